//! # 进程内打包后端
//!
//! 直接从网格生成 USDA 场景层并写入 USDZ，不依赖任何外部工具。
//!
//! ## 依赖关系
//! - 被 `packaging/mod.rs` 注册
//! - 使用 `packaging/usda.rs`、`packaging/usdz.rs`

use super::{usda, usdz, PackageInput, PackagingBackend};
use crate::error::{BackendFailure, FailureKind};

/// `native` 后端
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl PackagingBackend for NativeBackend {
    fn name(&self) -> &str {
        "native"
    }

    fn attempt(&self, input: &PackageInput<'_>) -> Result<(), BackendFailure> {
        input
            .mesh
            .check_integrity()
            .map_err(|reason| BackendFailure::new(self.name(), FailureKind::Malformed, reason))?;

        let layer = usda::to_usda(input.mesh);
        usdz::write_usdz(input.output, &[(usda::LAYER_NAME, layer.as_bytes())])
            .map_err(|e| BackendFailure::error(self.name(), e.to_string()))
    }

    fn needs_handoff(&self) -> bool {
        false
    }
}
