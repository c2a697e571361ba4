//! # 结构解析模块
//!
//! 把原始结构文件字节转换为 [`Structure`]。多个解析后端按固定顺序尝试，
//! 第一个产出合法结构的后端胜出：
//!
//! 1. `cif`：完整 CIF 解析（含对称展开）
//! 2. `multi-format`：POSCAR / .cell / .res / 宽松 CIF
//! 3. `text-scan`：正则提取晶胞参数，生成占位结构
//!
//! 每个后端的失败（返回错误、panic、结果不合法）都被记录，不会中断后续尝试。
//! 全部失败时返回 `CrystalError::ParseFailure`，附带每次尝试的原因。
//!
//! ## 依赖关系
//! - 被 `pipeline/orchestrator.rs` 使用
//! - 使用 `models/` 数据模型
//! - 子模块: cif, multi, poscar, cell, res, loose_cif, scan

pub mod cell;
pub mod cif;
pub mod loose_cif;
pub mod multi;
pub mod poscar;
pub mod res;
pub mod scan;

use crate::error::{panic_message, BackendFailure, CrystalError, FailureKind, Result};
use crate::models::Structure;
use log::{debug, info, warn};
use std::borrow::Cow;
use std::panic::{catch_unwind, AssertUnwindSafe};

pub use cif::CifBackend;
pub use multi::MultiFormatBackend;
pub use scan::TextScanBackend;

/// 解析后端统一接口
pub trait ParseBackend: Send + Sync {
    /// 后端名称（用于报告和 `preferredBackend`）
    fn name(&self) -> &str;

    /// 尝试解析；`default_name` 在文件本身没有名称时使用
    fn attempt(&self, content: &[u8], default_name: &str)
        -> std::result::Result<Structure, BackendFailure>;
}

/// 字节按 UTF-8 解码，非法序列替换为 U+FFFD
pub(crate) fn decode(content: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(content)
}

/// 解析结果
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub structure: Structure,
    /// 胜出的后端
    pub backend: String,
    /// 之前失败的尝试
    pub failures: Vec<BackendFailure>,
}

/// 按顺序尝试解析后端
pub struct StructureParser {
    backends: Vec<Box<dyn ParseBackend>>,
}

impl Default for StructureParser {
    fn default() -> Self {
        Self::new(default_backends())
    }
}

/// 默认注册表：cif → multi-format → text-scan
pub fn default_backends() -> Vec<Box<dyn ParseBackend>> {
    vec![
        Box::new(CifBackend),
        Box::new(MultiFormatBackend),
        Box::new(TextScanBackend),
    ]
}

impl StructureParser {
    pub fn new(backends: Vec<Box<dyn ParseBackend>>) -> Self {
        StructureParser { backends }
    }

    /// 将指定后端移到最前；名称未知时保持原顺序
    pub fn with_preferred(mut self, preferred: Option<&str>) -> Self {
        if let Some(name) = preferred {
            match self.backends.iter().position(|b| b.name() == name) {
                Some(idx) => {
                    let backend = self.backends.remove(idx);
                    self.backends.insert(0, backend);
                }
                None => warn!("unknown parsing backend '{}', keeping default order", name),
            }
        }
        self
    }

    /// 当前顺序下的后端名称
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// 解析结构文件内容
    pub fn parse(&self, content: &[u8], default_name: &str) -> Result<ParseOutcome> {
        let mut failures: Vec<BackendFailure> = Vec::new();

        for backend in &self.backends {
            let name = backend.name().to_string();
            debug!("trying parsing backend '{}' for '{}'", name, default_name);

            let result = catch_unwind(AssertUnwindSafe(|| backend.attempt(content, default_name)));
            let failure = match result {
                Ok(Ok(structure)) => match structure.validate() {
                    Ok(()) => {
                        info!(
                            "parsed '{}' with backend '{}': {} site(s), formula {}",
                            default_name,
                            name,
                            structure.len(),
                            structure.formula()
                        );
                        return Ok(ParseOutcome {
                            structure,
                            backend: name,
                            failures,
                        });
                    }
                    Err(reason) => BackendFailure::new(&name, FailureKind::Malformed, reason),
                },
                Ok(Err(failure)) => failure,
                Err(payload) => BackendFailure::new(
                    &name,
                    FailureKind::Panicked,
                    panic_message(payload.as_ref()),
                ),
            };

            warn!("parsing backend failed: {}", failure);
            failures.push(failure);
        }

        Err(CrystalError::ParseFailure { attempts: failures })
    }
}
