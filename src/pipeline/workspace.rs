//! # 临时工作区
//!
//! 每次转换独占一个临时目录，中间文件（OBJ/MTL、暂存 USDZ、外部工具日志）
//! 都写在其中。目录在 [`ScratchWorkspace::close`] 或 drop 时删除，
//! 因此提前返回和 panic 展开都会清理。
//!
//! ## 依赖关系
//! - 被 `pipeline/orchestrator.rs` 使用
//! - 使用 `tempfile` crate

use crate::error::{CrystalError, Result};
use log::debug;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PREFIX: &str = "crystal-ar-";

/// 单次转换的临时目录
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: TempDir,
}

impl ScratchWorkspace {
    /// 在 `root`（或系统临时目录）下创建
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX);
        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| CrystalError::ResourceFailure {
            path: root
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| std::env::temp_dir().display().to_string()),
            reason: format!("cannot create scratch workspace: {}", e),
        })?;
        debug!("scratch workspace at {}", dir.path().display());
        Ok(ScratchWorkspace { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// 工作区内的文件路径
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// 显式删除，返回清理错误
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().display().to_string();
        self.dir.close().map_err(|e| CrystalError::ResourceFailure {
            path,
            reason: format!("cannot remove scratch workspace: {}", e),
        })
    }
}
