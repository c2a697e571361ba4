//! # 外部协作者接口
//!
//! 编排器在转换前后调用的两个可替换组件：
//!
//! - [`InputValidator`]: 转换前确认输入看起来是结构文件且不超过大小上限
//! - [`ArtifactSink`]: 保存中间产物（OBJ/MTL）以便审计；没有 sink 或 sink 出错
//!   都不影响转换结果
//!
//! ## 依赖关系
//! - 被 `pipeline/orchestrator.rs` 使用
//! - 使用 `parsers/` 的格式识别函数

use crate::error::{CrystalError, Result};
use crate::parsers::{decode, poscar::looks_like_poscar, res::looks_like_res};
use log::debug;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

/// 签名检查读取的字符数
pub const SIGNATURE_WINDOW: usize = 1000;

/// 结构文件关键词（小写）
const STRUCTURE_KEYWORDS: [&str; 5] = ["data_", "_cell_length_a", "_atom_site_", "loop_", "%block lattice"];

/// 输入预检
pub trait InputValidator: Send + Sync {
    fn validate(&self, path: &Path, max_bytes: u64) -> Result<()>;
}

/// 默认预检：文件存在、大小不超限、开头包含结构文件特征
#[derive(Debug, Clone, Copy, Default)]
pub struct CifSignatureValidator;

impl InputValidator for CifSignatureValidator {
    fn validate(&self, path: &Path, max_bytes: u64) -> Result<()> {
        let meta = fs::metadata(path).map_err(|_| CrystalError::FileNotFound {
            path: path.display().to_string(),
        })?;
        if !meta.is_file() {
            return Err(CrystalError::InvalidInput(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        if meta.len() > max_bytes {
            return Err(CrystalError::InvalidInput(format!(
                "{} is {} bytes, limit is {}",
                path.display(),
                meta.len(),
                max_bytes
            )));
        }

        // UTF-8 最多 4 字节一个字符
        let mut buf = Vec::with_capacity(SIGNATURE_WINDOW * 4);
        File::open(path)
            .and_then(|f| f.take((SIGNATURE_WINDOW * 4) as u64).read_to_end(&mut buf))
            .map_err(|e| CrystalError::FileReadError {
                path: path.display().to_string(),
                source: e,
            })?;
        let head: String = decode(&buf).chars().take(SIGNATURE_WINDOW).collect();

        if has_structure_signature(&head) {
            Ok(())
        } else {
            Err(CrystalError::InvalidInput(format!(
                "{} does not look like a structure file",
                path.display()
            )))
        }
    }
}

/// 文本开头是否像结构文件
pub fn has_structure_signature(head: &str) -> bool {
    let lower = head.to_lowercase();
    STRUCTURE_KEYWORDS.iter().any(|k| lower.contains(k))
        || looks_like_poscar(head)
        || looks_like_res(head)
}

/// 中间产物保存
pub trait ArtifactSink: Send + Sync {
    /// 保存一次转换的中间文件；`conversion` 为转换名称
    fn persist(&self, conversion: &str, files: &[PathBuf]) -> Result<()>;
}

/// 复制到 `<root>/<conversion>/` 下
#[derive(Debug, Clone)]
pub struct DirectoryArtifactSink {
    root: PathBuf,
}

impl DirectoryArtifactSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryArtifactSink { root: root.into() }
    }
}

impl ArtifactSink for DirectoryArtifactSink {
    fn persist(&self, conversion: &str, files: &[PathBuf]) -> Result<()> {
        let target = self.root.join(conversion);
        fs::create_dir_all(&target).map_err(|e| CrystalError::FileWriteError {
            path: target.display().to_string(),
            source: e,
        })?;
        for file in files.iter().filter(|f| f.is_file()) {
            let Some(name) = file.file_name() else {
                continue;
            };
            let dest = target.join(name);
            fs::copy(file, &dest).map_err(|e| CrystalError::FileWriteError {
                path: dest.display().to_string(),
                source: e,
            })?;
            debug!("kept artifact {}", dest.display());
        }
        Ok(())
    }
}
