//! # CIF 解析后端
//!
//! 首选解析后端：完整的 CIF 词法/语法分析，支持对称操作展开、部分占位和不确定度。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 注册
//! - 子模块: lexer, reader, symmetry

pub mod lexer;
pub mod reader;
pub mod symmetry;

use super::{decode, ParseBackend};
use crate::error::BackendFailure;
use crate::models::Structure;

pub use reader::parse_cif_content;

/// 基于 nom 的 CIF 解析后端
#[derive(Debug, Default)]
pub struct CifBackend;

impl ParseBackend for CifBackend {
    fn name(&self) -> &str {
        "cif"
    }

    fn attempt(&self, content: &[u8], default_name: &str) -> Result<Structure, BackendFailure> {
        parse_cif_content(&decode(content), default_name)
            .map_err(|e| BackendFailure::error(self.name(), e.to_string()))
    }
}
