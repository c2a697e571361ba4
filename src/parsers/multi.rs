//! # 多格式解析后端
//!
//! 第二顺位后端：按内容特征嗅探格式，依次尝试
//! AIRSS .res → CASTEP .cell → POSCAR → 宽松 CIF。
//! 只有特征匹配的格式会被尝试；全部不匹配视为失败。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 注册
//! - 使用 `parsers/{res,cell,poscar,loose_cif}.rs`

use super::{cell, decode, loose_cif, poscar, res, ParseBackend};
use crate::error::{BackendFailure, Result};
use crate::models::Structure;
use log::debug;

type Reader = fn(&str, &str) -> Result<Structure>;
type Sniffer = fn(&str) -> bool;

const FORMATS: [(&str, Sniffer, Reader); 4] = [
    ("res", res::looks_like_res, res::parse_res_content),
    ("cell", cell::looks_like_cell, cell::parse_cell_content),
    ("poscar", poscar::looks_like_poscar, poscar::parse_poscar_content),
    ("loose-cif", loose_cif::looks_like_cif, loose_cif::parse_loose_cif_content),
];

/// 按内容嗅探的多格式后端
#[derive(Debug, Default)]
pub struct MultiFormatBackend;

impl ParseBackend for MultiFormatBackend {
    fn name(&self) -> &str {
        "multi-format"
    }

    fn attempt(&self, content: &[u8], default_name: &str) -> std::result::Result<Structure, BackendFailure> {
        let text = decode(content);
        let mut errors: Vec<String> = Vec::new();

        for (format, sniff, read) in FORMATS {
            if !sniff(&text) {
                continue;
            }
            debug!("multi-format: '{}' looks like {}", default_name, format);
            match read(&text, default_name) {
                Ok(structure) => return Ok(structure),
                Err(e) => errors.push(e.to_string()),
            }
        }

        let reason = if errors.is_empty() {
            "content matches no supported format".to_string()
        } else {
            errors.join("; ")
        };
        Err(BackendFailure::error(self.name(), reason))
    }
}
