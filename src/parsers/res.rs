//! # AIRSS / SHELX .res 格式解析器
//!
//! 解析 AIRSS 结构搜索产生的 .res 文件格式。
//!
//! ## .res 格式说明
//! ```text
//! TITL name P V E H 0 0 n (sym) [spin info]
//! CELL 1.0 a b c alpha beta gamma
//! LATT -1
//! SFAC Element1 Element2 ...
//! Element1 1 x1 y1 z1 1.0
//! Element2 2 x2 y2 z2 1.0
//! ...
//! END
//! ```
//!
//! 只读取构建结构需要的部分：名称、晶胞、空间群和原子行（第 6 列为占有率）。
//!
//! ## 依赖关系
//! - 被 `parsers/multi.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{CrystalError, Result};
use crate::models::elements::symbol_from_label;
use crate::models::{Lattice, Site, Structure};

/// 内容是否同时有 CELL 与 SFAC 行
pub fn looks_like_res(content: &str) -> bool {
    let mut has_cell = false;
    let mut has_sfac = false;
    for line in content.lines() {
        let upper = line.trim_start().to_uppercase();
        has_cell |= upper.starts_with("CELL");
        has_sfac |= upper.starts_with("SFAC");
    }
    has_cell && has_sfac
}

/// 从字符串内容解析 .res 格式
pub fn parse_res_content(content: &str, default_name: &str) -> Result<Structure> {
    let mut name = default_name.to_string();
    let mut lattice: Option<Lattice> = None;
    let mut sites: Vec<Site> = Vec::new();
    let mut sfac_elements: Vec<String> = Vec::new();
    let mut space_group: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0].to_uppercase().as_str() {
            "TITL" => {
                if parts.len() >= 2 {
                    name = parts[1].to_string();
                }
                // 查找 (sym) 空间群
                if let (Some(sym_start), Some(sym_end)) = (line.find('('), line.find(')')) {
                    if sym_end > sym_start {
                        space_group = Some(line[sym_start + 1..sym_end].to_string());
                    }
                }
            }
            "CELL" => {
                // CELL wavelength a b c alpha beta gamma
                let values: Vec<f64> = parts[1..].iter().filter_map(|s| s.parse().ok()).collect();
                if values.len() < 7 {
                    return Err(CrystalError::ParseError {
                        format: "res".to_string(),
                        path: name,
                        reason: "CELL line needs wavelength a b c alpha beta gamma".to_string(),
                    });
                }
                lattice = Some(Lattice::from_parameters(
                    values[1], values[2], values[3], values[4], values[5], values[6],
                ));
            }
            "SFAC" => {
                sfac_elements = parts[1..].iter().map(|s| s.to_string()).collect();
            }
            "LATT" | "ZERR" | "END" | "REM" | "SYMM" => {}
            _ => {
                // 原子行: Label type x y z occ
                if parts.len() < 5 || sfac_elements.is_empty() {
                    continue;
                }
                let element = parts[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| sfac_elements.get(idx.wrapping_sub(1)))
                    .and_then(|e| symbol_from_label(e))
                    .or_else(|| symbol_from_label(parts[0]));
                let Some(element) = element else {
                    continue;
                };
                if let (Ok(x), Ok(y), Ok(z)) = (
                    parts[2].parse::<f64>(),
                    parts[3].parse::<f64>(),
                    parts[4].parse::<f64>(),
                ) {
                    let occupancy = parts
                        .get(5)
                        .and_then(|s| s.parse::<f64>().ok())
                        .unwrap_or(1.0);
                    sites.push(
                        Site::with_occupancy(element, occupancy, [x, y, z]).with_label(parts[0]),
                    );
                }
            }
        }
    }

    let lattice = lattice.ok_or_else(|| CrystalError::ParseError {
        format: "res".to_string(),
        path: name.clone(),
        reason: "Missing CELL line".to_string(),
    })?;

    let mut structure = Structure::new(name, lattice, sites);
    structure.space_group = space_group;
    structure.source_format = Some("res".to_string());

    Ok(structure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_res_basic() {
        let content = r#"
TITL TiC-12345 100.0 50.0 -100.0 -99.5 0 0 8 (Fm-3m)
CELL 1.0 4.33 4.33 4.33 90.0 90.0 90.0
LATT -1
SFAC Ti C
Ti 1 0.0 0.0 0.0 1.0
Ti 1 0.5 0.5 0.0 1.0
Ti 1 0.5 0.0 0.5 1.0
Ti 1 0.0 0.5 0.5 1.0
C 2 0.5 0.5 0.5 1.0
C 2 0.0 0.0 0.5 1.0
C 2 0.0 0.5 0.0 1.0
C 2 0.5 0.0 0.0 1.0
END
"#;
        assert!(looks_like_res(content));
        let structure = parse_res_content(content, "test").unwrap();
        assert_eq!(structure.name, "TiC-12345");
        assert_eq!(structure.len(), 8);
        assert_eq!(structure.space_group, Some("Fm-3m".to_string()));
        assert_eq!(structure.formula(), "C4Ti4");
    }

    #[test]
    fn test_parse_res_shelx_labels_and_occupancy() {
        let content = r#"
TITL FeNi
CELL 0.71073 3.5 3.5 3.5 90 90 90
SFAC Fe Ni
Fe1 1 0.0 0.0 0.0 0.5
Ni1 2 0.5 0.5 0.0 1.0
END
"#;
        let structure = parse_res_content(content, "test").unwrap();
        assert_eq!(structure.sites[0].dominant_element(), "Fe");
        assert_eq!(structure.sites[0].species[0].occupancy, 0.5);
        assert_eq!(structure.sites[1].dominant_element(), "Ni");
    }

    #[test]
    fn test_parse_res_missing_cell() {
        let content = r#"
TITL Test 0.0 10.0 0.0 0.0 0 0 1 (P1)
SFAC Fe
Fe 1 0.0 0.0 0.0 1.0
END
"#;
        assert!(!looks_like_res(content));
        let result = parse_res_content(content, "test");
        assert!(result.is_err());
    }
}
