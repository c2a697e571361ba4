//! # CASTEP .cell 格式解析器
//!
//! 解析 CASTEP 输入文件 .cell 格式。
//!
//! ## .cell 格式说明
//! ```text
//! %BLOCK LATTICE_CART
//! ang
//! a1 a2 a3
//! b1 b2 b3
//! c1 c2 c3
//! %ENDBLOCK LATTICE_CART
//!
//! %BLOCK POSITIONS_FRAC
//! Element x y z
//! ...
//! %ENDBLOCK POSITIONS_FRAC
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/multi.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{CrystalError, Result};
use crate::models::elements::symbol_from_label;
use crate::models::{Lattice, Site, Structure};

const BOHR_TO_ANGSTROM: f64 = 0.529_177_210_903;

fn format_error(name: &str, reason: impl Into<String>) -> CrystalError {
    CrystalError::ParseError {
        format: "cell".to_string(),
        path: name.to_string(),
        reason: reason.into(),
    }
}

/// 内容中是否有 .cell 的晶格块
pub fn looks_like_cell(content: &str) -> bool {
    let upper = content.to_uppercase();
    upper.contains("%BLOCK LATTICE_CART") || upper.contains("%BLOCK LATTICE_ABC")
}

/// 从字符串内容解析 .cell 格式
pub fn parse_cell_content(content: &str, default_name: &str) -> Result<Structure> {
    let content_upper = content.to_uppercase();
    let lines: Vec<&str> = content.lines().collect();

    // 解析 LATTICE_CART 或 LATTICE_ABC
    let lattice = if let Some(start) = find_block_start(&content_upper, "LATTICE_CART") {
        parse_lattice_cart(&lines, start, default_name)?
    } else if let Some(start) = find_block_start(&content_upper, "LATTICE_ABC") {
        parse_lattice_abc(&lines, start, default_name)?
    } else {
        return Err(format_error(default_name, "Missing LATTICE_CART or LATTICE_ABC block"));
    };

    // 解析 POSITIONS_FRAC 或 POSITIONS_ABS
    let sites = if let Some(start) = find_block_start(&content_upper, "POSITIONS_FRAC") {
        parse_positions(&lines, start)?
    } else if let Some(start) = find_block_start(&content_upper, "POSITIONS_ABS") {
        parse_positions(&lines, start)?
            .into_iter()
            .map(|site| {
                lattice
                    .to_fractional(site.position)
                    .map(|frac| Site { position: frac, ..site })
                    .ok_or_else(|| format_error(default_name, "Singular lattice"))
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        return Err(format_error(default_name, "Missing POSITIONS_FRAC or POSITIONS_ABS block"));
    };

    let mut structure = Structure::new(default_name, lattice, sites);
    structure.source_format = Some("cell".to_string());

    Ok(structure)
}

/// 查找 %BLOCK XXX 的起始行号
fn find_block_start(content_upper: &str, block_name: &str) -> Option<usize> {
    let pattern = format!("%BLOCK {}", block_name);
    content_upper
        .lines()
        .position(|line| line.trim().starts_with(&pattern))
}

fn is_skippable(line: &str) -> bool {
    line.is_empty() || line.starts_with('#') || line.starts_with('!')
}

/// 块内单位行 -> 换算到 Å 的系数
fn unit_factor(line: &str) -> Option<f64> {
    match line.to_lowercase().as_str() {
        "ang" => Some(1.0),
        "bohr" | "a0" => Some(BOHR_TO_ANGSTROM),
        "nm" => Some(10.0),
        _ => None,
    }
}

/// 解析 LATTICE_CART 块
fn parse_lattice_cart(lines: &[&str], start: usize, name: &str) -> Result<Lattice> {
    let mut matrix = [[0.0; 3]; 3];
    let mut row_idx = 0;
    let mut factor = 1.0;

    for line in lines.iter().skip(start + 1) {
        let line = line.trim();
        if line.to_uppercase().starts_with("%ENDBLOCK") {
            break;
        }
        if let Some(f) = unit_factor(line) {
            factor = f;
            continue;
        }
        if is_skippable(line) {
            continue;
        }

        let parts: Vec<f64> = line
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();

        if parts.len() >= 3 && row_idx < 3 {
            matrix[row_idx] = [parts[0] * factor, parts[1] * factor, parts[2] * factor];
            row_idx += 1;
        }
    }

    if row_idx < 3 {
        return Err(format_error(name, "Incomplete LATTICE_CART block"));
    }

    Ok(Lattice::from_vectors(matrix))
}

/// 解析 LATTICE_ABC 块
fn parse_lattice_abc(lines: &[&str], start: usize, name: &str) -> Result<Lattice> {
    let mut params: Vec<f64> = Vec::new();
    let mut factor = 1.0;

    for line in lines.iter().skip(start + 1) {
        let line = line.trim();
        if line.to_uppercase().starts_with("%ENDBLOCK") {
            break;
        }
        if let Some(f) = unit_factor(line) {
            factor = f;
            continue;
        }
        if is_skippable(line) {
            continue;
        }

        params.extend(line.split_whitespace().filter_map(|p| p.parse::<f64>().ok()));
    }

    if params.len() < 6 {
        return Err(format_error(
            name,
            "Incomplete LATTICE_ABC block (need a b c alpha beta gamma)",
        ));
    }

    Ok(Lattice::from_parameters(
        params[0] * factor,
        params[1] * factor,
        params[2] * factor,
        params[3],
        params[4],
        params[5],
    ))
}

/// 解析原子位置块
fn parse_positions(lines: &[&str], start: usize) -> Result<Vec<Site>> {
    let mut sites = Vec::new();

    for line in lines.iter().skip(start + 1) {
        let line = line.trim();
        if line.to_uppercase().starts_with("%ENDBLOCK") {
            break;
        }
        if is_skippable(line) || unit_factor(line).is_some() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() >= 4 {
            // "Fe:1" 这类带标签的物种
            let Some(element) = symbol_from_label(parts[0]) else {
                continue;
            };
            if let (Ok(x), Ok(y), Ok(z)) = (
                parts[1].parse::<f64>(),
                parts[2].parse::<f64>(),
                parts[3].parse::<f64>(),
            ) {
                sites.push(Site::new(element, [x, y, z]).with_label(parts[0]));
            }
        }
    }

    Ok(sites)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_lattice_cart() {
        let content = r#"
%BLOCK LATTICE_CART
ang
5.0 0.0 0.0
0.0 5.0 0.0
0.0 0.0 5.0
%ENDBLOCK LATTICE_CART

%BLOCK POSITIONS_FRAC
Na 0.0 0.0 0.0
Cl 0.5 0.5 0.5
%ENDBLOCK POSITIONS_FRAC
"#;
        assert!(looks_like_cell(content));
        let structure = parse_cell_content(content, "NaCl").unwrap();
        assert_eq!(structure.len(), 2);

        let (a, b, c, _, _, _) = structure.lattice.parameters();
        assert!((a - 5.0).abs() < 0.01);
        assert!((b - 5.0).abs() < 0.01);
        assert!((c - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_parse_cell_lattice_abc() {
        let content = r#"
%BLOCK LATTICE_ABC
ang
5.64 5.64 5.64
90.0 90.0 90.0
%ENDBLOCK LATTICE_ABC

%BLOCK POSITIONS_FRAC
Na 0.0 0.0 0.0
Cl 0.5 0.5 0.5
%ENDBLOCK POSITIONS_FRAC
"#;
        let structure = parse_cell_content(content, "NaCl").unwrap();
        let (a, _, _, alpha, beta, gamma) = structure.lattice.parameters();

        assert!((a - 5.64).abs() < 0.01);
        assert!((alpha - 90.0).abs() < 0.01);
        assert!((beta - 90.0).abs() < 0.01);
        assert!((gamma - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_parse_cell_positions_abs() {
        let content = r#"
%BLOCK LATTICE_CART
4.0 0.0 0.0
0.0 4.0 0.0
0.0 0.0 4.0
%ENDBLOCK LATTICE_CART
%BLOCK POSITIONS_ABS
Fe:1 2.0 1.0 0.0
%ENDBLOCK POSITIONS_ABS
"#;
        let structure = parse_cell_content(content, "Fe").unwrap();
        assert_eq!(structure.sites[0].dominant_element(), "Fe");
        let p = structure.sites[0].position;
        assert!((p[0] - 0.5).abs() < 1e-12 && (p[1] - 0.25).abs() < 1e-12 && p[2].abs() < 1e-12);
    }

    #[test]
    fn test_parse_cell_with_comments() {
        let content = r#"
# This is a comment
! Another comment
%BLOCK LATTICE_CART
ang
3.0 0.0 0.0
0.0 3.0 0.0
0.0 0.0 3.0
%ENDBLOCK LATTICE_CART

%BLOCK POSITIONS_FRAC
# Fe at origin
Fe 0.0 0.0 0.0
%ENDBLOCK POSITIONS_FRAC
"#;
        let structure = parse_cell_content(content, "Fe").unwrap();
        assert_eq!(structure.len(), 1);
        assert_eq!(structure.sites[0].dominant_element(), "Fe");
    }

    #[test]
    fn test_parse_cell_missing_lattice() {
        let err = parse_cell_content("%BLOCK POSITIONS_FRAC\nFe 0 0 0\n%ENDBLOCK POSITIONS_FRAC\n", "x")
            .unwrap_err();
        assert!(err.to_string().contains("LATTICE"));
    }
}
