//! # 宽松的逐行 CIF 读取器
//!
//! 不做完整的 STAR 语法分析：逐行扫描晶胞参数和 `_atom_site_*` loop，
//! 忽略对称操作（按 P1 处理）。用于首选 CIF 解析失败后的兜底，
//! 例如 loop 行列数不齐、值中夹带空白等不规范文件。
//!
//! ## 依赖关系
//! - 被 `parsers/multi.rs` 使用
//! - 使用 `parsers/cif/reader.rs` 的数值解析

use super::cif::reader::parse_number;
use crate::error::{CrystalError, Result};
use crate::models::elements::symbol_from_label;
use crate::models::{Lattice, Site, Structure};

fn format_error(name: &str, reason: impl Into<String>) -> CrystalError {
    CrystalError::ParseError {
        format: "loose-cif".to_string(),
        path: name.to_string(),
        reason: reason.into(),
    }
}

/// 是否含有 CIF 晶胞或原子位点关键字
pub fn looks_like_cif(content: &str) -> bool {
    let lower = content.to_lowercase();
    lower.contains("_cell_length_a") && lower.contains("_atom_site_")
}

/// 行内 "_key value" 的值
fn inline_value(line: &str) -> Option<f64> {
    line.split_whitespace().nth(1).and_then(parse_number)
}

/// 逐行解析，只取第一个原子位点 loop
pub fn parse_loose_cif_content(content: &str, default_name: &str) -> Result<Structure> {
    let mut name = default_name.to_string();
    let mut cell: [Option<f64>; 6] = [None, None, None, Some(90.0), Some(90.0), Some(90.0)];
    const CELL_KEYS: [&str; 6] = [
        "_cell_length_a",
        "_cell_length_b",
        "_cell_length_c",
        "_cell_angle_alpha",
        "_cell_angle_beta",
        "_cell_angle_gamma",
    ];

    let mut in_loop = false;
    let mut headers: Vec<String> = Vec::new();
    let mut sites: Vec<Site> = Vec::new();
    let mut atom_loop_done = false;

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let lower = line.to_lowercase();

        if let Some(block) = lower.strip_prefix("data_") {
            if !block.is_empty() && name == default_name {
                name = line[5..].trim().to_string();
            }
            in_loop = false;
            continue;
        }

        if lower.starts_with("loop_") {
            if is_atom_loop(&headers) && !sites.is_empty() {
                atom_loop_done = true;
            }
            in_loop = true;
            headers.clear();
            continue;
        }

        if lower.starts_with('_') {
            if let Some(idx) = CELL_KEYS.iter().position(|k| lower.split_whitespace().next() == Some(*k)) {
                if let Some(v) = inline_value(line) {
                    cell[idx] = Some(v);
                }
                in_loop = false;
                continue;
            }
            if in_loop && line.split_whitespace().count() == 1 {
                // 数据行开始前的列名
                if sites.is_empty() || !is_atom_loop(&headers) {
                    headers.push(lower);
                    continue;
                }
            }
            in_loop = false;
            continue;
        }

        if in_loop && !atom_loop_done && is_atom_loop(&headers) {
            if let Some(site) = parse_atom_row(line, &headers) {
                sites.push(site);
            }
        }
    }

    let [a, b, c, alpha, beta, gamma] = cell;
    let (Some(a), Some(b), Some(c)) = (a, b, c) else {
        return Err(format_error(&name, "missing cell lengths"));
    };
    if sites.is_empty() {
        return Err(format_error(&name, "no atom sites found"));
    }

    let lattice = Lattice::from_parameters(
        a,
        b,
        c,
        alpha.unwrap_or(90.0),
        beta.unwrap_or(90.0),
        gamma.unwrap_or(90.0),
    );
    let mut structure = Structure::new(name, lattice, sites);
    structure.source_format = Some("cif".to_string());
    Ok(structure)
}

fn is_atom_loop(headers: &[String]) -> bool {
    headers.iter().any(|h| h == "_atom_site_fract_x")
}

/// 按列名取值；行比列少时缺失列按缺省处理
fn parse_atom_row(line: &str, headers: &[String]) -> Option<Site> {
    let parts: Vec<&str> = line
        .split_whitespace()
        .map(|p| p.trim_matches(|c| c == '\'' || c == '"'))
        .collect();
    let column = |name: &str| -> Option<&str> {
        headers
            .iter()
            .position(|h| h == name)
            .and_then(|i| parts.get(i).copied())
    };

    let element = column("_atom_site_type_symbol")
        .and_then(symbol_from_label)
        .or_else(|| column("_atom_site_label").and_then(symbol_from_label))?;

    let x = column("_atom_site_fract_x").and_then(parse_number)?;
    let y = column("_atom_site_fract_y").and_then(parse_number)?;
    let z = column("_atom_site_fract_z").and_then(parse_number)?;
    let occupancy = column("_atom_site_occupancy")
        .and_then(parse_number)
        .unwrap_or(1.0);

    let mut site = Site::with_occupancy(element, occupancy, [x, y, z]);
    if let Some(label) = column("_atom_site_label") {
        site = site.with_label(label);
    }
    Some(site)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_reader_skips_symmetry() {
        let content = "data_NaCl
_cell_length_a 5.64
_cell_length_b 5.64
_cell_length_c 5.64
loop_
_symmetry_equiv_pos_as_xyz
'x, y, z'
'-x, -y, -z'
loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
Na1 Na 0 0 0
Cl1 Cl 0.5 0.5 0.5
";
        assert!(looks_like_cif(content));
        let s = parse_loose_cif_content(content, "x").unwrap();
        assert_eq!(s.name, "NaCl");
        assert_eq!(s.len(), 2);
        assert_eq!(s.sites[1].dominant_element(), "Cl");
    }

    #[test]
    fn test_loose_reader_tolerates_ragged_rows() {
        // 第二行缺少占有率列，第三行多出一列
        let content = "_cell_length_a 4
_cell_length_b 4
_cell_length_c 4
loop_
_atom_site_label
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
_atom_site_occupancy
Fe1 0 0 0 1.0
O1 0.5 0.5 0.5
O2 0.5 0 0 0.5 extra
";
        let s = parse_loose_cif_content(content, "ragged").unwrap();
        assert_eq!(s.name, "ragged");
        assert_eq!(s.len(), 3);
        assert_eq!(s.sites[1].species[0].occupancy, 1.0);
        assert_eq!(s.sites[2].species[0].occupancy, 0.5);
    }

    #[test]
    fn test_loose_reader_requires_cell() {
        let content = "loop_\n_atom_site_label\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\nFe1 0 0 0\n";
        assert!(parse_loose_cif_content(content, "x").is_err());
    }
}
