//! # CIF 读取器
//!
//! 将记号流组装为数据块（单值项 + loop 表），再从第一个含原子位点的数据块
//! 构建 [`Structure`]。
//!
//! 识别的数据项：
//! - `_cell_length_{a,b,c}`、`_cell_angle_{alpha,beta,gamma}`（角度缺省 90°）
//! - `_atom_site_*` loop：label / type_symbol / fract_{x,y,z}（或 Cartn_{x,y,z}）/ occupancy
//! - `_symmetry_equiv_pos_as_xyz` 或 `_space_group_symop_operation_xyz`
//! - `_symmetry_space_group_name_h-m` 或 `_space_group_name_h-m_alt`
//!
//! 数值可带不确定度括号，如 `5.6402(3)`。
//!
//! ## 依赖关系
//! - 被 `parsers/cif/mod.rs` 使用
//! - 使用 `parsers/cif/lexer.rs`、`parsers/cif/symmetry.rs`

use super::lexer::{tokenize, Token};
use super::symmetry::{expand, AsymmetricSite, SymOp};
use crate::error::{CrystalError, Result};
use crate::models::elements::symbol_from_label;
use crate::models::{Lattice, Structure};
use log::{debug, warn};
use std::collections::HashMap;

/// loop_ 表
#[derive(Debug, Clone, Default)]
pub struct CifLoop {
    /// 列名（小写）
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CifLoop {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// 按候选列名依次查找
    pub fn column_any(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.column(n))
    }
}

/// data_ 数据块
#[derive(Debug, Clone, Default)]
pub struct CifBlock {
    pub name: String,
    pub items: HashMap<String, String>,
    pub loops: Vec<CifLoop>,
}

impl CifBlock {
    pub fn item(&self, name: &str) -> Option<&str> {
        self.items.get(name).map(String::as_str).filter(|v| !is_null(v))
    }

    /// 包含指定列的 loop
    pub fn find_loop(&self, column: &str) -> Option<&CifLoop> {
        self.loops.iter().find(|l| l.column(column).is_some())
    }

    fn has_atom_sites(&self) -> bool {
        self.find_loop("_atom_site_fract_x").is_some()
            || self.find_loop("_atom_site_cartn_x").is_some()
    }
}

/// `.` 与 `?` 表示无值
pub fn is_null(value: &str) -> bool {
    value == "." || value == "?"
}

/// 解析带不确定度的数值："5.6402(3)" -> 5.6402
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = match value.find('(') {
        Some(idx) => &value[..idx],
        None => value,
    };
    trimmed.trim().parse().ok()
}

/// 记号流 -> 数据块列表
pub fn read_blocks(text: &str) -> Vec<CifBlock> {
    let tokens = tokenize(text);
    let mut blocks: Vec<CifBlock> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            Token::DataBlock(name) => {
                blocks.push(CifBlock {
                    name: name.clone(),
                    ..Default::default()
                });
                i += 1;
            }
            Token::Loop => {
                i += 1;
                let mut cif_loop = CifLoop::default();
                while let Some(Token::DataName(name)) = tokens.get(i) {
                    cif_loop.headers.push(name.clone());
                    i += 1;
                }
                let mut values: Vec<String> = Vec::new();
                while let Some(v) = tokens.get(i).and_then(Token::as_value) {
                    values.push(v.to_string());
                    i += 1;
                }
                if cif_loop.headers.is_empty() {
                    continue;
                }
                let width = cif_loop.headers.len();
                if values.len() % width != 0 {
                    warn!(
                        "CIF loop ({}) has {} values, not a multiple of {} columns; dropping the partial row",
                        cif_loop.headers[0],
                        values.len(),
                        width
                    );
                }
                cif_loop.rows = values.chunks_exact(width).map(|c| c.to_vec()).collect();
                current_block(&mut blocks).loops.push(cif_loop);
            }
            Token::DataName(name) => {
                let name = name.clone();
                i += 1;
                if let Some(v) = tokens.get(i).and_then(Token::as_value) {
                    current_block(&mut blocks).items.insert(name, v.to_string());
                    i += 1;
                }
            }
            _ => {
                // 游离的值
                i += 1;
            }
        }
    }

    blocks
}

/// 没有 data_ 头时自动创建匿名块
fn current_block(blocks: &mut Vec<CifBlock>) -> &mut CifBlock {
    if blocks.is_empty() {
        blocks.push(CifBlock::default());
    }
    let last = blocks.len() - 1;
    &mut blocks[last]
}

fn format_error(name: &str, reason: impl Into<String>) -> CrystalError {
    CrystalError::ParseError {
        format: "cif".to_string(),
        path: name.to_string(),
        reason: reason.into(),
    }
}

/// 解析 CIF 文本，返回第一个含原子位点的结构
pub fn parse_cif_content(content: &str, default_name: &str) -> Result<Structure> {
    let blocks = read_blocks(content);
    if blocks.is_empty() {
        return Err(format_error(default_name, "no data block found"));
    }

    let block = blocks
        .iter()
        .find(|b| b.has_atom_sites())
        .ok_or_else(|| format_error(default_name, "no _atom_site loop found"))?;

    let name = if block.name.is_empty() {
        default_name.to_string()
    } else {
        block.name.clone()
    };

    let lattice = read_lattice(block, &name)?;
    let records = read_atom_sites(block, &lattice, &name)?;
    let ops = read_symmetry_ops(block);

    let sites = expand(&records, &ops);
    debug!(
        "CIF block '{}': {} asymmetric record(s), {} symmetry op(s) -> {} site(s)",
        name,
        records.len(),
        ops.len().max(1),
        sites.len()
    );

    let mut structure = Structure::new(name, lattice, sites);
    structure.space_group = block
        .item("_symmetry_space_group_name_h-m")
        .or_else(|| block.item("_space_group_name_h-m_alt"))
        .map(|s| s.trim().to_string());
    structure.source_format = Some("cif".to_string());

    if ops.is_empty() {
        if let Some(sg) = &structure.space_group {
            let compact: String = sg.chars().filter(|c| !c.is_whitespace()).collect();
            if compact != "P1" {
                warn!(
                    "CIF '{}' declares space group {} but lists no symmetry operations; using sites as given",
                    structure.name, sg
                );
            }
        }
    }

    Ok(structure)
}

fn read_lattice(block: &CifBlock, name: &str) -> Result<Lattice> {
    let length = |key: &str| -> Result<f64> {
        block
            .item(key)
            .and_then(parse_number)
            .ok_or_else(|| format_error(name, format!("missing or invalid {}", key)))
    };
    let angle = |key: &str| block.item(key).and_then(parse_number).unwrap_or(90.0);

    Ok(Lattice::from_parameters(
        length("_cell_length_a")?,
        length("_cell_length_b")?,
        length("_cell_length_c")?,
        angle("_cell_angle_alpha"),
        angle("_cell_angle_beta"),
        angle("_cell_angle_gamma"),
    ))
}

fn read_atom_sites(block: &CifBlock, lattice: &Lattice, name: &str) -> Result<Vec<AsymmetricSite>> {
    let (table, cartesian) = match block.find_loop("_atom_site_fract_x") {
        Some(l) => (l, false),
        None => match block.find_loop("_atom_site_cartn_x") {
            Some(l) => (l, true),
            None => return Err(format_error(name, "no _atom_site loop found")),
        },
    };

    let prefix = if cartesian { "_atom_site_cartn_" } else { "_atom_site_fract_" };
    let coord_cols: Vec<usize> = ["x", "y", "z"]
        .iter()
        .map(|axis| {
            table
                .column(&format!("{}{}", prefix, axis))
                .ok_or_else(|| format_error(name, format!("missing {}{} column", prefix, axis)))
        })
        .collect::<Result<_>>()?;

    let label_col = table.column("_atom_site_label");
    let type_col = table.column("_atom_site_type_symbol");
    let occ_col = table.column("_atom_site_occupancy");

    let mut records = Vec::new();
    for (row_idx, row) in table.rows.iter().enumerate() {
        let label = label_col.map(|c| row[c].clone()).filter(|l| !is_null(l));

        let element = type_col
            .map(|c| row[c].as_str())
            .filter(|s| !is_null(s))
            .and_then(symbol_from_label)
            .or_else(|| label.as_deref().and_then(symbol_from_label));
        let element = match element {
            Some(e) => e.to_string(),
            None => {
                warn!("CIF '{}': skipping atom_site row {} with unknown element", name, row_idx + 1);
                continue;
            }
        };

        let mut coords = [0.0; 3];
        for (k, &col) in coord_cols.iter().enumerate() {
            coords[k] = parse_number(&row[col]).ok_or_else(|| {
                format_error(name, format!("invalid coordinate '{}' in atom_site row {}", row[col], row_idx + 1))
            })?;
        }
        let position = if cartesian {
            lattice
                .to_fractional(coords)
                .ok_or_else(|| format_error(name, "singular lattice for Cartesian sites"))?
        } else {
            coords
        };

        let occupancy = occ_col
            .map(|c| row[c].as_str())
            .filter(|s| !is_null(s))
            .and_then(parse_number)
            .unwrap_or(1.0);

        records.push(AsymmetricSite {
            element,
            occupancy,
            position,
            label,
        });
    }

    if records.is_empty() {
        return Err(format_error(name, "atom_site loop has no usable rows"));
    }
    Ok(records)
}

fn read_symmetry_ops(block: &CifBlock) -> Vec<SymOp> {
    const OP_COLUMNS: [&str; 2] = [
        "_symmetry_equiv_pos_as_xyz",
        "_space_group_symop_operation_xyz",
    ];

    let raw: Vec<String> = match block.loops.iter().find_map(|l| l.column_any(&OP_COLUMNS).map(|c| (l, c))) {
        Some((table, col)) => table.rows.iter().map(|r| r[col].clone()).collect(),
        None => OP_COLUMNS
            .iter()
            .find_map(|k| block.item(k))
            .map(|s| vec![s.to_string()])
            .unwrap_or_default(),
    };

    raw.iter()
        .filter_map(|text| match SymOp::parse(text) {
            Ok(op) => Some(op),
            Err(e) => {
                warn!("ignoring unparsable symmetry operation: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROCK_SALT: &str = r#"
data_NaCl
_cell_length_a 5.6402(3)
_cell_length_b 5.6402(3)
_cell_length_c 5.6402(3)
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
_symmetry_space_group_name_H-M 'F m -3 m'
loop_
_symmetry_equiv_pos_as_xyz
'x, y, z'
'x, y+1/2, z+1/2'
'x+1/2, y, z+1/2'
'x+1/2, y+1/2, z'
loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
_atom_site_occupancy
Na1 Na+ 0.0 0.0 0.0 1.0
Cl1 Cl- 0.5 0.5 0.5 1.0
"#;

    #[test]
    fn test_parse_rock_salt() {
        let s = parse_cif_content(ROCK_SALT, "fallback").unwrap();
        assert_eq!(s.name, "NaCl");
        assert_eq!(s.len(), 8);
        assert_eq!(s.space_group.as_deref(), Some("F m -3 m"));
        assert_eq!(s.formula(), "Cl4Na4");
        let (a, _, _, alpha, _, _) = s.lattice.parameters();
        assert!((a - 5.6402).abs() < 1e-9);
        assert!((alpha - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_label_fallback_and_defaults() {
        let text = "data_x\n_cell_length_a 4\n_cell_length_b 4\n_cell_length_c 4\nloop_\n_atom_site_label\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\nFe1 0 0 0\nO2 0.5 0.5 0.5\n";
        let s = parse_cif_content(text, "fallback").unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.sites[0].dominant_element(), "Fe");
        assert_eq!(s.sites[1].dominant_element(), "O");
        assert_eq!(s.sites[0].species[0].occupancy, 1.0);
        assert_eq!(s.sites[0].label.as_deref(), Some("Fe1"));
    }

    #[test]
    fn test_cartesian_sites() {
        let text = "data_c\n_cell_length_a 2\n_cell_length_b 2\n_cell_length_c 2\nloop_\n_atom_site_type_symbol\n_atom_site_Cartn_x\n_atom_site_Cartn_y\n_atom_site_Cartn_z\nC 1.0 1.0 1.0\n";
        let s = parse_cif_content(text, "c").unwrap();
        let p = s.sites[0].position;
        assert!((p[0] - 0.5).abs() < 1e-9 && (p[1] - 0.5).abs() < 1e-9 && (p[2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_cell_is_error() {
        let text = "data_x\nloop_\n_atom_site_label\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\nFe1 0 0 0\n";
        let err = parse_cif_content(text, "x").unwrap_err();
        assert!(err.to_string().contains("_cell_length_a"));
    }

    #[test]
    fn test_no_atom_sites_is_error() {
        let err = parse_cif_content("data_x\n_cell_length_a 3\n", "x").unwrap_err();
        assert!(err.to_string().contains("_atom_site"));
        assert!(parse_cif_content("", "x").is_err());
    }

    #[test]
    fn test_partial_loop_row_dropped() {
        let blocks = read_blocks("data_a\nloop_\n_a\n_b\n1 2 3\n");
        assert_eq!(blocks[0].loops[0].rows.len(), 1);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("5.6402(3)"), Some(5.6402));
        assert_eq!(parse_number("90"), Some(90.0));
        assert_eq!(parse_number("?"), None);
    }
}
