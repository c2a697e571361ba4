//! # VASP POSCAR 格式解析器
//!
//! 解析 VASP POSCAR/CONTCAR 文件格式。
//!
//! ## POSCAR 格式说明
//! ```text
//! Comment line (structure name)
//! 1.0                    # scaling factor
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+)
//! n1 n2 ...              # number of atoms per element
//! Selective dynamics     # optional
//! Direct/Cartesian       # coordinate type
//! x1 y1 z1               # atom positions
//! ...
//! ```
//!
//! VASP 4 文件没有元素行，此时尝试从注释行读取元素符号。
//!
//! ## 依赖关系
//! - 被 `parsers/multi.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{CrystalError, Result};
use crate::models::elements::normalize_symbol;
use crate::models::{Lattice, Site, Structure};

fn format_error(name: &str, reason: impl Into<String>) -> CrystalError {
    CrystalError::ParseError {
        format: "poscar".to_string(),
        path: name.to_string(),
        reason: reason.into(),
    }
}

/// 粗略判断内容是否像 POSCAR（第 2 行为单个数字，第 3-5 行各三个数字）
pub fn looks_like_poscar(content: &str) -> bool {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 8 {
        return false;
    }
    let scale_ok = lines[1].split_whitespace().count() == 1 && lines[1].trim().parse::<f64>().is_ok();
    let lattice_ok = lines[2..5].iter().all(|l| {
        let nums: Vec<f64> = l.split_whitespace().filter_map(|s| s.parse().ok()).collect();
        nums.len() >= 3
    });
    scale_ok && lattice_ok
}

/// 从字符串内容解析 POSCAR 格式
pub fn parse_poscar_content(content: &str, default_name: &str) -> Result<Structure> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.len() < 8 {
        return Err(format_error(default_name, "File too short"));
    }

    // Line 0: Comment/name
    let comment = lines[0].trim();
    let name = if comment.is_empty() {
        default_name.to_string()
    } else {
        comment.to_string()
    };

    // Line 1: Scaling factor（负值表示目标体积）
    let scale: f64 = lines[1]
        .trim()
        .parse()
        .map_err(|_| format_error(&name, "Invalid scaling factor"))?;

    // Lines 2-4: Lattice vectors
    let mut matrix = [[0.0; 3]; 3];
    for i in 0..3 {
        let parts: Vec<f64> = lines[2 + i]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if parts.len() < 3 {
            return Err(format_error(&name, format!("Invalid lattice vector at line {}", 3 + i)));
        }
        matrix[i] = [parts[0], parts[1], parts[2]];
    }
    let factor = if scale < 0.0 {
        let raw_volume = Lattice::from_vectors(matrix).volume().abs();
        if raw_volume < 1e-12 {
            return Err(format_error(&name, "Degenerate lattice"));
        }
        (-scale / raw_volume).cbrt()
    } else {
        scale
    };
    for row in matrix.iter_mut() {
        for v in row.iter_mut() {
            *v *= factor;
        }
    }
    let lattice = Lattice::from_vectors(matrix);

    // Line 5: Element symbols (VASP 5+) or atom counts (VASP 4)
    let line5_parts: Vec<&str> = lines[5].split_whitespace().collect();
    let first = line5_parts
        .first()
        .ok_or_else(|| format_error(&name, "Missing element/count line"))?;
    let (elements, counts, atom_line_start) = if first.parse::<usize>().is_ok() {
        let counts: Vec<usize> = line5_parts.iter().filter_map(|s| s.parse().ok()).collect();
        let elements: Vec<String> = comment
            .split_whitespace()
            .filter_map(normalize_symbol)
            .map(str::to_string)
            .collect();
        if elements.len() != counts.len() {
            return Err(format_error(
                &name,
                "VASP 4 file without element symbols on the comment line",
            ));
        }
        (elements, counts, 6)
    } else {
        let elements: Vec<String> = line5_parts
            .iter()
            .map(|s| {
                // "Fe_pv" / "Fe/abc123" 这类 POTCAR 标记
                let base = s.split(['_', '/']).next().unwrap_or(s);
                normalize_symbol(base).map(str::to_string).unwrap_or_else(|| base.to_string())
            })
            .collect();
        let counts: Vec<usize> = lines[6]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        (elements, counts, 7)
    };

    if counts.len() != elements.len() {
        return Err(format_error(&name, "Element and count lines disagree"));
    }

    // Check for "Selective dynamics" line
    let mut coord_line = atom_line_start;
    if lines.len() > coord_line && lines[coord_line].trim().to_lowercase().starts_with('s') {
        coord_line += 1;
    }

    if lines.len() <= coord_line {
        return Err(format_error(&name, "Missing coordinate type line"));
    }

    let coord_type = lines[coord_line].trim().to_lowercase();
    let is_cartesian = coord_type.starts_with('c') || coord_type.starts_with('k');

    let mut sites: Vec<Site> = Vec::new();
    let mut line_idx = coord_line + 1;

    for (elem, &count) in elements.iter().zip(counts.iter()) {
        for _ in 0..count {
            let line = lines
                .get(line_idx)
                .ok_or_else(|| format_error(&name, "Fewer positions than declared atoms"))?;
            let parts: Vec<f64> = line
                .split_whitespace()
                .take(3)
                .filter_map(|s| s.parse().ok())
                .collect();
            if parts.len() < 3 {
                return Err(format_error(&name, format!("Invalid position at line {}", line_idx + 1)));
            }

            let position = if is_cartesian {
                let cart = [parts[0] * factor, parts[1] * factor, parts[2] * factor];
                lattice
                    .to_fractional(cart)
                    .ok_or_else(|| format_error(&name, "Singular lattice"))?
            } else {
                [parts[0], parts[1], parts[2]]
            };
            sites.push(Site::new(elem.clone(), position));
            line_idx += 1;
        }
    }

    let mut structure = Structure::new(name, lattice, sites);
    structure.source_format = Some("poscar".to_string());

    Ok(structure)
}
