//! # 文本扫描后端（最后手段）
//!
//! 只用正则从文本中提取晶胞参数，然后生成占位结构：
//! 两个同元素位点，分别位于 (0,0,0) 和 (½,½,½)。
//! 元素取第一个 `_atom_site_type_symbol` 值，其次取 `_chemical_formula_sum`
//! 的第一个元素，都没有时用碳。
//!
//! 结果只保证能出图，不代表真实结构。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 注册
//! - 使用 `regex`

use super::{decode, ParseBackend};
use crate::error::BackendFailure;
use crate::models::elements::symbol_from_label;
use crate::models::{Lattice, Site, Structure};
use log::warn;
use regex::Regex;
use std::sync::OnceLock;

/// 无法识别元素时的占位元素
pub const PLACEHOLDER_ELEMENT: &str = "C";

fn cell_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*_cell_(length_a|length_b|length_c|angle_alpha|angle_beta|angle_gamma)\s+([-+0-9.eE]+)")
            .unwrap()
    })
}

fn formula_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*_chemical_formula_sum\s+['"]?\s*([A-Z][a-z]?)"#).unwrap()
    })
}

/// 提取 (a, b, c, alpha, beta, gamma)，缺少任一长度返回 None
pub fn scan_cell(text: &str) -> Option<[f64; 6]> {
    let mut values: [Option<f64>; 6] = [None, None, None, Some(90.0), Some(90.0), Some(90.0)];
    for caps in cell_regex().captures_iter(text) {
        let idx = match &caps[1] {
            "length_a" => 0,
            "length_b" => 1,
            "length_c" => 2,
            "angle_alpha" => 3,
            "angle_beta" => 4,
            _ => 5,
        };
        if let Ok(v) = caps[2].parse::<f64>() {
            values[idx] = Some(v);
        }
    }
    let mut out = [0.0; 6];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = value?;
    }
    Some(out)
}

/// 第一个 `_atom_site_type_symbol` 值
fn first_type_symbol(text: &str) -> Option<&'static str> {
    let mut headers: Vec<&str> = Vec::new();
    let mut in_loop = false;
    for line in text.lines().map(str::trim) {
        if line.eq_ignore_ascii_case("loop_") {
            in_loop = true;
            headers.clear();
            continue;
        }
        if !in_loop || line.is_empty() {
            continue;
        }
        if line.starts_with('_') {
            headers.push(line);
            continue;
        }
        let Some(col) = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case("_atom_site_type_symbol"))
        else {
            in_loop = false;
            continue;
        };
        return line.split_whitespace().nth(col).and_then(symbol_from_label);
    }
    None
}

/// 占位结构的元素
pub fn placeholder_element(text: &str) -> &'static str {
    first_type_symbol(text)
        .or_else(|| {
            formula_regex()
                .captures(text)
                .and_then(|caps| symbol_from_label(&caps[1]))
        })
        .unwrap_or(PLACEHOLDER_ELEMENT)
}

/// 正则扫描后端
#[derive(Debug, Default)]
pub struct TextScanBackend;

impl ParseBackend for TextScanBackend {
    fn name(&self) -> &str {
        "text-scan"
    }

    fn attempt(&self, content: &[u8], default_name: &str) -> Result<Structure, BackendFailure> {
        let text = decode(content);
        let [a, b, c, alpha, beta, gamma] = scan_cell(&text)
            .ok_or_else(|| BackendFailure::error(self.name(), "no _cell_length_a/b/c values found"))?;

        let element = placeholder_element(&text);
        warn!(
            "'{}': using placeholder structure ({} at origin and body centre)",
            default_name, element
        );

        let lattice = Lattice::from_parameters(a, b, c, alpha, beta, gamma);
        let sites = vec![
            Site::new(element, [0.0, 0.0, 0.0]),
            Site::new(element, [0.5, 0.5, 0.5]),
        ];
        let mut structure = Structure::new(default_name, lattice, sites);
        structure.source_format = Some("text-scan".to_string());
        Ok(structure)
    }
}
