//! # 材质标准化
//!
//! 不同打包后端对材质的命名和配色不一致（"atom_Na"、"Na"、"x909090"），
//! 这里把它们统一为 `<元素>_MAT` 和标准 CPK 颜色。
//!
//! 元素推断按三级回退：
//! 1. 名称匹配：去掉 `atom_` 前缀和 `_MAT` 后缀后匹配 `^([A-Z][a-z]?)\d*[+-]*$`
//! 2. 颜色匹配：与标准颜色表的欧氏距离最近且小于 [`COLOR_TOLERANCE`]
//! 3. 十六进制名称：`x909090` / `909090` 解码为 RGB 后再走第 2 级
//!
//! 结构材质 `bond` 统一为 [`BOND_MAT`]。无法识别的材质保留名称、改为中性灰，
//! 并记录 `unresolved material` 警告。标准化后同名的材质会合并，面的材质下标随之重映射。
//!
//! 再次标准化不会产生任何变化：标准名称在第 1 级即命中，中性灰不匹配任何元素。
//!
//! ## 依赖关系
//! - 被 `pipeline/orchestrator.rs`、`commands/standardize.rs` 使用
//! - 使用 `models/elements.rs`、`models/mesh.rs`

use crate::models::elements::{lookup, Rgb, ELEMENTS, NEUTRAL_COLOR};
use crate::models::{Material, MeshModel};
use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// 颜色匹配容差（RGB 欧氏距离）
pub const COLOR_TOLERANCE: f64 = 0.05;
/// 化学键的标准材质名
pub const BOND_MAT: &str = "Bond_MAT";
/// 化学键颜色
pub const BOND_COLOR: Rgb = NEUTRAL_COLOR;

fn element_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z][a-z]?)\d*[+-]*$").unwrap())
}

fn hex_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^x?([0-9A-Fa-f]{6})$").unwrap())
}

/// 元素的标准材质名
pub fn canonical_name(element: &str) -> String {
    format!("{}_MAT", element)
}

/// 材质是如何被识别的
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Name,
    Color,
    HexName,
    Bond,
    Unresolved,
}

/// 单个材质的映射记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialMapping {
    pub original: String,
    pub canonical: String,
    pub element: Option<String>,
    pub resolution: Resolution,
}

/// 标准化报告
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StandardizationReport {
    pub mappings: Vec<MaterialMapping>,
    /// 合并后的材质数量
    pub material_count: usize,
}

impl StandardizationReport {
    pub fn unresolved(&self) -> Vec<&str> {
        self.mappings
            .iter()
            .filter(|m| m.resolution == Resolution::Unresolved)
            .map(|m| m.original.as_str())
            .collect()
    }

    pub fn resolved_count(&self) -> usize {
        self.mappings.len() - self.unresolved().len()
    }
}

/// 第 1 级：名称匹配
pub fn element_from_name(name: &str) -> Option<&'static str> {
    let stripped = strip_affixes(name);
    let caps = element_name_regex().captures(stripped)?;
    lookup(&caps[1]).map(|e| e.symbol)
}

/// 第 2 级：最近颜色；距离相同时取元素表中靠前的
pub fn element_from_color(color: Rgb) -> Option<&'static str> {
    let mut best: Option<(f64, &'static str)> = None;
    for e in ELEMENTS {
        let d = color_distance(color, e.color);
        if d < COLOR_TOLERANCE && best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, e.symbol));
        }
    }
    best.map(|(_, s)| s)
}

/// 第 3 级：十六进制名称解码
pub fn color_from_hex_name(name: &str) -> Option<Rgb> {
    let caps = hex_name_regex().captures(name)?;
    let hex = &caps[1];
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok().map(|v| v as f64 / 255.0);
    Some([channel(0)?, channel(2)?, channel(4)?])
}

fn color_distance(a: Rgb, b: Rgb) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn strip_affixes(name: &str) -> &str {
    let name = name.strip_prefix("atom_").unwrap_or(name);
    name.strip_suffix("_MAT").unwrap_or(name)
}

fn is_bond_name(name: &str) -> bool {
    let stripped = strip_affixes(name);
    stripped.eq_ignore_ascii_case("bond") || stripped.eq_ignore_ascii_case("bonds")
}

/// 材质标准化器
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialStandardizer {
    /// 保留原始颜色，只改名
    pub preserve_original_colors: bool,
}

impl MaterialStandardizer {
    pub fn new(preserve_original_colors: bool) -> Self {
        MaterialStandardizer {
            preserve_original_colors,
        }
    }

    /// 标准化网格材质
    pub fn standardize(&self, mesh: &MeshModel) -> MeshModel {
        self.standardize_with_report(mesh).0
    }

    /// 识别单个材质，返回 (新材质, 映射记录)
    fn resolve(&self, material: &Material) -> (Material, MaterialMapping) {
        let keep_or = |canonical: Rgb| {
            if self.preserve_original_colors {
                material.color
            } else {
                canonical
            }
        };

        let (name, display, color, element, resolution) = if is_bond_name(&material.name) {
            (BOND_MAT.to_string(), "Bond".to_string(), keep_or(BOND_COLOR), None, Resolution::Bond)
        } else if let Some(el) = element_from_name(&material.name) {
            (canonical_name(el), el.to_string(), keep_or(standard(el)), Some(el), Resolution::Name)
        } else if let Some(el) = element_from_color(material.color) {
            (canonical_name(el), el.to_string(), keep_or(standard(el)), Some(el), Resolution::Color)
        } else if let Some(el) = color_from_hex_name(&material.name).and_then(element_from_color) {
            (canonical_name(el), el.to_string(), keep_or(standard(el)), Some(el), Resolution::HexName)
        } else {
            warn!(
                "unresolved material '{}' (color {:.3} {:.3} {:.3}), using neutral default",
                material.name, material.color[0], material.color[1], material.color[2]
            );
            (
                material.name.clone(),
                material.display_name.clone(),
                keep_or(NEUTRAL_COLOR),
                None,
                Resolution::Unresolved,
            )
        };

        let mapping = MaterialMapping {
            original: material.name.clone(),
            canonical: name.clone(),
            element: element.map(str::to_string),
            resolution,
        };
        (
            Material {
                name,
                display_name: display,
                color,
            },
            mapping,
        )
    }

    /// 标准化并返回映射报告
    pub fn standardize_with_report(&self, mesh: &MeshModel) -> (MeshModel, StandardizationReport) {
        let mut materials: Vec<Material> = Vec::new();
        let mut index_of: HashMap<String, usize> = HashMap::new();
        let mut remap: Vec<usize> = Vec::with_capacity(mesh.materials.len());
        let mut report = StandardizationReport::default();

        for material in &mesh.materials {
            let (resolved, mapping) = self.resolve(material);
            debug!(
                "material '{}' -> '{}' ({:?})",
                mapping.original, mapping.canonical, mapping.resolution
            );
            report.mappings.push(mapping);

            let idx = match index_of.get(&resolved.name) {
                // 合并：保留第一个出现的颜色
                Some(&idx) => idx,
                None => {
                    materials.push(resolved);
                    let idx = materials.len() - 1;
                    index_of.insert(materials[idx].name.clone(), idx);
                    idx
                }
            };
            remap.push(idx);
        }

        let faces = mesh
            .faces
            .iter()
            .map(|f| {
                let mut face = *f;
                face.material = remap.get(f.material).copied().unwrap_or(f.material);
                face
            })
            .collect();

        report.material_count = materials.len();
        (
            MeshModel {
                vertices: mesh.vertices.clone(),
                faces,
                materials,
            },
            report,
        )
    }
}

fn standard(element: &str) -> Rgb {
    crate::models::elements::standard_color(element)
}
