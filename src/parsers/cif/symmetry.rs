//! # 对称操作
//!
//! 解析 `x, y+1/2, -z` 形式的对称操作，并用其将不对称单元展开为完整晶胞。
//!
//! 展开规则：
//! - 生成的坐标折回 [0, 1)
//! - 同一记录生成的等价位置按周期距离去重（容差 [`DEDUP_TOLERANCE`]）
//! - 不同记录落在同一位置时合并为一个多物种位点（部分占位）
//!
//! ## 依赖关系
//! - 被 `parsers/cif/reader.rs` 使用
//! - 使用 `models/structure.rs`

use crate::models::Site;

/// 分数坐标去重容差
pub const DEDUP_TOLERANCE: f64 = 1e-3;

/// 对称操作：x' = R·x + t
#[derive(Debug, Clone, PartialEq)]
pub struct SymOp {
    pub rotation: [[f64; 3]; 3],
    pub translation: [f64; 3],
}

impl SymOp {
    pub fn identity() -> Self {
        SymOp {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [0.0; 3],
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// 解析 "x, y+1/2, -z"（可带引号）
    pub fn parse(text: &str) -> Result<Self, String> {
        let cleaned: String = text
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        let components: Vec<&str> = cleaned.split(',').collect();
        if components.len() != 3 {
            return Err(format!("expected 3 components in '{}'", text.trim()));
        }

        let mut op = SymOp {
            rotation: [[0.0; 3]; 3],
            translation: [0.0; 3],
        };
        for (row, component) in components.iter().enumerate() {
            let (coeffs, shift) = parse_component(component)
                .map_err(|e| format!("{} in '{}'", e, text.trim()))?;
            op.rotation[row] = coeffs;
            op.translation[row] = shift;
        }
        Ok(op)
    }

    pub fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        let mut out = [0.0; 3];
        for (i, row) in self.rotation.iter().enumerate() {
            out[i] = row[0] * p[0] + row[1] * p[1] + row[2] * p[2] + self.translation[i];
        }
        out
    }
}

/// 解析单个分量，返回 (x/y/z 系数, 常数平移)
fn parse_component(component: &str) -> Result<([f64; 3], f64), String> {
    if component.is_empty() {
        return Err("empty component".to_string());
    }

    // 在 +/- 处切分为带符号的项
    let mut terms: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in component.chars() {
        if (c == '+' || c == '-') && !current.is_empty() {
            terms.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        terms.push(current);
    }

    let mut coeffs = [0.0; 3];
    let mut shift = 0.0;

    for term in terms {
        let (sign, body) = match term.strip_prefix('-') {
            Some(rest) => (-1.0, rest),
            None => (1.0, term.trim_start_matches('+')),
        };
        if body.is_empty() {
            return Err(format!("dangling sign in '{}'", component));
        }

        let axis = match body.chars().last() {
            Some('x') => Some(0),
            Some('y') => Some(1),
            Some('z') => Some(2),
            _ => None,
        };

        match axis {
            Some(axis) => {
                let factor = body[..body.len() - 1].trim_end_matches('*');
                let factor = if factor.is_empty() {
                    1.0
                } else {
                    parse_fraction(factor)?
                };
                coeffs[axis] += sign * factor;
            }
            None => shift += sign * parse_fraction(body)?,
        }
    }

    Ok((coeffs, shift))
}

/// "1/2" 或 "0.5"
fn parse_fraction(s: &str) -> Result<f64, String> {
    match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().map_err(|_| format!("bad number '{}'", s))?;
            let den: f64 = den.parse().map_err(|_| format!("bad number '{}'", s))?;
            if den == 0.0 {
                return Err(format!("zero denominator in '{}'", s));
            }
            Ok(num / den)
        }
        None => s.parse().map_err(|_| format!("bad number '{}'", s)),
    }
}

/// 不对称单元中的一条原子记录
#[derive(Debug, Clone)]
pub struct AsymmetricSite {
    pub element: String,
    pub occupancy: f64,
    pub position: [f64; 3],
    pub label: Option<String>,
}

fn wrap(p: [f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for k in 0..3 {
        let mut v = p[k].rem_euclid(1.0);
        // 1 - 1e-12 这类值折到 0
        if (1.0 - v).abs() < 1e-9 {
            v = 0.0;
        }
        out[k] = v;
    }
    out
}

/// 周期边界下两个分数坐标是否重合
fn same_position(a: [f64; 3], b: [f64; 3], tol: f64) -> bool {
    (0..3).all(|k| {
        let d = a[k] - b[k];
        (d - d.round()).abs() < tol
    })
}

/// 用对称操作展开不对称单元
///
/// 只有恒等操作时保留原始坐标（不折回）。
pub fn expand(records: &[AsymmetricSite], ops: &[SymOp]) -> Vec<Site> {
    let identity_only = ops.is_empty() || ops.iter().all(SymOp::is_identity);

    let mut sites: Vec<Site> = Vec::new();
    // 每个位点由哪些记录贡献
    let mut contributors: Vec<Vec<usize>> = Vec::new();

    for (record_idx, record) in records.iter().enumerate() {
        let images: Vec<[f64; 3]> = if identity_only {
            vec![record.position]
        } else {
            ops.iter().map(|op| wrap(op.apply(record.position))).collect()
        };

        for pos in images {
            let existing = sites
                .iter()
                .position(|s| same_position(s.position, pos, DEDUP_TOLERANCE));

            match existing {
                Some(idx) if contributors[idx].contains(&record_idx) => {}
                Some(idx) => {
                    sites[idx].add_species(record.element.clone(), record.occupancy);
                    contributors[idx].push(record_idx);
                }
                None => {
                    let mut site =
                        Site::with_occupancy(record.element.clone(), record.occupancy, pos);
                    if let Some(label) = &record.label {
                        site = site.with_label(label.clone());
                    }
                    sites.push(site);
                    contributors.push(vec![record_idx]);
                }
            }
        }
    }

    sites
}
