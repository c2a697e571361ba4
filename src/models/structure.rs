//! # 晶体结构数据模型
//!
//! 定义统一的周期性晶体结构表示。结构由解析后端构建一次，之后只读。
//!
//! - `Lattice`: 3x3 晶格矩阵（行向量 a, b, c）
//! - `Site`: 位点，包含若干 (元素, 占有率) 和分数坐标
//! - `Structure`: 晶格 + 有序位点列表
//!
//! ## 依赖关系
//! - 被 `parsers/`、`geometry/` 使用
//! - 使用 `models/elements.rs` 计算密度

use super::elements;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// 阿伏伽德罗常数相关换算：u/Å³ -> g/cm³
const AMU_PER_A3_TO_G_PER_CM3: f64 = 1.660_539_066_60;

/// 晶格参数表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格参数 (a, b, c, alpha, beta, gamma) 创建晶格
    /// 角度单位：度
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let cos_alpha = alpha.to_radians().cos();
        let cos_beta = beta.to_radians().cos();
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();

        let a_vec = [a, 0.0, 0.0];
        let b_vec = [b * cos_gamma, b * sin_gamma, 0.0];

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        // 不合法的角度组合会得到 NaN，由 Structure::validate 拒绝
        let c3 = (c * c - c1 * c1 - c2 * c2).sqrt();

        Lattice {
            matrix: [a_vec, b_vec, [c1, c2, c3]],
        }
    }

    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 立方晶格
    pub fn cubic(a: f64) -> Self {
        Self::from_vectors([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
    }

    /// nalgebra 矩阵形式（行向量为晶格向量）
    pub fn as_matrix(&self) -> Matrix3<f64> {
        let m = self.matrix;
        Matrix3::new(
            m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
        )
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [a_vec, b_vec, c_vec] = self.vectors();

        let a = a_vec.norm();
        let b = b_vec.norm();
        let c = c_vec.norm();

        let alpha = (b_vec.dot(&c_vec) / (b * c)).acos().to_degrees();
        let beta = (a_vec.dot(&c_vec) / (a * c)).acos().to_degrees();
        let gamma = (a_vec.dot(&b_vec) / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 三个晶格向量
    pub fn vectors(&self) -> [Vector3<f64>; 3] {
        [
            Vector3::from(self.matrix[0]),
            Vector3::from(self.matrix[1]),
            Vector3::from(self.matrix[2]),
        ]
    }

    /// 计算晶格体积（带符号，右手系为正）
    pub fn volume(&self) -> f64 {
        self.as_matrix().determinant()
    }

    /// 分数坐标转笛卡尔坐标
    pub fn to_cartesian(&self, frac: [f64; 3]) -> Vector3<f64> {
        self.as_matrix().transpose() * Vector3::from(frac)
    }

    /// 笛卡尔坐标转分数坐标，奇异矩阵返回 None
    pub fn to_fractional(&self, cart: [f64; 3]) -> Option<[f64; 3]> {
        let inv = self.as_matrix().transpose().try_inverse()?;
        let f = inv * Vector3::from(cart);
        Some([f.x, f.y, f.z])
    }
}

/// 位点上的一个物种
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    /// 元素符号
    pub element: String,
    /// 占有率
    pub occupancy: f64,
}

/// 晶体位点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// 该位点上的物种（至少一个）
    pub species: Vec<Species>,

    /// 分数坐标 [x, y, z]，不要求在 [0, 1) 内
    pub position: [f64; 3],

    /// 可选：原子标签（用于区分同种元素的不同位置）
    pub label: Option<String>,
}

impl Site {
    /// 完全占据的单元素位点
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Self::with_occupancy(element, 1.0, position)
    }

    pub fn with_occupancy(element: impl Into<String>, occupancy: f64, position: [f64; 3]) -> Self {
        Site {
            species: vec![Species {
                element: element.into(),
                occupancy,
            }],
            position,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// 向位点追加一个物种（无序/混合占位）
    pub fn add_species(&mut self, element: impl Into<String>, occupancy: f64) {
        let element = element.into();
        if let Some(existing) = self.species.iter_mut().find(|s| s.element == element) {
            existing.occupancy += occupancy;
        } else {
            self.species.push(Species { element, occupancy });
        }
    }

    /// 占有率之和
    pub fn total_occupancy(&self) -> f64 {
        self.species.iter().map(|s| s.occupancy).sum()
    }

    /// 占有率最大的元素（并列时取先出现者）
    pub fn dominant_element(&self) -> &str {
        let mut best: Option<&Species> = None;
        for s in &self.species {
            match best {
                Some(b) if s.occupancy <= b.occupancy => {}
                _ => best = Some(s),
            }
        }
        best.map(|s| s.element.as_str()).unwrap_or("X")
    }
}

/// 晶体结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// 结构名称
    pub name: String,

    /// 晶格
    pub lattice: Lattice,

    /// 位点列表
    pub sites: Vec<Site>,

    /// 空间群
    pub space_group: Option<String>,

    /// 来源格式
    pub source_format: Option<String>,
}

impl Structure {
    pub fn new(name: impl Into<String>, lattice: Lattice, sites: Vec<Site>) -> Self {
        Structure {
            name: name.into(),
            lattice,
            sites,
            space_group: None,
            source_format: None,
        }
    }

    /// 位点数量
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// 晶胞体积 (Å³)
    pub fn volume(&self) -> f64 {
        self.lattice.volume().abs()
    }

    /// 所有位点的笛卡尔坐标
    pub fn cartesian_positions(&self) -> Vec<Vector3<f64>> {
        self.sites
            .iter()
            .map(|s| self.lattice.to_cartesian(s.position))
            .collect()
    }

    /// 密度 (g/cm³)，按占有率加权
    pub fn density(&self) -> f64 {
        let volume = self.volume();
        if volume <= 0.0 {
            return 0.0;
        }
        let mass: f64 = self
            .sites
            .iter()
            .flat_map(|s| s.species.iter())
            .map(|sp| sp.occupancy * elements::atomic_mass(&sp.element))
            .sum();
        mass * AMU_PER_A3_TO_G_PER_CM3 / volume
    }

    /// 计算化学式（元素按字母序，计数按占有率累加后取整）
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, f64> = BTreeMap::new();

        for sp in self.sites.iter().flat_map(|s| s.species.iter()) {
            *counts.entry(sp.element.as_str()).or_insert(0.0) += sp.occupancy;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                let n = count.round() as i64;
                if n <= 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, n)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 检查结构是否可用：至少一个位点、晶格非退化、坐标有限、占有率为正
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.sites.is_empty() {
            return Err("structure has zero sites".to_string());
        }
        let volume = self.lattice.volume();
        if !volume.is_finite() || volume.abs() < 1e-6 {
            return Err(format!("degenerate lattice (volume = {})", volume));
        }
        for (i, site) in self.sites.iter().enumerate() {
            if site.position.iter().any(|v| !v.is_finite()) {
                return Err(format!("site {} has non-finite coordinates", i));
            }
            if site.species.is_empty() {
                return Err(format!("site {} has no species", i));
            }
            let occ = site.total_occupancy();
            if !occ.is_finite() || occ <= 0.0 {
                return Err(format!("site {} has non-positive occupancy {}", i, occ));
            }
        }
        Ok(())
    }
}
