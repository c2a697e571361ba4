//! # 化学键推断
//!
//! 两个位点之间的距离不超过 `(r_i + r_j) * cutoff_factor` 时成键，
//! r 为主元素的共价半径（缺失时用默认值）。
//!
//! 周期边界：对每对 (i, j) 取最小镜像，即在 {-1, 0, 1}³ 的晶格平移中
//! 选择最短的一个 j 的镜像。每个无序对最多产生一条键，且总有 i < j。
//!
//! ## 依赖关系
//! - 被 `pipeline/orchestrator.rs` 使用
//! - 使用 `models/structure.rs`、`models/elements.rs`

use crate::models::elements::covalent_radius;
use crate::models::{Bond, Structure};
use log::debug;
use nalgebra::Vector3;

/// 默认截断系数
pub const DEFAULT_CUTOFF_FACTOR: f64 = 1.2;

const TIE_TOLERANCE: f64 = 1e-9;

/// 化学键推断器
#[derive(Debug, Clone, Copy, Default)]
pub struct BondInferencer;

impl BondInferencer {
    /// O(n²) 枚举所有位点对
    pub fn compute(structure: &Structure, cutoff_factor: f64) -> Vec<Bond> {
        let n = structure.len();
        let lattice = structure.lattice.as_matrix().transpose();
        let radii: Vec<f64> = structure
            .sites
            .iter()
            .map(|s| covalent_radius(s.dominant_element()))
            .collect();

        let mut bonds = Vec::new();
        for i in 0..n {
            let fi = Vector3::from(structure.sites[i].position);
            for j in (i + 1)..n {
                let fj = Vector3::from(structure.sites[j].position);
                let threshold = (radii[i] + radii[j]) * cutoff_factor;

                // 先把分数坐标差折到 [-0.5, 0.5]，再搜索相邻平移
                let raw = fj - fi;
                let base = raw.map(|v| -v.round());
                let reduced = raw + base;

                let mut best: Option<(f64, [i32; 3])> = None;
                for sx in -1..=1 {
                    for sy in -1..=1 {
                        for sz in -1..=1 {
                            let shift = Vector3::new(sx as f64, sy as f64, sz as f64);
                            let d = (lattice * (reduced + shift)).norm();
                            let total = base + shift;
                            let image = [total.x as i32, total.y as i32, total.z as i32];
                            if is_better(d, image, best) {
                                best = Some((d, image));
                            }
                        }
                    }
                }

                if let Some((distance, image)) = best {
                    if distance <= threshold {
                        bonds.push(Bond {
                            i,
                            j,
                            distance,
                            image,
                        });
                    }
                }
            }
        }

        debug!(
            "bond inference: {} site(s), cutoff factor {}, {} bond(s)",
            n,
            cutoff_factor,
            bonds.len()
        );
        bonds
    }
}

/// 距离相同（1e-9 内）时优先平移量小的镜像，晶胞内的键不会被画成跨边界
fn is_better(d: f64, image: [i32; 3], best: Option<(f64, [i32; 3])>) -> bool {
    let Some((bd, bi)) = best else {
        return true;
    };
    let weight = |img: [i32; 3]| img.iter().map(|v| v.abs()).sum::<i32>();
    d < bd - TIE_TOLERANCE || ((d - bd).abs() <= TIE_TOLERANCE && weight(image) < weight(bi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Lattice, Site};

    fn rock_salt(a: f64) -> Structure {
        let na = [[0.0, 0.0, 0.0], [0.0, 0.5, 0.5], [0.5, 0.0, 0.5], [0.5, 0.5, 0.0]];
        let cl = [[0.5, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 0.5], [0.5, 0.5, 0.5]];
        let mut sites: Vec<Site> = na.iter().map(|p| Site::new("Na", *p)).collect();
        sites.extend(cl.iter().map(|p| Site::new("Cl", *p)));
        Structure::new("NaCl", Lattice::cubic(a), sites)
    }

    #[test]
    fn test_rock_salt_only_cation_anion_bonds() {
        let s = rock_salt(5.6);
        let bonds = BondInferencer::compute(&s, 1.2);
        assert!(!bonds.is_empty());
        for b in &bonds {
            let ei = s.sites[b.i].dominant_element();
            let ej = s.sites[b.j].dominant_element();
            assert_ne!(ei, ej, "same-element bond {}-{}", b.i, b.j);
            assert!((b.distance - 2.8).abs() < 1e-9);
        }
        // 每个 Na 在晶胞内有 3 个最近邻 Cl（按最小镜像计）
        assert_eq!(bonds.len(), 12);
    }

    #[test]
    fn test_bonds_respect_cutoff_and_are_unique() {
        let s = rock_salt(5.6);
        let factor = 1.2;
        let bonds = BondInferencer::compute(&s, factor);
        let mut seen = std::collections::HashSet::new();
        for b in &bonds {
            assert!(b.i < b.j);
            assert!(seen.insert((b.i, b.j)));
            let limit = (covalent_radius(s.sites[b.i].dominant_element())
                + covalent_radius(s.sites[b.j].dominant_element()))
                * factor;
            assert!(b.distance <= limit);
        }
    }

    #[test]
    fn test_periodic_image_is_recorded() {
        // 两个原子隔着晶胞边界相距 1.0 Å
        let s = Structure::new(
            "C2",
            Lattice::cubic(10.0),
            vec![Site::new("C", [0.05, 0.0, 0.0]), Site::new("C", [0.95, 0.0, 0.0])],
        );
        let bonds = BondInferencer::compute(&s, 1.2);
        assert_eq!(bonds.len(), 1);
        assert_eq!(bonds[0].image, [-1, 0, 0]);
        assert!((bonds[0].distance - 1.0).abs() < 1e-9);
        assert!(bonds[0].is_periodic());
    }

    #[test]
    fn test_equidistant_images_prefer_in_cell() {
        let s = Structure::new(
            "NaCl",
            Lattice::cubic(5.6),
            vec![Site::new("Na", [0.0, 0.0, 0.0]), Site::new("Cl", [0.5, 0.0, 0.0])],
        );
        let bonds = BondInferencer::compute(&s, 1.2);
        assert_eq!(bonds.len(), 1);
        assert_eq!(bonds[0].image, [0, 0, 0]);
    }

    #[test]
    fn test_unknown_element_uses_default_radius() {
        let s = Structure::new(
            "X",
            Lattice::cubic(20.0),
            vec![Site::new("Xx", [0.0, 0.0, 0.0]), Site::new("Xx", [0.15, 0.0, 0.0])],
        );
        // 3.0 Å <= (1.5 + 1.5) * 1.2
        assert_eq!(BondInferencer::compute(&s, 1.2).len(), 1);
        assert!(BondInferencer::compute(&s, 0.9).is_empty());
    }

    #[test]
    fn test_empty_and_single_site() {
        let empty = Structure::new("e", Lattice::cubic(3.0), vec![]);
        assert!(BondInferencer::compute(&empty, 1.2).is_empty());
        let one = Structure::new("o", Lattice::cubic(1.0), vec![Site::new("H", [0.0; 3])]);
        assert!(BondInferencer::compute(&one, 1.2).is_empty());
    }
}
