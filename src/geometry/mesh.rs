//! # 网格构建
//!
//! 把结构和化学键转换为一个合并的 [`MeshModel`]：
//! - 每个位点一个 UV 球体，半径 = 参考半径 × 缩放因子，材质名为元素符号
//! - 每条键一个圆柱体，半径 = [`BOND_RADIUS`] × 缩放因子，共用材质 `bond`
//! - 跨晶胞边界的键画成两段半圆柱，各自从晶胞内的原子画到键的中点
//!
//! 所有坐标乘以缩放因子。缩放因子 ≤ 0 或位点为空时直接返回 `GeometryFailure`。
//!
//! ## 依赖关系
//! - 被 `pipeline/orchestrator.rs` 使用
//! - 使用 `geometry/primitives.rs`、`models/`

use super::primitives::{cylinder, uv_sphere, Primitive};
use crate::error::{CrystalError, Result};
use crate::models::elements::{reference_radius, standard_color, NEUTRAL_COLOR};
use crate::models::{Bond, Face, MeshModel, Structure};
use log::debug;
use nalgebra::Vector3;

/// 键圆柱半径（缩放前，Å）
pub const BOND_RADIUS: f64 = 0.1;
/// 键的材质 id
pub const BOND_MATERIAL: &str = "bond";

/// 网格生成参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshOptions {
    pub sphere_resolution: u32,
    pub bond_resolution: u32,
    pub include_bonds: bool,
    pub scale_factor: f64,
}

impl Default for MeshOptions {
    fn default() -> Self {
        MeshOptions {
            sphere_resolution: 20,
            bond_resolution: 8,
            include_bonds: true,
            scale_factor: 1.0,
        }
    }
}

/// 网格构建器
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshBuilder;

impl MeshBuilder {
    pub fn build(structure: &Structure, bonds: &[Bond], options: &MeshOptions) -> Result<MeshModel> {
        let scale = options.scale_factor;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(CrystalError::GeometryFailure(format!(
                "scale factor must be positive, got {}",
                scale
            )));
        }
        if structure.is_empty() {
            return Err(CrystalError::GeometryFailure(format!(
                "structure '{}' has zero atoms",
                structure.name
            )));
        }

        let positions: Vec<Vector3<f64>> = structure
            .cartesian_positions()
            .into_iter()
            .map(|p| p * scale)
            .collect();

        let mut mesh = MeshModel::new();

        for (site, center) in structure.sites.iter().zip(&positions) {
            let element = site.dominant_element();
            let material = mesh.ensure_material(element, element, standard_color(element));
            let sphere = uv_sphere(
                (*center).into(),
                reference_radius(element) * scale,
                options.sphere_resolution,
            );
            append(&mut mesh, sphere, material)?;
        }

        let mut drawn = 0usize;
        let mut skipped = 0usize;
        if options.include_bonds && !bonds.is_empty() {
            let material = mesh.ensure_material(BOND_MATERIAL, BOND_MATERIAL, NEUTRAL_COLOR);
            let lattice = structure.lattice.as_matrix().transpose();
            let radius = BOND_RADIUS * scale;

            for bond in bonds {
                let (Some(ci), Some(cj)) = (positions.get(bond.i), positions.get(bond.j)) else {
                    return Err(CrystalError::GeometryFailure(format!(
                        "bond ({}, {}) references a missing site",
                        bond.i, bond.j
                    )));
                };

                let segments: Vec<(Vector3<f64>, Vector3<f64>)> = if bond.is_periodic() {
                    let shift = lattice
                        * Vector3::new(
                            bond.image[0] as f64,
                            bond.image[1] as f64,
                            bond.image[2] as f64,
                        )
                        * scale;
                    let half = (cj + shift - ci) * 0.5;
                    vec![(*ci, ci + half), (*cj, cj - half)]
                } else {
                    vec![(*ci, *cj)]
                };

                for (start, end) in segments {
                    match cylinder(start.into(), end.into(), radius, options.bond_resolution) {
                        Some(c) => {
                            append(&mut mesh, c, material)?;
                            drawn += 1;
                        }
                        None => skipped += 1,
                    }
                }
            }
        }

        debug!(
            "mesh for '{}': {} sphere(s), {} bond segment(s) ({} zero-length skipped), {} vertices, {} faces",
            structure.name,
            structure.len(),
            drawn,
            skipped,
            mesh.vertex_count(),
            mesh.face_count()
        );

        Ok(mesh)
    }
}

/// 把图元追加到网格，面索引加上顶点偏移
fn append(mesh: &mut MeshModel, primitive: Primitive, material: usize) -> Result<()> {
    let base = mesh.push_vertices(primitive.vertices)?;
    mesh.faces.extend(primitive.faces.into_iter().map(|p| Face {
        polygon: p.offset(base),
        material,
    }));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::bonds::BondInferencer;
    use crate::models::{Lattice, Site};

    fn nacl_pair() -> Structure {
        Structure::new(
            "NaCl",
            Lattice::cubic(5.6),
            vec![Site::new("Na", [0.0, 0.0, 0.0]), Site::new("Cl", [0.5, 0.0, 0.0])],
        )
    }

    #[test]
    fn test_build_counts_and_materials() {
        let s = nacl_pair();
        let bonds = BondInferencer::compute(&s, 1.2);
        let options = MeshOptions {
            sphere_resolution: 4,
            bond_resolution: 6,
            ..Default::default()
        };
        let mesh = MeshBuilder::build(&s, &bonds, &options).unwrap();

        let sphere_vertices = 2 + 3 * 8;
        let bond_segments = bonds.iter().map(|b| if b.is_periodic() { 2 } else { 1 }).sum::<usize>();
        assert_eq!(mesh.vertex_count(), 2 * sphere_vertices + bond_segments * 12);
        assert!(mesh.check_integrity().is_ok());

        let names: Vec<&str> = mesh.materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Na", "Cl", "bond"]);
    }

    #[test]
    fn test_build_without_bonds() {
        let s = nacl_pair();
        let bonds = BondInferencer::compute(&s, 1.2);
        let options = MeshOptions {
            include_bonds: false,
            ..Default::default()
        };
        let mesh = MeshBuilder::build(&s, &bonds, &options).unwrap();
        assert!(mesh.material_index(BOND_MATERIAL).is_none());
        assert!(mesh.vertex_count() > 0 && mesh.face_count() > 0);
    }

    #[test]
    fn test_zero_scale_is_geometry_failure() {
        let s = nacl_pair();
        let options = MeshOptions {
            scale_factor: 0.0,
            ..Default::default()
        };
        let err = MeshBuilder::build(&s, &[], &options).unwrap_err();
        assert_eq!(err.category(), "GeometryFailure");

        let options = MeshOptions {
            scale_factor: -1.0,
            ..Default::default()
        };
        assert!(MeshBuilder::build(&s, &[], &options).is_err());
    }

    #[test]
    fn test_empty_structure_is_geometry_failure() {
        let s = Structure::new("empty", Lattice::cubic(3.0), vec![]);
        let err = MeshBuilder::build(&s, &[], &MeshOptions::default()).unwrap_err();
        assert!(matches!(err, CrystalError::GeometryFailure(_)));
    }

    #[test]
    fn test_scale_factor_scales_positions() {
        let s = Structure::new("H", Lattice::cubic(4.0), vec![Site::new("H", [0.5, 0.5, 0.5])]);
        let options = MeshOptions {
            scale_factor: 2.0,
            ..Default::default()
        };
        let mesh = MeshBuilder::build(&s, &[], &options).unwrap();
        let (min, max) = mesh.bounds().unwrap();
        let r = reference_radius("H") * 2.0;
        assert!((max[2] - (4.0 + r)).abs() < 1e-9);
        assert!((min[2] - (4.0 - r)).abs() < 1e-9);
    }

    #[test]
    fn test_periodic_bond_drawn_as_two_halves() {
        let s = Structure::new(
            "C2",
            Lattice::cubic(10.0),
            vec![Site::new("C", [0.05, 0.0, 0.0]), Site::new("C", [0.95, 0.0, 0.0])],
        );
        let bonds = BondInferencer::compute(&s, 1.2);
        let options = MeshOptions {
            sphere_resolution: 2,
            bond_resolution: 3,
            ..Default::default()
        };
        let mesh = MeshBuilder::build(&s, &bonds, &options).unwrap();
        let bond = mesh.material_index(BOND_MATERIAL).unwrap();
        assert_eq!(mesh.faces_with_material(bond).len(), 6);
        // 半段圆柱不会穿过晶胞内部
        let (min, max) = mesh.bounds().unwrap();
        assert!(min[0] > -0.6 && max[0] < 10.6);
    }

    #[test]
    fn test_zero_length_bond_skipped() {
        let s = Structure::new(
            "dup",
            Lattice::cubic(3.0),
            vec![Site::new("O", [0.0; 3]), Site::new("O", [0.0; 3])],
        );
        let bonds = vec![Bond {
            i: 0,
            j: 1,
            distance: 0.0,
            image: [0, 0, 0],
        }];
        let mesh = MeshBuilder::build(&s, &bonds, &MeshOptions::default()).unwrap();
        let bond = mesh.material_index(BOND_MATERIAL).unwrap();
        assert!(mesh.faces_with_material(bond).is_empty());
    }

    #[test]
    fn test_bond_with_missing_site_fails() {
        let s = nacl_pair();
        let bonds = vec![Bond {
            i: 0,
            j: 7,
            distance: 1.0,
            image: [0, 0, 0],
        }];
        assert!(MeshBuilder::build(&s, &bonds, &MeshOptions::default()).is_err());
    }
}
