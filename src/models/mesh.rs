//! # 网格数据模型
//!
//! 原子球体与化学键圆柱体合并后的三角/四边形网格，以及材质表。
//! 每个面只引用一个材质（材质表下标）。
//!
//! ## 依赖关系
//! - 被 `geometry/mesh.rs` 构建
//! - 被 `materials/` 原地修改
//! - 被 `packaging/` 消费

use super::elements::Rgb;
use crate::error::{CrystalError, Result};
use serde::{Deserialize, Serialize};

/// 面的顶点索引（0 起始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polygon {
    Tri([u32; 3]),
    Quad([u32; 4]),
}

impl Polygon {
    pub fn indices(&self) -> &[u32] {
        match self {
            Polygon::Tri(v) => v,
            Polygon::Quad(v) => v,
        }
    }

    /// 所有索引加上偏移
    pub fn offset(self, base: u32) -> Polygon {
        match self {
            Polygon::Tri(v) => Polygon::Tri(v.map(|i| i + base)),
            Polygon::Quad(v) => Polygon::Quad(v.map(|i| i + base)),
        }
    }
}

/// 网格面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub polygon: Polygon,
    /// 材质表下标
    pub material: usize,
}

/// 材质表条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// 材质 id（如 "Na"、"bond"、标准化后的 "Na_MAT"）
    pub name: String,
    /// 显示名称
    pub display_name: String,
    /// 漫反射颜色
    pub color: Rgb,
}

/// 网格模型
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshModel {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Face>,
    pub materials: Vec<Material>,
}

impl MeshModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// 三角形数量（四边形计为两个）
    pub fn triangle_count(&self) -> usize {
        self.faces
            .iter()
            .map(|f| match f.polygon {
                Polygon::Tri(_) => 1,
                Polygon::Quad(_) => 2,
            })
            .sum()
    }

    /// 按名称查找材质下标
    pub fn material_index(&self, name: &str) -> Option<usize> {
        self.materials.iter().position(|m| m.name == name)
    }

    /// 查找或新建材质，返回下标
    pub fn ensure_material(&mut self, name: &str, display_name: &str, color: Rgb) -> usize {
        if let Some(idx) = self.material_index(name) {
            return idx;
        }
        self.materials.push(Material {
            name: name.to_string(),
            display_name: display_name.to_string(),
            color,
        });
        self.materials.len() - 1
    }

    /// 追加一组顶点，返回第一个顶点的全局下标
    ///
    /// 面索引是 `u32`，顶点总数超出其范围时撤销追加并返回 `GeometryFailure`。
    pub fn push_vertices(&mut self, vertices: impl IntoIterator<Item = [f64; 3]>) -> Result<u32> {
        let start = self.vertices.len();
        self.vertices.extend(vertices);
        match (u32::try_from(start), u32::try_from(self.vertices.len())) {
            (Ok(base), Ok(_)) => Ok(base),
            _ => {
                let total = self.vertices.len();
                self.vertices.truncate(start);
                Err(CrystalError::GeometryFailure(format!(
                    "mesh needs {} vertices, more than 32-bit face indices can address",
                    total
                )))
            }
        }
    }

    /// 使用某个材质的面下标（按出现顺序）
    pub fn faces_with_material(&self, material: usize) -> Vec<usize> {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.material == material)
            .map(|(i, _)| i)
            .collect()
    }

    /// 所有顶点的轴对齐包围盒 (min, max)
    pub fn bounds(&self) -> Option<([f64; 3], [f64; 3])> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for v in &self.vertices {
            for k in 0..3 {
                min[k] = min[k].min(v[k]);
                max[k] = max[k].max(v[k]);
            }
        }
        Some((min, max))
    }

    /// 检查所有面索引和材质下标是否越界
    pub fn check_integrity(&self) -> std::result::Result<(), String> {
        let n = self.vertices.len();
        for (i, face) in self.faces.iter().enumerate() {
            if face.material >= self.materials.len() {
                return Err(format!("face {} references missing material {}", i, face.material));
            }
            if let Some(bad) = face.polygon.indices().iter().find(|&&v| v as usize >= n) {
                return Err(format!("face {} references missing vertex {}", i, bad));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_material_reuses_existing() {
        let mut mesh = MeshModel::new();
        let a = mesh.ensure_material("Na", "Na", [1.0, 0.0, 0.0]);
        let b = mesh.ensure_material("Na", "Na", [0.0, 1.0, 0.0]);
        assert_eq!(a, b);
        assert_eq!(mesh.materials.len(), 1);
        assert_eq!(mesh.materials[0].color, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_integrity_detects_bad_index() {
        let mut mesh = MeshModel::new();
        let m = mesh.ensure_material("bond", "bond", [0.5, 0.5, 0.5]);
        mesh.push_vertices([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).unwrap();
        mesh.faces.push(Face {
            polygon: Polygon::Tri([0, 1, 2]),
            material: m,
        });
        assert!(mesh.check_integrity().is_ok());

        mesh.faces.push(Face {
            polygon: Polygon::Quad([0, 1, 2, 3]),
            material: m,
        });
        assert!(mesh.check_integrity().is_err());
        assert_eq!(mesh.triangle_count(), 3);
    }

    #[test]
    fn test_bounds() {
        let mut mesh = MeshModel::new();
        assert!(mesh.bounds().is_none());
        mesh.push_vertices([[1.0, -2.0, 0.5], [-1.0, 3.0, 0.0]]).unwrap();
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, [-1.0, -2.0, 0.0]);
        assert_eq!(max, [1.0, 3.0, 0.5]);
    }
}
