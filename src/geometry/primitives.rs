//! # 几何图元
//!
//! UV 球体和无端盖圆柱体的顶点/面生成。返回的面索引相对于图元自身的顶点，
//! 由调用方加上全局偏移。
//!
//! ## 依赖关系
//! - 被 `geometry/mesh.rs` 使用

use crate::models::Polygon;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// 球体最小纬度分段数
pub const MIN_SPHERE_RESOLUTION: u32 = 2;
/// 圆柱最小径向分段数
pub const MIN_BOND_RESOLUTION: u32 = 3;
/// 球体最大纬度分段数
pub const MAX_SPHERE_RESOLUTION: u32 = 256;
/// 圆柱最大径向分段数
pub const MAX_BOND_RESOLUTION: u32 = 128;

/// 图元网格（局部索引）
#[derive(Debug, Clone, Default)]
pub struct Primitive {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Polygon>,
}

/// UV 球体
///
/// `resolution` 为纬度分段数，经度分段数取其两倍。两极各只有一个顶点，
/// 极区用三角扇连接，中间各环之间用四边形。
/// 顶点数 = 2 + (resolution - 1) · 2·resolution。
/// 分段数被限制在 [`MIN_SPHERE_RESOLUTION`, `MAX_SPHERE_RESOLUTION`] 内。
pub fn uv_sphere(center: [f64; 3], radius: f64, resolution: u32) -> Primitive {
    let lat = resolution.clamp(MIN_SPHERE_RESOLUTION, MAX_SPHERE_RESOLUTION);
    let lon = 2 * lat;
    let c = Vector3::from(center);

    let (lat_n, lon_n) = (lat as usize, lon as usize);
    let mut vertices: Vec<[f64; 3]> = Vec::with_capacity(2 + (lat_n - 1) * lon_n);
    vertices.push((c + Vector3::new(0.0, 0.0, radius)).into());
    for i in 1..lat {
        let theta = PI * i as f64 / lat as f64;
        let (sin_t, cos_t) = theta.sin_cos();
        for k in 0..lon {
            let phi = 2.0 * PI * k as f64 / lon as f64;
            let (sin_p, cos_p) = phi.sin_cos();
            let v = c + radius * Vector3::new(sin_t * cos_p, sin_t * sin_p, cos_t);
            vertices.push(v.into());
        }
    }
    let south = vertices.len() as u32;
    vertices.push((c - Vector3::new(0.0, 0.0, radius)).into());

    // 第 i 环（1 起始）第 k 个顶点
    let ring = |i: u32, k: u32| 1 + (i - 1) * lon + (k % lon);

    let mut faces = Vec::with_capacity(lat_n * lon_n);
    for k in 0..lon {
        faces.push(Polygon::Tri([0, ring(1, k), ring(1, k + 1)]));
    }
    for i in 1..(lat - 1) {
        for k in 0..lon {
            faces.push(Polygon::Quad([
                ring(i, k),
                ring(i + 1, k),
                ring(i + 1, k + 1),
                ring(i, k + 1),
            ]));
        }
    }
    for k in 0..lon {
        faces.push(Polygon::Tri([south, ring(lat - 1, k + 1), ring(lat - 1, k)]));
    }

    Primitive { vertices, faces }
}

/// 与 `dir` 垂直的一对单位向量
///
/// 轴接近 z 方向时改用 x 轴做叉积，避免退化。
fn perpendicular_frame(dir: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = if dir.z.abs() < 0.9 {
        Vector3::z()
    } else {
        Vector3::x()
    };
    let u = dir.cross(&helper).normalize();
    let v = dir.cross(&u).normalize();
    (u, v)
}

/// 无端盖圆柱体；两端重合时返回 None
///
/// 顶点数 = 2·resolution，面数 = resolution（四边形）。
pub fn cylinder(start: [f64; 3], end: [f64; 3], radius: f64, resolution: u32) -> Option<Primitive> {
    let n = resolution.clamp(MIN_BOND_RESOLUTION, MAX_BOND_RESOLUTION);
    let a = Vector3::from(start);
    let b = Vector3::from(end);
    let axis = b - a;
    let length = axis.norm();
    if length < 1e-12 {
        return None;
    }
    let dir = axis / length;
    let (u, v) = perpendicular_frame(&dir);

    let mut vertices: Vec<[f64; 3]> = Vec::with_capacity(2 * n as usize);
    for k in 0..n {
        let phi = 2.0 * PI * k as f64 / n as f64;
        let offset = radius * (phi.cos() * u + phi.sin() * v);
        vertices.push((a + offset).into());
        vertices.push((b + offset).into());
    }

    let faces = (0..n)
        .map(|k| {
            let next = (k + 1) % n;
            Polygon::Quad([2 * k, 2 * next, 2 * next + 1, 2 * k + 1])
        })
        .collect();

    Some(Primitive { vertices, faces })
}
