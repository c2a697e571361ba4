//! # OBJ/MTL 中间格式
//!
//! 外部打包工具（usdzconvert 等）读取 OBJ + MTL，这里负责写出和读回。
//!
//! 写出格式：
//! ```text
//! mtllib model.mtl
//! o CrystalStructure
//! v x y z
//! g Na_MAT
//! usemtl Na_MAT
//! f 1 2 3
//! ```
//! 面按材质分组，索引从 1 开始。MTL 中每个材质写 `Ka/Kd/Ks/Ns/d`。
//!
//! ## 依赖关系
//! - 被 `packaging/mod.rs`、`commands/standardize.rs` 使用
//! - 使用 `models/mesh.rs`

use crate::error::{CrystalError, Result};
use crate::models::elements::{Rgb, NEUTRAL_COLOR};
use crate::models::{Face, MeshModel, Polygon};
use log::warn;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// 没有 usemtl 的面使用的材质名
pub const DEFAULT_MATERIAL: &str = "default";

fn write_error(path: &Path) -> impl Fn(std::io::Error) -> CrystalError + '_ {
    move |source| CrystalError::FileWriteError {
        path: path.display().to_string(),
        source,
    }
}

/// 写出 OBJ 和配套 MTL
pub fn write_obj(mesh: &MeshModel, obj_path: &Path, mtl_path: &Path) -> Result<()> {
    write_mtl(mesh, mtl_path)?;

    let err = write_error(obj_path);
    let mut w = BufWriter::new(File::create(obj_path).map_err(&err)?);
    let mtl_name = mtl_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model.mtl".to_string());

    writeln!(w, "# crystal-ar mesh: {} vertices, {} faces", mesh.vertex_count(), mesh.face_count())
        .map_err(&err)?;
    writeln!(w, "mtllib {}", mtl_name).map_err(&err)?;
    writeln!(w, "o CrystalStructure").map_err(&err)?;
    for v in &mesh.vertices {
        writeln!(w, "v {:.6} {:.6} {:.6}", v[0], v[1], v[2]).map_err(&err)?;
    }

    for (idx, material) in mesh.materials.iter().enumerate() {
        let faces = mesh.faces_with_material(idx);
        if faces.is_empty() {
            continue;
        }
        writeln!(w, "g {}", material.name).map_err(&err)?;
        writeln!(w, "usemtl {}", material.name).map_err(&err)?;
        for fi in faces {
            let line: Vec<String> = mesh.faces[fi]
                .polygon
                .indices()
                .iter()
                .map(|i| (i + 1).to_string())
                .collect();
            writeln!(w, "f {}", line.join(" ")).map_err(&err)?;
        }
    }
    w.flush().map_err(&err)?;
    Ok(())
}

/// 写出 MTL
pub fn write_mtl(mesh: &MeshModel, mtl_path: &Path) -> Result<()> {
    let err = write_error(mtl_path);
    let mut w = BufWriter::new(File::create(mtl_path).map_err(&err)?);
    writeln!(w, "# crystal-ar materials: {}", mesh.materials.len()).map_err(&err)?;
    for m in &mesh.materials {
        let [r, g, b] = m.color;
        writeln!(w).map_err(&err)?;
        writeln!(w, "newmtl {}", m.name).map_err(&err)?;
        writeln!(w, "Ka {:.6} {:.6} {:.6}", r * 0.2, g * 0.2, b * 0.2).map_err(&err)?;
        writeln!(w, "Kd {:.6} {:.6} {:.6}", r, g, b).map_err(&err)?;
        writeln!(w, "Ks 0.500000 0.500000 0.500000").map_err(&err)?;
        writeln!(w, "Ns 50").map_err(&err)?;
        writeln!(w, "d 1.0").map_err(&err)?;
    }
    w.flush().map_err(&err)?;
    Ok(())
}

/// 读取 MTL：材质名 -> Kd 颜色（按出现顺序）
pub fn read_mtl(mtl_path: &Path) -> Result<Vec<(String, Rgb)>> {
    let content = fs::read_to_string(mtl_path).map_err(|e| CrystalError::FileReadError {
        path: mtl_path.display().to_string(),
        source: e,
    })?;

    let mut materials: Vec<(String, Rgb)> = Vec::new();
    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["newmtl", name, ..] => materials.push((name.to_string(), NEUTRAL_COLOR)),
            ["Kd", r, g, b, ..] => {
                if let (Some(last), Ok(r), Ok(g), Ok(b)) =
                    (materials.last_mut(), r.parse::<f64>(), g.parse::<f64>(), b.parse::<f64>())
                {
                    last.1 = [r, g, b];
                }
            }
            _ => {}
        }
    }
    Ok(materials)
}

/// 读取 OBJ（及其 MTL）重建网格
///
/// `mtl_path` 为 None 时使用 OBJ 中 `mtllib` 指向的文件（相对 OBJ 所在目录）。
/// 多于 4 个顶点的面按扇形拆成三角形。
pub fn read_obj(obj_path: &Path, mtl_path: Option<&Path>) -> Result<MeshModel> {
    let content = fs::read_to_string(obj_path).map_err(|e| CrystalError::FileReadError {
        path: obj_path.display().to_string(),
        source: e,
    })?;
    let parse_err = |line_no: usize, reason: &str| CrystalError::ParseError {
        format: "obj".to_string(),
        path: obj_path.display().to_string(),
        reason: format!("line {}: {}", line_no, reason),
    };

    let mut mesh = MeshModel::new();
    let mut mtllib: Option<String> = None;
    let mut current: Option<String> = None;
    // (材质名, 多边形)，材质表最后统一建立
    let mut pending: Vec<(String, Vec<u32>)> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line_no = i + 1;
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.first().copied() {
            Some("v") => {
                let coords: Vec<f64> = parts[1..]
                    .iter()
                    .take(3)
                    .filter_map(|s| s.parse().ok())
                    .collect();
                if coords.len() < 3 {
                    return Err(parse_err(line_no, "vertex needs three coordinates"));
                }
                mesh.vertices.push([coords[0], coords[1], coords[2]]);
            }
            Some("f") => {
                let n = mesh.vertices.len() as i64;
                let mut indices = Vec::with_capacity(parts.len() - 1);
                for token in &parts[1..] {
                    let raw = token.split('/').next().unwrap_or("");
                    let idx: i64 = raw
                        .parse()
                        .map_err(|_| parse_err(line_no, "invalid face index"))?;
                    let resolved = if idx < 0 { n + idx } else { idx - 1 };
                    if resolved < 0 || resolved >= n {
                        return Err(parse_err(line_no, "face index out of range"));
                    }
                    let index = u32::try_from(resolved)
                        .map_err(|_| parse_err(line_no, "face index out of range"))?;
                    indices.push(index);
                }
                if indices.len() < 3 {
                    return Err(parse_err(line_no, "face needs at least three vertices"));
                }
                let material = current.clone().unwrap_or_else(|| DEFAULT_MATERIAL.to_string());
                pending.push((material, indices));
            }
            Some("usemtl") => current = parts.get(1).map(|s| s.to_string()),
            Some("mtllib") => mtllib = parts.get(1).map(|s| s.to_string()),
            _ => {}
        }
    }

    let mtl_colors: Vec<(String, Rgb)> = match (mtl_path, &mtllib) {
        (Some(p), _) => read_mtl(p)?,
        (None, Some(name)) => {
            let p = obj_path.parent().unwrap_or_else(|| Path::new(".")).join(name);
            if p.exists() {
                read_mtl(&p)?
            } else {
                warn!("mtllib '{}' referenced by {} not found", name, obj_path.display());
                Vec::new()
            }
        }
        (None, None) => Vec::new(),
    };

    for (name, color) in &mtl_colors {
        mesh.ensure_material(name, name, *color);
    }
    let colors: HashMap<&str, Rgb> = mtl_colors.iter().map(|(n, c)| (n.as_str(), *c)).collect();

    for (material, indices) in pending {
        let color = colors.get(material.as_str()).copied().unwrap_or(NEUTRAL_COLOR);
        let m = mesh.ensure_material(&material, &material, color);
        match indices.len() {
            3 => mesh.faces.push(Face {
                polygon: Polygon::Tri([indices[0], indices[1], indices[2]]),
                material: m,
            }),
            4 => mesh.faces.push(Face {
                polygon: Polygon::Quad([indices[0], indices[1], indices[2], indices[3]]),
                material: m,
            }),
            _ => {
                for k in 1..indices.len() - 1 {
                    mesh.faces.push(Face {
                        polygon: Polygon::Tri([indices[0], indices[k], indices[k + 1]]),
                        material: m,
                    });
                }
            }
        }
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mesh() -> MeshModel {
        let mut mesh = MeshModel::new();
        mesh.push_vertices([
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ])
        .unwrap();
        let na = mesh.ensure_material("Na_MAT", "Na", [0.67, 0.36, 0.95]);
        let bond = mesh.ensure_material("Bond_MAT", "Bond", [0.5, 0.5, 0.5]);
        mesh.faces.push(Face {
            polygon: Polygon::Quad([0, 1, 2, 3]),
            material: bond,
        });
        mesh.faces.push(Face {
            polygon: Polygon::Tri([0, 1, 2]),
            material: na,
        });
        mesh
    }

    #[test]
    fn test_written_obj_is_grouped_and_one_based() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("model.obj");
        let mtl = dir.path().join("model.mtl");
        write_obj(&sample_mesh(), &obj, &mtl).unwrap();

        let text = fs::read_to_string(&obj).unwrap();
        assert!(text.contains("mtllib model.mtl"));
        let na_pos = text.find("usemtl Na_MAT").unwrap();
        let bond_pos = text.find("usemtl Bond_MAT").unwrap();
        assert!(na_pos < bond_pos);
        assert!(text.contains("f 1 2 3\n"));
        assert!(text.contains("f 1 2 3 4\n"));

        let mtl_text = fs::read_to_string(&mtl).unwrap();
        assert!(mtl_text.contains("newmtl Na_MAT"));
        assert!(mtl_text.contains("Kd 0.670000 0.360000 0.950000"));
    }

    #[test]
    fn test_read_back_preserves_geometry_and_colors() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("model.obj");
        let mtl = dir.path().join("model.mtl");
        let mesh = sample_mesh();
        write_obj(&mesh, &obj, &mtl).unwrap();

        let back = read_obj(&obj, None).unwrap();
        assert_eq!(back.vertex_count(), 4);
        assert_eq!(back.face_count(), 2);
        assert_eq!(back.triangle_count(), 3);
        let na = back.material_index("Na_MAT").unwrap();
        assert_eq!(back.materials[na].color, [0.67, 0.36, 0.95]);
        assert!(back.check_integrity().is_ok());
    }

    #[test]
    fn test_read_handles_slashes_negative_and_ngons() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("x.obj");
        fs::write(
            &obj,
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 0.5 1.5 0\nf 1/1/1 2/2/2 3/3/3\nusemtl atom_Na\nf -5 -4 -3 -2 -1\n",
        )
        .unwrap();
        let mesh = read_obj(&obj, None).unwrap();
        assert_eq!(mesh.face_count(), 4);
        assert_eq!(mesh.materials[0].name, DEFAULT_MATERIAL);
        assert_eq!(mesh.materials[1].name, "atom_Na");
        assert_eq!(mesh.materials[1].color, NEUTRAL_COLOR);
    }

    #[test]
    fn test_read_rejects_out_of_range_index() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("bad.obj");
        fs::write(&obj, "v 0 0 0\nf 1 2 3\n").unwrap();
        let err = read_obj(&obj, None).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
