//! # USDA 场景层
//!
//! 将 [`MeshModel`] 写成 USD 文本层：
//!
//! ```text
//! #usda 1.0
//! (defaultPrim = "CrystalStructure", metersPerUnit = 1, upAxis = "Y")
//!
//! def Xform "CrystalStructure"
//!     def Mesh "Crystal"            points / faceVertexCounts / faceVertexIndices
//!         def GeomSubset "Na_MAT"   每个材质一个面子集，familyName = "materialBind"
//!     def Scope "Materials"
//!         def Material "Na_MAT"     UsdPreviewSurface
//! ```
//!
//! ## 依赖关系
//! - 被 `packaging/native.rs` 使用
//! - 使用 `models/mesh.rs`

use crate::models::MeshModel;
use std::collections::HashSet;

/// 默认 prim 名称
pub const ROOT_PRIM: &str = "CrystalStructure";
/// 场景层在 USDZ 中的文件名
pub const LAYER_NAME: &str = "scene.usda";

const ROUGHNESS: f64 = 0.3;
const METALLIC: f64 = 0.0;
/// 自发光系数（相对漫反射）
const EMISSIVE_RATIO: f64 = 0.05;

/// 材质名转为合法的 USD prim 标识符，并保证不重复
fn prim_names(mesh: &MeshModel) -> Vec<String> {
    let mut used = HashSet::new();
    mesh.materials
        .iter()
        .map(|m| {
            let mut id: String = m
                .name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
                .collect();
            if id.is_empty() || id.starts_with(|c: char| c.is_ascii_digit()) {
                id.insert(0, '_');
            }
            let base = id.clone();
            let mut n = 1;
            while !used.insert(id.clone()) {
                id = format!("{}_{}", base, n);
                n += 1;
            }
            id
        })
        .collect()
}

fn fmt_f(v: f64) -> String {
    // USD 不接受 NaN/inf
    if v.is_finite() {
        format!("{:.6}", v)
    } else {
        "0".to_string()
    }
}

fn join_ints(values: impl IntoIterator<Item = usize>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// 生成 USDA 文本
pub fn to_usda(mesh: &MeshModel) -> String {
    let ids = prim_names(mesh);
    let mut out = String::new();

    out.push_str("#usda 1.0\n(\n");
    out.push_str(&format!("    defaultPrim = \"{}\"\n", ROOT_PRIM));
    out.push_str("    metersPerUnit = 1\n");
    out.push_str("    upAxis = \"Y\"\n");
    out.push_str(")\n\n");

    out.push_str(&format!("def Xform \"{}\" (\n    kind = \"component\"\n)\n{{\n", ROOT_PRIM));

    // 网格
    let points = mesh
        .vertices
        .iter()
        .map(|v| format!("({}, {}, {})", fmt_f(v[0]), fmt_f(v[1]), fmt_f(v[2])))
        .collect::<Vec<_>>()
        .join(", ");
    let counts = join_ints(mesh.faces.iter().map(|f| f.polygon.indices().len()));
    let indices = join_ints(
        mesh.faces
            .iter()
            .flat_map(|f| f.polygon.indices().iter().map(|&i| i as usize)),
    );

    out.push_str("    def Mesh \"Crystal\" (\n");
    out.push_str("        prepend apiSchemas = [\"MaterialBindingAPI\"]\n    )\n    {\n");
    if let Some((min, max)) = mesh.bounds() {
        out.push_str(&format!(
            "        float3[] extent = [({}, {}, {}), ({}, {}, {})]\n",
            fmt_f(min[0]),
            fmt_f(min[1]),
            fmt_f(min[2]),
            fmt_f(max[0]),
            fmt_f(max[1]),
            fmt_f(max[2])
        ));
    }
    out.push_str(&format!("        int[] faceVertexCounts = [{}]\n", counts));
    out.push_str(&format!("        int[] faceVertexIndices = [{}]\n", indices));
    out.push_str(&format!("        point3f[] points = [{}]\n", points));
    out.push_str("        uniform bool doubleSided = 1\n");
    out.push_str("        uniform token subdivisionScheme = \"none\"\n");
    out.push_str("        uniform token subsetFamily:materialBind:familyType = \"partition\"\n");

    for (idx, id) in ids.iter().enumerate() {
        let faces = mesh.faces_with_material(idx);
        if faces.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "\n        def GeomSubset \"{}\" (\n            prepend apiSchemas = [\"MaterialBindingAPI\"]\n        )\n        {{\n",
            id
        ));
        out.push_str("            uniform token elementType = \"face\"\n");
        out.push_str("            uniform token familyName = \"materialBind\"\n");
        out.push_str(&format!("            int[] indices = [{}]\n", join_ints(faces)));
        out.push_str(&format!(
            "            rel material:binding = </{}/Materials/{}>\n",
            ROOT_PRIM, id
        ));
        out.push_str("        }\n");
    }
    out.push_str("    }\n\n");

    // 材质
    out.push_str("    def Scope \"Materials\"\n    {\n");
    for (material, id) in mesh.materials.iter().zip(&ids) {
        let [r, g, b] = material.color;
        out.push_str(&format!(
            "        def Material \"{}\" (\n            displayName = \"{}\"\n        )\n        {{\n",
            id,
            escape(&material.display_name)
        ));
        out.push_str(&format!(
            "            token outputs:surface.connect = </{}/Materials/{}/PreviewSurface.outputs:surface>\n\n",
            ROOT_PRIM, id
        ));
        out.push_str("            def Shader \"PreviewSurface\"\n            {\n");
        out.push_str("                uniform token info:id = \"UsdPreviewSurface\"\n");
        out.push_str(&format!(
            "                color3f inputs:diffuseColor = ({}, {}, {})\n",
            fmt_f(r),
            fmt_f(g),
            fmt_f(b)
        ));
        out.push_str(&format!(
            "                color3f inputs:emissiveColor = ({}, {}, {})\n",
            fmt_f(r * EMISSIVE_RATIO),
            fmt_f(g * EMISSIVE_RATIO),
            fmt_f(b * EMISSIVE_RATIO)
        ));
        out.push_str(&format!("                float inputs:metallic = {}\n", METALLIC));
        out.push_str(&format!("                float inputs:roughness = {}\n", ROUGHNESS));
        out.push_str("                token outputs:surface\n");
        out.push_str("            }\n        }\n");
    }
    out.push_str("    }\n}\n");

    out
}
