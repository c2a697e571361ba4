//! # standardize 命令实现
//!
//! 读取 OBJ/MTL，标准化材质名称和颜色后写回。
//!
//! ## 依赖关系
//! - 使用 `cli/standardize.rs` 定义的参数
//! - 使用 `packaging/obj.rs`, `materials/`

use crate::cli::standardize::StandardizeArgs;
use crate::error::{CrystalError, Result};
use crate::materials::standardizer::Resolution;
use crate::materials::MaterialStandardizer;
use crate::packaging::obj;
use crate::utils::output;

use std::path::PathBuf;
use tabled::{Table, Tabled};

/// 材质映射表格行
#[derive(Debug, Clone, Tabled)]
struct MappingRow {
    #[tabled(rename = "Material")]
    original: String,
    #[tabled(rename = "Canonical")]
    canonical: String,
    #[tabled(rename = "Element")]
    element: String,
    #[tabled(rename = "Matched by")]
    resolution: String,
}

/// 执行 standardize 命令
pub fn execute(args: StandardizeArgs) -> Result<()> {
    output::print_header("Standardizing Materials");

    if !args.obj.is_file() {
        return Err(CrystalError::FileNotFound {
            path: args.obj.display().to_string(),
        });
    }

    let mesh = obj::read_obj(&args.obj, args.mtl.as_deref())?;
    output::print_info(&format!(
        "Read {} vertices, {} faces, {} material(s) from '{}'",
        mesh.vertex_count(),
        mesh.face_count(),
        mesh.materials.len(),
        args.obj.display()
    ));

    let standardizer = MaterialStandardizer::new(args.preserve_colors);
    let (standardized, report) = standardizer.standardize_with_report(&mesh);

    let out_obj = args.output.clone().unwrap_or_else(|| args.obj.clone());
    let out_mtl: PathBuf = match (&args.output, &args.mtl) {
        (None, Some(mtl)) => mtl.clone(),
        _ => out_obj.with_extension("mtl"),
    };
    obj::write_obj(&standardized, &out_obj, &out_mtl)?;

    let rows: Vec<MappingRow> = report
        .mappings
        .iter()
        .map(|m| MappingRow {
            original: m.original.clone(),
            canonical: m.canonical.clone(),
            element: m.element.clone().unwrap_or_else(|| "-".to_string()),
            resolution: match m.resolution {
                Resolution::Name => "name",
                Resolution::Color => "color",
                Resolution::HexName => "hex name",
                Resolution::Bond => "bond",
                Resolution::Unresolved => "unresolved",
            }
            .to_string(),
        })
        .collect();
    println!("{}", Table::new(&rows));

    for name in report.unresolved() {
        output::print_warning(&format!("Unresolved material '{}' kept with neutral color", name));
    }
    output::print_done(&format!(
        "{} of {} material(s) resolved, written to '{}'",
        report.resolved_count(),
        report.mappings.len(),
        out_obj.display()
    ));

    Ok(())
}
