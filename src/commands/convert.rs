//! # convert 命令实现
//!
//! 结构文件 → USDZ。
//!
//! ## 功能
//! - 单文件：直接转换，打印报告摘要
//! - 目录：收集匹配文件，并行转换到输出目录，可选 CSV 汇总
//! - `--report` 写出 JSON 报告（目录模式为报告数组）
//!
//! ## 依赖关系
//! - 使用 `cli/convert.rs` 定义的参数
//! - 使用 `pipeline/`, `batch/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::batch::{BatchResult, BatchRunner, FileCollector, ProcessResult};
use crate::cli::convert::ConvertArgs;
use crate::error::{CrystalError, Result};
use crate::pipeline::{
    ConversionOptions, ConversionOrchestrator, ConversionReport, DirectoryArtifactSink, Step,
};
use crate::utils::{output, progress};

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// CSV 汇总行
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    input: &'a str,
    output: &'a str,
    success: bool,
    parse_backend: &'a str,
    package_backend: &'a str,
    atoms: usize,
    bonds: usize,
    vertices: usize,
    faces: usize,
    bytes: u64,
    a: Option<f64>,
    b: Option<f64>,
    c: Option<f64>,
    alpha: Option<f64>,
    beta: Option<f64>,
    gamma: Option<f64>,
    volume: Option<f64>,
    density: Option<f64>,
    message: &'a str,
}

impl<'a> SummaryRow<'a> {
    fn from_report(report: &'a ConversionReport) -> Self {
        let backend = |step: Step| {
            report
                .step(step)
                .and_then(|s| s.backend.as_deref())
                .unwrap_or("")
        };
        let lattice = |k: usize| report.stats.lattice_parameters.map(|p| p[k]);
        SummaryRow {
            input: &report.input,
            output: &report.output,
            success: report.success,
            parse_backend: backend(Step::Parse),
            package_backend: backend(Step::Package),
            atoms: report.stats.atom_count,
            bonds: report.stats.bond_count,
            vertices: report.stats.vertex_count,
            faces: report.stats.face_count,
            bytes: report.stats.file_size,
            a: lattice(0),
            b: lattice(1),
            c: lattice(2),
            alpha: lattice(3),
            beta: lattice(4),
            gamma: lattice(5),
            volume: report.stats.volume,
            density: report.stats.density,
            message: &report.message,
        }
    }
}

/// 执行 convert 命令
pub fn execute(args: ConvertArgs) -> Result<()> {
    let options = build_options(&args)?;

    let mut orchestrator = ConversionOrchestrator::new(args.backends.to_config());
    if args.no_validate {
        orchestrator = orchestrator.with_validator(None);
    }
    if let Some(dir) = &args.keep_artifacts {
        orchestrator = orchestrator.with_sink(Box::new(DirectoryArtifactSink::new(dir)));
    }

    if args.input.is_file() {
        convert_single(&args, &orchestrator, &options)
    } else if args.input.is_dir() {
        convert_directory(&args, &orchestrator, &options)
    } else {
        Err(CrystalError::FileNotFound {
            path: args.input.display().to_string(),
        })
    }
}

/// 选项文件 + 命令行覆盖
fn build_options(args: &ConvertArgs) -> Result<ConversionOptions> {
    let mut options = match &args.options {
        Some(path) => ConversionOptions::from_json_file(path)?,
        None => ConversionOptions::default(),
    };

    if let Some(v) = args.sphere_resolution {
        options.sphere_resolution = v;
    }
    if let Some(v) = args.bond_resolution {
        options.bond_resolution = v;
    }
    if args.no_bonds {
        options.include_bonds = false;
    }
    if let Some(v) = args.scale {
        options.scale_factor = v;
    }
    if let Some(v) = args.cutoff {
        options.bond_cutoff_factor = v;
    }
    if let Some(v) = &args.backend {
        options.preferred_backend = Some(v.clone());
    }
    if args.preserve_colors {
        options.preserve_original_colors = true;
    }
    if let Some(v) = args.timeout {
        options.timeout_secs = v;
    }

    options.validate()?;
    Ok(options)
}

/// 单文件输出路径：已存在的目录或无扩展名时放到目录下
fn single_output_path(input: &Path, output: &Path) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(output_name(input))
    } else {
        output.to_path_buf()
    }
}

fn output_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("structure");
    format!("{}.usdz", stem)
}

fn convert_single(
    args: &ConvertArgs,
    orchestrator: &ConversionOrchestrator,
    options: &ConversionOptions,
) -> Result<()> {
    output::print_header("Converting to USDZ");

    let output_path = single_output_path(&args.input, &args.output);
    let spinner = progress::create_spinner(&format!("Converting {}", args.input.display()));
    let report = orchestrator.convert(&args.input, &output_path, options);
    spinner.finish_and_clear();

    output::print_report(&report);
    if let Some(path) = &args.report {
        write_json(path, &report)?;
        output::print_success(&format!("Report saved to '{}'", path.display()));
    }

    if report.success {
        Ok(())
    } else {
        Err(CrystalError::Other(format!("conversion failed: {}", report.message)))
    }
}

fn convert_directory(
    args: &ConvertArgs,
    orchestrator: &ConversionOrchestrator,
    options: &ConversionOptions,
) -> Result<()> {
    output::print_header("Converting to USDZ (batch)");

    let files = FileCollector::new(&args.input)
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect()?;

    if files.is_empty() {
        output::print_warning(&format!(
            "No files matched '{}' under {}",
            args.pattern,
            args.input.display()
        ));
        return Ok(());
    }

    fs::create_dir_all(&args.output).map_err(|e| CrystalError::FileWriteError {
        path: args.output.display().to_string(),
        source: e,
    })?;

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Found {} files to convert ({} jobs)",
        files.len(),
        runner.jobs()
    ));

    let result = runner.run(&files, |input| {
        let output_path = args.output.join(output_name(input));
        if output_path.exists() && !args.overwrite {
            return ProcessResult::Skipped(output_path);
        }
        orchestrator.convert(input, &output_path, options).into()
    })?;

    print_batch_summary(&result);

    if let Some(path) = &args.summary {
        write_summary_csv(path, &result.reports)?;
        output::print_success(&format!("Summary saved to '{}'", path.display()));
    }
    if let Some(path) = &args.report {
        write_json(path, &result.reports)?;
        output::print_success(&format!("Reports saved to '{}'", path.display()));
    }

    Ok(())
}

fn print_batch_summary(result: &BatchResult) {
    for report in result.reports.iter().filter(|r| !r.success) {
        output::print_report(report);
    }
    if result.skipped > 0 {
        output::print_skip(&format!(
            "{} file(s) already converted (use --overwrite)",
            result.skipped
        ));
    }
    output::print_done(&format!(
        "Converted {} of {} file(s) ({} skipped, {} failed)",
        result.success,
        result.total(),
        result.skipped,
        result.failed
    ));
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| CrystalError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 保存 CSV 汇总
fn write_summary_csv(path: &Path, reports: &[ConversionReport]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for report in reports {
        wtr.serialize(SummaryRow::from_report(report))?;
    }
    wtr.flush().map_err(|e| CrystalError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn parse(argv: &[&str]) -> ConvertArgs {
        match Cli::parse_from(argv).command {
            Commands::Convert(args) => args,
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_flags_override_options_file() {
        let dir = tempfile::tempdir().unwrap();
        let opts = dir.path().join("o.json");
        fs::write(&opts, r#"{"sphereResolution": 10, "scaleFactor": 3.0}"#).unwrap();

        let args = parse(&[
            "crystal-ar",
            "convert",
            "-i",
            "a.cif",
            "-o",
            "a.usdz",
            "--options",
            opts.to_str().unwrap(),
            "--scale",
            "2",
            "--no-bonds",
            "--backend",
            "native",
        ]);
        let options = build_options(&args).unwrap();
        assert_eq!(options.sphere_resolution, 10);
        assert_eq!(options.scale_factor, 2.0);
        assert!(!options.include_bonds);
        assert_eq!(options.preferred_backend.as_deref(), Some("native"));
    }

    #[test]
    fn test_invalid_flag_values_are_rejected() {
        let args = parse(&["crystal-ar", "convert", "-i", "a", "-o", "b", "--bond-resolution", "2"]);
        assert!(build_options(&args).is_err());
    }

    #[test]
    fn test_output_path_rules() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            single_output_path(Path::new("x/NaCl.cif"), dir.path()),
            dir.path().join("NaCl.usdz")
        );
        assert_eq!(
            single_output_path(Path::new("NaCl.cif"), Path::new("out/model.usdz")),
            PathBuf::from("out/model.usdz")
        );
    }

    #[test]
    fn test_summary_csv_has_one_row_per_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("fe.cif");
        fs::write(
            &input,
            "data_Fe\n_cell_length_a 2.87\n_cell_length_b 2.87\n_cell_length_c 2.87\nloop_\n_atom_site_label\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\nFe1 0 0 0\nFe2 0.5 0.5 0.5\n",
        )
        .unwrap();
        let orchestrator = ConversionOrchestrator::new(crate::pipeline::PipelineConfig {
            enable_usdzconvert: false,
            enable_docker: false,
            ..Default::default()
        });
        let report = orchestrator.convert(
            &input,
            &dir.path().join("fe.usdz"),
            &ConversionOptions::default(),
        );
        assert!(report.success, "{}", report.message);

        let csv_path = dir.path().join("summary.csv");
        write_summary_csv(&csv_path, &[report]).unwrap();
        let text = fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("input,output,success,parse_backend,package_backend"));
        assert!(lines[1].contains(",true,cif,native,2,"));
        assert!(lines[0].ends_with(",a,b,c,alpha,beta,gamma,volume,density,message"));
        assert!(lines[1].contains(",2.87,"));
    }
}
