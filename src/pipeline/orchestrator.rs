//! # 转换编排器
//!
//! 按顺序执行：参数检查 → 输入预检 → 解析 → 化学键 → 网格 → 材质标准化 → 打包，
//! 每一步的结果写入 [`ConversionReport`]。
//!
//! - 解析失败、几何失败立即终止后续步骤
//! - 打包失败只在所有后端都失败后才出现
//! - 临时工作区在每条退出路径上删除；清理失败只记录，不改变转换结果
//! - 任何 panic 都被捕获并转成失败报告
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs`、`batch/runner.rs` 使用
//! - 使用 `parsers/`、`geometry/`、`materials/`、`packaging/`

use super::collaborators::{ArtifactSink, CifSignatureValidator, InputValidator};
use super::options::{ConversionOptions, PipelineConfig};
use super::workspace::ScratchWorkspace;
use crate::error::{panic_message, BackendFailure, CrystalError, Result};
use crate::geometry::{BondInferencer, MeshBuilder};
use crate::materials::MaterialStandardizer;
use crate::models::Structure;
use crate::packaging::{PackageConverter, PackageInfo, MTL_FILE, OBJ_FILE};
use crate::parsers::StructureParser;
use log::{error, info, warn};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

/// 流水线步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Options,
    Validate,
    Read,
    Workspace,
    Parse,
    Bonds,
    Mesh,
    Standardize,
    Package,
    Artifacts,
    Cleanup,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Options => "options",
            Step::Validate => "validate",
            Step::Read => "read",
            Step::Workspace => "workspace",
            Step::Parse => "parse",
            Step::Bonds => "bonds",
            Step::Mesh => "mesh",
            Step::Standardize => "standardize",
            Step::Package => "package",
            Step::Artifacts => "artifacts",
            Step::Cleanup => "cleanup",
        };
        write!(f, "{}", name)
    }
}

/// 单个步骤的诊断
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub step: Step,
    pub success: bool,
    pub detail: String,
    /// 解析/打包步骤中胜出的后端
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// 失败的后端尝试（按尝试顺序）
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<BackendFailure>,
}

/// 汇总统计
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionStats {
    pub atom_count: usize,
    pub bond_count: usize,
    pub vertex_count: usize,
    pub face_count: usize,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// a, b, c (Å), α, β, γ (°)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lattice_parameters: Option<[f64; 6]>,
    /// 晶胞体积 (Å³)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// 密度 (g/cm³)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
}

/// 转换报告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReport {
    pub success: bool,
    pub message: String,
    pub input: String,
    pub output: String,
    /// 失败类别（见 `CrystalError::category`）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<String>,
    pub steps: Vec<StepReport>,
    pub stats: ConversionStats,
    pub elapsed_ms: u64,
}

impl ConversionReport {
    fn new(input: &str, output: &Path) -> Self {
        ConversionReport {
            success: false,
            message: String::new(),
            input: input.to_string(),
            output: output.display().to_string(),
            error_category: None,
            steps: Vec::new(),
            stats: ConversionStats::default(),
            elapsed_ms: 0,
        }
    }

    fn push(&mut self, step: Step, success: bool, detail: impl Into<String>) -> &mut StepReport {
        self.steps.push(StepReport {
            step,
            success,
            detail: detail.into(),
            backend: None,
            attempts: Vec::new(),
        });
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }

    fn fail(&mut self, step: Step, err: &CrystalError) {
        let report = self.push(step, false, err.to_string());
        report.attempts = err.attempts().to_vec();
    }

    pub fn step(&self, step: Step) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step == step)
    }

    /// 所有步骤中失败的后端尝试
    pub fn failed_attempts(&self) -> Vec<&BackendFailure> {
        self.steps.iter().flat_map(|s| s.attempts.iter()).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// 转换编排器
///
/// 每次 `convert` 新建解析器、打包器和临时工作区，实例之间不共享可变状态，
/// 可以在多个线程中同时使用。
pub struct ConversionOrchestrator {
    config: PipelineConfig,
    validator: Option<Box<dyn InputValidator>>,
    sink: Option<Box<dyn ArtifactSink>>,
}

impl Default for ConversionOrchestrator {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl ConversionOrchestrator {
    pub fn new(config: PipelineConfig) -> Self {
        ConversionOrchestrator {
            config,
            validator: Some(Box::new(CifSignatureValidator)),
            sink: None,
        }
    }

    /// 替换或关闭输入预检
    pub fn with_validator(mut self, validator: Option<Box<dyn InputValidator>>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn ArtifactSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 解析器注册表；`preferred` 只在命中时生效
    pub fn parser(&self, preferred: Option<&str>) -> StructureParser {
        let parser = StructureParser::default();
        let known = preferred.is_some_and(|p| parser.backend_names().contains(&p));
        if known {
            parser.with_preferred(preferred)
        } else {
            parser
        }
    }

    /// 打包器注册表；`preferred` 只在命中时生效
    pub fn packager(&self, options: &ConversionOptions) -> PackageConverter {
        let packager = PackageConverter::from_config(&self.config, options.timeout());
        let preferred = options.preferred_backend.as_deref();
        let known = preferred.is_some_and(|p| packager.backend_names().contains(&p));
        if known {
            packager.with_preferred(preferred)
        } else {
            packager
        }
    }

    /// 转换结构文件
    pub fn convert(&self, input: &Path, output: &Path, options: &ConversionOptions) -> ConversionReport {
        let start = Instant::now();
        let mut report = ConversionReport::new(&input.display().to_string(), output);
        let result = catch_unwind(AssertUnwindSafe(|| {
            self.run_file(input, output, options, &mut report)
        }));
        finish(report, result, start)
    }

    /// 转换已解析的结构（跳过输入预检和解析）
    pub fn convert_structure(
        &self,
        structure: &Structure,
        output: &Path,
        options: &ConversionOptions,
    ) -> ConversionReport {
        let start = Instant::now();
        let mut report = ConversionReport::new(&structure.name, output);
        let result = catch_unwind(AssertUnwindSafe(|| -> Result<PackageInfo> {
            self.check_options(options, &mut report)?;
            let workspace = self.workspace(&mut report)?;
            let result = self.run_structure(structure, output, options, &workspace, &mut report);
            cleanup(workspace, &mut report);
            result
        }));
        finish(report, result, start)
    }

    fn run_file(
        &self,
        input: &Path,
        output: &Path,
        options: &ConversionOptions,
        report: &mut ConversionReport,
    ) -> Result<PackageInfo> {
        self.check_options(options, report)?;

        if let Some(validator) = &self.validator {
            if let Err(e) = validator.validate(input, options.max_input_bytes) {
                report.fail(Step::Validate, &e);
                return Err(e);
            }
            report.push(Step::Validate, true, "input looks like a structure file");
        }

        let content = match fs::read(input) {
            Ok(content) => content,
            Err(source) => {
                let err = CrystalError::FileReadError {
                    path: input.display().to_string(),
                    source,
                };
                report.fail(Step::Read, &err);
                return Err(err);
            }
        };
        report.push(Step::Read, true, format!("{} bytes", content.len()));

        let name = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "structure".to_string());

        let workspace = self.workspace(report)?;
        let result = self.parse_and_build(&content, &name, output, options, &workspace, report);
        cleanup(workspace, report);
        result
    }

    fn parse_and_build(
        &self,
        content: &[u8],
        name: &str,
        output: &Path,
        options: &ConversionOptions,
        workspace: &ScratchWorkspace,
        report: &mut ConversionReport,
    ) -> Result<PackageInfo> {
        let parser = self.parser(options.preferred_backend.as_deref());
        let outcome = match parser.parse(content, name) {
            Ok(outcome) => outcome,
            Err(e) => {
                report.fail(Step::Parse, &e);
                return Err(e);
            }
        };
        let step = report.push(
            Step::Parse,
            true,
            format!(
                "{} site(s), formula {}",
                outcome.structure.len(),
                outcome.structure.formula()
            ),
        );
        step.backend = Some(outcome.backend.clone());
        step.attempts = outcome.failures.clone();

        self.run_structure(&outcome.structure, output, options, workspace, report)
    }

    fn run_structure(
        &self,
        structure: &Structure,
        output: &Path,
        options: &ConversionOptions,
        workspace: &ScratchWorkspace,
        report: &mut ConversionReport,
    ) -> Result<PackageInfo> {
        let (a, b, c, alpha, beta, gamma) = structure.lattice.parameters();
        report.stats.atom_count = structure.len();
        report.stats.lattice_parameters = Some([a, b, c, alpha, beta, gamma]);
        report.stats.volume = Some(structure.volume());
        if !structure.is_empty() {
            report.stats.formula = Some(structure.formula());
            report.stats.density = Some(structure.density());
        }

        let bonds = if options.include_bonds {
            let bonds = BondInferencer::compute(structure, options.bond_cutoff_factor);
            report.push(
                Step::Bonds,
                true,
                format!("{} bond(s) at cutoff factor {}", bonds.len(), options.bond_cutoff_factor),
            );
            bonds
        } else {
            report.push(Step::Bonds, true, "bonds disabled");
            Vec::new()
        };
        report.stats.bond_count = bonds.len();

        let mesh = match MeshBuilder::build(structure, &bonds, &options.mesh_options()) {
            Ok(mesh) => mesh,
            Err(e) => {
                report.fail(Step::Mesh, &e);
                return Err(e);
            }
        };
        report.push(
            Step::Mesh,
            true,
            format!(
                "{} vertices, {} faces ({} triangles), {} material(s)",
                mesh.vertex_count(),
                mesh.face_count(),
                mesh.triangle_count(),
                mesh.materials.len()
            ),
        );

        let standardizer = MaterialStandardizer::new(options.preserve_original_colors);
        let (mesh, materials) = standardizer.standardize_with_report(&mesh);
        let unresolved = materials.unresolved();
        let detail = if unresolved.is_empty() {
            format!("{} material(s) resolved", materials.resolved_count())
        } else {
            format!(
                "{} material(s) resolved, unresolved: {}",
                materials.resolved_count(),
                unresolved.join(", ")
            )
        };
        report.push(Step::Standardize, true, detail);
        report.stats.vertex_count = mesh.vertex_count();
        report.stats.face_count = mesh.face_count();

        let packager = self.packager(options);
        let packaged = packager.convert(&mesh, output, workspace.path());

        if let Some(sink) = &self.sink {
            let name = if structure.name.is_empty() { "structure" } else { structure.name.as_str() };
            let files = vec![workspace.file(OBJ_FILE), workspace.file(MTL_FILE)];
            match sink.persist(name, &files) {
                Ok(()) => {
                    report.push(Step::Artifacts, true, "intermediate files kept");
                }
                Err(e) => {
                    warn!("artifact sink failed: {}", e);
                    report.push(Step::Artifacts, false, e.to_string());
                }
            }
        }

        match packaged {
            Ok(info) => {
                let step = report.push(
                    Step::Package,
                    true,
                    format!("{} bytes written", info.file_size),
                );
                step.backend = Some(info.backend.clone());
                step.attempts = info.attempts.clone();
                report.stats.file_size = info.file_size;
                Ok(info)
            }
            Err(e) => {
                report.fail(Step::Package, &e);
                Err(e)
            }
        }
    }

    fn check_options(&self, options: &ConversionOptions, report: &mut ConversionReport) -> Result<()> {
        if let Err(e) = options.validate() {
            report.fail(Step::Options, &e);
            return Err(e);
        }
        if let Some(preferred) = options.preferred_backend.as_deref() {
            let parse_known = self.parser(None).backend_names().contains(&preferred);
            let package_known = self.packager(options).backend_names().contains(&preferred);
            if !parse_known && !package_known {
                warn!("preferred backend '{}' is not registered, using default order", preferred);
            }
        }
        Ok(())
    }

    fn workspace(&self, report: &mut ConversionReport) -> Result<ScratchWorkspace> {
        ScratchWorkspace::create(self.config.scratch_root.as_deref()).map_err(|e| {
            report.fail(Step::Workspace, &e);
            e
        })
    }
}

/// 删除工作区；失败只记录
fn cleanup(workspace: ScratchWorkspace, report: &mut ConversionReport) {
    if let Err(e) = workspace.close() {
        warn!("{}", e);
        report.push(Step::Cleanup, false, e.to_string());
    }
}

fn finish(
    mut report: ConversionReport,
    result: std::thread::Result<Result<PackageInfo>>,
    start: Instant,
) -> ConversionReport {
    report.elapsed_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(Ok(info)) => {
            report.success = true;
            report.message = format!(
                "converted {} -> {} with backend '{}'",
                report.input, report.output, info.backend
            );
            info!("{}", report.message);
        }
        Ok(Err(e)) => {
            report.message = e.to_string();
            report.error_category = Some(e.category().to_string());
            error!("conversion of {} failed: {}", report.input, report.message);
        }
        Err(payload) => {
            report.message = format!("internal error: {}", panic_message(payload.as_ref()));
            report.error_category = Some("InternalFailure".to_string());
            error!("conversion of {} panicked: {}", report.input, report.message);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::models::{Lattice, Site};
    use crate::pipeline::DirectoryArtifactSink;
    use std::fs::File;
    use std::path::PathBuf;
    use zip::ZipArchive;

    const ROCK_SALT: &str = "data_NaCl
_cell_length_a 5.6
_cell_length_b 5.6
_cell_length_c 5.6
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
_symmetry_space_group_name_H-M 'P 1'
loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
Na1 Na 0.0 0.0 0.0
Na2 Na 0.0 0.5 0.5
Na3 Na 0.5 0.0 0.5
Na4 Na 0.5 0.5 0.0
Cl1 Cl 0.5 0.0 0.0
Cl2 Cl 0.0 0.5 0.0
Cl3 Cl 0.0 0.0 0.5
Cl4 Cl 0.5 0.5 0.5
";

    struct Setup {
        scratch: tempfile::TempDir,
        files: tempfile::TempDir,
    }

    impl Setup {
        fn new() -> Self {
            Setup {
                scratch: tempfile::tempdir().unwrap(),
                files: tempfile::tempdir().unwrap(),
            }
        }

        /// 只启用进程内后端，测试不依赖外部工具
        fn config(&self) -> PipelineConfig {
            PipelineConfig {
                scratch_root: Some(self.scratch.path().to_path_buf()),
                enable_usdzconvert: false,
                enable_docker: false,
                ..PipelineConfig::default()
            }
        }

        fn write(&self, name: &str, content: &str) -> PathBuf {
            let path = self.files.path().join(name);
            fs::write(&path, content).unwrap();
            path
        }

        fn output(&self) -> PathBuf {
            self.files.path().join("out").join("model.usdz")
        }

        fn scratch_is_empty(&self) -> bool {
            fs::read_dir(self.scratch.path()).unwrap().next().is_none()
        }
    }

    #[test]
    fn test_rock_salt_end_to_end() {
        let setup = Setup::new();
        let input = setup.write("nacl.cif", ROCK_SALT);
        let report = ConversionOrchestrator::new(setup.config()).convert(
            &input,
            &setup.output(),
            &ConversionOptions::default(),
        );

        assert!(report.success, "{}", report.message);
        assert_eq!(report.stats.atom_count, 8);
        assert_eq!(report.stats.bond_count, 12);
        assert!(report.stats.vertex_count > 0 && report.stats.face_count > 0);
        assert_eq!(report.stats.formula.as_deref(), Some("Cl4Na4"));
        let [a, b, c, alpha, beta, gamma] = report.stats.lattice_parameters.unwrap();
        assert!((a - 5.6).abs() < 1e-9 && (b - 5.6).abs() < 1e-9 && (c - 5.6).abs() < 1e-9);
        assert!([alpha, beta, gamma].iter().all(|x| (x - 90.0).abs() < 1e-9));
        assert!((report.stats.volume.unwrap() - 175.616).abs() < 1e-6);
        // 4 × (22.990 + 35.45) u / 175.616 Å³
        assert!((report.stats.density.unwrap() - 2.21).abs() < 0.01);
        assert!(report.step(Step::Mesh).unwrap().detail.contains("triangles"));
        assert_eq!(report.step(Step::Parse).unwrap().backend.as_deref(), Some("cif"));
        assert_eq!(report.step(Step::Package).unwrap().backend.as_deref(), Some("native"));
        assert_eq!(report.stats.file_size, fs::metadata(setup.output()).unwrap().len());

        let mut archive = ZipArchive::new(File::open(setup.output()).unwrap()).unwrap();
        let mut layer = String::new();
        std::io::Read::read_to_string(&mut archive.by_index(0).unwrap(), &mut layer).unwrap();
        assert!(layer.contains("def Material \"Na_MAT\""));
        assert!(layer.contains("def Material \"Cl_MAT\""));
        assert!(layer.contains("def Material \"Bond_MAT\""));

        assert!(setup.scratch_is_empty());
    }

    #[test]
    fn test_zero_atom_structure_stops_before_packaging() {
        let setup = Setup::new();
        let empty = Structure::new("empty", Lattice::cubic(4.0), vec![]);
        let report = ConversionOrchestrator::new(setup.config()).convert_structure(
            &empty,
            &setup.output(),
            &ConversionOptions::default(),
        );

        assert!(!report.success);
        assert_eq!(report.error_category.as_deref(), Some("GeometryFailure"));
        assert!(!report.step(Step::Mesh).unwrap().success);
        assert!(report.step(Step::Package).is_none());
        assert!(!setup.output().exists());
        assert!(setup.scratch_is_empty());
    }

    #[test]
    fn test_zero_scale_is_geometry_failure() {
        let setup = Setup::new();
        let input = setup.write("nacl.cif", ROCK_SALT);
        let options = ConversionOptions {
            scale_factor: 0.0,
            ..Default::default()
        };
        let report = ConversionOrchestrator::new(setup.config()).convert(&input, &setup.output(), &options);
        assert_eq!(report.error_category.as_deref(), Some("GeometryFailure"));
        assert!(report.step(Step::Package).is_none());
    }

    #[test]
    fn test_parse_failure_lists_every_backend() {
        let setup = Setup::new();
        let input = setup.write("junk.cif", "data_junk\nnothing useful here\n");
        let report = ConversionOrchestrator::new(setup.config()).convert(
            &input,
            &setup.output(),
            &ConversionOptions::default(),
        );

        assert_eq!(report.error_category.as_deref(), Some("ParseFailure"));
        let parse = report.step(Step::Parse).unwrap();
        let backends: Vec<&str> = parse.attempts.iter().map(|a| a.backend.as_str()).collect();
        assert_eq!(backends, vec!["cif", "multi-format", "text-scan"]);
        assert!(report.step(Step::Bonds).is_none());
        assert!(setup.scratch_is_empty());
    }

    #[test]
    fn test_validator_rejects_before_parsing() {
        let setup = Setup::new();
        let input = setup.write("notes.txt", "shopping list\n");
        let report = ConversionOrchestrator::new(setup.config()).convert(
            &input,
            &setup.output(),
            &ConversionOptions::default(),
        );
        assert_eq!(report.error_category.as_deref(), Some("InvalidInput"));
        assert!(report.step(Step::Parse).is_none());

        // 关闭预检后进入解析
        let report = ConversionOrchestrator::new(setup.config())
            .with_validator(None)
            .convert(&input, &setup.output(), &ConversionOptions::default());
        assert_eq!(report.error_category.as_deref(), Some("ParseFailure"));
    }

    #[test]
    fn test_packaging_failure_when_no_backend_left() {
        let setup = Setup::new();
        let input = setup.write("nacl.cif", ROCK_SALT);
        let config = PipelineConfig {
            enable_native: false,
            usdzconvert_program: "no-such-usdzconvert".to_string(),
            enable_usdzconvert: true,
            ..setup.config()
        };
        let report = ConversionOrchestrator::new(config).convert(
            &input,
            &setup.output(),
            &ConversionOptions::default(),
        );

        assert_eq!(report.error_category.as_deref(), Some("PackagingFailure"));
        let package = report.step(Step::Package).unwrap();
        assert_eq!(package.attempts.len(), 1);
        assert_eq!(package.attempts[0].kind, FailureKind::NotFound);
        assert!(setup.scratch_is_empty());
    }

    #[test]
    fn test_preferred_parse_backend_and_report_json() {
        let setup = Setup::new();
        let input = setup.write("nacl.cif", ROCK_SALT);
        let options = ConversionOptions {
            preferred_backend: Some("text-scan".to_string()),
            include_bonds: false,
            ..Default::default()
        };
        let report = ConversionOrchestrator::new(setup.config()).convert(&input, &setup.output(), &options);
        assert!(report.success);
        assert_eq!(report.step(Step::Parse).unwrap().backend.as_deref(), Some("text-scan"));
        assert_eq!(report.stats.bond_count, 0);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"success\": true"));
        assert!(json.contains("\"atomCount\": 2"));
        assert!(json.contains("\"step\": \"package\""));
        assert!(json.contains("\"latticeParameters\""));
        assert!(json.contains("\"density\""));
    }

    struct BrokenSink;
    impl ArtifactSink for BrokenSink {
        fn persist(&self, _: &str, _: &[PathBuf]) -> Result<()> {
            Err(CrystalError::Other("disk full".to_string()))
        }
    }

    #[test]
    fn test_artifact_sink_is_optional_and_non_fatal() {
        let setup = Setup::new();
        let audit = tempfile::tempdir().unwrap();
        let input = setup.write("nacl.cif", ROCK_SALT);

        let report = ConversionOrchestrator::new(setup.config())
            .with_sink(Box::new(DirectoryArtifactSink::new(audit.path())))
            .convert(&input, &setup.output(), &ConversionOptions::default());
        assert!(report.success);
        assert!(audit.path().join("NaCl").join(OBJ_FILE).exists());

        let report = ConversionOrchestrator::new(setup.config())
            .with_sink(Box::new(BrokenSink))
            .convert(&input, &setup.output(), &ConversionOptions::default());
        assert!(report.success);
        assert!(!report.step(Step::Artifacts).unwrap().success);
    }

    #[test]
    fn test_invalid_options_are_reported() {
        let setup = Setup::new();
        let structure = Structure::new("fe", Lattice::cubic(2.9), vec![Site::new("Fe", [0.0; 3])]);
        for sphere_resolution in [1, 46_342] {
            let options = ConversionOptions {
                sphere_resolution,
                ..Default::default()
            };
            let report = ConversionOrchestrator::new(setup.config()).convert_structure(
                &structure,
                &setup.output(),
                &options,
            );
            assert_eq!(report.error_category.as_deref(), Some("InvalidArgument"));
            assert_eq!(report.steps[0].step, Step::Options);
            assert!(report.step(Step::Mesh).is_none());
        }
    }
}
