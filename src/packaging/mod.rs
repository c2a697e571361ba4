//! # 打包模块
//!
//! 把标准化后的 [`MeshModel`] 打包为 USDZ。多个打包后端按固定顺序尝试：
//!
//! 1. `native`：进程内生成 USDA 并写入 USDZ 容器
//! 2. `usdzconvert`：调用 Apple usdzconvert 命令行工具
//! 3. `docker`：在容器中运行 usdzconvert
//!
//! 网格先写成 OBJ/MTL 中间文件放在工作目录，外部工具读取它们；
//! 中间文件写入失败只记为需要它们的后端的失败。
//! 每个后端写到自己的暂存文件；只有存在且非空的暂存文件才算成功，
//! 然后复制到最终输出路径，复制失败也记为该后端的失败。
//! 任何后端的错误、panic、非零退出码、超时、缺失或空输出都被记录，
//! 不会中断后续尝试。
//!
//! ## 依赖关系
//! - 被 `pipeline/orchestrator.rs` 使用
//! - 使用 `models/mesh.rs`、`pipeline/options.rs`
//! - 子模块: obj, usda, usdz, native, external, process

pub mod external;
pub mod native;
pub mod obj;
pub mod process;
pub mod usda;
pub mod usdz;

use crate::error::{panic_message, BackendFailure, CrystalError, FailureKind, Result};
use crate::models::MeshModel;
use crate::pipeline::PipelineConfig;
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use external::ExternalToolBackend;
pub use native::NativeBackend;

/// 中间 OBJ 文件名
pub const OBJ_FILE: &str = "crystal.obj";
/// 中间 MTL 文件名
pub const MTL_FILE: &str = "crystal.mtl";

/// 单个打包后端的输入
#[derive(Debug, Clone, Copy)]
pub struct PackageInput<'a> {
    pub mesh: &'a MeshModel,
    /// 工作目录（外部工具在其中运行）
    pub workdir: &'a Path,
    pub obj_path: &'a Path,
    pub mtl_path: &'a Path,
    /// 本后端的暂存输出路径
    pub output: &'a Path,
    /// 外部进程超时
    pub timeout: Duration,
}

/// 打包后端统一接口
pub trait PackagingBackend: Send + Sync {
    fn name(&self) -> &str;

    /// 生成 `input.output`；返回 Ok 后仍会检查文件是否存在且非空
    fn attempt(&self, input: &PackageInput<'_>) -> std::result::Result<(), BackendFailure>;

    /// 后端是否看起来可用（仅用于状态显示）
    fn probe(&self) -> bool {
        true
    }

    /// 是否读取 OBJ/MTL 中间文件
    fn needs_handoff(&self) -> bool {
        true
    }
}

/// 打包结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    /// 产出最终文件的后端
    pub backend: String,
    /// 之前失败的尝试
    pub attempts: Vec<BackendFailure>,
    pub vertex_count: usize,
    pub face_count: usize,
    /// 输出文件字节数
    pub file_size: u64,
}

/// 按顺序尝试打包后端
pub struct PackageConverter {
    backends: Vec<Box<dyn PackagingBackend>>,
    timeout: Duration,
}

impl PackageConverter {
    pub fn new(backends: Vec<Box<dyn PackagingBackend>>, timeout: Duration) -> Self {
        PackageConverter { backends, timeout }
    }

    /// 按配置建立注册表：native → usdzconvert → docker（跳过被禁用的）
    pub fn from_config(config: &PipelineConfig, timeout: Duration) -> Self {
        let mut backends: Vec<Box<dyn PackagingBackend>> = Vec::new();
        if config.enable_native {
            backends.push(Box::new(NativeBackend));
        }
        if config.enable_usdzconvert {
            backends.push(Box::new(ExternalToolBackend::usdzconvert(
                &config.usdzconvert_program,
            )));
        }
        if config.enable_docker {
            backends.push(Box::new(ExternalToolBackend::docker(
                &config.docker_program,
                &config.docker_image,
            )));
        }
        Self::new(backends, timeout)
    }

    /// 将指定后端移到最前；名称未知时保持原顺序
    pub fn with_preferred(mut self, preferred: Option<&str>) -> Self {
        if let Some(name) = preferred {
            match self.backends.iter().position(|b| b.name() == name) {
                Some(idx) => {
                    let backend = self.backends.remove(idx);
                    self.backends.insert(0, backend);
                }
                None => debug!("'{}' is not a packaging backend, keeping default order", name),
            }
        }
        self
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// (名称, 是否可用) 列表，按注册顺序
    pub fn probe_all(&self) -> Vec<(String, bool)> {
        self.backends
            .iter()
            .map(|b| (b.name().to_string(), b.probe()))
            .collect()
    }

    /// 打包网格到 `output`，中间文件写在 `workdir`
    pub fn convert(&self, mesh: &MeshModel, output: &Path, workdir: &Path) -> Result<PackageInfo> {
        let obj_path = workdir.join(OBJ_FILE);
        let mtl_path = workdir.join(MTL_FILE);
        let handoff = obj::write_obj(mesh, &obj_path, &mtl_path).map_err(|e| e.to_string());
        if let Err(reason) = &handoff {
            warn!("intermediate OBJ/MTL not written: {}", reason);
        }

        let mut failures: Vec<BackendFailure> = Vec::new();

        for backend in &self.backends {
            let name = backend.name().to_string();
            if let (Err(reason), true) = (&handoff, backend.needs_handoff()) {
                let failure = BackendFailure::error(
                    &name,
                    format!("intermediate OBJ/MTL unavailable: {}", reason),
                );
                warn!("packaging backend failed: {}", failure);
                failures.push(failure);
                continue;
            }
            let staging = staging_path(workdir, &name);
            let input = PackageInput {
                mesh,
                workdir,
                obj_path: &obj_path,
                mtl_path: &mtl_path,
                output: &staging,
                timeout: self.timeout,
            };
            debug!("trying packaging backend '{}'", name);

            let result = catch_unwind(AssertUnwindSafe(|| backend.attempt(&input)));
            let outcome = match result {
                Ok(Ok(())) => check_output(&name, &staging),
                Ok(Err(failure)) => Err(failure),
                Err(payload) => Err(BackendFailure::new(
                    &name,
                    FailureKind::Panicked,
                    panic_message(payload.as_ref()),
                )),
            };

            let published = outcome.and_then(|_| {
                publish(&staging, output).map_err(|e| BackendFailure::error(&name, e.to_string()))
            });
            match published {
                Ok(file_size) => {
                    info!(
                        "packaged {} with backend '{}' ({} bytes)",
                        output.display(),
                        name,
                        file_size
                    );
                    return Ok(PackageInfo {
                        backend: name,
                        attempts: failures,
                        vertex_count: mesh.vertex_count(),
                        face_count: mesh.face_count(),
                        file_size,
                    });
                }
                Err(failure) => {
                    warn!("packaging backend failed: {}", failure);
                    failures.push(failure);
                }
            }
        }

        Err(CrystalError::PackagingFailure { attempts: failures })
    }
}

fn staging_path(workdir: &Path, backend: &str) -> PathBuf {
    let safe: String = backend
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    workdir.join(format!("{}-output.usdz", safe))
}

/// 暂存文件必须存在且非空
fn check_output(backend: &str, staging: &Path) -> std::result::Result<u64, BackendFailure> {
    match fs::metadata(staging) {
        Ok(meta) if meta.len() > 0 => Ok(meta.len()),
        Ok(_) => Err(BackendFailure::new(
            backend,
            FailureKind::EmptyOutput,
            format!("{} is empty", staging.display()),
        )),
        Err(_) => Err(BackendFailure::new(
            backend,
            FailureKind::MissingOutput,
            format!("{} was not created", staging.display()),
        )),
    }
}

/// 复制暂存文件到最终路径，返回字节数
fn publish(staging: &Path, output: &Path) -> Result<u64> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CrystalError::FileWriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    fs::copy(staging, output).map_err(|e| CrystalError::FileWriteError {
        path: output.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Face, Polygon};
    use std::fs::File;
    use zip::ZipArchive;

    struct Failing;
    impl PackagingBackend for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn attempt(&self, _: &PackageInput<'_>) -> std::result::Result<(), BackendFailure> {
            Err(BackendFailure::error("failing", "forced failure"))
        }
    }

    struct Panicking;
    impl PackagingBackend for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }
        fn attempt(&self, _: &PackageInput<'_>) -> std::result::Result<(), BackendFailure> {
            panic!("boom")
        }
    }

    /// 声称成功但什么也不写
    struct Silent;
    impl PackagingBackend for Silent {
        fn name(&self) -> &str {
            "silent"
        }
        fn attempt(&self, _: &PackageInput<'_>) -> std::result::Result<(), BackendFailure> {
            Ok(())
        }
    }

    /// 写出空文件
    struct EmptyWriter;
    impl PackagingBackend for EmptyWriter {
        fn name(&self) -> &str {
            "empty"
        }
        fn attempt(&self, input: &PackageInput<'_>) -> std::result::Result<(), BackendFailure> {
            File::create(input.output)
                .map(|_| ())
                .map_err(|e| BackendFailure::error("empty", e.to_string()))
        }
    }

    fn triangle() -> MeshModel {
        let mut mesh = MeshModel::new();
        mesh.push_vertices([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).unwrap();
        let m = mesh.ensure_material("C_MAT", "C", [0.565, 0.565, 0.565]);
        mesh.faces.push(Face {
            polygon: Polygon::Tri([0, 1, 2]),
            material: m,
        });
        mesh
    }

    #[test]
    fn test_falls_back_to_second_backend() {
        let work = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("nested").join("out.usdz");

        let converter = PackageConverter::new(
            vec![Box::new(Failing), Box::new(NativeBackend)],
            Duration::from_secs(5),
        );
        let info = converter.convert(&triangle(), &output, work.path()).unwrap();

        assert_eq!(info.backend, "native");
        assert_eq!(info.attempts.len(), 1);
        assert_eq!(info.attempts[0].backend, "failing");
        assert_eq!(info.attempts[0].kind, FailureKind::Error);
        assert_eq!(info.vertex_count, 3);
        assert_eq!(info.face_count, 1);
        assert_eq!(info.file_size, fs::metadata(&output).unwrap().len());

        let mut archive = ZipArchive::new(File::open(&output).unwrap()).unwrap();
        assert_eq!(archive.by_index(0).unwrap().name(), usda::LAYER_NAME);
        assert!(work.path().join(OBJ_FILE).exists());
    }

    #[test]
    fn test_missing_empty_and_panicking_outputs_are_failures() {
        let work = tempfile::tempdir().unwrap();
        let output = work.path().join("final.usdz");
        let converter = PackageConverter::new(
            vec![Box::new(Panicking), Box::new(Silent), Box::new(EmptyWriter)],
            Duration::from_secs(5),
        );
        let err = converter.convert(&triangle(), &output, work.path()).unwrap_err();

        let kinds: Vec<_> = err.attempts().iter().map(|a| a.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![FailureKind::Panicked, FailureKind::MissingOutput, FailureKind::EmptyOutput]
        );
        assert_eq!(err.category(), "PackagingFailure");
        assert!(!output.exists());
    }

    #[test]
    fn test_preferred_and_config_order() {
        let mut config = PipelineConfig::default();
        let converter = PackageConverter::from_config(&config, Duration::from_secs(1));
        assert_eq!(converter.backend_names(), vec!["native", "usdzconvert", "docker"]);

        let converter = converter.with_preferred(Some("docker"));
        assert_eq!(converter.backend_names(), vec!["docker", "native", "usdzconvert"]);

        config.enable_native = false;
        let converter = PackageConverter::from_config(&config, Duration::from_secs(1));
        assert_eq!(converter.backend_names(), vec!["usdzconvert", "docker"]);
    }

    /// 读取中间 OBJ 并原样复制为输出
    struct ObjCopier;
    impl PackagingBackend for ObjCopier {
        fn name(&self) -> &str {
            "obj-copier"
        }
        fn attempt(&self, input: &PackageInput<'_>) -> std::result::Result<(), BackendFailure> {
            fs::copy(input.obj_path, input.output)
                .map(|_| ())
                .map_err(|e| BackendFailure::error("obj-copier", e.to_string()))
        }
    }

    #[test]
    fn test_unwritable_handoff_only_fails_backends_that_read_it() {
        let work = tempfile::tempdir().unwrap();
        // 同名目录占住 OBJ 路径，写中间文件必然失败
        fs::create_dir(work.path().join(OBJ_FILE)).unwrap();
        let output = work.path().join("final.usdz");

        let converter = PackageConverter::new(
            vec![Box::new(ObjCopier), Box::new(NativeBackend)],
            Duration::from_secs(5),
        );
        let info = converter.convert(&triangle(), &output, work.path()).unwrap();

        assert_eq!(info.backend, "native");
        assert_eq!(info.attempts.len(), 1);
        assert_eq!(info.attempts[0].backend, "obj-copier");
        assert!(info.attempts[0].reason.contains("intermediate OBJ/MTL"));
        assert!(output.is_file());
    }

    #[test]
    fn test_failed_publish_is_recorded_as_packaging_failure() {
        let work = tempfile::tempdir().unwrap();
        let blocker = work.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();
        let output = blocker.join("out.usdz");

        let converter = PackageConverter::new(vec![Box::new(NativeBackend)], Duration::from_secs(5));
        let err = converter.convert(&triangle(), &output, work.path()).unwrap_err();

        assert_eq!(err.category(), "PackagingFailure");
        assert_eq!(err.attempts().len(), 1);
        assert_eq!(err.attempts()[0].backend, "native");
        assert_eq!(err.attempts()[0].kind, FailureKind::Error);
    }

    #[test]
    fn test_probe_all_keeps_registry_order() {
        let converter = PackageConverter::new(
            vec![
                Box::new(NativeBackend),
                Box::new(ExternalToolBackend::usdzconvert("crystal-ar-no-such-tool")),
            ],
            Duration::from_secs(1),
        );
        let status = converter.probe_all();
        assert_eq!(
            status,
            vec![
                ("native".to_string(), true),
                ("usdzconvert".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_no_backends_is_packaging_failure() {
        let work = tempfile::tempdir().unwrap();
        let converter = PackageConverter::new(vec![], Duration::from_secs(1));
        let err = converter
            .convert(&triangle(), &work.path().join("x.usdz"), work.path())
            .unwrap_err();
        assert!(matches!(err, CrystalError::PackagingFailure { .. }));
        assert!(err.attempts().is_empty());
    }
}
