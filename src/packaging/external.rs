//! # 外部工具打包后端
//!
//! 以参数模板调用命令行工具，把中间 OBJ 转为 USDZ。
//!
//! 模板占位符：
//! - `{input}` / `{output}`：OBJ 与暂存输出的完整路径
//! - `{workdir}`：工作目录
//! - `{input_name}` / `{input_stem}` / `{output_name}`：文件名部分
//!
//! 两个预置后端：
//! - `usdzconvert`: `usdzconvert {input} {output}`
//! - `docker`: `docker run --rm -v {workdir}:/workspace -w /workspace <image> {input_name}`，
//!   工具在挂载目录中写出 `{input_stem}.usdz`，随后移动到暂存输出
//!
//! ## 依赖关系
//! - 被 `packaging/mod.rs` 注册
//! - 使用 `packaging/process.rs`

use super::process::{probe, run_with_timeout};
use super::{PackageInput, PackagingBackend};
use crate::error::{BackendFailure, FailureKind};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// usdzconvert 的容器镜像
pub const DEFAULT_DOCKER_IMAGE: &str = "michaelgold/usdzconvert:0.66-usd-22.05b";

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// 以命令模板描述的外部工具后端
#[derive(Debug, Clone)]
pub struct ExternalToolBackend {
    name: String,
    program: String,
    args: Vec<String>,
    /// 工具实际写出的文件（模板）；None 表示工具直接写 `{output}`
    produced: Option<String>,
    probe_args: Vec<String>,
}

impl ExternalToolBackend {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: &[&str]) -> Self {
        ExternalToolBackend {
            name: name.into(),
            program: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
            produced: None,
            probe_args: vec!["--help".to_string()],
        }
    }

    /// 工具把结果写到别处时，指定其路径模板
    pub fn with_produced(mut self, template: impl Into<String>) -> Self {
        self.produced = Some(template.into());
        self
    }

    pub fn with_probe_args(mut self, args: &[&str]) -> Self {
        self.probe_args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Apple usdzconvert
    pub fn usdzconvert(program: &str) -> Self {
        Self::new("usdzconvert", program, &["{input}", "{output}"])
    }

    /// 容器中的 usdzconvert
    pub fn docker(program: &str, image: &str) -> Self {
        Self::new(
            "docker",
            program,
            &["run", "--rm", "-v", "{workdir}:/workspace", "-w", "/workspace", image, "{input_name}"],
        )
        .with_produced("{workdir}/{input_stem}.usdz")
        .with_probe_args(&["--version"])
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn expand(template: &str, input: &PackageInput<'_>) -> String {
        let file_part = |p: &Path| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        let stem = input
            .obj_path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        template
            .replace("{input_name}", &file_part(input.obj_path))
            .replace("{input_stem}", &stem)
            .replace("{output_name}", &file_part(input.output))
            .replace("{input}", &input.obj_path.display().to_string())
            .replace("{output}", &input.output.display().to_string())
            .replace("{workdir}", &input.workdir.display().to_string())
    }
}

impl PackagingBackend for ExternalToolBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn attempt(&self, input: &PackageInput<'_>) -> Result<(), BackendFailure> {
        let args: Vec<String> = self.args.iter().map(|a| Self::expand(a, input)).collect();
        let outcome = run_with_timeout(
            &self.name,
            &self.program,
            &args,
            input.workdir,
            &self.name,
            input.timeout,
        )?;

        if !outcome.status.success() {
            let detail = if outcome.stderr_tail.is_empty() {
                "no diagnostic output".to_string()
            } else {
                outcome.stderr_tail
            };
            return Err(BackendFailure::new(
                &self.name,
                FailureKind::NonZeroExit(outcome.status.code()),
                format!("'{}' failed: {}", self.program, detail),
            ));
        }
        debug!(
            "[{}] finished in {:.2}s",
            self.name,
            outcome.elapsed.as_secs_f64()
        );

        if let Some(template) = &self.produced {
            let produced = PathBuf::from(Self::expand(template, input));
            if produced != input.output {
                if !produced.exists() {
                    return Err(BackendFailure::new(
                        &self.name,
                        FailureKind::MissingOutput,
                        format!("{} was not created", produced.display()),
                    ));
                }
                fs::rename(&produced, input.output)
                    .or_else(|_| fs::copy(&produced, input.output).map(|_| ()))
                    .map_err(|e| {
                        BackendFailure::error(
                            &self.name,
                            format!("cannot move {}: {}", produced.display(), e),
                        )
                    })?;
            }
        }
        Ok(())
    }

    fn probe(&self) -> bool {
        let args: Vec<&str> = self.probe_args.iter().map(String::as_str).collect();
        probe(&self.program, &args, PROBE_TIMEOUT)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::models::MeshModel;

    struct Fixture {
        dir: tempfile::TempDir,
        mesh: MeshModel,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("crystal.obj"), "v 0 0 0\n").unwrap();
            Fixture {
                dir,
                mesh: MeshModel::new(),
            }
        }

        fn run(&self, backend: &ExternalToolBackend, timeout: Duration) -> Result<(), BackendFailure> {
            let obj = self.dir.path().join("crystal.obj");
            let mtl = self.dir.path().join("crystal.mtl");
            let output = self.dir.path().join("staging.usdz");
            let input = PackageInput {
                mesh: &self.mesh,
                workdir: self.dir.path(),
                obj_path: &obj,
                mtl_path: &mtl,
                output: &output,
                timeout,
            };
            backend.attempt(&input)
        }

        fn output(&self) -> PathBuf {
            self.dir.path().join("staging.usdz")
        }
    }

    #[test]
    fn test_direct_output_tool() {
        let fx = Fixture::new();
        let backend = ExternalToolBackend::new("copy", "sh", &["-c", "cp \"$0\" \"$1\"", "{input}", "{output}"]);
        fx.run(&backend, Duration::from_secs(10)).unwrap();
        assert_eq!(fs::read_to_string(fx.output()).unwrap(), "v 0 0 0\n");
    }

    #[test]
    fn test_produced_file_is_moved_to_output() {
        let fx = Fixture::new();
        let backend = ExternalToolBackend::new("stem", "sh", &["-c", "echo pkg > \"$0\".usdz", "{input_stem}"])
            .with_produced("{workdir}/{input_stem}.usdz");
        fx.run(&backend, Duration::from_secs(10)).unwrap();
        assert_eq!(fs::read_to_string(fx.output()).unwrap(), "pkg\n");
        assert!(!fx.dir.path().join("crystal.usdz").exists());
    }

    #[test]
    fn test_non_zero_exit_carries_stderr() {
        let fx = Fixture::new();
        let backend = ExternalToolBackend::new("bad", "sh", &["-c", "echo 'no USD libs' >&2; exit 3"]);
        let err = fx.run(&backend, Duration::from_secs(10)).unwrap_err();
        assert_eq!(err.kind, FailureKind::NonZeroExit(Some(3)));
        assert!(err.reason.contains("no USD libs"));
    }

    #[test]
    fn test_timeout_and_missing_tool() {
        let fx = Fixture::new();
        let slow = ExternalToolBackend::new("slow", "sh", &["-c", "sleep 5"]);
        let err = fx.run(&slow, Duration::from_millis(200)).unwrap_err();
        assert_eq!(err.kind, FailureKind::Timeout);

        let ghost = ExternalToolBackend::usdzconvert("no-such-usdzconvert-binary");
        let err = fx.run(&ghost, Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.kind, FailureKind::NotFound);
        assert!(!ghost.probe());
    }

    #[test]
    fn test_missing_produced_file() {
        let fx = Fixture::new();
        let backend = ExternalToolBackend::new("quiet", "sh", &["-c", "true"])
            .with_produced("{workdir}/{input_stem}.usdz");
        let err = fx.run(&backend, Duration::from_secs(10)).unwrap_err();
        assert_eq!(err.kind, FailureKind::MissingOutput);
    }

    #[test]
    fn test_docker_template_expansion() {
        let fx = Fixture::new();
        let backend = ExternalToolBackend::docker("docker", DEFAULT_DOCKER_IMAGE);
        let obj = fx.dir.path().join("crystal.obj");
        let input = PackageInput {
            mesh: &fx.mesh,
            workdir: fx.dir.path(),
            obj_path: &obj,
            mtl_path: &obj,
            output: &obj,
            timeout: Duration::from_secs(1),
        };
        let args: Vec<String> = backend.args.iter().map(|a| ExternalToolBackend::expand(a, &input)).collect();
        assert_eq!(args[3], format!("{}:/workspace", fx.dir.path().display()));
        assert_eq!(args[6], DEFAULT_DOCKER_IMAGE);
        assert_eq!(args[7], "crystal.obj");
    }
}
