//! # 外部进程调用
//!
//! 以固定约定调用外部工具：程序 + 参数、工作目录、超时。
//! stdout/stderr 重定向到工作目录下的文件，轮询 `try_wait` 直到退出或超时，
//! 超时后杀死进程。
//!
//! ## 依赖关系
//! - 被 `packaging/external.rs` 使用

use crate::error::{BackendFailure, FailureKind};
use log::debug;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// 报告中保留的 stderr 尾部长度
const STDERR_TAIL_CHARS: usize = 400;

/// 进程结束结果
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub status: ExitStatus,
    pub stderr_tail: String,
    pub elapsed: Duration,
}

/// 运行命令直到结束或超时
///
/// `log_stem` 决定日志文件名：`<workdir>/<log_stem>.stdout.log` / `.stderr.log`。
/// 失败以 [`BackendFailure`] 返回，`backend` 字段填 `backend`。
pub fn run_with_timeout(
    backend: &str,
    program: &str,
    args: &[String],
    workdir: &Path,
    log_stem: &str,
    timeout: Duration,
) -> Result<ProcessOutcome, BackendFailure> {
    let stdout_path = workdir.join(format!("{}.stdout.log", log_stem));
    let stderr_path = workdir.join(format!("{}.stderr.log", log_stem));
    let io_failure = |what: &str, e: std::io::Error| {
        BackendFailure::error(backend, format!("{}: {}", what, e))
    };

    let stdout = File::create(&stdout_path).map_err(|e| io_failure("cannot create stdout log", e))?;
    let stderr = File::create(&stderr_path).map_err(|e| io_failure("cannot create stderr log", e))?;

    debug!("[{}] running {} {}", backend, program, args.join(" "));
    let start = Instant::now();
    let mut child = Command::new(program)
        .args(args)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => BackendFailure::new(
                backend,
                FailureKind::NotFound,
                format!("executable '{}' not found", program),
            ),
            _ => io_failure(&format!("cannot spawn '{}'", program), e),
        })?;

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(BackendFailure::new(
                        backend,
                        FailureKind::Timeout,
                        format!("'{}' did not finish within {}s", program, timeout.as_secs_f64()),
                    ));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                return Err(io_failure("cannot poll child process", e));
            }
        }
    };

    let stderr_tail = tail(&fs::read_to_string(&stderr_path).unwrap_or_default());
    Ok(ProcessOutcome {
        status,
        stderr_tail,
        elapsed: start.elapsed(),
    })
}

/// 字符串末尾最多 [`STDERR_TAIL_CHARS`] 个字符
fn tail(text: &str) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - STDERR_TAIL_CHARS).collect()
}

/// 探测程序是否可以启动（用于状态显示，不影响注册表顺序）
pub fn probe(program: &str, args: &[&str], timeout: Duration) -> bool {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    let mut child = match child {
        Ok(c) => c,
        Err(_) => return false,
    };
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return status.success(),
            Ok(None) if start.elapsed() < timeout => std::thread::sleep(POLL_INTERVAL),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return false;
            }
        }
    }
}
