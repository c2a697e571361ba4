//! # 统一错误处理模块
//!
//! 定义 crystal-ar 的所有错误类型，使用 `thiserror` 派生。
//!
//! 转换流水线中的四类失败：
//! - `ParseFailure`: 所有结构解析后端都失败
//! - `GeometryFailure`: 几何生成失败（零原子、非法缩放因子）
//! - `PackagingFailure`: 所有打包后端都失败
//! - `ResourceFailure`: 临时工作区创建/清理失败
//!
//! 单个后端的失败用 [`BackendFailure`] 记录，不直接作为错误传播。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// crystal-ar 统一错误类型
#[derive(Error, Debug)]
pub enum CrystalError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 单一格式解析错误（由解析后端转换为 BackendFailure）
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file '{path}': {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 流水线错误
    // ─────────────────────────────────────────────────────────────
    #[error("Structure parsing failed after {} backend attempt(s): {}", .attempts.len(), summarize(.attempts))]
    ParseFailure { attempts: Vec<BackendFailure> },

    #[error("Geometry generation failed: {0}")]
    GeometryFailure(String),

    #[error("Packaging failed after {} backend attempt(s): {}", .attempts.len(), summarize(.attempts))]
    PackagingFailure { attempts: Vec<BackendFailure> },

    #[error("Scratch workspace error at {path}: {reason}")]
    ResourceFailure { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 输入与参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 序列化错误
    // ─────────────────────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, CrystalError>;

impl CrystalError {
    /// 错误所属的失败类别，用于报告
    pub fn category(&self) -> &'static str {
        match self {
            CrystalError::ParseFailure { .. } | CrystalError::ParseError { .. } => "ParseFailure",
            CrystalError::GeometryFailure(_) => "GeometryFailure",
            CrystalError::PackagingFailure { .. } => "PackagingFailure",
            CrystalError::ResourceFailure { .. } => "ResourceFailure",
            CrystalError::InvalidInput(_)
            | CrystalError::FileNotFound { .. }
            | CrystalError::Json(_) => "InvalidInput",
            CrystalError::InvalidArgument(_) => "InvalidArgument",
            _ => "IoFailure",
        }
    }

    /// 附带的后端尝试记录（仅解析/打包失败有）
    pub fn attempts(&self) -> &[BackendFailure] {
        match self {
            CrystalError::ParseFailure { attempts } | CrystalError::PackagingFailure { attempts } => {
                attempts
            }
            _ => &[],
        }
    }
}

/// 后端失败的具体类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "code")]
pub enum FailureKind {
    /// 后端返回了错误
    Error,
    /// 后端内部 panic
    Panicked,
    /// 外部进程退出码非零
    NonZeroExit(Option<i32>),
    /// 外部进程超时
    Timeout,
    /// 后端声称成功但输出文件不存在
    MissingOutput,
    /// 输出文件大小为零
    EmptyOutput,
    /// 可执行文件不存在
    NotFound,
    /// 结果不合法（如零原子、退化晶格）
    Malformed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Error => write!(f, "error"),
            FailureKind::Panicked => write!(f, "panicked"),
            FailureKind::NonZeroExit(Some(code)) => write!(f, "exit code {}", code),
            FailureKind::NonZeroExit(None) => write!(f, "killed by signal"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::MissingOutput => write!(f, "missing output"),
            FailureKind::EmptyOutput => write!(f, "empty output"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::Malformed => write!(f, "malformed result"),
        }
    }
}

/// 单个后端尝试的失败记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFailure {
    /// 后端名称
    pub backend: String,
    /// 失败类型
    pub kind: FailureKind,
    /// 人类可读的原因
    pub reason: String,
}

impl BackendFailure {
    pub fn new(backend: impl Into<String>, kind: FailureKind, reason: impl Into<String>) -> Self {
        BackendFailure {
            backend: backend.into(),
            kind,
            reason: reason.into(),
        }
    }

    /// 普通错误
    pub fn error(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(backend, FailureKind::Error, reason)
    }
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.backend, self.kind, self.reason)
    }
}

fn summarize(attempts: &[BackendFailure]) -> String {
    if attempts.is_empty() {
        return "no backend configured".to_string();
    }
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// 从 panic 负载中提取消息
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_lists_every_attempt() {
        let err = CrystalError::ParseFailure {
            attempts: vec![
                BackendFailure::error("cif", "no cell"),
                BackendFailure::new("text-scan", FailureKind::Malformed, "zero sites"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 backend attempt(s)"));
        assert!(msg.contains("cif (error): no cell"));
        assert!(msg.contains("text-scan (malformed result): zero sites"));
        assert_eq!(err.category(), "ParseFailure");
        assert_eq!(err.attempts().len(), 2);
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::NonZeroExit(Some(3)).to_string(), "exit code 3");
        assert_eq!(FailureKind::Timeout.to_string(), "timeout");
    }

    #[test]
    fn test_panic_message_downcast() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
