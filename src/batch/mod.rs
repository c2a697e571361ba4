//! # 批量处理模块
//!
//! 目录输入时批量转换结构文件。每个文件是独立的流水线实例，
//! 拥有自己的临时工作区，可以并行执行。
//!
//! ## 功能
//! - 收集匹配文件列表（glob 模式，可递归）
//! - 并行处理
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchResult, BatchRunner, ProcessResult};
