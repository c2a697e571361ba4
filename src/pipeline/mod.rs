//! # 转换流水线
//!
//! 结构文件 → USDZ 的编排层：配置、临时工作区、外部协作者和编排器。
//!
//! ## 依赖关系
//! - 被 `commands/`、`batch/` 使用
//! - 子模块: options, workspace, collaborators, orchestrator

pub mod collaborators;
pub mod options;
pub mod orchestrator;
pub mod workspace;

pub use collaborators::{ArtifactSink, CifSignatureValidator, DirectoryArtifactSink, InputValidator};
pub use options::{ConversionOptions, PipelineConfig};
pub use orchestrator::{ConversionOrchestrator, ConversionReport, ConversionStats, Step, StepReport};
pub use workspace::ScratchWorkspace;
