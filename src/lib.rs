//! # crystal-ar - 晶体结构 AR 资产转换
//!
//! 把周期性晶体结构文件（CIF、POSCAR、.cell、.res）转换为可在 AR 查看器中
//! 打开的 USDZ 资产。
//!
//! ## 流水线
//! ```text
//! 文件字节 → StructureParser → Structure
//!          → BondInferencer → Vec<Bond>
//!          → MeshBuilder → MeshModel
//!          → MaterialStandardizer → 标准化 MeshModel
//!          → PackageConverter → .usdz
//! ```
//! `ConversionOrchestrator` 串联以上步骤并生成 `ConversionReport`。
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── pipeline/   (编排器、配置、临时工作区)
//!   │     ├── parsers/    (结构解析后端)
//!   │     ├── geometry/   (化学键、网格)
//!   │     ├── materials/  (材质标准化)
//!   │     └── packaging/  (OBJ/USDA/USDZ 与打包后端)
//!   ├── models/     (数据模型)
//!   ├── batch/      (批量并行转换)
//!   ├── cli/ commands/ utils/  (命令行前端)
//!   └── error.rs    (错误处理)
//! ```

pub mod batch;
pub mod cli;
pub mod commands;
pub mod error;
pub mod geometry;
pub mod materials;
pub mod models;
pub mod packaging;
pub mod parsers;
pub mod pipeline;
pub mod utils;

pub use error::{BackendFailure, CrystalError, FailureKind, Result};
pub use pipeline::{ConversionOptions, ConversionOrchestrator, ConversionReport, PipelineConfig};
