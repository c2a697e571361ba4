//! # 材质模块
//!
//! ## 依赖关系
//! - 被 `pipeline/`、`commands/` 使用
//! - 子模块: standardizer

pub mod standardizer;

pub use standardizer::{MaterialStandardizer, StandardizationReport, BOND_MAT};
