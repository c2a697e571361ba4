//! # 几何模块
//!
//! 化学键推断和网格生成。
//!
//! ## 依赖关系
//! - 被 `pipeline/orchestrator.rs` 使用
//! - 使用 `models/`
//! - 子模块: bonds, primitives, mesh

pub mod bonds;
pub mod mesh;
pub mod primitives;

pub use bonds::{BondInferencer, DEFAULT_CUTOFF_FACTOR};
pub use mesh::{MeshBuilder, MeshOptions, BOND_MATERIAL, BOND_RADIUS};
