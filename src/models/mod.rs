//! # 数据模型模块
//!
//! 定义晶体结构、化学键、网格和元素数据。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`geometry/`、`materials/`、`packaging/` 使用
//! - 子模块: structure, bond, mesh, elements

pub mod bond;
pub mod elements;
pub mod mesh;
pub mod structure;

pub use bond::Bond;
pub use elements::Rgb;
pub use mesh::{Face, Material, MeshModel, Polygon};
pub use structure::{Lattice, Site, Species, Structure};
