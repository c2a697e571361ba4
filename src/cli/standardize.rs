//! # standardize 子命令 CLI 定义
//!
//! 标准化外部工具生成的 OBJ/MTL 材质
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/standardize.rs`

use clap::Args;
use std::path::PathBuf;

/// standardize 子命令参数
#[derive(Args, Debug)]
pub struct StandardizeArgs {
    /// OBJ file to standardize
    pub obj: PathBuf,

    /// MTL file (default: the mtllib referenced by the OBJ)
    #[arg(long)]
    pub mtl: Option<PathBuf>,

    /// Write to this OBJ instead of overwriting the input (MTL next to it)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep the original colors, only rename materials
    #[arg(long, default_value_t = false)]
    pub preserve_colors: bool,
}
