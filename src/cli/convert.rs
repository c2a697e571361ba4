//! # convert 子命令 CLI 定义
//!
//! 结构文件 → USDZ。输入为目录时批量并行转换。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/convert.rs`

use super::backends::BackendArgs;
use clap::Args;
use std::path::PathBuf;

/// convert 子命令参数
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input structure file or directory
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output .usdz file, or output directory for directory input
    #[arg(short, long)]
    pub output: PathBuf,

    /// JSON file with conversion options (camelCase keys)
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// Latitude rings per atom sphere
    #[arg(long)]
    pub sphere_resolution: Option<u32>,

    /// Radial segments per bond cylinder
    #[arg(long)]
    pub bond_resolution: Option<u32>,

    /// Do not draw bonds
    #[arg(long, default_value_t = false)]
    pub no_bonds: bool,

    /// Global scale factor for positions and radii
    #[arg(long)]
    pub scale: Option<f64>,

    /// Bond cutoff factor applied to the covalent radius sum
    #[arg(long)]
    pub cutoff: Option<f64>,

    /// Parsing or packaging backend to try first
    #[arg(long)]
    pub backend: Option<String>,

    /// Keep original material colors (only rename)
    #[arg(long, default_value_t = false)]
    pub preserve_colors: bool,

    /// Timeout for external packaging tools (seconds)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Skip the input signature check
    #[arg(long, default_value_t = false)]
    pub no_validate: bool,

    /// Copy intermediate OBJ/MTL files into this directory
    #[arg(long)]
    pub keep_artifacts: Option<PathBuf>,

    /// Write the conversion report(s) as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write a CSV summary (directory input)
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Glob pattern(s) for input files, comma separated
    #[arg(short, long, default_value = "*.cif")]
    pub pattern: String,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    #[command(flatten)]
    pub backends: BackendArgs,
}
