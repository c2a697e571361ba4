//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `convert`: 结构文件 → USDZ（单文件或目录）
//! - `standardize`: 原地标准化 OBJ + MTL 的材质
//! - `backends`: 列出解析/打包后端及可用性
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: convert, standardize, backends

pub mod backends;
pub mod convert;
pub mod standardize;

use clap::{Parser, Subcommand};

/// crystal-ar - 晶体结构 AR 资产转换器
#[derive(Parser)]
#[command(name = "crystal-ar")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Convert crystal structure files into USDZ assets for AR viewers", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// `RUST_LOG` 未设置时使用的日志级别
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Convert structure files (.cif, POSCAR, .cell, .res) to USDZ
    Convert(convert::ConvertArgs),

    /// Standardize material names and colors of an OBJ/MTL pair in place
    Standardize(standardize::StandardizeArgs),

    /// List parsing and packaging backends with availability
    Backends(backends::BackendsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        let cli = Cli::parse_from(["crystal-ar", "-vv", "backends"]);
        assert_eq!(cli.log_level(), "debug");
        let cli = Cli::parse_from(["crystal-ar", "backends"]);
        assert_eq!(cli.log_level(), "warn");
    }
}
