//! # crystal-ar 命令行入口
//!
//! ## 子命令
//! - `convert` - 结构文件 → USDZ（单文件或目录批量）
//! - `standardize` - 标准化 OBJ/MTL 材质
//! - `backends` - 列出解析/打包后端
//!
//! 日志级别取 `RUST_LOG`，未设置时由 `-v`/`-vv` 决定（默认 warn）。

use clap::Parser;
use crystal_ar::cli::Cli;
use crystal_ar::{commands, utils};

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .format_timestamp(None)
        .init();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
