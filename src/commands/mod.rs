//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `pipeline/`, `batch/`, `utils/`
//! - 子模块: convert, standardize, backends

pub mod backends;
pub mod convert;
pub mod standardize;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Convert(args) => convert::execute(args),
        Commands::Standardize(args) => standardize::execute(args),
        Commands::Backends(args) => backends::execute(args),
    }
}
