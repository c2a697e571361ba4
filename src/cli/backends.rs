//! # backends 子命令 CLI 定义
//!
//! 后端注册表配置参数，`convert` 与 `backends` 共用。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs`、`cli/convert.rs` 使用
//! - 参数传递给 `commands/backends.rs`

use crate::packaging::external::DEFAULT_DOCKER_IMAGE;
use crate::pipeline::PipelineConfig;
use clap::Args;
use std::path::PathBuf;

/// 打包后端配置
#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// Parent directory for per-conversion scratch workspaces
    #[arg(long, env = "CRYSTAL_AR_TEMP_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// usdzconvert executable
    #[arg(long, env = "CRYSTAL_AR_USDZCONVERT", default_value = "usdzconvert")]
    pub usdzconvert: String,

    /// docker executable
    #[arg(long, default_value = "docker")]
    pub docker: String,

    /// Container image providing usdzconvert
    #[arg(long, env = "CRYSTAL_AR_DOCKER_IMAGE", default_value = DEFAULT_DOCKER_IMAGE)]
    pub docker_image: String,

    /// Disable the in-process USDZ writer
    #[arg(long, default_value_t = false)]
    pub no_native: bool,

    /// Disable the usdzconvert backend
    #[arg(long, default_value_t = false)]
    pub no_usdzconvert: bool,

    /// Disable the docker backend
    #[arg(long, default_value_t = false)]
    pub no_docker: bool,
}

impl BackendArgs {
    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            scratch_root: self.scratch_dir.clone(),
            usdzconvert_program: self.usdzconvert.clone(),
            docker_program: self.docker.clone(),
            docker_image: self.docker_image.clone(),
            enable_native: !self.no_native,
            enable_usdzconvert: !self.no_usdzconvert,
            enable_docker: !self.no_docker,
        }
    }
}

/// backends 子命令参数
#[derive(Args, Debug)]
pub struct BackendsArgs {
    #[command(flatten)]
    pub backends: BackendArgs,

    /// Skip availability probes
    #[arg(long, default_value_t = false)]
    pub no_probe: bool,
}
