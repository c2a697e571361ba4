//! # 转换配置
//!
//! - [`ConversionOptions`]: 每次转换的参数，JSON 键为 camelCase，缺省键取默认值
//! - [`PipelineConfig`]: 后端注册表的静态配置（临时目录、外部工具路径、容器镜像）
//!
//! ## 依赖关系
//! - 被 `pipeline/orchestrator.rs`、`packaging/mod.rs`、`cli/` 使用
//! - 使用 `serde`、`serde_json`

use crate::error::{CrystalError, Result};
use crate::geometry::mesh::MeshOptions;
use crate::geometry::primitives::{
    MAX_BOND_RESOLUTION, MAX_SPHERE_RESOLUTION, MIN_BOND_RESOLUTION, MIN_SPHERE_RESOLUTION,
};
use crate::geometry::DEFAULT_CUTOFF_FACTOR;
use crate::packaging::external::DEFAULT_DOCKER_IMAGE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 外部打包工具默认超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
/// 输入文件大小上限
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 50 * 1024 * 1024;

/// 单次转换参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConversionOptions {
    pub sphere_resolution: u32,
    pub bond_resolution: u32,
    pub include_bonds: bool,
    pub scale_factor: f64,
    /// 解析或打包后端名称；命中的后端被移到注册表最前
    pub preferred_backend: Option<String>,
    pub preserve_original_colors: bool,
    pub bond_cutoff_factor: f64,
    pub timeout_secs: u64,
    pub max_input_bytes: u64,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        ConversionOptions {
            sphere_resolution: 20,
            bond_resolution: 8,
            include_bonds: true,
            scale_factor: 1.0,
            preferred_backend: None,
            preserve_original_colors: false,
            bond_cutoff_factor: DEFAULT_CUTOFF_FACTOR,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl ConversionOptions {
    /// 从 JSON 文件读取
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| CrystalError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let options: ConversionOptions = serde_json::from_str(&content)?;
        Ok(options)
    }

    /// 检查参数范围
    ///
    /// `scaleFactor` 的正负不在这里检查，由网格生成时报告几何失败。
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SPHERE_RESOLUTION..=MAX_SPHERE_RESOLUTION).contains(&self.sphere_resolution) {
            return Err(CrystalError::InvalidArgument(format!(
                "sphereResolution must be between {} and {}, got {}",
                MIN_SPHERE_RESOLUTION, MAX_SPHERE_RESOLUTION, self.sphere_resolution
            )));
        }
        if !(MIN_BOND_RESOLUTION..=MAX_BOND_RESOLUTION).contains(&self.bond_resolution) {
            return Err(CrystalError::InvalidArgument(format!(
                "bondResolution must be between {} and {}, got {}",
                MIN_BOND_RESOLUTION, MAX_BOND_RESOLUTION, self.bond_resolution
            )));
        }
        if !self.scale_factor.is_finite() {
            return Err(CrystalError::InvalidArgument(
                "scaleFactor must be finite".to_string(),
            ));
        }
        if !self.bond_cutoff_factor.is_finite() || self.bond_cutoff_factor <= 0.0 {
            return Err(CrystalError::InvalidArgument(format!(
                "bondCutoffFactor must be positive, got {}",
                self.bond_cutoff_factor
            )));
        }
        if self.timeout_secs == 0 {
            return Err(CrystalError::InvalidArgument(
                "timeoutSecs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn mesh_options(&self) -> MeshOptions {
        MeshOptions {
            sphere_resolution: self.sphere_resolution,
            bond_resolution: self.bond_resolution,
            include_bonds: self.include_bonds,
            scale_factor: self.scale_factor,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 后端注册表配置
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// 临时工作区的父目录；None 使用系统临时目录
    pub scratch_root: Option<PathBuf>,
    pub usdzconvert_program: String,
    pub docker_program: String,
    pub docker_image: String,
    pub enable_native: bool,
    pub enable_usdzconvert: bool,
    pub enable_docker: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            scratch_root: None,
            usdzconvert_program: "usdzconvert".to_string(),
            docker_program: "docker".to_string(),
            docker_image: DEFAULT_DOCKER_IMAGE.to_string(),
            enable_native: true,
            enable_usdzconvert: true,
            enable_docker: true,
        }
    }
}
