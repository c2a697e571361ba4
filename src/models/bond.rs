//! # 化学键数据模型
//!
//! ## 依赖关系
//! - 被 `geometry/bonds.rs` 生成
//! - 被 `geometry/mesh.rs` 消费

use serde::{Deserialize, Serialize};

/// 一条化学键：原子 i 与原子 j 的某个周期镜像相连，且 i < j
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub i: usize,
    pub j: usize,
    /// 键长 (Å)
    pub distance: f64,
    /// 原子 j 所在镜像相对原胞的晶格平移
    pub image: [i32; 3],
}

impl Bond {
    /// 是否跨越晶胞边界
    pub fn is_periodic(&self) -> bool {
        self.image != [0, 0, 0]
    }
}
