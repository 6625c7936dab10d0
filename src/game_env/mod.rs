// ==============================================================================
// --- 模块声明 ---
// ==============================================================================

pub mod board;
pub mod constants;
pub mod env;
pub mod features;
pub mod rules;
pub mod solver;
pub mod types;

#[cfg(test)]
pub mod corridor;

// ==============================================================================
// --- 公共 API 重导出 ---
// ==============================================================================

// 从 constants.rs 导出所有常量
pub use constants::*;

// 环境接口
pub use env::{Environment, StepResult};

// 从 types.rs 导出所有数据类型
pub use types::{Block, BlockMove, BlocksState, Support};

// 从 board.rs 导出主要的环境结构体
pub use board::BlocksWorld;

// 最优步数表及其全局缓存
pub use solver::{distance_table, DistanceTable};

// 梯度控制使用的线性特征
pub use features::BlockFeatures;
