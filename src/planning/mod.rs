//! 前瞻规划模块
//!
//! 在环境快照上做有界深度的策略模拟，为当前决策细化动作价值。
//! 真实环境只被读取，所有模拟都在副本上进行。

mod config;
mod search;

pub use config::{PlanningConfig, PlanningResult};
pub use search::Planner;
