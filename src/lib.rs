//! # blocks_mc - 带前瞻规划的蒙特卡洛控制
//!
//! 在积木世界上用采样的 episode 学习动作策略，
//! 可选地在决策前用当前策略做有界深度的模拟来细化动作价值。
//!
//! ## 模块
//! - `game_env`: 环境接口与积木世界实现
//! - `control`: 策略存储 (表格平均 / 线性 SGD) 与 ε-贪心探索
//! - `episode`: episode 数据与生成器
//! - `planning`: 基于环境快照的前瞻规划器
//! - `monte_carlo`: 控制器主循环与每局指标
//! - `trial_log`: 试验结果 CSV 记录
//!
//! ## 使用示例
//! ```rust
//! use blocks_mc::{BlocksWorld, LearnOptions, MonteCarlo, TabularConfig, TabularControl};
//!
//! let env = BlocksWorld::new(3).unwrap();
//! let control = TabularControl::new(TabularConfig::default()).unwrap();
//! let mut mc = MonteCarlo::new(env, control, 7);
//! let options = LearnOptions { number_episodes: 10, ..LearnOptions::default() };
//! let metrics = mc.learn_policy(&options).unwrap();
//! assert_eq!(metrics.len(), 10);
//! ```

pub mod config;
pub mod control;
pub mod episode;
pub mod error;
pub mod game_env;
pub mod monte_carlo;
pub mod planning;
pub mod trial_log;

// 重新导出核心类型，方便外部使用
pub use config::{LearnOptions, TruncationPolicy};
pub use control::{
    ActionDistribution, Control, Exploration, SgdConfig, SgdControl, StepSize, TabularConfig,
    TabularControl, VisitRule,
};
pub use episode::{Episode, EpisodeGenerator, Step, Termination};
pub use error::{
    ConfigurationError, EmptyEpisodeError, EnvError, InvalidStateError, McError,
    NotSimulatableError, PlanningError,
};
pub use game_env::{BlockFeatures, BlockMove, BlocksState, BlocksWorld, Environment, Support};
pub use monte_carlo::{mean_return_ratio, tail_mean_return_ratio, MonteCarlo, TrialMetrics};
pub use planning::{Planner, PlanningConfig, PlanningResult};
pub use trial_log::{TrialLog, TrialRecord};

// 导出常量
pub use game_env::{DEFAULT_BLOCKS, MAX_BLOCKS, MIN_BLOCKS};
