// config.rs - 学习选项模块
//
// learn_policy 的全部选项，可从 JSON 读取，缺省字段使用默认值。

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigurationError;
use crate::planning::PlanningConfig;

// ================ 截断处理 ================

/// 被截断 (未到达终局) 的 episode 在回报比中的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// 回报比直接记为 0
    #[default]
    ZeroRatio,
    /// 不计算回报比
    Exclude,
}

// ================ 学习选项 ================

/// `learn_policy` 的选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnOptions {
    /// 折扣率 γ ∈ (0, 1]
    pub discount_rate: f64,
    pub number_episodes: usize,
    /// 每次决策调用规划器的概率 ∈ [0, 1]
    pub planning_factor: f64,
    /// 从未访问过的状态是否也调用规划器
    pub plan_on_empty_policy: bool,
    pub planning_horizon: usize,
    /// 单局最大步数，超过即截断
    pub max_episode_length: usize,
    /// 每个候选动作的模拟次数
    pub planning_rollouts: usize,
    /// 模拟在视界处截断时加上叶子状态的贪心价值 (默认关闭，只累加模拟回报)
    pub bootstrap_planning: bool,
    pub truncation: TruncationPolicy,
    /// 每隔多少局输出一次进度 (None 不输出)
    pub progress_interval: Option<usize>,
}

impl Default for LearnOptions {
    fn default() -> Self {
        Self {
            discount_rate: 1.0,
            number_episodes: 1000,
            planning_factor: 0.0,
            plan_on_empty_policy: false,
            planning_horizon: 6,
            max_episode_length: 14,
            planning_rollouts: 1,
            bootstrap_planning: false,
            truncation: TruncationPolicy::ZeroRatio,
            progress_interval: None,
        }
    }
}

impl LearnOptions {
    /// 检查选项，任何 episode 开始前调用
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.discount_rate.is_finite() && self.discount_rate > 0.0 && self.discount_rate <= 1.0) {
            return Err(ConfigurationError::new(
                "discount_rate",
                format!("必须在 (0, 1] 之间，实际为 {}", self.discount_rate),
            ));
        }
        if !(0.0..=1.0).contains(&self.planning_factor) {
            return Err(ConfigurationError::new(
                "planning_factor",
                format!("必须在 [0, 1] 之间，实际为 {}", self.planning_factor),
            ));
        }
        if self.max_episode_length == 0 {
            return Err(ConfigurationError::new("max_episode_length", "必须大于 0"));
        }
        if self.planning_rollouts == 0 {
            return Err(ConfigurationError::new("planning_rollouts", "至少需要 1 次模拟"));
        }
        if self.progress_interval == Some(0) {
            return Err(ConfigurationError::new("progress_interval", "必须大于 0"));
        }
        Ok(())
    }

    /// 对应的规划器配置
    pub fn planning_config(&self) -> PlanningConfig {
        PlanningConfig {
            horizon: self.planning_horizon,
            rollouts_per_action: self.planning_rollouts,
            discount_rate: self.discount_rate,
            bootstrap: self.bootstrap_planning,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| ConfigurationError::new("options", format!("JSON 解析失败: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取选项文件 {}", path.display()))?;
        Ok(Self::from_json_str(&text)?)
    }
}
