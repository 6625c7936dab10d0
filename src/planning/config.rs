// src/planning/config.rs
// 规划配置与规划结果定义

use crate::control::{greedy_index, ActionDistribution};
use crate::error::ConfigurationError;

/// 前瞻规划配置参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanningConfig {
    /// 每次模拟最多前进的步数 (包含第一个动作)
    pub horizon: usize,
    /// 每个候选动作的模拟次数
    pub rollouts_per_action: usize,
    /// 模拟回报的折扣率
    pub discount_rate: f64,
    /// 模拟在视界处截断时，是否加上叶子状态的贪心价值
    pub bootstrap: bool,
}

impl Default for PlanningConfig {
    /// 默认配置
    ///
    /// * horizon: 6
    /// * rollouts_per_action: 1
    /// * discount_rate: 1.0
    /// * bootstrap: false
    fn default() -> Self {
        Self {
            horizon: 6,
            rollouts_per_action: 1,
            discount_rate: 1.0,
            bootstrap: false,
        }
    }
}

impl PlanningConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.rollouts_per_action == 0 {
            return Err(ConfigurationError::new("planning_rollouts", "至少需要 1 次模拟"));
        }
        if !(self.discount_rate > 0.0 && self.discount_rate <= 1.0) {
            return Err(ConfigurationError::new(
                "discount_rate",
                format!("必须在 (0, 1] 之间，实际为 {}", self.discount_rate),
            ));
        }
        Ok(())
    }
}

/// 规划结果
///
/// 当前真实状态下每个合法动作的细化价值，只服务于一次决策，用完即弃。
#[derive(Debug, Clone, PartialEq)]
pub struct PlanningResult<A> {
    /// (动作, 细化价值)，顺序与合法动作枚举一致
    values: Vec<(A, f64)>,
    /// 实际执行的模拟次数
    rollouts: usize,
}

impl<A: Clone + PartialEq> PlanningResult<A> {
    pub fn new(values: Vec<(A, f64)>, rollouts: usize) -> Self {
        Self { values, rollouts }
    }

    pub fn values(&self) -> &[(A, f64)] {
        &self.values
    }

    pub fn value(&self, action: &A) -> Option<f64> {
        self.values.iter().find(|(a, _)| a == action).map(|(_, v)| *v)
    }

    pub fn rollouts(&self) -> usize {
        self.rollouts
    }

    /// 细化价值最高的动作，平局取第一个
    pub fn greedy_action(&self) -> Option<&A> {
        greedy_index(self.values.iter().map(|(_, v)| *v)).map(|idx| &self.values[idx].0)
    }

    /// 本次决策的动作分布: 全部概率给细化价值最高的动作
    pub fn distribution(&self) -> ActionDistribution<A> {
        let actions: Vec<A> = self.values.iter().map(|(a, _)| a.clone()).collect();
        let values: Vec<f64> = self.values.iter().map(|(_, v)| *v).collect();
        ActionDistribution::greedy(&actions, &values)
    }
}
