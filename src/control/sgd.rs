use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

use super::exploration::{Exploration, VisitRule};
use super::store::ActionValueTable;
use super::Control;
use crate::episode::Episode;
use crate::error::{ConfigurationError, EmptyEpisodeError};

/// (状态, 动作) 的特征向量，线性价值函数的输入
pub trait FeatureMap<S, A> {
    /// 特征维度
    fn dim(&self) -> usize;

    fn features(&self, state: &S, action: &A) -> Array1<f64>;
}

/// 学习率规则
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepSize {
    /// 固定学习率
    Constant { alpha: f64 },
    /// 按 (状态, 动作) 的访问次数: α = 1 / N(s, a)
    InverseVisit,
    /// 按已处理的 episode 数衰减: α = initial / (1 + rate * episodes)
    Decay { initial: f64, rate: f64 },
}

impl Default for StepSize {
    fn default() -> Self {
        StepSize::Constant { alpha: 0.05 }
    }
}

impl StepSize {
    /// `pair_visits` 已包含本次访问
    pub fn rate(&self, pair_visits: u64, episodes: u64) -> f64 {
        match *self {
            StepSize::Constant { alpha } => alpha,
            StepSize::InverseVisit => 1.0 / pair_visits.max(1) as f64,
            StepSize::Decay { initial, rate } => initial / (1.0 + rate * episodes as f64),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            StepSize::Constant { alpha } => {
                if !(alpha.is_finite() && alpha > 0.0) {
                    return Err(ConfigurationError::new(
                        "step_size.alpha",
                        format!("必须为正数，实际为 {}", alpha),
                    ));
                }
            }
            StepSize::InverseVisit => {}
            StepSize::Decay { initial, rate } => {
                if !(initial.is_finite() && initial > 0.0) {
                    return Err(ConfigurationError::new(
                        "step_size.initial",
                        format!("必须为正数，实际为 {}", initial),
                    ));
                }
                if !(rate.is_finite() && rate >= 0.0) {
                    return Err(ConfigurationError::new(
                        "step_size.rate",
                        format!("不能为负，实际为 {}", rate),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// 梯度控制的配置
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SgdConfig {
    pub exploration: Exploration,
    pub visit_rule: VisitRule,
    pub step_size: StepSize,
}

/// 线性函数逼近的蒙特卡洛控制
///
/// Q(s, a) = w · φ(s, a)。每个参与更新的 (状态, 动作) 做一步 SGD:
/// w ← w + α (G - w · φ) φ
///
/// 可以在状态之间泛化，但不再有表格平均的收敛保证。
pub struct SgdControl<S, A, F> {
    weights: Array1<f64>,
    features: F,
    /// 只用访问次数 (探索率与 1/N 学习率)
    visits: ActionValueTable<S, A>,
    exploration: Exploration,
    visit_rule: VisitRule,
    step_size: StepSize,
    /// 已处理的 episode 数
    episodes_seen: u64,
}

impl<S, A, F> SgdControl<S, A, F>
where
    S: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
    F: FeatureMap<S, A>,
{
    pub fn new(features: F, config: SgdConfig) -> Result<Self, ConfigurationError> {
        config.exploration.validate()?;
        config.step_size.validate()?;
        if features.dim() == 0 {
            return Err(ConfigurationError::new("features", "特征维度不能为 0"));
        }
        Ok(Self {
            weights: Array1::zeros(features.dim()),
            features,
            visits: ActionValueTable::new(),
            exploration: config.exploration,
            visit_rule: config.visit_rule,
            step_size: config.step_size,
            episodes_seen: 0,
        })
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn episodes_seen(&self) -> u64 {
        self.episodes_seen
    }

    pub fn feature_map(&self) -> &F {
        &self.features
    }
}

impl<S, A, F> Control<S, A> for SgdControl<S, A, F>
where
    S: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
    F: FeatureMap<S, A>,
{
    fn value(&self, state: &S, action: &A) -> f64 {
        self.weights.dot(&self.features.features(state, action))
    }

    fn update(&mut self, episode: &Episode<S, A>, discount_rate: f64) -> Result<(), EmptyEpisodeError> {
        if episode.is_empty() {
            return Err(EmptyEpisodeError);
        }

        let returns = episode.returns(discount_rate);
        for t in self.visit_rule.indices(episode) {
            let step = &episode.steps()[t];
            let n = self.visits.bump(&step.state, &step.action);
            let alpha = self.step_size.rate(n, self.episodes_seen);

            let phi = self.features.features(&step.state, &step.action);
            let error = returns[t] - self.weights.dot(&phi);
            self.weights.scaled_add(alpha * error, &phi);
        }

        self.episodes_seen += 1;
        log::trace!("SGD 权重: {:?}", self.weights);
        Ok(())
    }

    fn visit_count(&self, state: &S, action: &A) -> u64 {
        self.visits.visit_count(state, action)
    }

    fn state_visits(&self, state: &S) -> u64 {
        self.visits.state_visits(state)
    }

    fn exploration(&self) -> &Exploration {
        &self.exploration
    }
}
