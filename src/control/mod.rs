//! 控制策略模块
//!
//! - `Control`：策略存储的统一接口 (value / update / greedy_action / action_distribution)
//! - `TabularControl`：首次访问回报的精确滑动平均
//! - `SgdControl`：线性函数逼近 + 随机梯度下降
//!
//! 从未访问过的状态一律使用合法动作上的均匀分布。

use std::fmt::Debug;
use std::hash::Hash;

use crate::episode::Episode;
use crate::error::{EmptyEpisodeError, InvalidStateError};

mod distribution;
mod exploration;
mod sgd;
mod store;
mod tabular;

pub use distribution::{greedy_index, ActionDistribution};
pub use exploration::{Exploration, VisitRule, DEFAULT_GLIE_CONSTANT};
pub use sgd::{FeatureMap, SgdConfig, SgdControl, StepSize};
pub use store::{ActionValueEntry, ActionValueTable};
pub use tabular::{TabularConfig, TabularControl};

/// 策略存储接口
///
/// 查询时由调用方提供该状态的合法动作 (顺序即平局时的优先顺序)。
pub trait Control<S, A>
where
    S: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
{
    /// 动作价值估计
    fn value(&self, state: &S, action: &A) -> f64;

    /// 用一局完整的 episode 更新估计
    fn update(&mut self, episode: &Episode<S, A>, discount_rate: f64) -> Result<(), EmptyEpisodeError>;

    fn visit_count(&self, state: &S, action: &A) -> u64;

    /// 状态下所有动作的访问次数之和
    fn state_visits(&self, state: &S) -> u64;

    fn exploration(&self) -> &Exploration;

    /// 该状态是否已有动作价值数据
    fn has_data(&self, state: &S) -> bool {
        self.state_visits(state) > 0
    }

    /// 该状态当前的 ε
    fn exploration_rate(&self, state: &S) -> f64 {
        self.exploration().epsilon(self.state_visits(state))
    }

    /// 贪心动作，平局取枚举顺序中的第一个
    fn greedy_action(&self, state: &S, legal_actions: &[A]) -> Result<A, InvalidStateError> {
        greedy_index(legal_actions.iter().map(|a| self.value(state, a)))
            .map(|idx| legal_actions[idx].clone())
            .ok_or_else(|| InvalidStateError::for_state(state))
    }

    /// 当前探索规则下的动作分布
    fn action_distribution(
        &self,
        state: &S,
        legal_actions: &[A],
    ) -> Result<ActionDistribution<A>, InvalidStateError> {
        if legal_actions.is_empty() {
            return Err(InvalidStateError::for_state(state));
        }
        if !self.has_data(state) {
            return Ok(ActionDistribution::uniform(legal_actions));
        }
        let values: Vec<f64> = legal_actions.iter().map(|a| self.value(state, a)).collect();
        Ok(ActionDistribution::epsilon_greedy(
            legal_actions,
            &values,
            self.exploration_rate(state),
        ))
    }
}
