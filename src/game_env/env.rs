use rand::Rng;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{EnvError, NotSimulatableError};

// ==============================================================================
// --- 环境接口 ---
// ==============================================================================

/// 单步执行结果
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult<S> {
    pub next_state: S,
    pub reward: f64,
    pub terminal: bool,
}

/// 蒙特卡洛控制所需的环境接口
///
/// 环境持有当前局面；`step` 在当前局面上执行动作。
/// 每局开始前调用 `reset`，一个环境实例一次只服务一局。
pub trait Environment {
    type State: Clone + Eq + Hash + Debug;
    type Action: Clone + Eq + Hash + Debug;

    /// 开始新的一局，返回本局的初始状态
    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Self::State;

    /// 本局的初始状态
    fn initial_state(&self) -> &Self::State;

    /// 当前状态
    fn current_state(&self) -> &Self::State;

    /// 给定状态下的合法动作，顺序固定
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    fn is_terminal(&self, state: &Self::State) -> bool;

    /// 在当前状态上执行动作
    fn step(&mut self, action: &Self::Action) -> Result<StepResult<Self::State>, EnvError>;

    /// 从 `state` 出发可获得的最优折扣回报
    fn optimal_return(&self, state: &Self::State, discount_rate: f64) -> f64;

    /// 复制一份独立的环境用于模拟，默认不支持
    fn snapshot(&self) -> Result<Self, NotSimulatableError>
    where
        Self: Sized,
    {
        Err(NotSimulatableError::new("环境未实现快照"))
    }
}
