// episode.rs - episode 生成模块
//
// 驱动策略与环境完成一局交互，可选地在每次决策前调用规划器。
// 规划结果只影响当次决策，不写入策略存储。

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

use crate::control::{ActionDistribution, Control};
use crate::error::{InvalidStateError, McError, PlanningError};
use crate::game_env::Environment;
use crate::planning::Planner;

// ================ episode 数据 ================

/// 单步记录
#[derive(Debug, Clone, PartialEq)]
pub struct Step<S, A> {
    pub state: S,
    pub action: A,
    pub reward: f64,
}

/// 一局的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// 到达终局
    Terminal,
    /// 达到最大步数被截断 (不是策略意义上的终局)
    Truncated,
}

/// 一局完整的交互轨迹
#[derive(Debug, Clone)]
pub struct Episode<S, A> {
    start_state: S,
    steps: Vec<Step<S, A>>,
    termination: Termination,
    /// 由规划结果决定的步数
    planned_decisions: usize,
}

impl<S, A> Episode<S, A> {
    pub fn new(start_state: S, steps: Vec<Step<S, A>>, termination: Termination) -> Self {
        Self {
            start_state,
            steps,
            termination,
            planned_decisions: 0,
        }
    }

    pub fn start_state(&self) -> &S {
        &self.start_state
    }

    pub fn steps(&self) -> &[Step<S, A>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn is_truncated(&self) -> bool {
        self.termination == Termination::Truncated
    }

    pub fn planned_decisions(&self) -> usize {
        self.planned_decisions
    }

    /// 从起点开始的折扣回报: Σ γ^k r_k
    pub fn discounted_return(&self, discount_rate: f64) -> f64 {
        let mut total = 0.0;
        let mut discount = 1.0;
        for step in &self.steps {
            total += discount * step.reward;
            discount *= discount_rate;
        }
        total
    }

    /// 每个时刻之后的折扣回报 G_t = r_t + γ G_{t+1}
    pub fn returns(&self, discount_rate: f64) -> Vec<f64> {
        let mut returns = vec![0.0; self.steps.len()];
        let mut g = 0.0;
        for (t, step) in self.steps.iter().enumerate().rev() {
            g = step.reward + discount_rate * g;
            returns[t] = g;
        }
        returns
    }
}

impl<S: Eq + Hash, A: Eq + Hash> Episode<S, A> {
    /// 每个 (状态, 动作) 第一次出现的时刻 (升序)
    pub fn first_visit_indices(&self) -> Vec<usize> {
        let mut seen = HashSet::with_capacity(self.steps.len());
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, step)| seen.insert((&step.state, &step.action)))
            .map(|(t, _)| t)
            .collect()
    }
}

// ================ episode 生成器 ================

/// episode 生成器
///
/// 不负责重置环境: 调用方在每局开始前先 `reset`。
pub struct EpisodeGenerator<'p> {
    max_steps: usize,
    planner: Option<&'p Planner>,
    /// 每次决策调用规划器的概率
    planning_factor: f64,
    /// 没有任何数据的状态是否也规划
    plan_on_empty_policy: bool,
}

impl<'p> EpisodeGenerator<'p> {
    pub fn new(max_steps: usize) -> Self {
        Self {
            max_steps,
            planner: None,
            planning_factor: 0.0,
            plan_on_empty_policy: false,
        }
    }

    pub fn with_planner(
        mut self,
        planner: &'p Planner,
        planning_factor: f64,
        plan_on_empty_policy: bool,
    ) -> Self {
        self.planner = Some(planner);
        self.planning_factor = planning_factor;
        self.plan_on_empty_policy = plan_on_empty_policy;
        self
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// 运行一局，返回完整轨迹
    pub fn run<E, C, R>(
        &self,
        env: &mut E,
        control: &C,
        rng: &mut R,
    ) -> Result<Episode<E::State, E::Action>, McError>
    where
        E: Environment,
        C: Control<E::State, E::Action>,
        R: Rng + ?Sized,
    {
        let start_state = env.initial_state().clone();
        let mut state = start_state.clone();
        let mut steps = Vec::new();
        let mut planned_decisions = 0;

        if env.is_terminal(&state) {
            return Ok(Episode::new(start_state, steps, Termination::Terminal));
        }

        let mut termination = Termination::Truncated;
        for _ in 0..self.max_steps {
            let legal_actions = env.legal_actions(&state);
            if legal_actions.is_empty() {
                return Err(InvalidStateError::for_state(&state).into());
            }

            let (distribution, planned) = self.decide(&*env, control, &state, &legal_actions, rng)?;
            if planned {
                planned_decisions += 1;
            }
            let action = distribution.sample(rng).clone();

            let result = env.step(&action)?;
            steps.push(Step {
                state,
                action,
                reward: result.reward,
            });
            state = result.next_state;

            if result.terminal {
                termination = Termination::Terminal;
                break;
            }
        }

        log::trace!(
            "episode 结束: {} 步, {:?}, 规划 {} 次",
            steps.len(),
            termination,
            planned_decisions
        );

        let mut episode = Episode::new(start_state, steps, termination);
        episode.planned_decisions = planned_decisions;
        Ok(episode)
    }

    /// 本次决策使用的动作分布，以及它是否来自规划
    fn decide<E, C, R>(
        &self,
        env: &E,
        control: &C,
        state: &E::State,
        legal_actions: &[E::Action],
        rng: &mut R,
    ) -> Result<(ActionDistribution<E::Action>, bool), McError>
    where
        E: Environment,
        C: Control<E::State, E::Action>,
        R: Rng + ?Sized,
    {
        if let Some(planner) = self.planner {
            let draw: f64 = rng.gen();
            if draw < self.planning_factor && (self.plan_on_empty_policy || control.has_data(state)) {
                match planner.plan(env, state, control, rng) {
                    Ok(result) => return Ok((result.distribution(), true)),
                    Err(PlanningError::NotSimulatable(e)) => {
                        log::warn!("{}，回退为直接按策略选择动作", e);
                    }
                    Err(PlanningError::InvalidState(e)) => return Err(e.into()),
                    Err(PlanningError::Environment(e)) => return Err(e.into()),
                }
            }
        }
        Ok((control.action_distribution(state, legal_actions)?, false))
    }
}
