// src/planning/search.rs
// 基于环境快照的有界前瞻模拟

use rand::Rng;

use super::config::{PlanningConfig, PlanningResult};
use crate::control::Control;
use crate::error::{ConfigurationError, InvalidStateError, PlanningError};
use crate::game_env::Environment;

/// 前瞻规划器
///
/// 对当前状态的每个合法动作，在环境副本上先执行该动作，
/// 再按当前策略模拟至多 `horizon` 步，平均折扣回报作为该动作的细化价值。
/// 只持有真实环境的共享引用，所有模拟都发生在快照上。
#[derive(Debug, Clone)]
pub struct Planner {
    config: PlanningConfig,
}

impl Planner {
    pub fn new(config: PlanningConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    /// 为 `state` (即 `env` 的当前状态) 计算细化动作价值
    ///
    /// 环境无法快照时返回 `PlanningError::NotSimulatable`。
    pub fn plan<E, C, R>(
        &self,
        env: &E,
        state: &E::State,
        control: &C,
        rng: &mut R,
    ) -> Result<PlanningResult<E::Action>, PlanningError>
    where
        E: Environment,
        C: Control<E::State, E::Action>,
        R: Rng + ?Sized,
    {
        let legal_actions = env.legal_actions(state);
        if legal_actions.is_empty() {
            return Err(InvalidStateError::for_state(state).into());
        }

        let template = env.snapshot()?;
        debug_assert_eq!(template.current_state(), state);

        // 视界为 0: 不模拟，直接使用已学到的估计
        if self.config.horizon == 0 {
            let values = legal_actions
                .into_iter()
                .map(|a| {
                    let v = control.value(state, &a);
                    (a, v)
                })
                .collect();
            return Ok(PlanningResult::new(values, 0));
        }

        let mut values = Vec::with_capacity(legal_actions.len());
        let mut rollouts = 0;
        for action in legal_actions {
            let mut total = 0.0;
            for _ in 0..self.config.rollouts_per_action {
                let mut sim = template.snapshot()?;
                total += self.rollout(&mut sim, &action, control, rng)?;
                rollouts += 1;
            }
            let mean = total / self.config.rollouts_per_action as f64;
            values.push((action, mean));
        }

        Ok(PlanningResult::new(values, rollouts))
    }

    /// 在副本上执行 `first`，再按策略模拟，返回折扣回报
    fn rollout<E, C, R>(
        &self,
        sim: &mut E,
        first: &E::Action,
        control: &C,
        rng: &mut R,
    ) -> Result<f64, PlanningError>
    where
        E: Environment,
        C: Control<E::State, E::Action>,
        R: Rng + ?Sized,
    {
        let gamma = self.config.discount_rate;

        let first_step = sim.step(first)?;
        let mut total = first_step.reward;
        let mut discount = gamma;
        let mut state = first_step.next_state;
        let mut terminal = first_step.terminal;
        let mut depth = 1;

        while !terminal && depth < self.config.horizon {
            let legal_actions = sim.legal_actions(&state);
            if legal_actions.is_empty() {
                break;
            }
            let action = control
                .action_distribution(&state, &legal_actions)?
                .sample(rng)
                .clone();
            let step = sim.step(&action)?;
            total += discount * step.reward;
            discount *= gamma;
            state = step.next_state;
            terminal = step.terminal;
            depth += 1;
        }

        // 视界截断: 用已学到的贪心价值估计剩余回报
        if !terminal && self.config.bootstrap && control.has_data(&state) {
            let best = sim
                .legal_actions(&state)
                .iter()
                .map(|a| control.value(&state, a))
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |b| b.max(v))));
            if let Some(best) = best {
                total += discount * best;
            }
        }

        Ok(total)
    }
}
