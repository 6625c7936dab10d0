use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

use super::exploration::{Exploration, VisitRule};
use super::store::ActionValueTable;
use super::Control;
use crate::episode::Episode;
use crate::error::{ConfigurationError, EmptyEpisodeError};

/// 表格控制的配置
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularConfig {
    pub exploration: Exploration,
    pub visit_rule: VisitRule,
}

/// 表格蒙特卡洛控制
///
/// 每个 (状态, 动作) 保存首次访问回报的精确平均，
/// 在 GLIE 条件下收敛到真实期望回报。
#[derive(Debug, Clone)]
pub struct TabularControl<S, A> {
    table: ActionValueTable<S, A>,
    exploration: Exploration,
    visit_rule: VisitRule,
}

impl<S, A> TabularControl<S, A>
where
    S: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
{
    pub fn new(config: TabularConfig) -> Result<Self, ConfigurationError> {
        config.exploration.validate()?;
        Ok(Self {
            table: ActionValueTable::new(),
            exploration: config.exploration,
            visit_rule: config.visit_rule,
        })
    }

    pub fn table(&self) -> &ActionValueTable<S, A> {
        &self.table
    }

    pub fn visit_rule(&self) -> VisitRule {
        self.visit_rule
    }
}

impl<S, A> Control<S, A> for TabularControl<S, A>
where
    S: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
{
    fn value(&self, state: &S, action: &A) -> f64 {
        self.table.value(state, action)
    }

    fn update(&mut self, episode: &Episode<S, A>, discount_rate: f64) -> Result<(), EmptyEpisodeError> {
        if episode.is_empty() {
            return Err(EmptyEpisodeError);
        }

        let returns = episode.returns(discount_rate);
        let indices = self.visit_rule.indices(episode);
        for &t in &indices {
            let step = &episode.steps()[t];
            let entry = self.table.record(&step.state, &step.action, returns[t]);
            log::trace!(
                "Q({:?}, {:?}) <- {:.4} (n={})",
                step.state,
                step.action,
                entry.value,
                entry.visit_count
            );
        }
        Ok(())
    }

    fn visit_count(&self, state: &S, action: &A) -> u64 {
        self.table.visit_count(state, action)
    }

    fn state_visits(&self, state: &S) -> u64 {
        self.table.state_visits(state)
    }

    fn exploration(&self) -> &Exploration {
        &self.exploration
    }
}
