// 动作价值表: 每个 (状态, 动作) 的估计值与访问次数，首次访问时惰性创建。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// 单个 (状态, 动作) 的统计量
///
/// 访问次数只增不减；价值是已处理回报的滑动平均。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionValueEntry {
    pub value: f64,
    pub visit_count: u64,
}

impl ActionValueEntry {
    /// 增量平均: new = old + (target - old) / n
    pub fn record(&mut self, target: f64) {
        self.visit_count += 1;
        self.value += (target - self.value) / self.visit_count as f64;
    }

    /// 只累加访问次数，返回新的次数
    pub fn bump(&mut self) -> u64 {
        self.visit_count += 1;
        self.visit_count
    }
}

#[derive(Debug, Clone)]
struct StateRecord<A> {
    actions: HashMap<A, ActionValueEntry>,
    /// 该状态下所有动作访问次数之和
    visits: u64,
}

impl<A> StateRecord<A> {
    fn new() -> Self {
        Self {
            actions: HashMap::new(),
            visits: 0,
        }
    }
}

/// 按状态分组的动作价值表
#[derive(Debug, Clone)]
pub struct ActionValueTable<S, A> {
    states: HashMap<S, StateRecord<A>>,
}

impl<S, A> Default for ActionValueTable<S, A> {
    fn default() -> Self {
        Self {
            states: HashMap::new(),
        }
    }
}

impl<S, A> ActionValueTable<S, A>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, state: &S, action: &A) -> Option<&ActionValueEntry> {
        self.states.get(state).and_then(|rec| rec.actions.get(action))
    }

    /// 估计值，未访问过的动作为 0
    pub fn value(&self, state: &S, action: &A) -> f64 {
        self.get(state, action).map(|e| e.value).unwrap_or(0.0)
    }

    pub fn visit_count(&self, state: &S, action: &A) -> u64 {
        self.get(state, action).map(|e| e.visit_count).unwrap_or(0)
    }

    pub fn state_visits(&self, state: &S) -> u64 {
        self.states.get(state).map(|rec| rec.visits).unwrap_or(0)
    }

    fn entry_mut(&mut self, state: &S, action: &A) -> (&mut u64, &mut ActionValueEntry) {
        let rec = self
            .states
            .entry(state.clone())
            .or_insert_with(StateRecord::new);
        let entry = rec.actions.entry(action.clone()).or_default();
        (&mut rec.visits, entry)
    }

    /// 把一次回报并入滑动平均
    pub fn record(&mut self, state: &S, action: &A, target: f64) -> ActionValueEntry {
        let (visits, entry) = self.entry_mut(state, action);
        *visits += 1;
        entry.record(target);
        *entry
    }

    /// 只记录一次访问，返回该 (状态, 动作) 的新访问次数
    pub fn bump(&mut self, state: &S, action: &A) -> u64 {
        let (visits, entry) = self.entry_mut(state, action);
        *visits += 1;
        entry.bump()
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_pairs(&self) -> usize {
        self.states.values().map(|rec| rec.actions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, &A, &ActionValueEntry)> {
        self.states
            .iter()
            .flat_map(|(s, rec)| rec.actions.iter().map(move |(a, e)| (s, a, e)))
    }
}
