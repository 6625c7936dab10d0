use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

/// 第一个最大值的下标，平局时取枚举顺序靠前者 (NaN 永远不会胜出)
pub fn greedy_index<I>(values: I) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (idx, v) in values.into_iter().enumerate() {
        match best {
            None => best = Some((idx, v)),
            Some((_, b)) if v > b || (b.is_nan() && !v.is_nan()) => best = Some((idx, v)),
            _ => {}
        }
    }
    best.map(|(idx, _)| idx)
}

/// 某个状态下合法动作上的概率分布
///
/// 只包含合法动作，非法动作的概率恒为 0。
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDistribution<A> {
    entries: Vec<(A, f64)>,
}

impl<A: Clone + PartialEq> ActionDistribution<A> {
    /// 在所有合法动作上均匀分布
    pub fn uniform(legal_actions: &[A]) -> Self {
        let p = 1.0 / legal_actions.len() as f64;
        Self {
            entries: legal_actions.iter().map(|a| (a.clone(), p)).collect(),
        }
    }

    /// ε-greedy: 1-ε 给贪心动作，ε 均分给所有合法动作 (包括贪心动作)
    ///
    /// `values` 与 `legal_actions` 一一对应。
    pub fn epsilon_greedy(legal_actions: &[A], values: &[f64], epsilon: f64) -> Self {
        debug_assert_eq!(legal_actions.len(), values.len());
        let k = legal_actions.len() as f64;
        let greedy = greedy_index(values.iter().copied());
        let entries = legal_actions
            .iter()
            .enumerate()
            .map(|(idx, a)| {
                let mut p = epsilon / k;
                if Some(idx) == greedy {
                    p += 1.0 - epsilon;
                }
                (a.clone(), p)
            })
            .collect();
        Self { entries }
    }

    /// 全部概率给贪心动作
    pub fn greedy(legal_actions: &[A], values: &[f64]) -> Self {
        Self::epsilon_greedy(legal_actions, values, 0.0)
    }

    /// 动作的概率，不在分布中 (非法) 的动作为 0
    pub fn probability(&self, action: &A) -> f64 {
        self.entries
            .iter()
            .find(|(a, _)| a == action)
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(A, f64)> {
        self.entries.iter()
    }

    /// 按概率采样一个动作
    ///
    /// 权重全为 0 (数值异常) 时回退为在合法动作中均匀选择。
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &A {
        match WeightedIndex::new(self.entries.iter().map(|(_, p)| *p)) {
            Ok(dist) => &self.entries[dist.sample(rng)].0,
            Err(_) => {
                &self
                    .entries
                    .choose(rng)
                    .expect("动作分布至少包含一个合法动作")
                    .0
            }
        }
    }
}
