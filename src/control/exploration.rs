use serde::{Deserialize, Serialize};

use crate::episode::Episode;
use crate::error::ConfigurationError;
use std::hash::Hash;

/// GLIE 默认常数: ε(s) = c / (c + N(s))
///
/// 状态被访问 c 次时 ε 降到 1/2
pub const DEFAULT_GLIE_CONSTANT: f64 = 100.0;

/// 探索规则 (ε 的取值方式)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Exploration {
    /// 固定 ε
    Constant { epsilon: f64 },
    /// 随状态访问次数衰减: ε(s) = c / (c + N(s))，满足 GLIE 条件
    Glie { constant: f64 },
}

impl Default for Exploration {
    fn default() -> Self {
        Exploration::Glie {
            constant: DEFAULT_GLIE_CONSTANT,
        }
    }
}

impl Exploration {
    /// 给定状态已被访问 `state_visits` 次时的 ε
    pub fn epsilon(&self, state_visits: u64) -> f64 {
        match *self {
            Exploration::Constant { epsilon } => epsilon,
            Exploration::Glie { constant } => constant / (constant + state_visits as f64),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            Exploration::Constant { epsilon } => {
                if !(0.0..=1.0).contains(&epsilon) {
                    return Err(ConfigurationError::new(
                        "exploration.epsilon",
                        format!("必须在 [0, 1] 之间，实际为 {}", epsilon),
                    ));
                }
            }
            Exploration::Glie { constant } => {
                if !(constant.is_finite() && constant > 0.0) {
                    return Err(ConfigurationError::new(
                        "exploration.constant",
                        format!("必须为正数，实际为 {}", constant),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// 一局中哪些时刻参与更新
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitRule {
    /// 每个 (状态, 动作) 只取第一次出现
    #[default]
    FirstVisit,
    /// 每次出现都参与更新
    EveryVisit,
}

impl VisitRule {
    /// 参与更新的时刻下标 (升序)
    pub fn indices<S, A>(&self, episode: &Episode<S, A>) -> Vec<usize>
    where
        S: Eq + Hash,
        A: Eq + Hash,
    {
        match self {
            VisitRule::FirstVisit => episode.first_visit_indices(),
            VisitRule::EveryVisit => (0..episode.len()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_glie_decays() {
        let exploration = Exploration::Glie { constant: 2.0 };
        assert_relative_eq!(exploration.epsilon(0), 1.0);
        assert_relative_eq!(exploration.epsilon(2), 0.5);
        assert!(exploration.epsilon(1000) < 0.01);
    }

    #[test]
    fn test_default_keeps_exploring_early() {
        let exploration = Exploration::default();
        assert_eq!(exploration, Exploration::Glie { constant: DEFAULT_GLIE_CONSTANT });
        assert_relative_eq!(exploration.epsilon(0), 1.0);
        // 前几十次访问仍以探索为主，之后才逐渐贪心
        assert!(exploration.epsilon(50) > 0.6);
        assert_relative_eq!(exploration.epsilon(100), 0.5);
        assert!(exploration.epsilon(10_000) < 0.01);
    }

    #[test]
    fn test_validate() {
        assert!(Exploration::Constant { epsilon: 1.5 }.validate().is_err());
        assert!(Exploration::Glie { constant: 0.0 }.validate().is_err());
        assert!(Exploration::default().validate().is_ok());
    }

    #[test]
    fn test_serde_tagged() {
        let exploration: Exploration =
            serde_json::from_str(r#"{"kind":"constant","epsilon":0.1}"#).unwrap();
        assert_eq!(exploration, Exploration::Constant { epsilon: 0.1 });
    }
}
