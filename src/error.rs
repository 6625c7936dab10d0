// error.rs - 错误类型模块
//
// 蒙特卡洛控制各环节的错误分类:
// - ConfigurationError: 选项非法，在任何 episode 开始前抛出
// - InvalidStateError: 在没有合法动作的状态上查询策略
// - EmptyEpisodeError: 控制策略收到长度为 0 的 episode
// - NotSimulatableError: 环境无法快照，规划器失败 (可恢复)

use std::fmt::Debug;
use thiserror::Error;

// ================ 基础错误类型 ================

/// 配置错误 (致命，学习开始前即返回)
#[derive(Debug, Clone, PartialEq, Error)]
#[error("配置字段 `{field}` 无效: {reason}")]
pub struct ConfigurationError {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigurationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// 在终局/无合法动作的状态上查询策略
#[derive(Debug, Clone, PartialEq, Error)]
#[error("状态 {state} 没有合法动作")]
pub struct InvalidStateError {
    /// 状态的 Debug 表示
    pub state: String,
}

impl InvalidStateError {
    pub fn for_state<S: Debug>(state: &S) -> Self {
        Self {
            state: format!("{:?}", state),
        }
    }
}

/// 控制策略收到空 episode (环境一开始就终止)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("episode 长度为 0，无法更新策略")]
pub struct EmptyEpisodeError;

/// 环境无法被复制用于模拟
#[derive(Debug, Clone, PartialEq, Error)]
#[error("环境不可模拟: {reason}")]
pub struct NotSimulatableError {
    pub reason: String,
}

impl NotSimulatableError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// 环境执行动作时的错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("无效动作: {0}")]
    IllegalAction(String),
}

// ================ 规划器错误 ================

/// 规划器的失败模式
///
/// 只有 `NotSimulatable` 会被 episode 生成器吞掉并回退，其余向上传播。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    #[error(transparent)]
    NotSimulatable(#[from] NotSimulatableError),
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),
    #[error(transparent)]
    Environment(#[from] EnvError),
}

// ================ 顶层错误 ================

/// `learn_policy` 及 episode 生成过程中可能返回的错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum McError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),
    #[error(transparent)]
    EmptyEpisode(#[from] EmptyEpisodeError),
    #[error(transparent)]
    Environment(#[from] EnvError),
}

pub type Result<T> = std::result::Result<T, McError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_convert_to_their_own_kind() {
        let err: McError = ConfigurationError::new("discount_rate", "x").into();
        assert!(matches!(err, McError::Configuration(ref e) if e.field == "discount_rate"));

        let err: McError = InvalidStateError::for_state(&3u8).into();
        assert_eq!(err, McError::InvalidState(InvalidStateError { state: "3".to_string() }));

        let err: McError = EmptyEpisodeError.into();
        assert_eq!(err.to_string(), EmptyEpisodeError.to_string());

        let err: McError = EnvError::IllegalAction("0 -> 1".to_string()).into();
        assert!(matches!(err, McError::Environment(_)));
    }

    #[test]
    fn test_planning_error_sources() {
        let err: PlanningError = NotSimulatableError::new("无快照").into();
        assert_eq!(err.to_string(), "环境不可模拟: 无快照");
        let err: PlanningError = InvalidStateError::for_state(&"s").into();
        assert!(matches!(err, PlanningError::InvalidState(_)));
        let err: PlanningError = EnvError::IllegalAction("a".to_string()).into();
        assert!(matches!(err, PlanningError::Environment(_)));
    }
}
