use ndarray::Array1;

use super::constants::BLOCK_FEATURE_COUNT;
use super::types::*;
use crate::control::FeatureMap;

// ==============================================================================
// --- 线性特征 (梯度控制使用) ---
// ==============================================================================

/// 积木世界的 (状态, 动作) 手工特征
///
/// 依次为:
/// 0. 偏置
/// 1. 移动前目标塔高度 / n
/// 2. 移动后目标塔高度 / n
/// 3. 把方块放到它在目标中的支撑上
/// 4. 拆掉目标塔顶端的方块
/// 5. 移动后的堆数 / n
/// 6. 移动后到达目标
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFeatures;

impl BlockFeatures {
    /// 方块在目标状态中应当所在的支撑
    fn goal_support(block: Block) -> Support {
        if block == 0 {
            Support::Table
        } else {
            Support::On(block - 1)
        }
    }
}

impl FeatureMap<BlocksState, BlockMove> for BlockFeatures {
    fn dim(&self) -> usize {
        BLOCK_FEATURE_COUNT
    }

    fn features(&self, state: &BlocksState, action: &BlockMove) -> Array1<f64> {
        let n = state.size().max(1) as f64;
        let next = state.apply(action);
        let height_before = state.goal_tower_height();
        let height_after = next.goal_tower_height();

        let mut phi = Array1::zeros(BLOCK_FEATURE_COUNT);
        phi[0] = 1.0;
        phi[1] = height_before as f64 / n;
        phi[2] = height_after as f64 / n;
        if action.to == Self::goal_support(action.block) {
            phi[3] = 1.0;
        }
        if (action.block as usize) < height_before {
            phi[4] = 1.0;
        }
        phi[5] = next.stacks().len() as f64 / n;
        if next.is_goal() {
            phi[6] = 1.0;
        }
        phi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_finishing_move_features() {
        // [0 1] | [2]，把 2 放到 1 上即完成
        let state = BlocksState::from_stacks(3, &[vec![0, 1], vec![2]]);
        let mv = BlockMove::new(2, Support::On(1));
        let phi = BlockFeatures.features(&state, &mv);

        assert_eq!(phi.len(), BlockFeatures.dim());
        assert_relative_eq!(phi[0], 1.0);
        assert_relative_eq!(phi[1], 2.0 / 3.0);
        assert_relative_eq!(phi[2], 1.0);
        assert_relative_eq!(phi[3], 1.0);
        assert_relative_eq!(phi[4], 0.0);
        assert_relative_eq!(phi[5], 1.0 / 3.0);
        assert_relative_eq!(phi[6], 1.0);
    }

    #[test]
    fn test_breaking_tower_features() {
        let state = BlocksState::from_stacks(3, &[vec![0, 1], vec![2]]);
        let mv = BlockMove::new(1, Support::Table);
        let phi = BlockFeatures.features(&state, &mv);

        assert_relative_eq!(phi[2], 1.0 / 3.0);
        assert_relative_eq!(phi[3], 0.0);
        assert_relative_eq!(phi[4], 1.0);
        assert_relative_eq!(phi[5], 1.0);
        assert_relative_eq!(phi[6], 0.0);
    }
}
