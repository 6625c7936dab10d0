// ==============================================================================
// --- 常量定义 ---
// ==============================================================================

/// 支持的最少方块数 (1 个方块时初始状态必然就是目标)
pub const MIN_BLOCKS: usize = 2;
/// 支持的最多方块数 (8 个方块约 144 万个状态，距离表仍可一次性算完)
pub const MAX_BLOCKS: usize = 8;

/// 默认方块数 (与实验脚本一致)
pub const DEFAULT_BLOCKS: usize = 7;

/// 到达目标塔时获得的奖励
pub const GOAL_REWARD: f64 = 1.0;
/// 其余每一步的奖励
pub const STEP_REWARD: f64 = 0.0;

/// 随机初始化时，下一个方块叠在当前栈上的概率
pub const STACK_PROBABILITY: f64 = 0.5;

/// 线性特征维度:
/// 偏置 + 动作前塔高 + 动作后塔高 + 放到目标位置 + 拆塔 + 栈数 + 是否到达目标
pub const BLOCK_FEATURE_COUNT: usize = 7;
