use serde::{Deserialize, Serialize};
use std::fmt;

// ==============================================================================
// --- 基础数据结构 ---
// ==============================================================================

/// 方块编号
pub type Block = u8;

/// 方块下方的支撑物
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Support {
    /// 桌面
    Table,
    /// 另一个方块
    On(Block),
}

impl fmt::Display for Support {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Support::Table => write!(f, "桌面"),
            Support::On(b) => write!(f, "{}", b),
        }
    }
}

/// 方块世界的一个局面
///
/// `on[b]` 记录方块 `b` 放在什么上面。栈之间无顺序，
/// 因此这个关系唯一确定一个局面，可直接作为哈希键。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlocksState {
    on: Vec<Support>,
}

impl BlocksState {
    /// 由支撑关系构造局面，不检查合法性 (测试与内部使用)
    pub fn from_supports(on: Vec<Support>) -> Self {
        Self { on }
    }

    /// 所有方块都在桌面上
    pub fn all_on_table(size: usize) -> Self {
        Self {
            on: vec![Support::Table; size],
        }
    }

    /// 由若干个栈 (自底向上) 构造局面
    pub fn from_stacks(size: usize, stacks: &[Vec<Block>]) -> Self {
        let mut on = vec![Support::Table; size];
        for stack in stacks {
            for pair in stack.windows(2) {
                on[pair[1] as usize] = Support::On(pair[0]);
            }
        }
        Self { on }
    }

    /// 目标局面: 0 在桌面，i 叠在 i-1 上
    pub fn goal(size: usize) -> Self {
        let on = (0..size)
            .map(|b| {
                if b == 0 {
                    Support::Table
                } else {
                    Support::On((b - 1) as Block)
                }
            })
            .collect();
        Self { on }
    }

    pub fn size(&self) -> usize {
        self.on.len()
    }

    pub fn support_of(&self, block: Block) -> Support {
        self.on[block as usize]
    }

    pub fn supports(&self) -> &[Support] {
        &self.on
    }

    pub(super) fn set_support(&mut self, block: Block, support: Support) {
        self.on[block as usize] = support;
    }

    /// 所有的栈，每个栈自底向上，按底部方块编号排序
    pub fn stacks(&self) -> Vec<Vec<Block>> {
        let n = self.size();
        let mut above: Vec<Option<Block>> = vec![None; n];
        for (b, s) in self.on.iter().enumerate() {
            if let Support::On(below) = s {
                above[*below as usize] = Some(b as Block);
            }
        }

        let mut stacks = Vec::new();
        for bottom in 0..n {
            if self.on[bottom] != Support::Table {
                continue;
            }
            let mut stack = vec![bottom as Block];
            let mut cur = bottom;
            while let Some(next) = above[cur] {
                stack.push(next);
                cur = next as usize;
            }
            stacks.push(stack);
        }
        stacks
    }
}

impl fmt::Display for BlocksState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stacks = self.stacks();
        for (i, stack) in stacks.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            let labels: Vec<String> = stack.iter().map(|b| b.to_string()).collect();
            write!(f, "[{}]", labels.join(" "))?;
        }
        Ok(())
    }
}

/// 动作: 把一个顶部空闲的方块移到桌面或另一个空闲方块上
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockMove {
    pub block: Block,
    pub to: Support,
}

impl BlockMove {
    pub fn new(block: Block, to: Support) -> Self {
        Self { block, to }
    }
}

impl fmt::Display for BlockMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.block, self.to)
    }
}
