use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, OnceLock};

use super::types::*;

// ==============================================================================
// --- 最优步数预计算表 ---
// ==============================================================================

/// 每个局面到目标塔的最少步数
///
/// 所有动作都可逆 (移走的方块总能原路放回)，
/// 因此从目标局面出发做一次广度优先搜索即可得到全部距离。
#[derive(Debug)]
pub struct DistanceTable {
    size: usize,
    distances: HashMap<BlocksState, u32>,
}

impl DistanceTable {
    fn build(size: usize) -> Self {
        let goal = BlocksState::goal(size);
        let mut distances = HashMap::new();
        let mut queue = VecDeque::new();

        distances.insert(goal.clone(), 0u32);
        queue.push_back(goal);

        while let Some(state) = queue.pop_front() {
            let d = distances[&state];
            for mv in state.legal_moves() {
                let next = state.apply(&mv);
                if !distances.contains_key(&next) {
                    distances.insert(next.clone(), d + 1);
                    queue.push_back(next);
                }
            }
        }

        log::debug!("{} 个方块的距离表: {} 个局面", size, distances.len());
        Self { size, distances }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// 局面到目标的最少步数
    pub fn distance(&self, state: &BlocksState) -> Option<u32> {
        self.distances.get(state).copied()
    }

    /// 局面总数
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn max_distance(&self) -> u32 {
        self.distances.values().copied().max().unwrap_or(0)
    }

    /// 遍历所有局面 (顺序不定)
    pub fn states(&self) -> impl Iterator<Item = &BlocksState> {
        self.distances.keys()
    }
}

static DISTANCE_TABLES: OnceLock<Mutex<HashMap<usize, Arc<DistanceTable>>>> = OnceLock::new();

/// 获取 `size` 个方块的距离表，每种规模全进程只计算一次
pub fn distance_table(size: usize) -> Arc<DistanceTable> {
    let tables = DISTANCE_TABLES.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard
        .entry(size)
        .or_insert_with(|| Arc::new(DistanceTable::build(size)))
        .clone()
}
