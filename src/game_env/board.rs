use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

use super::constants::*;
use super::env::{Environment, StepResult};
use super::solver::{distance_table, DistanceTable};
use super::types::*;
use crate::error::{ConfigurationError, EnvError, NotSimulatableError};

// ==============================================================================
// --- 环境结构体 (BlocksWorld) ---
// ==============================================================================

/// 方块世界环境
///
/// 目标是把所有方块叠成 0, 1, ..., n-1 (自底向上) 的一座塔。
/// 克隆代价很低: 距离表通过 `Arc` 共享。
#[derive(Clone, Debug)]
pub struct BlocksWorld {
    /// 方块数
    size: usize,
    /// 固定的初始局面 (None 表示每局随机)
    fixed_start: Option<BlocksState>,
    /// 本局初始局面
    initial: BlocksState,
    /// 当前局面
    current: BlocksState,
    /// 本局已执行步数
    total_step_counter: usize,
    /// 最少步数表
    distances: Arc<DistanceTable>,
}

impl BlocksWorld {
    /// 每局随机初始局面
    pub fn new(size: usize) -> Result<Self, ConfigurationError> {
        Self::validate_size(size)?;
        let initial = BlocksState::all_on_table(size);
        Ok(Self {
            size,
            fixed_start: None,
            current: initial.clone(),
            initial,
            total_step_counter: 0,
            distances: distance_table(size),
        })
    }

    /// 每局都从同一个局面开始
    pub fn with_start(start: BlocksState) -> Result<Self, ConfigurationError> {
        let mut world = Self::new(start.size())?;
        if world.distances.distance(&start).is_none() {
            return Err(ConfigurationError::new("start", format!("非法局面 {:?}", start)));
        }
        if start.is_goal() {
            return Err(ConfigurationError::new("start", "初始局面不能是目标局面"));
        }
        world.initial = start.clone();
        world.current = start.clone();
        world.fixed_start = Some(start);
        Ok(world)
    }

    fn validate_size(size: usize) -> Result<(), ConfigurationError> {
        if !(MIN_BLOCKS..=MAX_BLOCKS).contains(&size) {
            return Err(ConfigurationError::new(
                "blocks",
                format!("方块数必须在 {}..={} 之间，实际为 {}", MIN_BLOCKS, MAX_BLOCKS, size),
            ));
        }
        Ok(())
    }

    /// 随机生成一个非目标局面 (Shuffle + 随机切分成栈)
    fn random_configuration<R: Rng + ?Sized>(&self, rng: &mut R) -> BlocksState {
        loop {
            let mut order: Vec<Block> = (0..self.size as Block).collect();
            order.shuffle(rng);

            let mut stacks: Vec<Vec<Block>> = Vec::new();
            for block in order {
                match stacks.last_mut() {
                    Some(top) if rng.gen_bool(STACK_PROBABILITY) => top.push(block),
                    _ => stacks.push(vec![block]),
                }
            }

            let state = BlocksState::from_stacks(self.size, &stacks);
            if !state.is_goal() {
                return state;
            }
        }
    }

    // === 公共访问器方法 ===

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get_total_steps(&self) -> usize {
        self.total_step_counter
    }

    /// 局面到目标塔的最少步数
    pub fn distance_to_goal(&self, state: &BlocksState) -> Option<u32> {
        self.distances.distance(state)
    }

    pub fn distance_table(&self) -> &DistanceTable {
        &self.distances
    }
}

impl Environment for BlocksWorld {
    type State = BlocksState;
    type Action = BlockMove;

    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> BlocksState {
        let start = match &self.fixed_start {
            Some(start) => start.clone(),
            None => self.random_configuration(rng),
        };
        self.initial = start.clone();
        self.current = start.clone();
        self.total_step_counter = 0;
        start
    }

    fn initial_state(&self) -> &BlocksState {
        &self.initial
    }

    fn current_state(&self) -> &BlocksState {
        &self.current
    }

    fn legal_actions(&self, state: &BlocksState) -> Vec<BlockMove> {
        // 目标局面为终局，没有合法动作
        if state.is_goal() {
            return Vec::new();
        }
        state.legal_moves()
    }

    fn is_terminal(&self, state: &BlocksState) -> bool {
        state.is_goal()
    }

    fn step(&mut self, action: &BlockMove) -> Result<StepResult<BlocksState>, EnvError> {
        if self.current.is_goal() {
            return Err(EnvError::IllegalAction(format!(
                "{} (局面 {} 已终止)",
                action, self.current
            )));
        }
        if !self.current.is_legal(action) {
            return Err(EnvError::IllegalAction(format!(
                "{} (局面 {})",
                action, self.current
            )));
        }

        self.total_step_counter += 1;
        self.current = self.current.apply(action);

        let terminal = self.current.is_goal();
        let reward = if terminal { GOAL_REWARD } else { STEP_REWARD };
        Ok(StepResult {
            next_state: self.current.clone(),
            reward,
            terminal,
        })
    }

    fn optimal_return(&self, state: &BlocksState, discount_rate: f64) -> f64 {
        let distance = match self.distances.distance(state) {
            Some(d) => d,
            None => {
                log::warn!("局面 {:?} 不在距离表中", state);
                return 0.0;
            }
        };
        if distance == 0 {
            return 0.0;
        }

        let mut total = 0.0;
        let mut discount = 1.0;
        for _ in 1..distance {
            total += discount * STEP_REWARD;
            discount *= discount_rate;
        }
        total + discount * GOAL_REWARD
    }

    fn snapshot(&self) -> Result<Self, NotSimulatableError> {
        Ok(self.clone())
    }
}
