// 测试用走廊环境: 位置 0..=length，走到 length 得 1 分并终止。
// 可以关闭快照能力，或直接从终点出发，用来覆盖回退与错误路径。

use rand::Rng;

use super::env::{Environment, StepResult};
use crate::error::{EnvError, NotSimulatableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Corridor {
    length: usize,
    start: usize,
    position: usize,
    simulatable: bool,
}

impl Corridor {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            start: 0,
            position: 0,
            simulatable: true,
        }
    }

    pub fn starting_at(mut self, start: usize) -> Self {
        self.start = start;
        self.position = start;
        self
    }

    pub fn not_simulatable(mut self) -> Self {
        self.simulatable = false;
        self
    }
}

impl Environment for Corridor {
    type State = usize;
    type Action = Direction;

    fn reset<R: Rng + ?Sized>(&mut self, _rng: &mut R) -> usize {
        self.position = self.start;
        self.start
    }

    fn initial_state(&self) -> &usize {
        &self.start
    }

    fn current_state(&self) -> &usize {
        &self.position
    }

    fn legal_actions(&self, state: &usize) -> Vec<Direction> {
        if *state >= self.length {
            Vec::new()
        } else if *state == 0 {
            vec![Direction::Right]
        } else {
            vec![Direction::Left, Direction::Right]
        }
    }

    fn is_terminal(&self, state: &usize) -> bool {
        *state >= self.length
    }

    fn step(&mut self, action: &Direction) -> Result<StepResult<usize>, EnvError> {
        if !self.legal_actions(&self.position).contains(action) {
            return Err(EnvError::IllegalAction(format!("{:?} @ {}", action, self.position)));
        }
        self.position = match action {
            Direction::Left => self.position - 1,
            Direction::Right => self.position + 1,
        };
        let terminal = self.position >= self.length;
        Ok(StepResult {
            next_state: self.position,
            reward: if terminal { 1.0 } else { 0.0 },
            terminal,
        })
    }

    fn optimal_return(&self, state: &usize, discount_rate: f64) -> f64 {
        if *state >= self.length {
            return 0.0;
        }
        discount_rate.powi((self.length - state - 1) as i32)
    }

    fn snapshot(&self) -> Result<Self, NotSimulatableError> {
        if self.simulatable {
            Ok(self.clone())
        } else {
            Err(NotSimulatableError::new("走廊环境已关闭快照"))
        }
    }
}
