use super::types::*;

// ==============================================================================
// --- 规则逻辑扩展块 (合法动作、目标判定) ---
// ==============================================================================

impl BlocksState {
    /// 方块 `block` 上面是否没有其它方块
    pub fn is_clear(&self, block: Block) -> bool {
        !self.supports().iter().any(|s| *s == Support::On(block))
    }

    /// 所有顶部空闲的方块 (按编号升序)
    pub fn clear_blocks(&self) -> Vec<Block> {
        let n = self.size();
        let mut covered = vec![false; n];
        for s in self.supports() {
            if let Support::On(below) = s {
                covered[*below as usize] = true;
            }
        }
        (0..n)
            .filter(|&b| !covered[b])
            .map(|b| b as Block)
            .collect()
    }

    /// 合法动作列表
    ///
    /// 枚举顺序固定: 按方块编号，先桌面，再按编号排列的目标方块。
    /// 贪心动作平局时按此顺序取第一个，保证实验可复现。
    pub fn legal_moves(&self) -> Vec<BlockMove> {
        let clear = self.clear_blocks();
        let mut moves = Vec::with_capacity(clear.len() * clear.len());
        for &block in &clear {
            if self.support_of(block) != Support::Table {
                moves.push(BlockMove::new(block, Support::Table));
            }
            for &target in &clear {
                if target != block && self.support_of(block) != Support::On(target) {
                    moves.push(BlockMove::new(block, Support::On(target)));
                }
            }
        }
        moves
    }

    pub fn is_legal(&self, mv: &BlockMove) -> bool {
        let n = self.size();
        if mv.block as usize >= n || !self.is_clear(mv.block) {
            return false;
        }
        match mv.to {
            Support::Table => self.support_of(mv.block) != Support::Table,
            Support::On(target) => {
                (target as usize) < n
                    && target != mv.block
                    && self.is_clear(target)
                    && self.support_of(mv.block) != mv.to
            }
        }
    }

    /// 执行动作后的新局面 (不检查合法性)
    pub fn apply(&self, mv: &BlockMove) -> BlocksState {
        let mut next = self.clone();
        next.set_support(mv.block, mv.to);
        next
    }

    /// 目标塔自底向上已经就位的方块数
    pub fn goal_tower_height(&self) -> usize {
        let n = self.size();
        let mut height = 0;
        while height < n {
            let expected = if height == 0 {
                Support::Table
            } else {
                Support::On((height - 1) as Block)
            };
            if self.support_of(height as Block) != expected {
                break;
            }
            height += 1;
        }
        height
    }

    pub fn is_goal(&self) -> bool {
        self.goal_tower_height() == self.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_on_table_moves() {
        let state = BlocksState::all_on_table(3);
        let moves = state.legal_moves();
        // 每个方块都可以叠到另外两个方块上，不能再放桌面
        assert_eq!(moves.len(), 6);
        assert_eq!(moves[0], BlockMove::new(0, Support::On(1)));
        assert!(moves.iter().all(|m| m.to != Support::Table));
    }

    #[test]
    fn test_legal_moves_order_and_validity() {
        // [0 1] | [2]
        let state = BlocksState::from_stacks(3, &[vec![0, 1], vec![2]]);
        let moves = state.legal_moves();
        assert_eq!(
            moves,
            vec![
                BlockMove::new(1, Support::Table),
                BlockMove::new(1, Support::On(2)),
                BlockMove::new(2, Support::On(1)),
            ]
        );
        for mv in &moves {
            assert!(state.is_legal(mv));
        }
        assert!(!state.is_legal(&BlockMove::new(0, Support::Table)));
        assert!(!state.is_legal(&BlockMove::new(2, Support::Table)));
    }

    #[test]
    fn test_goal_tower_height() {
        assert_eq!(BlocksState::goal(4).goal_tower_height(), 4);
        assert!(BlocksState::goal(4).is_goal());
        assert_eq!(BlocksState::all_on_table(4).goal_tower_height(), 1);
        let reversed = BlocksState::from_stacks(3, &[vec![2, 1, 0]]);
        assert_eq!(reversed.goal_tower_height(), 0);
    }

    #[test]
    fn test_apply_and_stacks() {
        let state = BlocksState::all_on_table(3);
        let next = state.apply(&BlockMove::new(1, Support::On(0)));
        assert_eq!(next.stacks(), vec![vec![0, 1], vec![2]]);
        assert_eq!(next.to_string(), "[0 1] | [2]");
        // 原局面不变
        assert_eq!(state, BlocksState::all_on_table(3));
    }
}
