use crate::board::Board;
use crate::state::{GameState, ScoreWeights};

use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

/// Tunables for one solve invocation.
#[derive(Debug, Clone, Copy)]
pub struct SolveConfig {
    /// Max states to examine before giving up.
    pub max_states: usize,
    pub weights: ScoreWeights,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            max_states: 50_000,
            weights: ScoreWeights::default(),
        }
    }
}

pub fn solve(board: Board, config: SolveConfig) -> SolveResult {
    Solver::new(config).solve(board)
}

/// A struct representing the best-first solver for the patience game.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolveConfig,
}

impl Solver {
    pub fn new(config: SolveConfig) -> Self {
        Self { config }
    }

    /// Traverses the state space looking for a winning configuration.
    /// Always terminates: a win is found, the exploration budget runs
    /// out, or the frontier empties. Without a win, the lowest-scoring
    /// expanded state is reported instead.
    pub fn solve(&self, board: Board) -> SolveResult {
        let weights = &self.config.weights;
        let timer = Instant::now();

        let initial = GameState::new(board);
        let mut best_score = initial.score(weights);
        let mut best = initial.clone();
        let mut winning: Option<GameState> = None;

        let mut open = BinaryHeap::with_capacity(self.config.max_states / 10);
        let mut visited: FxHashSet<u64> = FxHashSet::default();
        let mut states_checked: usize = 0;

        open.push(Candidate::new(best_score, initial));

        while winning.is_none()
            && let Some(Candidate { score, state }) = open.pop()
        {
            // Dedup lazily: duplicates from different parents may sit in
            // the heap, only the first popped one is expanded.
            let key = state.board.canonical_key();
            if visited.contains(&key) {
                continue;
            }

            states_checked += 1;
            if states_checked >= self.config.max_states {
                break;
            }

            if score < best_score {
                best_score = score;
                best = state.clone();
            }

            visited.insert(key);

            for mov in state.legal_moves() {
                let next = state.apply(mov);
                if next.is_won() {
                    winning = Some(next);
                    break;
                }
                if next.has_no_legal_moves() {
                    // Dead configuration, drop it
                    continue;
                }
                let next_score = next.score(weights);
                open.push(Candidate::new(next_score, next));
            }
        }

        let (state, won) = match winning {
            Some(state) => (state, true),
            None => (best, false),
        };

        SolveResult {
            state,
            won,
            states: states_checked,
            elapsed: timer.elapsed(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolveResult {
    pub state: GameState,
    pub won: bool,
    pub states: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
struct Candidate {
    score: i32,
    state: GameState,
}

impl Candidate {
    fn new(score: i32, state: GameState) -> Self {
        Self { score, state }
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the lowest score pops first
        other.score.cmp(&self.score)
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Card, TOTAL_STACKS};

    fn board_of(rows: [&[i8]; TOTAL_STACKS]) -> Board {
        let mut board = Board::default();
        for (stack, row) in board.stacks.iter_mut().zip(rows) {
            for &value in row {
                stack.cards.push(Card::new(value));
            }
        }
        board
    }

    fn rank_multiset(board: &Board) -> Vec<i8> {
        let mut ranks: Vec<i8> = board
            .stacks
            .iter()
            .flat_map(|s| s.cards.iter().map(|c| c.rank()))
            .collect();
        ranks.sort();
        ranks
    }

    fn sample_deal() -> Board {
        Board::from_layout(&[
            vec!["6", "10", "v", "9", "8", "t"],
            vec!["10", "d", "v", "k", "7", "k"],
            vec!["6", "t", "9", "7", "6", "d"],
            vec!["d", "k", "10", "t", "t", "8"],
            vec!["8", "9", "v", "9", "7", "10"],
            vec!["v", "8", "d", "6", "k", "7"],
        ])
        .unwrap()
    }

    #[test]
    fn test_solve_one_move_from_win() {
        let board = board_of([&[14, 13, 12, 11, 10, 9, 8, 7], &[6], &[], &[], &[], &[]]);
        let result = solve(board, SolveConfig::default());
        assert!(result.won);
        assert!(result.state.is_won());
        assert_eq!(result.state.moves.len(), 1);
        assert!(result.state.board.stacks[0].is_complete());
    }

    #[test]
    fn test_solve_sample_deal() {
        let board = sample_deal();
        let weights = ScoreWeights::default();
        let initial_score = GameState::new(board.clone()).score(&weights);
        let initial_ranks = rank_multiset(&board);

        let result = solve(board.clone(), SolveConfig::default());

        // The search never regresses below the start
        assert!(result.won || result.state.score(&weights) <= initial_score);
        assert!(result.states > 0);
        assert_eq!(rank_multiset(&result.state.board), initial_ranks);

        // Replaying the reported moves from the deal reproduces the
        // reported board.
        let mut replay = GameState::new(board);
        for &mov in &result.state.moves {
            replay = replay.apply(mov);
        }
        assert_eq!(replay.board, result.state.board);
    }

    #[test]
    fn test_solve_respects_budget() {
        let config = SolveConfig {
            max_states: 1,
            ..Default::default()
        };
        let result = solve(sample_deal(), config);
        assert!(!result.won);
        assert_eq!(result.states, 1);
        // Nothing was expanded, so the best candidate is the deal itself
        assert!(result.state.moves.is_empty());
    }

    #[test]
    fn test_solve_exhausts_frontier() {
        // Two lone cards that can only shuffle between themselves; the
        // frontier dries up long before the budget does.
        let board = board_of([&[6], &[9], &[], &[], &[], &[]]);
        let result = solve(board, SolveConfig::default());
        assert!(!result.won);
        assert!(result.states < SolveConfig::default().max_states);
    }
}
