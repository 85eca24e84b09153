use crate::action::{Locus, Move};
use crate::board::{Board, TOTAL_STACKS};

use smallvec::SmallVec;

// 6 sources times 5 destinations bounds the move count per state.
pub type MoveList = SmallVec<[Move; 32]>;

/// Scoring weights for the search heuristic; lower scores are better.
/// `cheated` is negative so cheats subtract from the reward term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreWeights {
    pub complete: i32,
    pub empty: i32,
    pub cheated: i32,
    pub longest: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            complete: 100,
            empty: 50,
            cheated: -15,
            longest: 2,
        }
    }
}

/// One configuration of the board plus the moves taken to reach it from
/// the initial deal. States are never mutated; `apply` produces a new,
/// independent state.
#[derive(Debug, Clone)]
pub struct GameState {
    pub board: Board,
    pub moves: Vec<Move>,
}

impl GameState {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            moves: Vec::new(),
        }
    }

    pub fn is_won(&self) -> bool {
        self.board.is_won()
    }

    pub fn has_no_legal_moves(&self) -> bool {
        self.legal_moves().is_empty()
    }

    pub fn legal_moves(&self) -> MoveList {
        let mut moves = MoveList::new();

        for (index, stack) in self.board.stacks.iter().enumerate() {
            if stack.is_empty() || stack.is_complete() {
                continue;
            }
            let start = stack.run_start();
            let head = stack.cards[start];
            let run_len = stack.len() - start;
            let from = Locus {
                stack: index,
                card: start,
            };

            for (dest_index, dest) in self.board.stacks.iter().enumerate() {
                if dest_index == index {
                    continue;
                }
                if dest.is_complete() || dest.is_cheated() {
                    continue;
                }
                let to = Locus {
                    stack: dest_index,
                    card: dest.len(),
                };

                if head.is_cheated() {
                    // A cheated card moves alone, onto an empty stack or
                    // its natural successor; either landing uncheats it.
                    if dest
                        .peek_top()
                        .is_none_or(|top| top.value() == head.rank() + 1)
                    {
                        moves.push(Move {
                            from,
                            to,
                            cheated: true,
                        });
                    }
                    continue;
                }

                match dest.peek_top() {
                    None => moves.push(Move {
                        from,
                        to,
                        cheated: false,
                    }),
                    Some(top) if top.value() == head.value() + 1 => moves.push(Move {
                        from,
                        to,
                        cheated: false,
                    }),
                    // A lone natural card may be forced onto anything else
                    Some(_) if run_len == 1 => moves.push(Move {
                        from,
                        to,
                        cheated: true,
                    }),
                    Some(_) => {}
                }
            }
        }

        moves
    }

    /// Executes a move produced by `legal_moves` against a copy of the
    /// board. Enumeration and application must never disagree; the loci
    /// are asserted, not validated.
    pub fn apply(&self, mov: Move) -> GameState {
        debug_assert!(mov.from.stack < TOTAL_STACKS && mov.to.stack < TOTAL_STACKS);
        debug_assert!(mov.from.card < self.board.stacks[mov.from.stack].len());
        debug_assert_eq!(mov.to.card, self.board.stacks[mov.to.stack].len());

        let mut board = self.board.clone();
        board.move_run(mov.from.stack, mov.from.card, mov.to.stack, mov.cheated);

        let mut moves = self.moves.clone();
        moves.push(mov);
        GameState { board, moves }
    }

    pub fn score(&self, weights: &ScoreWeights) -> i32 {
        let board = &self.board;
        -(board.complete_stacks() as i32 * weights.complete
            + board.empty_stacks() as i32 * weights.empty
            + board.cheated_stacks() as i32 * weights.cheated
            + board.longest_stack() as i32 * weights.longest)
    }
}
