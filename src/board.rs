use anyhow::{Context, Result, bail};
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};

pub const TOTAL_STACKS: usize = 6;
pub const INITIAL_STACK_SIZE: usize = 6;
pub const MIN_RANK: i8 = 6;
pub const MAX_RANK: i8 = 14;
pub const RUN_LENGTH: usize = (MAX_RANK - MIN_RANK + 1) as usize;

const LABELS: [&str; RUN_LENGTH] = ["6", "7", "8", "9", "10", "v", "d", "k", "t"];
const STACK_CAPACITY: usize = TOTAL_STACKS * INITIAL_STACK_SIZE;

/// A card rank in [6,14]. A negative value marks a cheated placement;
/// the magnitude is always the natural rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Card(i8);

impl Card {
    pub fn new(value: i8) -> Self {
        debug_assert!((MIN_RANK..=MAX_RANK).contains(&value.abs()));
        Self(value)
    }

    pub fn parse(label: &str) -> Result<Self> {
        let (label, cheated) = match label.strip_suffix('*') {
            Some(rest) => (rest, true),
            None => (label, false),
        };
        let rank = LABELS
            .iter()
            .position(|&l| l == label)
            .with_context(|| format!("Invalid rank label '{label}'"))?;
        let value = MIN_RANK + rank as i8;
        Ok(Self(if cheated { -value } else { value }))
    }

    pub fn value(&self) -> i8 {
        self.0
    }

    pub fn rank(&self) -> i8 {
        self.0.abs()
    }

    pub fn is_cheated(&self) -> bool {
        self.0 < 0
    }

    /// Toggles the cheated marking, preserving the rank.
    pub fn flip_cheat(&self) -> Self {
        Self(-self.0)
    }

    pub fn label(&self) -> &'static str {
        LABELS[(self.rank() - MIN_RANK) as usize]
    }

    pub fn pretty_print(&self) -> String {
        if self.is_cheated() {
            format!("{}*", self.label())
        } else {
            self.label().to_string()
        }
    }
}

/// An ordered pile of cards; index 0 is the bottom, the last element is
/// the only card directly exposed to moves.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stack {
    pub cards: SmallVec<[Card; STACK_CAPACITY]>,
}

impl Stack {
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn peek_top(&self) -> Option<&Card> {
        self.cards.last()
    }

    /// A complete stack holds exactly the full natural run t..6 and is
    /// frozen for the rest of the game.
    pub fn is_complete(&self) -> bool {
        self.cards.len() == RUN_LENGTH
            && self
                .cards
                .iter()
                .enumerate()
                .all(|(i, card)| card.value() == MAX_RANK - i as i8)
    }

    pub fn is_cheated(&self) -> bool {
        self.peek_top().is_some_and(|card| card.is_cheated())
    }

    /// Start index of the maximal movable run: the single top card when
    /// it is cheated, otherwise the longest strictly descending-by-one
    /// suffix of natural ranks.
    pub fn run_start(&self) -> usize {
        debug_assert!(!self.cards.is_empty());
        let top = self.cards.len() - 1;
        if self.cards[top].is_cheated() {
            return top;
        }
        let mut start = top;
        while start > 0 && self.cards[start - 1].value() == self.cards[start].value() + 1 {
            start -= 1;
        }
        start
    }

    fn detach(&mut self, start: usize) -> Vec<Card> {
        self.cards.drain(start..).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    pub stacks: [Stack; TOTAL_STACKS],
}

impl Board {
    /// Builds the initial board from raw rank labels, one sequence per
    /// stack. Card multiplicity is the caller's responsibility.
    pub fn from_layout(layout: &[Vec<&str>]) -> Result<Self> {
        if layout.len() != TOTAL_STACKS {
            bail!(
                "Expected exactly {TOTAL_STACKS} stacks, got {}",
                layout.len()
            );
        }
        let mut board = Self::default();
        for (stack, labels) in board.stacks.iter_mut().zip(layout) {
            for label in labels {
                stack.cards.push(Card::parse(label)?);
            }
        }
        Ok(board)
    }

    pub fn is_won(&self) -> bool {
        self.stacks
            .iter()
            .all(|stack| stack.is_empty() || stack.is_complete())
    }

    pub fn complete_stacks(&self) -> usize {
        self.stacks.iter().filter(|s| s.is_complete()).count()
    }

    pub fn empty_stacks(&self) -> usize {
        self.stacks.iter().filter(|s| s.is_empty()).count()
    }

    pub fn cheated_stacks(&self) -> usize {
        self.stacks.iter().filter(|s| s.is_cheated()).count()
    }

    pub fn longest_stack(&self) -> usize {
        self.stacks.iter().map(|s| s.len()).max().unwrap_or(0)
    }

    /// Detaches the run starting at `from_card` and lands it on the
    /// destination stack. The cheated flag flips the sign of the landed
    /// card: a forced placement marks it cheated, an uncheat clears it.
    pub fn move_run(&mut self, from_stack: usize, from_card: usize, to_stack: usize, cheated: bool) {
        let run = self.stacks[from_stack].detach(from_card);
        let dest = &mut self.stacks[to_stack];
        dest.cards.extend(run);
        if cheated && let Some(last) = dest.cards.last_mut() {
            *last = last.flip_cheat();
        }
    }

    /// A stack-order-independent key: permuting which slot holds which
    /// stack contents yields the same key.
    pub fn canonical_key(&self) -> u64 {
        let mut ordered: [&Stack; TOTAL_STACKS] = std::array::from_fn(|i| &self.stacks[i]);
        ordered.sort_by(|a, b| a.cards.cmp(&b.cards));
        let mut hasher = FxHasher::default();
        for stack in ordered {
            stack.hash(&mut hasher);
        }
        hasher.finish()
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut board = Self::default();

        for line in content
            .split('\n')
            .map(|v| v.trim())
            .filter(|l| !l.is_empty())
        {
            let line_context = || format!("Failed to parse at '{line}'");
            let Some(rest) = line.strip_prefix("Stack") else {
                bail!("Unrecognized line '{line}'");
            };
            let mut parts = rest.splitn(2, ':');
            let idx = parts
                .next()
                .unwrap_or("")
                .trim()
                .parse::<usize>()
                .context("Invalid stack index")
                .with_context(line_context)?;
            if !(1..=TOTAL_STACKS).contains(&idx) {
                bail!("Stack index {idx} out of range 1..={TOTAL_STACKS}");
            }
            let stack = &mut board.stacks[idx - 1];
            for label in parts.next().unwrap_or("").split_whitespace() {
                stack
                    .cards
                    .push(Card::parse(label).with_context(line_context)?);
            }
        }

        Ok(board)
    }

    pub fn pretty_print(&self) -> String {
        let mut output = String::new();
        for (i, stack) in self.stacks.iter().enumerate() {
            if stack.is_empty() {
                continue;
            }
            let cards = stack
                .cards
                .iter()
                .map(|c| c.pretty_print())
                .collect::<Vec<_>>()
                .join(" ");
            output.push_str(&format!("Stack{}: {cards}\n", i + 1));
        }
        output.pop();
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(values: &[i8]) -> Stack {
        Stack::new(values.iter().map(|&v| Card::new(v)).collect())
    }

    #[test]
    fn test_parse_card() {
        for label in LABELS {
            let card = Card::parse(label).unwrap();
            assert_eq!(card.label(), label);
            assert!(!card.is_cheated());
        }
        assert_eq!(Card::parse("t").unwrap().value(), 14);
        assert_eq!(Card::parse("9*").unwrap().value(), -9);
        assert_eq!(Card::parse("9*").unwrap().rank(), 9);
        assert!(Card::parse("5").is_err());
        assert!(Card::parse("x").is_err());
    }

    #[test]
    fn test_is_complete() {
        assert!(stack(&[14, 13, 12, 11, 10, 9, 8, 7, 6]).is_complete());
        // A correct but shorter prefix is not complete
        assert!(!stack(&[14, 13, 12, 11, 10, 9, 8, 7]).is_complete());
        assert!(!stack(&[13, 12, 11, 10, 9, 8, 7, 6]).is_complete());
        assert!(!stack(&[14, 13, 12, 11, 10, 9, 8, 7, -6]).is_complete());
        assert!(!stack(&[]).is_complete());
    }

    #[test]
    fn test_run_start() {
        assert_eq!(stack(&[6, 10, 11, 9, 8, 14]).run_start(), 5);
        assert_eq!(stack(&[6, 10, 9, 8, 7]).run_start(), 1);
        assert_eq!(stack(&[10, 9, 8, 7]).run_start(), 0);
        // A cheated top moves alone
        assert_eq!(stack(&[12, 11, -10]).run_start(), 2);
        // A cheated card below the top never joins a run
        assert_eq!(stack(&[-9, 8]).run_start(), 1);
    }

    #[test]
    fn test_canonical_key() {
        let board = Board::from_layout(&[
            vec!["6", "10", "v"],
            vec!["9", "8", "t"],
            vec![],
            vec!["k"],
            vec!["7", "7"],
            vec!["d"],
        ])
        .unwrap();

        let mut permuted = board.clone();
        permuted.stacks.swap(0, 3);
        permuted.stacks.swap(2, 5);
        assert_eq!(board.canonical_key(), permuted.canonical_key());

        let mut changed = board.clone();
        changed.stacks[1].cards[2] = Card::new(13);
        assert_ne!(board.canonical_key(), changed.canonical_key());

        let mut cheated = board.clone();
        cheated.stacks[3].cards[0] = Card::new(-13);
        assert_ne!(board.canonical_key(), cheated.canonical_key());
    }

    #[test]
    fn test_parse_board() {
        const BOARD_STR: &str = r#"Stack1: 6 10 v 9 8 t
Stack2: 10 d v k 7 k
Stack3: 6 t 9 7 6 d
Stack5: 8 9 v 9* 7 10
Stack6: v 8 d 6 k 7"#;

        let board = Board::parse(BOARD_STR).unwrap();
        assert!(board.stacks[3].is_empty());
        assert_eq!(board.stacks[4].cards[3].value(), -9);
        assert_eq!(BOARD_STR, board.pretty_print());
    }

    #[test]
    fn test_parse_board_invalid() {
        assert!(Board::parse("Stack1: 5 6").is_err());
        assert!(Board::parse("Stack7: 6").is_err());
        assert!(Board::parse("Pile1: 6").is_err());
    }

    #[test]
    fn test_from_layout() {
        let board = Board::from_layout(&[
            vec!["6", "10", "v", "9", "8", "t"],
            vec!["10", "d", "v", "k", "7", "k"],
            vec!["6", "t", "9", "7", "6", "d"],
            vec!["d", "k", "10", "t", "t", "8"],
            vec!["8", "9", "v", "9", "7", "10"],
            vec!["v", "8", "d", "6", "k", "7"],
        ])
        .unwrap();
        assert_eq!(board.longest_stack(), 6);
        assert_eq!(board.empty_stacks(), 0);
        assert!(!board.is_won());

        assert!(Board::from_layout(&[vec!["6"]]).is_err());
    }
}
