use crate::board::{Board, Card};

/// A position on the board: which stack, and the card index within it.
/// For a move source this is where the run starts; for a destination it
/// is one past the current top, where the run lands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Locus {
    pub stack: usize,
    pub card: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Move {
    pub from: Locus,
    pub to: Locus,
    pub cheated: bool,
}

pub fn format_moves(moves: &[Move]) -> String {
    let list: Vec<String> = moves
        .iter()
        .map(|mov| {
            let mut str = format!(
                "{}.{}>{}.{}",
                mov.from.stack + 1,
                mov.from.card,
                mov.to.stack + 1,
                mov.to.card
            );
            if mov.cheated {
                str.push('*');
            }
            str
        })
        .collect();

    let mut output = String::new();
    let max_width = list.iter().map(|s| s.len()).max().unwrap_or_default() + 1;
    for chunk in list.chunks(10) {
        for cmd in chunk {
            output.push_str(&format!("{cmd:<width$}", width = max_width));
        }
        output.push('\n');
    }

    output
}

pub fn describe_move(board: &Board, mov: &Move) -> String {
    let format_card =
        |card: Option<&Card>| -> String { card.map(|c| c.pretty_print()).unwrap_or_default() };

    let from_stack = &board.stacks[mov.from.stack];
    let run = from_stack.cards[mov.from.card..]
        .iter()
        .map(|c| c.pretty_print())
        .collect::<Vec<_>>()
        .join(" ");
    let to_card = format_card(board.stacks[mov.to.stack].peek_top());

    let mut output = format!(
        "(Stack{}) {run} -> (Stack{}) {to_card}",
        mov.from.stack + 1,
        mov.to.stack + 1
    );
    if mov.cheated {
        let tag = if from_stack.is_cheated() {
            "uncheat"
        } else {
            "cheat"
        };
        output.push_str(&format!(" [{tag}]"));
    }
    output
}
