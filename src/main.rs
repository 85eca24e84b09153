use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use molek_solver::{
    action::{describe_move, format_moves},
    board::Board,
    solver::{SolveConfig, SolveResult, solve},
    state::GameState,
};
use std::io::{IsTerminal, Read, Write, stderr, stdin};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a deal
    Solve {
        /// Max states to examine before giving up
        #[arg(long, default_value_t = 50_000, value_name = "NUM")]
        max_states: usize,
        /// Print each move against the evolving board
        #[arg(long)]
        describe: bool,
        /// Optional file to load the deal from (stdin when omitted)
        file: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Solve {
            max_states,
            describe,
            file,
        } => {
            let content = match file {
                Some(file) => std::fs::read_to_string(file)?,
                None => {
                    let mut buf = String::new();
                    stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let board =
                Board::parse(&content).map_err(|err| anyhow!("Failed to parse deal; {err}"))?;
            let config = SolveConfig {
                max_states: *max_states,
                ..Default::default()
            };
            do_solve(board, config, *describe);
        }
    }

    Ok(())
}

fn do_solve(board: Board, config: SolveConfig, describe: bool) {
    let deal = board.pretty_print();
    let SolveResult {
        state,
        won,
        states,
        elapsed,
    } = with_spinner("Solving the deal...", {
        let board = board.clone();
        move || solve(board, config)
    });

    let outcome = if won {
        "✓ Solved the deal"
    } else {
        "✗ No win within budget, reporting the best state reached"
    };
    let moves_len = state.moves.len();
    let elapsed = format_elapsed(elapsed);
    println!(
        r#"{outcome}. Moves: {moves_len}, Elapsed: {elapsed}, States: {states}

===== DEAL =====
{deal}

===== RESULT =====
{}

===== MOVES ====="#,
        state.board.pretty_print()
    );
    println!("{}", format_moves(&state.moves));

    if describe {
        let mut replay = GameState::new(board);
        for &mov in &state.moves {
            println!("{}", describe_move(&replay.board, &mov));
            replay = replay.apply(mov);
        }
    }
}

fn with_spinner<T, F: FnOnce() -> T>(message: &str, f: F) -> T {
    if stderr().is_terminal() {
        let spinning = Arc::new(AtomicBool::new(true));
        let spinning_clone = Arc::clone(&spinning);
        let message = message.to_string();

        let handle = std::thread::spawn(move || {
            let spinner_chars = ['|', '/', '-', '\\'];
            let mut i = 0;
            let stderr = stderr();
            let mut handle = stderr.lock();

            let _ = write!(handle, "\x1b[?25l"); // hide cursor
            let _ = handle.flush();

            while spinning_clone.load(Ordering::Relaxed) {
                let spinner_char = spinner_chars[i % spinner_chars.len()];
                let _ = write!(handle, "\r{spinner_char} {message}",);
                let _ = handle.flush();
                std::thread::sleep(Duration::from_millis(100));
                i += 1;
            }

            let _ = write!(handle, "\r\x1b[2K\r\x1b[?25h"); // clear line and show cursor
            let _ = handle.flush();
        });

        let result = f();
        spinning.store(false, Ordering::Relaxed);
        let _ = handle.join();
        result
    } else {
        f()
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 90 {
        let ms = elapsed.subsec_millis();
        format!("{secs}.{ms:03}s")
    } else {
        let minutes = secs / 60;
        let secs = secs % 60;
        format!("{minutes}m {secs}s")
    }
}
