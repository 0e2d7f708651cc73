//! Connect-MCTS command line.
//!
//! ## Usage
//!
//! - `connect-mcts` - Start the text shell
//! - `connect-mcts shell` - Start the text shell
//! - `connect-mcts play` - Play against the engine in the terminal
//! - `connect-mcts selfplay` - Watch the engine play itself

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use fastrand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use connect_mcts::constants::{DEFAULT_TIME_BUDGET, EXPAND_THRESHOLD, EXPLORATION};
use connect_mcts::mcts::{Budget, SearchConfig, search};
use connect_mcts::shell::Shell;
use connect_mcts::state::{Outcome, State};

/// Connect-MCTS: a Connect Four engine built on Monte Carlo Tree Search
#[derive(Parser)]
#[command(name = "connect-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    search: SearchArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct SearchArgs {
    /// Thinking time per engine move, in milliseconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIME_BUDGET.as_millis() as u64)]
    budget_ms: u64,

    /// UCB1 exploration constant
    #[arg(long, global = true, default_value_t = EXPLORATION)]
    exploration: f64,

    /// Visits a leaf needs before it is expanded
    #[arg(long, global = true, default_value_t = EXPAND_THRESHOLD)]
    expand_threshold: u32,

    /// Seed for the playout generator (random if omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,
}

impl SearchArgs {
    fn config(&self) -> Result<SearchConfig> {
        if self.expand_threshold == 0 {
            bail!("--expand-threshold must be at least 1");
        }
        Ok(SearchConfig {
            exploration: self.exploration,
            expand_threshold: self.expand_threshold,
            budget: Budget::Time(Duration::from_millis(self.budget_ms)),
        })
    }

    fn rng(&self) -> Rng {
        self.seed.map_or_else(Rng::new, Rng::with_seed)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the line-oriented text shell on stdin/stdout
    Shell,
    /// Play against the engine in the terminal
    Play {
        /// Let the engine make the first move
        #[arg(long)]
        engine_first: bool,
    },
    /// Let the engine play both sides
    Selfplay,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("connect_mcts=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.search.config()?;
    let rng = cli.search.rng();

    match cli.command {
        Some(Commands::Play { engine_first }) => play(config, rng, engine_first),
        Some(Commands::Selfplay) => selfplay(config, rng),
        Some(Commands::Shell) | None => {
            let mut shell = Shell::new(config, rng);
            shell.run_stdio().context("shell I/O failed")
        }
    }
}

/// Human against engine. The human moves first unless `engine_first` is set.
fn play(config: SearchConfig, mut rng: Rng, engine_first: bool) -> Result<()> {
    let mut state = State::new();
    let mut lines = io::stdin().lock().lines();
    let mut engine_to_move = engine_first;

    println!("{state}");
    while !state.is_done() {
        if engine_to_move {
            let result = search(&state, &config, &mut rng)?;
            state.apply_move(result.column)?;
            println!("Engine plays {}", result.column);
        } else {
            print!("Your move {:?}: ", state.legal_moves());
            io::stdout().flush().context("failed to flush stdout")?;

            let Some(line) = lines.next() else {
                info!("input closed, leaving the game");
                return Ok(());
            };
            let line = line.context("failed to read move")?;
            let col = match line.trim().parse::<usize>() {
                Ok(col) => col,
                Err(_) => {
                    println!("Please enter a column number.");
                    continue;
                }
            };
            if let Err(e) = state.apply_move(col) {
                println!("{e}");
                continue;
            }
        }
        println!("{state}");
        engine_to_move = !engine_to_move;
    }

    // The outcome is stated for the side to move, which is whoever did not move last.
    let human_to_move = !engine_to_move;
    let message = match (state.outcome(), human_to_move) {
        (Outcome::Draw, _) => "DRAW",
        (Outcome::Loss, true) | (Outcome::Win, false) => "YOU LOSE...",
        _ => "YOU WIN!!",
    };
    println!("{message}");
    Ok(())
}

/// Engine against itself.
fn selfplay(config: SearchConfig, mut rng: Rng) -> Result<()> {
    let mut state = State::new();
    println!("{state}");
    while !state.is_done() {
        let result = search(&state, &config, &mut rng)?;
        state.apply_move(result.column)?;
        info!(
            column = result.column,
            iterations = result.iterations,
            winrate = result.winrate,
            "engine move"
        );
        println!("{state}");
    }

    let message = match state.outcome() {
        Outcome::Draw => "Draw".to_string(),
        // The side to move lost, so the last mover won.
        _ => {
            let winner = if state.is_first() { "second" } else { "first" };
            format!("The {winner} player wins")
        }
    };
    println!("{message}");
    Ok(())
}
