//! Line-oriented text protocol for driving the engine.
//!
//! The protocol follows the conventions of the Go Text Protocol: one command
//! per line, an optional numeric id in front, and responses of the form
//! `=id text` on success or `?id text` on failure, each followed by a blank
//! line.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`
//! - `list_commands`, `known_command <cmd>`
//! - `quit`
//! - `clear_board` - Start a new game
//! - `play <col>` - Drop a stone for the side to move
//! - `genmove` - Search, play and print the engine's column
//! - `legal_moves` - Columns that still have room
//! - `showboard` - Print the board
//! - `outcome` - `in_progress`, `win`, `loss` or `draw` for the side to move
//! - `time_budget <ms>` - Thinking time for `genmove`

use std::io::{self, BufRead, Write};
use std::time::Duration;

use fastrand::Rng;
use tracing::{debug, info};

use crate::mcts::{Budget, SearchConfig, search};
use crate::state::{Outcome, State};

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "clear_board",
    "genmove",
    "known_command",
    "legal_moves",
    "list_commands",
    "name",
    "outcome",
    "play",
    "protocol_version",
    "quit",
    "showboard",
    "time_budget",
    "version",
];

/// Shell state: the game in progress and the search settings.
pub struct Shell {
    state: State,
    config: SearchConfig,
    rng: Rng,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new(SearchConfig::default(), Rng::new())
    }
}

impl Shell {
    pub fn new(config: SearchConfig, rng: Rng) -> Self {
        Self {
            state: State::new(),
            config,
            rng,
        }
    }

    /// Current position.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Serve stdin/stdout until `quit` or end of input.
    pub fn run_stdio(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run(stdin.lock(), stdout.lock())
    }

    /// Serve commands from `input`, writing responses to `output`.
    pub fn run<R: BufRead, O: Write>(&mut self, input: R, mut output: O) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            let command = parts[0].to_lowercase();
            let args = &parts[1..];
            debug!(command = %command, ?args, "shell command");

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command id from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "2".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(name) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&name.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "clear_board" => {
                self.state = State::new();
                (true, String::new())
            }

            "play" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let Ok(col) = arg.parse::<usize>() else {
                    return (false, format!("invalid column: {arg}"));
                };
                match self.state.apply_move(col) {
                    Ok(()) => (true, String::new()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "genmove" => match search(&self.state, &self.config, &mut self.rng) {
                Ok(result) => {
                    if let Err(e) = self.state.apply_move(result.column) {
                        return (false, e.to_string());
                    }
                    info!(
                        column = result.column,
                        iterations = result.iterations,
                        winrate = result.winrate,
                        "genmove"
                    );
                    (true, result.column.to_string())
                }
                Err(e) => (false, e.to_string()),
            },

            "legal_moves" => {
                let moves: Vec<String> = self
                    .state
                    .legal_moves()
                    .iter()
                    .map(|c| c.to_string())
                    .collect();
                (true, moves.join(" "))
            }

            "showboard" => (true, format!("\n{}", self.state)),

            "outcome" => {
                let text = match self.state.outcome() {
                    Outcome::InProgress => "in_progress",
                    Outcome::Win => "win",
                    Outcome::Loss => "loss",
                    Outcome::Draw => "draw",
                };
                (true, text.to_string())
            }

            "time_budget" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match arg.parse::<u64>() {
                    Ok(ms) => {
                        self.config.budget = Budget::Time(Duration::from_millis(ms));
                        (true, String::new())
                    }
                    Err(_) => (false, format!("invalid time budget: {arg}")),
                }
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }
}
