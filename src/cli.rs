//! CLI - Command Line Interface for showdeck
//!
//! Every command prints human-readable lines on a terminal and a JSON
//! envelope when piped or run with `--json`.
//!
//! # Examples
//!
//! ```bash
//! showdeck search "the wire" --sort rating
//! showdeck show 169
//! showdeck episodes 169
//! showdeck episodes --season-id 731
//! showdeck genres Drama Comedy --limit 5 --json
//! showdeck top --pages 4
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::net::error::{NetworkError, NOT_FOUND_CODE};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// The requested record does not exist
    NotFound = 4,
}

impl ExitCode {
    /// Exit code for a failed request
    pub fn for_error(err: &NetworkError) -> Self {
        match (err.status, err.code.as_deref()) {
            (Some(404), _) => ExitCode::NotFound,
            (_, Some("ERR_MISSING_PARAM")) => ExitCode::InvalidArgs,
            (_, Some(NOT_FOUND_CODE)) => ExitCode::Error,
            _ => ExitCode::NetworkError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// showdeck - browse the TVmaze catalog from the terminal
#[derive(Parser, Debug)]
#[command(
    name = "showdeck",
    version,
    about = "Browse the TVmaze TV catalog",
    long_about = "Search shows, inspect cast, crew, seasons and episodes, \
                  and rank the show index by genre or rating.\n\n\
                  Output is JSON when piped or with --json.",
    after_help = "EXAMPLES:\n\
                  showdeck search \"breaking bad\"     Search for shows\n\
                  showdeck show 169                  Show details\n\
                  showdeck genres Drama -l 5         Top dramas\n\
                  showdeck top --json                Best rated shows"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search shows by name
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// Show details
    #[command(visible_alias = "i")]
    Show(IdCmd),

    /// Cast of a show
    Cast(IdCmd),

    /// Crew of a show
    Crew(IdCmd),

    /// Seasons of a show
    Seasons(IdCmd),

    /// Episodes of a show or of one season
    #[command(visible_alias = "ep")]
    Episodes(EpisodesCmd),

    /// One page of the show index
    Page(PageCmd),

    /// Best rated shows per genre
    Genres(GenresCmd),

    /// Best rated shows overall
    Top(TopCmd),

    /// List known genres
    GenreList,
}

// =============================================================================
// Search Command
// =============================================================================

#[derive(Args, Debug)]
pub struct SearchCmd {
    /// Search query
    #[arg(required = true)]
    pub query: String,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value = "20")]
    pub limit: usize,

    /// Result ordering
    #[arg(long, short = 's', value_enum, default_value = "score")]
    pub sort: SearchSort,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchSort {
    /// Relevance score (default)
    #[default]
    Score,
    /// Show rating
    Rating,
    /// Order returned by the API
    Api,
}

// =============================================================================
// Show / Cast / Crew / Seasons
// =============================================================================

#[derive(Args, Debug)]
pub struct IdCmd {
    /// TVmaze show id
    #[arg(required = true)]
    pub id: u64,

    /// Maximum number of results (list commands)
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

// =============================================================================
// Episodes Command
// =============================================================================

#[derive(Args, Debug)]
pub struct EpisodesCmd {
    /// TVmaze show id
    #[arg(required_unless_present = "season_id", conflicts_with = "season_id")]
    pub id: Option<u64>,

    /// List one season's episodes instead (TVmaze season id)
    #[arg(long)]
    pub season_id: Option<u64>,

    /// Only episodes of this season number (show mode)
    #[arg(long, short = 's')]
    pub season: Option<u32>,
}

// =============================================================================
// Index Commands
// =============================================================================

#[derive(Args, Debug)]
pub struct PageCmd {
    /// Index page (250 shows each, starting at 0)
    #[arg(default_value = "0")]
    pub page: u32,

    /// Maximum number of results
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct GenresCmd {
    /// Genres to rank (default: all known genres)
    pub genres: Vec<String>,

    /// Index pages to scan
    #[arg(long, short = 'p')]
    pub pages: Option<u32>,

    /// Shows per genre
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,

    /// Minimum rating
    #[arg(long, short = 'm')]
    pub min_rating: Option<f64>,
}

#[derive(Args, Debug)]
pub struct TopCmd {
    /// Number of shows
    #[arg(long, short = 'l', default_value = "12")]
    pub limit: usize,

    /// Index pages to scan
    #[arg(long, short = 'p', default_value = "2")]
    pub pages: u32,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data: the JSON envelope, or pretty JSON on a terminal
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print one record: the JSON envelope, or its display line
    pub fn print_item<T: Serialize + Display>(&self, item: &T) -> anyhow::Result<()> {
        if self.json {
            return self.print(item);
        }
        println!("{}", item);
        Ok(())
    }

    /// Print records: the JSON envelope, or one display line each
    pub fn print_list<T: Serialize + Display>(&self, items: &[T]) -> anyhow::Result<()> {
        if self.json {
            return self.print(items);
        }
        for item in items {
            println!("{}", item);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
