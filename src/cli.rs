//! CLI - Command Line Interface for Cinelog
//!
//! Every action is scriptable. With `--json` (or when stdout is not a
//! terminal) all output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Browse the catalog
//! cinelog search "el padrino" -t movie
//! cinelog top-rated -y 1999 -n 25
//!
//! # Track what you watch
//! cinelog watched add 550 -t movie --rating 9 --review "great"
//! cinelog watched list --sort rating
//! cinelog saved add 1396 -t tv
//! ```

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::models::{Identity, MediaType, WatchedSort};

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
    /// Title not found (remotely or in a collection)
    NotFound = 4,
    /// Local storage could not be written
    StorageError = 5,
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

/// Cinelog - browse TMDB and keep a log of what you watch
#[derive(Parser, Debug)]
#[command(
    name = "cinelog",
    version,
    about = "Browse TMDB and keep a log of what you watch",
    long_about = "Search and browse movies and TV shows from TMDB, and keep a local \
                  record of the titles you have watched (with rating, review and date) \
                  or saved for later.",
    after_help = "EXAMPLES:\n\
                  cinelog search \"blade runner\"              Search movies and shows\n\
                  cinelog top-rated -y 1999 -n 25            Best movies of 1999\n\
                  cinelog watched add 550 -t movie -r 9      Mark as watched\n\
                  cinelog saved list --json                  Saved titles as JSON"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

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
    /// Search for movies or TV shows
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// List popular movies or TV shows
    #[command(visible_alias = "pop")]
    Popular(PopularCmd),

    /// Get details for a movie or show
    #[command(visible_alias = "i")]
    Info(InfoCmd),

    /// Best rated titles of a given year
    #[command(visible_alias = "top")]
    TopRated(TopRatedCmd),

    /// List countries (for `top-rated --country`)
    Countries,

    /// List genres
    Genres(GenresCmd),

    /// Manage the watched list
    #[command(visible_alias = "w")]
    Watched(WatchedCmd),

    /// Manage the saved-for-later list
    Saved(SavedCmd),

    /// Show or edit configuration
    Config(ConfigCmd),
}

/// Media type argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaTypeFilter {
    /// Movies
    #[default]
    Movie,
    /// TV shows
    Tv,
}

impl From<MediaTypeFilter> for MediaType {
    fn from(filter: MediaTypeFilter) -> MediaType {
        match filter {
            MediaTypeFilter::Movie => MediaType::Movie,
            MediaTypeFilter::Tv => MediaType::Tv,
        }
    }
}

/// A catalog ID plus its media type
#[derive(Args, Debug, Clone, Copy)]
pub struct TitleRef {
    /// TMDB ID
    #[arg(required = true)]
    pub id: u64,

    /// Media type of the ID
    #[arg(long, short = 't', value_enum, required = true)]
    pub media_type: MediaTypeFilter,
}

impl TitleRef {
    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.media_type.into())
    }
}

// =============================================================================
// Catalog Commands
// =============================================================================

/// Search movies or TV shows by title
#[derive(Args, Debug)]
pub struct SearchCmd {
    /// Search query
    #[arg(required = true)]
    pub query: String,

    /// What to search
    #[arg(long, short = 't', value_enum, default_value = "movie")]
    pub media_type: MediaTypeFilter,

    /// Result page
    #[arg(long, short = 'p', default_value = "1")]
    pub page: u32,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value = "20")]
    pub limit: usize,
}

/// Popular movies or TV shows
#[derive(Args, Debug)]
pub struct PopularCmd {
    /// What to list
    #[arg(long, short = 't', value_enum, default_value = "movie")]
    pub media_type: MediaTypeFilter,

    /// Result page
    #[arg(long, short = 'p', default_value = "1")]
    pub page: u32,
}

/// Detailed information about a movie or TV show
#[derive(Args, Debug)]
pub struct InfoCmd {
    #[command(flatten)]
    pub title: TitleRef,
}

/// Best rated titles of a year (titles with at least 100 votes)
#[derive(Args, Debug)]
pub struct TopRatedCmd {
    /// Release year (movies) or first air year (TV)
    #[arg(long, short = 'y', required = true)]
    pub year: i32,

    /// How many titles to return (1-100)
    #[arg(long, short = 'n', default_value = "10")]
    pub count: usize,

    /// What to rank
    #[arg(long, short = 't', value_enum, default_value = "movie")]
    pub media_type: MediaTypeFilter,

    /// Origin country, ISO 3166-1 (TV only)
    #[arg(long)]
    pub country: Option<String>,
}

/// Genre list
#[derive(Args, Debug)]
pub struct GenresCmd {
    #[arg(long, short = 't', value_enum, default_value = "movie")]
    pub media_type: MediaTypeFilter,
}

// =============================================================================
// Watched Commands
// =============================================================================

#[derive(Args, Debug)]
pub struct WatchedCmd {
    #[command(subcommand)]
    pub action: WatchedAction,
}

#[derive(Subcommand, Debug)]
pub enum WatchedAction {
    /// List watched titles
    #[command(visible_alias = "ls")]
    List(WatchedListCmd),

    /// Show one watched title
    Get(TitleRef),

    /// Mark a title as watched (removes it from the saved list)
    Add(WatchedAddCmd),

    /// Change rating, review or date of a watched title
    Edit(WatchedEditCmd),

    /// Remove a title from the watched list
    #[command(visible_alias = "rm")]
    Remove(TitleRef),

    /// Counts and average rating
    Stats,
}

/// Sort order for the watched list
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortArg {
    /// Most recent first
    #[default]
    Date,
    /// Highest rating first
    Rating,
    /// Alphabetical
    Title,
}

impl From<SortArg> for WatchedSort {
    fn from(sort: SortArg) -> WatchedSort {
        match sort {
            SortArg::Date => WatchedSort::Date,
            SortArg::Rating => WatchedSort::Rating,
            SortArg::Title => WatchedSort::Title,
        }
    }
}

#[derive(Args, Debug)]
pub struct WatchedListCmd {
    /// Only this media type
    #[arg(long, short = 't', value_enum)]
    pub media_type: Option<MediaTypeFilter>,

    /// Sort order
    #[arg(long, value_enum, default_value = "date")]
    pub sort: SortArg,
}

#[derive(Args, Debug)]
pub struct WatchedAddCmd {
    #[command(flatten)]
    pub title_ref: TitleRef,

    /// Your rating (1-10)
    #[arg(long, short = 'r', required = true, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub rating: u8,

    /// Short review
    #[arg(long)]
    pub review: Option<String>,

    /// Date watched, YYYY-MM-DD (default: today)
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Title (fetched from TMDB when omitted)
    #[arg(long)]
    pub title: Option<String>,

    /// Poster path, e.g. /abc.jpg (fetched from TMDB when title is omitted)
    #[arg(long)]
    pub poster: Option<String>,
}

#[derive(Args, Debug)]
pub struct WatchedEditCmd {
    #[command(flatten)]
    pub title_ref: TitleRef,

    /// New rating (1-10)
    #[arg(long, short = 'r', value_parser = clap::value_parser!(u8).range(1..=10))]
    pub rating: Option<u8>,

    /// New review
    #[arg(long, conflicts_with = "clear_review")]
    pub review: Option<String>,

    /// Remove the review
    #[arg(long)]
    pub clear_review: bool,

    /// New date watched, YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

impl WatchedEditCmd {
    pub fn has_changes(&self) -> bool {
        self.rating.is_some() || self.review.is_some() || self.clear_review || self.date.is_some()
    }
}

/// Parse a YYYY-MM-DD date argument
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", s))
}

// =============================================================================
// Saved Commands
// =============================================================================

#[derive(Args, Debug)]
pub struct SavedCmd {
    #[command(subcommand)]
    pub action: SavedAction,
}

#[derive(Subcommand, Debug)]
pub enum SavedAction {
    /// List saved titles
    #[command(visible_alias = "ls")]
    List,

    /// Save a title for later
    Add(SavedAddCmd),

    /// Remove a saved title
    #[command(visible_alias = "rm")]
    Remove(TitleRef),

    /// Remove every saved title
    Clear,
}

#[derive(Args, Debug)]
pub struct SavedAddCmd {
    #[command(flatten)]
    pub title_ref: TitleRef,

    /// Title (fetched from TMDB when omitted)
    #[arg(long)]
    pub title: Option<String>,

    /// Poster path (fetched from TMDB when title is omitted)
    #[arg(long)]
    pub poster: Option<String>,
}

// =============================================================================
// Config Commands
// =============================================================================

#[derive(Args, Debug)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration (credentials masked)
    Show,

    /// Store a TMDB API key
    SetKey {
        #[arg(required = true)]
        key: String,
    },

    /// Store a TMDB read access token
    SetToken {
        #[arg(required = true)]
        token: String,
    },
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

/// Status OK response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusOk {
    pub status: &'static str,
}

impl Default for StatusOk {
    fn default() -> Self {
        Self { status: "ok" }
    }
}

/// Result of a collection mutation
#[derive(Debug, Serialize)]
pub struct MutationResult {
    pub status: &'static str,
    pub id: u64,
    pub media_type: MediaType,
    pub changed: bool,
}

impl MutationResult {
    pub fn new(identity: Identity, changed: bool) -> Self {
        Self {
            status: "ok",
            id: identity.id,
            media_type: identity.media_type,
            changed,
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

    /// Print success data (pretty JSON in either mode)
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print a list: JSON envelope, or one `Display` line per item
    pub fn print_list<T: Serialize + Display>(&self, items: &[T]) -> anyhow::Result<()> {
        if self.json {
            return self.print(items);
        }
        if items.is_empty() {
            self.info("(empty)");
        }
        for item in items {
            println!("{}", item);
        }
        Ok(())
    }

    /// Print one item: JSON envelope, or its `Display` line
    pub fn print_item<T: Serialize + Display>(&self, item: &T) -> anyhow::Result<()> {
        if self.json {
            return self.print(item);
        }
        println!("{}", item);
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
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
