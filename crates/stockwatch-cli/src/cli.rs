//! CLI argument definitions for stockwatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `watchlist` | List, add, or remove tracked symbols |
//! | `reports` | Fetch (or follow) generated analysis reports |
//! | `chart` | Fetch a symbol's price series |
//! | `timer` | Set the daily analysis time |
//! | `analyze` | Trigger an analysis run now |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--email` / `--name` | none | Signed-in identity |
//! | `--session` | none | JSON session file, instead of `--email`/`--name` |
//! | `--api-url` | env / dev default | Store base URL |
//! | `--timeout-ms` | `10000` | Request timeout in ms |
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `-v` | `false` | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! stockwatch --email ada@example.com watchlist add 0700 --market HK
//! stockwatch reports --date yesterday --format table
//! stockwatch reports --follow --interval-secs 30
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Personal stock watchlist and analysis reports.
#[derive(Debug, Parser)]
#[command(name = "stockwatch", author, version, about = "Personal stock watchlist CLI")]
pub struct Cli {
    /// Email of the signed-in user.
    #[arg(long, global = true, value_name = "EMAIL")]
    pub email: Option<String>,

    /// Display name, used when no email is given.
    #[arg(long, global = true, value_name = "NAME")]
    pub name: Option<String>,

    /// Session state as JSON, e.g. `{"status":"authenticated","email":"..."}`.
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        conflicts_with_all = ["email", "name"]
    )]
    pub session: Option<PathBuf>,

    /// Store base URL. Overrides `STOCKWATCH_API_URL`.
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Request timeout in milliseconds. Overrides `STOCKWATCH_TIMEOUT_MS`.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text for terminal display.
    Table,
    /// Single JSON object output.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the signed-in user's watchlist.
    Watchlist(WatchlistArgs),

    /// Fetch generated analysis reports.
    ///
    /// Reports are shared by all users; no sign-in needed.
    Reports(ReportsArgs),

    /// Fetch the price series for one symbol.
    Chart(ChartArgs),

    /// Set the daily analysis time (24-hour HH:MM).
    Timer(TimerArgs),

    /// Trigger an analysis run immediately.
    Analyze,
}

#[derive(Debug, Args)]
pub struct WatchlistArgs {
    #[command(subcommand)]
    pub command: WatchlistCommand,
}

#[derive(Debug, Subcommand)]
pub enum WatchlistCommand {
    /// Show tracked symbols, newest first.
    List,

    /// Track a symbol.
    ///
    ///   stockwatch --email ada@example.com watchlist add aapl
    ///   stockwatch --email ada@example.com watchlist add 700 --market HK
    Add(AddArgs),

    /// Stop tracking a symbol.
    Remove(RemoveArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Instrument code; trimmed and upper-cased.
    pub symbol: String,

    /// Listing market (HK or US).
    #[arg(long, default_value = "US")]
    pub market: String,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct ReportsArgs {
    /// Which reports to fetch: today, yesterday, or all.
    #[arg(long, default_value = "today")]
    pub date: String,

    /// Keep polling and print each new batch until interrupted.
    #[arg(long, default_value_t = false)]
    pub follow: bool,

    /// Seconds between polls in follow mode.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: u64,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    /// Listing market (HK or US).
    pub market: String,

    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct TimerArgs {
    /// Time of day, e.g. 08:30.
    pub time: String,
}
