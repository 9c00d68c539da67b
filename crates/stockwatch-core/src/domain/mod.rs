//! # Domain Models
//!
//! Validated value types shared by the watchlist, the store client and the CLI.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Trimmed, upper-cased instrument code |
//! | [`Market`] | Venue tag (`HK`, `US`) |
//! | [`TrackedSymbol`] | One watchlist entry |
//! | [`Report`] | Store-generated analysis report |
//! | [`ChartSeries`] | Per-symbol price points |
//! | [`TimerSetting`] | Daily analysis time (`HH:MM`) |
//! | [`Timestamp`] | UTC instant, lenient on input |
//!
//! Construction validates invariants, so an invalid symbol or timer never
//! reaches the network:
//!
//! ```rust
//! use stockwatch_core::{Symbol, ValidationError};
//!
//! assert_eq!(Symbol::parse(" aapl ").unwrap().as_str(), "AAPL");
//! assert_eq!(Symbol::parse("  "), Err(ValidationError::EmptySymbol));
//! ```

mod market;
mod models;
mod symbol;
mod timestamp;

pub use market::Market;
pub use models::{
    Ack, ChartPoint, ChartSeries, DateFilter, NewSymbol, NewsItem, Report, TimerSetting,
    TrackedSymbol, Trend, PLACEHOLDER_NAME,
};
pub use symbol::Symbol;
pub use timestamp::Timestamp;
