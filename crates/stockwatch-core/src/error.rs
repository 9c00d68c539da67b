use thiserror::Error;

use crate::{Market, StoreError, Symbol};

/// Validation errors raised before any remote call is issued.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid market '{value}', expected one of HK, US")]
    InvalidMarket { value: String },
    #[error("invalid date filter '{value}', expected one of today, yesterday, all")]
    InvalidDateFilter { value: String },
    #[error("timer must be a 24-hour HH:MM time: '{value}'")]
    InvalidTimerTime { value: String },

    #[error("timestamp must be ISO-8601/RFC3339: '{value}'")]
    InvalidTimestamp { value: String },

    #[error("identity cannot be empty")]
    EmptyIdentity,

    #[error("api base url must be an absolute http(s) url: '{value}'")]
    InvalidBaseUrl { value: String },
    #[error("invalid runtime context '{value}', expected one of local, hosted")]
    InvalidRuntimeContext { value: String },
}

/// Failures of watchlist load/add/remove.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WatchlistError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{action} requires sign-in")]
    AuthRequired { action: &'static str },

    #[error("signed in, but the session carries neither email nor name; sign in again")]
    IdentityUnavailable,

    #[error("sign-in is still being resolved; try again shortly")]
    IdentityPending,

    #[error("{symbol} ({market}) is already in the watchlist")]
    AlreadyTracked { symbol: Symbol, market: Market },

    #[error("{symbol} ({market}) is already being added")]
    AlreadyPending { symbol: Symbol, market: Market },

    #[error(transparent)]
    Remote(#[from] StoreError),
}

impl WatchlistError {
    /// Whether the caller should direct the user to sign in.
    pub const fn needs_sign_in(&self) -> bool {
        matches!(self, Self::AuthRequired { .. } | Self::IdentityUnavailable)
    }
}
