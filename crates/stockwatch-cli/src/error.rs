use std::path::PathBuf;

use stockwatch_core::{StoreError, ValidationError, WatchlistError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Watchlist(#[from] WatchlistError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cannot read session file {}: {source}", path.display())]
    SessionRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file {} is not a valid session: {source}", path.display())]
    SessionFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::SessionRead { .. } | Self::SessionFormat { .. } => 2,
            Self::Watchlist(error) => match error {
                WatchlistError::Validation(_)
                | WatchlistError::AlreadyTracked { .. }
                | WatchlistError::AlreadyPending { .. } => 2,
                WatchlistError::AuthRequired { .. }
                | WatchlistError::IdentityUnavailable
                | WatchlistError::IdentityPending => 3,
                WatchlistError::Remote(_) => 4,
            },
            Self::Store(_) => 4,
            Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
