//! Session state for one CLI invocation.

use std::path::Path;

use stockwatch_core::SessionState;

use crate::cli::Cli;
use crate::error::CliError;

/// A `--session` file wins; otherwise `--email`/`--name` mean signed in and
/// neither means anonymous.
pub fn load(cli: &Cli) -> Result<SessionState, CliError> {
    match &cli.session {
        Some(path) => from_file(path),
        None => Ok(from_flags(cli.email.as_deref(), cli.name.as_deref())),
    }
}

pub fn from_flags(email: Option<&str>, name: Option<&str>) -> SessionState {
    if email.is_none() && name.is_none() {
        return SessionState::Anonymous;
    }

    SessionState::Authenticated {
        email: email.map(String::from),
        name: name.map(String::from),
    }
}

pub fn from_file(path: &Path) -> Result<SessionState, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::SessionRead {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| CliError::SessionFormat {
        path: path.to_path_buf(),
        source,
    })
}
