//! Identity resolution from an externally managed session.
//!
//! The auth subsystem reports a [`SessionState`]; [`resolve`] turns it into a
//! [`Resolution`] and [`IdentityResolver`] publishes changes to dependents
//! such as the watchlist reconciler.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::ValidationError;

/// Stable per-user key used to scope remote watchlist operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyIdentity);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Identity {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.0
    }
}

/// Session phases observed from the auth subsystem. Provider-specific shapes
/// are collapsed into the optional `email`/`name` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    Pending,
    Authenticated {
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
    Anonymous,
}

/// Settled (or not yet settled) identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "identity", rename_all = "snake_case")]
pub enum Resolution {
    /// Session still resolving; dependents defer instead of clearing.
    Pending,
    Guest,
    User(Identity),
    /// Authenticated session without email or name.
    Unidentified,
}

impl Resolution {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::User(identity) => Some(identity),
            Self::Pending | Self::Guest | Self::Unidentified => None,
        }
    }

    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Email first, display name as fallback. Blank fields count as absent.
pub fn resolve(session: &SessionState) -> Resolution {
    match session {
        SessionState::Pending => Resolution::Pending,
        SessionState::Anonymous => Resolution::Guest,
        SessionState::Authenticated { email, name } => email
            .as_deref()
            .and_then(|value| Identity::parse(value).ok())
            .or_else(|| name.as_deref().and_then(|value| Identity::parse(value).ok()))
            .map_or(Resolution::Unidentified, Resolution::User),
    }
}

/// Holds the current resolution and notifies subscribers on change.
#[derive(Debug)]
pub struct IdentityResolver {
    sender: watch::Sender<Resolution>,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityResolver {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Resolution::Pending);
        Self { sender }
    }

    /// Feed a new session observation. Returns `true` when the resolution
    /// changed.
    pub fn update(&self, session: &SessionState) -> bool {
        let next = resolve(session);
        let changed = self.sender.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next.clone();
            true
        });

        if changed {
            tracing::debug!(resolution = ?next, "identity resolution changed");
        }
        changed
    }

    pub fn current(&self) -> Resolution {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Resolution> {
        self.sender.subscribe()
    }
}
