//! Pure watchlist state transitions.
//!
//! [`apply`] performs the optimistic half of a mutation and names the store
//! call to issue; [`reconcile`] folds the store's answer back in. Neither does
//! I/O, so every rollback path is testable without a network.

use serde::Serialize;

use crate::{Identity, Market, Symbol, Timestamp, TrackedSymbol, ValidationError, WatchlistError};

/// Ordered watchlist owned by exactly one identity (`None` = guest).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WatchlistState {
    owner: Option<Identity>,
    entries: Vec<TrackedSymbol>,
}

impl WatchlistState {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn owned_by(owner: Identity) -> Self {
        Self {
            owner: Some(owner),
            entries: Vec::new(),
        }
    }

    /// State as returned by a full load, in store order.
    pub fn with_entries(owner: Option<Identity>, entries: Vec<TrackedSymbol>) -> Self {
        Self { owner, entries }
    }

    pub fn owner(&self) -> Option<&Identity> {
        self.owner.as_ref()
    }

    pub fn entries(&self) -> &[TrackedSymbol] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TrackedSymbol> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, symbol: &Symbol, market: Market) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.same_listing(symbol, market))
    }

    /// Stored code a removal of `symbol` refers to: an exact match first,
    /// then an HK entry that differs only in zero padding.
    pub fn stored_symbol(&self, symbol: &Symbol) -> Option<&Symbol> {
        self.entries
            .iter()
            .find(|entry| entry.symbol == *symbol)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|entry| entry.same_listing(symbol, Market::Hk))
            })
            .map(|entry| &entry.symbol)
    }
}

/// User mutation request with a normalized symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Add { symbol: Symbol, market: Market },
    Remove { symbol: Symbol },
}

impl Intent {
    pub fn add(raw_symbol: &str, market: Market) -> Result<Self, ValidationError> {
        Ok(Self::Add {
            symbol: Symbol::parse(raw_symbol)?,
            market,
        })
    }

    /// Removal targets an existing entry, so any stored code is accepted.
    pub fn remove(raw_symbol: &str) -> Result<Self, ValidationError> {
        let symbol = Symbol::from_store(raw_symbol);
        if symbol.as_str().is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        Ok(Self::Remove { symbol })
    }

    pub const fn action(&self) -> &'static str {
        match self {
            Self::Add { .. } => "adding a symbol",
            Self::Remove { .. } => "removing a symbol",
        }
    }
}

/// Store call required to complete an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingCall {
    Create {
        identity: Identity,
        symbol: Symbol,
        market: Market,
    },
    Delete {
        identity: Identity,
        symbol: Symbol,
    },
}

impl PendingCall {
    pub fn identity(&self) -> &Identity {
        match self {
            Self::Create { identity, .. } | Self::Delete { identity, .. } => identity,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        match self {
            Self::Create { symbol, .. } | Self::Delete { symbol, .. } => symbol,
        }
    }
}

/// What the store answered for a [`PendingCall`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Create succeeded with the authoritative entry.
    Created(TrackedSymbol),
    /// Delete succeeded and the list was re-fetched.
    Reloaded(Vec<TrackedSymbol>),
    /// The call failed.
    Failed,
}

/// Optimistic half of a mutation. A guest owner yields `AuthRequired` and no
/// call; adding a listing that is already present yields `AlreadyTracked`.
pub fn apply(
    state: &WatchlistState,
    intent: &Intent,
    now: Timestamp,
) -> Result<(WatchlistState, PendingCall), WatchlistError> {
    let identity = state
        .owner()
        .cloned()
        .ok_or(WatchlistError::AuthRequired {
            action: intent.action(),
        })?;

    match intent {
        Intent::Add { symbol, market } => {
            if state.contains(symbol, *market) {
                return Err(WatchlistError::AlreadyTracked {
                    symbol: symbol.clone(),
                    market: *market,
                });
            }

            let mut entries = Vec::with_capacity(state.len() + 1);
            entries.push(TrackedSymbol::placeholder(symbol.clone(), *market, now));
            entries.extend(state.entries.iter().cloned());

            Ok((
                WatchlistState {
                    owner: state.owner.clone(),
                    entries,
                },
                PendingCall::Create {
                    identity,
                    symbol: symbol.clone(),
                    market: *market,
                },
            ))
        }
        Intent::Remove { symbol } => Ok((
            state.clone(),
            PendingCall::Delete {
                identity,
                symbol: state.stored_symbol(symbol).unwrap_or(symbol).clone(),
            },
        )),
    }
}

/// Folds a store answer into the state.
///
/// - create success: the placeholder (matched by listing, not by position) is
///   replaced in place by the authoritative entry; duplicates of either
///   listing are dropped. With no placeholder left, the entry is prepended.
/// - create failure: placeholders for the listing are removed.
/// - delete success: the reloaded list replaces the entries wholesale.
/// - delete failure: unchanged.
pub fn reconcile(state: &WatchlistState, intent: &Intent, outcome: &Outcome) -> WatchlistState {
    match (intent, outcome) {
        (Intent::Add { symbol, market }, Outcome::Created(confirmed)) => {
            let matches = |entry: &TrackedSymbol| {
                entry.same_listing(symbol, *market)
                    || entry.same_listing(&confirmed.symbol, confirmed.market)
            };

            let position = state.entries.iter().position(matches);
            let mut entries: Vec<TrackedSymbol> = state
                .entries
                .iter()
                .filter(|entry| !matches(*entry))
                .cloned()
                .collect();
            entries.insert(position.unwrap_or(0).min(entries.len()), confirmed.clone());

            WatchlistState {
                owner: state.owner.clone(),
                entries,
            }
        }
        (Intent::Add { symbol, market }, Outcome::Failed) => WatchlistState {
            owner: state.owner.clone(),
            entries: state
                .entries
                .iter()
                .filter(|entry| !(entry.is_placeholder() && entry.same_listing(symbol, *market)))
                .cloned()
                .collect(),
        },
        (Intent::Remove { .. }, Outcome::Reloaded(entries)) => {
            WatchlistState::with_entries(state.owner.clone(), entries.clone())
        }
        (Intent::Remove { .. }, Outcome::Failed)
        | (Intent::Add { .. }, Outcome::Reloaded(_))
        | (Intent::Remove { .. }, Outcome::Created(_)) => state.clone(),
    }
}
