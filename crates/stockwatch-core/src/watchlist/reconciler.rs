use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::watch;

use super::transition::{apply, reconcile, Intent, Outcome, WatchlistState};
use crate::store::WatchlistStore;
use crate::{
    Identity, Market, Resolution, StoreError, Symbol, Timestamp, TrackedSymbol, WatchlistError,
};

/// Result of a load attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Entries replaced by the store's list.
    Loaded { count: usize },
    /// Guest: state emptied without a store call.
    Cleared,
    /// Identity still pending; nothing attempted.
    Deferred,
    /// Identity changed or a newer load landed first; the result was dropped.
    Stale,
}

/// Identity and sequence a load was issued under.
#[derive(Debug, Clone)]
struct LoadTicket {
    identity: Identity,
    generation: u64,
    sequence: u64,
}

#[derive(Debug)]
struct Inner {
    resolution: Resolution,
    /// Bumped on every resolution change; loads from older generations are
    /// stale.
    generation: u64,
    issued_loads: u64,
    applied_load: u64,
    state: WatchlistState,
    adds_in_flight: HashSet<ListingKey>,
}

/// Keeps the local watchlist in step with the remote store for the current
/// identity.
///
/// The state lock is never held across a store call, so loads and mutations
/// may interleave freely.
pub struct WatchlistReconciler<S> {
    store: S,
    inner: Mutex<Inner>,
}

impl<S: WatchlistStore> WatchlistReconciler<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            inner: Mutex::new(Inner {
                resolution: Resolution::Pending,
                generation: 0,
                issued_loads: 0,
                applied_load: 0,
                state: WatchlistState::guest(),
                adds_in_flight: HashSet::new(),
            }),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn snapshot(&self) -> WatchlistState {
        self.lock().state.clone()
    }

    pub fn entries(&self) -> Vec<TrackedSymbol> {
        self.lock().state.entries().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().state.is_empty()
    }

    pub fn resolution(&self) -> Resolution {
        self.lock().resolution.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.lock().resolution.identity().cloned()
    }

    /// React to an identity resolution.
    ///
    /// Pending and unidentified sessions keep the current entries; a guest
    /// gets an empty list; a user gets a list owned by them (emptied first if
    /// the owner changed) followed by a full load.
    pub async fn settle(&self, resolution: Resolution) -> Result<LoadOutcome, WatchlistError> {
        {
            let mut inner = self.lock();
            if inner.resolution != resolution {
                inner.generation += 1;
                inner.resolution = resolution.clone();
            }

            match &resolution {
                Resolution::Pending => return Ok(LoadOutcome::Deferred),
                Resolution::Unidentified => {
                    tracing::warn!("authenticated session has no usable identity");
                    return Err(WatchlistError::IdentityUnavailable);
                }
                Resolution::Guest => {
                    inner.state = WatchlistState::guest();
                    tracing::debug!("guest session; watchlist cleared");
                    return Ok(LoadOutcome::Cleared);
                }
                Resolution::User(identity) => {
                    if inner.state.owner() != Some(identity) {
                        inner.state = WatchlistState::owned_by(identity.clone());
                    }
                }
            }
        }

        self.load().await
    }

    /// Follow an identity feed until its sender is dropped, settling on every
    /// change. Errors are logged, not returned.
    pub async fn follow(&self, mut resolutions: watch::Receiver<Resolution>) {
        loop {
            let resolution = resolutions.borrow_and_update().clone();
            if let Err(error) = self.settle(resolution).await {
                tracing::warn!(%error, "watchlist settle failed");
            }

            if resolutions.changed().await.is_err() {
                break;
            }
        }
    }

    /// Full reload for the current identity. On failure the entries are left
    /// untouched.
    pub async fn load(&self) -> Result<LoadOutcome, WatchlistError> {
        let ticket = {
            let mut inner = self.lock();
            match inner.resolution.clone() {
                Resolution::Pending => return Ok(LoadOutcome::Deferred),
                Resolution::Unidentified => return Err(WatchlistError::IdentityUnavailable),
                Resolution::Guest => {
                    inner.state = WatchlistState::guest();
                    return Ok(LoadOutcome::Cleared);
                }
                Resolution::User(identity) => issue_ticket(&mut inner, identity),
            }
        };

        let result = self.store.list(Some(&ticket.identity)).await;
        self.finish_load(&ticket, result, |state, entries| {
            WatchlistState::with_entries(state.owner().cloned(), entries)
        })
    }

    /// Optimistically add a symbol, then commit or roll back on the store's
    /// answer. Returns the authoritative entry.
    pub async fn add(
        &self,
        raw_symbol: &str,
        market: Market,
    ) -> Result<TrackedSymbol, WatchlistError> {
        let symbol = Symbol::parse(raw_symbol)?;
        let intent = Intent::Add {
            symbol: symbol.clone(),
            market,
        };

        let (identity, key) = {
            let mut inner = self.lock();
            let identity = check_mutable(&inner.resolution, &intent)?;
            let key = listing_key(&identity, &symbol, market);
            if inner.adds_in_flight.contains(&key) {
                return Err(WatchlistError::AlreadyPending { symbol, market });
            }

            let (next, _) = apply(&inner.state, &intent, Timestamp::now())?;
            inner.state = next;
            inner.adds_in_flight.insert(key.clone());
            (identity, key)
        };

        tracing::debug!(%symbol, %market, %identity, "optimistic add applied");
        let result = self.store.create(&identity, &symbol, market).await;

        let mut inner = self.lock();
        inner.adds_in_flight.remove(&key);

        if inner.state.owner() != Some(&identity) {
            tracing::debug!(%symbol, %market, "identity changed during add; outcome dropped");
            return result.map_err(WatchlistError::from);
        }

        match result {
            Ok(confirmed) => {
                inner.state = reconcile(&inner.state, &intent, &Outcome::Created(confirmed.clone()));
                tracing::info!(symbol = %confirmed.symbol, %market, "symbol added");
                Ok(confirmed)
            }
            Err(error) => {
                inner.state = reconcile(&inner.state, &intent, &Outcome::Failed);
                tracing::warn!(%symbol, %market, %error, "add failed; optimistic entry rolled back");
                Err(error.into())
            }
        }
    }

    /// Delete a symbol remotely, then re-sync the whole list. Local entries
    /// are not spliced.
    pub async fn remove(&self, raw_symbol: &str) -> Result<LoadOutcome, WatchlistError> {
        let intent = Intent::remove(raw_symbol)?;

        let (identity, symbol) = {
            let inner = self.lock();
            check_mutable(&inner.resolution, &intent)?;
            let (_, call) = apply(&inner.state, &intent, Timestamp::now())?;
            (call.identity().clone(), call.symbol().clone())
        };

        if let Err(error) = self.store.delete(&identity, &symbol).await {
            tracing::warn!(%symbol, %error, "remove failed; watchlist unchanged");
            return Err(error.into());
        }
        tracing::info!(%symbol, "symbol removed; re-syncing");

        let ticket = {
            let mut inner = self.lock();
            match inner.resolution.clone() {
                Resolution::User(current) if current == identity => {
                    issue_ticket(&mut inner, current)
                }
                _ => return Ok(LoadOutcome::Stale),
            }
        };

        let result = self.store.list(Some(&ticket.identity)).await;
        self.finish_load(&ticket, result, |state, entries| {
            reconcile(state, &intent, &Outcome::Reloaded(entries))
        })
    }

    fn finish_load(
        &self,
        ticket: &LoadTicket,
        result: Result<Vec<TrackedSymbol>, StoreError>,
        replace: impl FnOnce(&WatchlistState, Vec<TrackedSymbol>) -> WatchlistState,
    ) -> Result<LoadOutcome, WatchlistError> {
        let mut inner = self.lock();
        let current = inner.generation == ticket.generation
            && inner.state.owner() == Some(&ticket.identity)
            && ticket.sequence > inner.applied_load;

        if !current {
            tracing::debug!(identity = %ticket.identity, "discarding stale watchlist load");
            return Ok(LoadOutcome::Stale);
        }

        match result {
            Ok(entries) => {
                let count = entries.len();
                inner.state = replace(&inner.state, entries);
                inner.applied_load = ticket.sequence;
                tracing::info!(identity = %ticket.identity, count, "watchlist loaded");
                Ok(LoadOutcome::Loaded { count })
            }
            Err(error) => {
                tracing::warn!(identity = %ticket.identity, %error, "watchlist load failed");
                Err(error.into())
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .expect("watchlist state lock should not be poisoned")
    }
}

fn issue_ticket(inner: &mut Inner, identity: Identity) -> LoadTicket {
    inner.issued_loads += 1;
    LoadTicket {
        identity,
        generation: inner.generation,
        sequence: inner.issued_loads,
    }
}

/// Identity a mutation may run under.
fn check_mutable(resolution: &Resolution, intent: &Intent) -> Result<Identity, WatchlistError> {
    match resolution {
        Resolution::User(identity) => Ok(identity.clone()),
        Resolution::Pending => Err(WatchlistError::IdentityPending),
        Resolution::Unidentified => Err(WatchlistError::IdentityUnavailable),
        Resolution::Guest => Err(WatchlistError::AuthRequired {
            action: intent.action(),
        }),
    }
}

type ListingKey = (Identity, Market, String);

/// In-flight key per owner; HK codes are compared without zero padding.
fn listing_key(identity: &Identity, symbol: &Symbol, market: Market) -> ListingKey {
    let code = match market {
        Market::Hk => symbol.hk_listing_code(),
        Market::Us => symbol.as_str(),
    };
    (identity.clone(), market, code.to_owned())
}
