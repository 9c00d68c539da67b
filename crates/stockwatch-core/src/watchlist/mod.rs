//! Watchlist state and its reconciliation with the remote store.
//!
//! | Item | Role |
//! |------|------|
//! | [`WatchlistState`] | ordered entries owned by one identity |
//! | [`apply`] / [`reconcile`] | pure optimistic/commit/rollback transitions |
//! | [`WatchlistReconciler`] | async driver over a [`WatchlistStore`](crate::WatchlistStore) |

mod reconciler;
mod transition;

pub use reconciler::{LoadOutcome, WatchlistReconciler};
pub use transition::{apply, reconcile, Intent, Outcome, PendingCall, WatchlistState};
