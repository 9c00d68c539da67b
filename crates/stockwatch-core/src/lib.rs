//! # Stockwatch Core
//!
//! Client-side core of the stockwatch dashboard: a watchlist of tracked
//! `(symbol, market)` pairs kept in step with a remote store, scoped to an
//! identity settled by an external auth subsystem.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | API base URL resolution and timeouts |
//! | [`domain`] | Symbols, markets, watchlist entries, reports |
//! | [`error`] | Validation and watchlist errors |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`identity`] | Session phases and identity resolution |
//! | [`reports`] | Periodic report feed refresh |
//! | [`store`] | Remote store contract and client |
//! | [`watchlist`] | Optimistic add/remove and identity-scoped loads |
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────────┐  Resolution  ┌─────────────────────┐
//! │ IdentityResolver │─────────────▶│ WatchlistReconciler │
//! └──────────────────┘              └──────────┬──────────┘
//!                                              │ list / create / delete
//!                                              ▼
//!                                   ┌─────────────────────┐
//!                                   │ StoreClient (HTTP)  │
//!                                   └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stockwatch_core::{
//!     resolve, ApiConfig, Market, RuntimeContext, SessionState, StoreClient, WatchlistReconciler,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApiConfig::resolve(None, RuntimeContext::Local);
//!     let watchlist = WatchlistReconciler::new(StoreClient::new(config));
//!
//!     let session = SessionState::Authenticated {
//!         email: Some(String::from("ada@example.com")),
//!         name: None,
//!     };
//!     watchlist.settle(resolve(&session)).await?;
//!     watchlist.add("aapl", Market::Us).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod identity;
pub mod reports;
pub mod store;
pub mod watchlist;

pub use config::{ApiConfig, RuntimeContext};

pub use domain::{
    Ack, ChartPoint, ChartSeries, DateFilter, Market, NewSymbol, NewsItem, Report, Symbol,
    TimerSetting, Timestamp, TrackedSymbol, Trend, PLACEHOLDER_NAME,
};

pub use error::{ValidationError, WatchlistError};

pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
    StubHttpClient,
};

pub use identity::{resolve, Identity, IdentityResolver, Resolution, SessionState};

pub use reports::{ReportFeed, ReportPoller};

pub use store::{Endpoint, StoreClient, StoreError, StoreErrorKind, WatchlistStore};

pub use watchlist::{
    apply, reconcile, Intent, LoadOutcome, Outcome, PendingCall, WatchlistReconciler,
    WatchlistState,
};
