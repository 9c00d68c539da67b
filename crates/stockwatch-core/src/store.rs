//! Remote store contract and its HTTP client.
//!
//! # Endpoints
//!
//! | Endpoint | Method | Path |
//! |----------|--------|------|
//! | [`Endpoint::ListSymbols`] | GET | `/stocks` |
//! | [`Endpoint::AddSymbol`] | POST | `/stocks` |
//! | [`Endpoint::RemoveSymbol`] | DELETE | `/stocks/{symbol}` |
//! | [`Endpoint::ListReports`] | GET | `/reports` |
//! | [`Endpoint::Chart`] | GET | `/stocks/{market}/{symbol}/chart` |
//! | [`Endpoint::SetTimer`] | POST | `/settings/timer` |
//! | [`Endpoint::TriggerAnalysis`] | POST | `/debug/trigger-analysis` |
//!
//! Watchlist calls carry the identity twice, as `?user_email=` and as the
//! `X-User-Email` header. Requests without either are anonymous.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{
    Ack, ApiConfig, ChartPoint, ChartSeries, DateFilter, Identity, Market, NewSymbol, Report,
    Symbol, TimerSetting, TrackedSymbol,
};

pub const IDENTITY_HEADER: &str = "X-User-Email";
pub const IDENTITY_QUERY: &str = "user_email";

/// Store endpoint, used in logs and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListSymbols,
    AddSymbol,
    RemoveSymbol,
    ListReports,
    Chart,
    SetTimer,
    TriggerAnalysis,
}

impl Endpoint {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListSymbols => "list_symbols",
            Self::AddSymbol => "add_symbol",
            Self::RemoveSymbol => "remove_symbol",
            Self::ListReports => "list_reports",
            Self::Chart => "chart",
            Self::SetTimer => "set_timer",
            Self::TriggerAnalysis => "trigger_analysis",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Request never produced a response.
    Transport,
    /// Non-2xx response.
    Status,
    /// 2xx response with a body that did not decode.
    Decode,
}

/// Failure of a single store call. `message` is user-facing: for `Status`
/// errors it is the response body verbatim when one was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    kind: StoreErrorKind,
    endpoint: Endpoint,
    status: Option<u16>,
    message: String,
}

impl StoreError {
    pub fn transport(endpoint: Endpoint, message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Transport,
            endpoint,
            status: None,
            message: message.into(),
        }
    }

    /// Uses the trimmed body as detail, or a generic message for empty bodies.
    pub fn status(endpoint: Endpoint, status: u16, body: &str) -> Self {
        let detail = body.trim();
        let message = if detail.is_empty() {
            format!("{endpoint} failed with status {status}")
        } else {
            detail.to_owned()
        };

        Self {
            kind: StoreErrorKind::Status,
            endpoint,
            status: Some(status),
            message,
        }
    }

    pub fn decode(endpoint: Endpoint, message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Decode,
            endpoint,
            status: None,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    pub const fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub const fn http_status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            StoreErrorKind::Transport => "store.transport",
            StoreErrorKind::Status => "store.status",
            StoreErrorKind::Decode => "store.decode",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for StoreError {}

type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Watchlist operations the reconciler needs from the remote store.
pub trait WatchlistStore: Send + Sync {
    fn list<'a>(&'a self, identity: Option<&'a Identity>) -> StoreFuture<'a, Vec<TrackedSymbol>>;

    fn create<'a>(
        &'a self,
        identity: &'a Identity,
        symbol: &'a Symbol,
        market: Market,
    ) -> StoreFuture<'a, TrackedSymbol>;

    fn delete<'a>(&'a self, identity: &'a Identity, symbol: &'a Symbol) -> StoreFuture<'a, Ack>;
}

impl<T: WatchlistStore + ?Sized> WatchlistStore for Arc<T> {
    fn list<'a>(&'a self, identity: Option<&'a Identity>) -> StoreFuture<'a, Vec<TrackedSymbol>> {
        (**self).list(identity)
    }

    fn create<'a>(
        &'a self,
        identity: &'a Identity,
        symbol: &'a Symbol,
        market: Market,
    ) -> StoreFuture<'a, TrackedSymbol> {
        (**self).create(identity, symbol, market)
    }

    fn delete<'a>(&'a self, identity: &'a Identity, symbol: &'a Symbol) -> StoreFuture<'a, Ack> {
        (**self).delete(identity, symbol)
    }
}

/// HTTP client for the remote store.
#[derive(Clone)]
pub struct StoreClient {
    http_client: Arc<dyn HttpClient>,
    config: ApiConfig,
}

impl StoreClient {
    pub fn new(config: ApiConfig) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), config)
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, config: ApiConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub async fn list_symbols(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Vec<TrackedSymbol>, StoreError> {
        let request = scoped(HttpRequest::get(self.config.endpoint("/stocks")), identity);
        self.send(Endpoint::ListSymbols, request).await
    }

    pub async fn add_symbol(
        &self,
        identity: &Identity,
        symbol: &Symbol,
        market: Market,
    ) -> Result<TrackedSymbol, StoreError> {
        let body = serde_json::to_string(&NewSymbol { symbol, market })
            .map_err(|e| StoreError::decode(Endpoint::AddSymbol, e.to_string()))?;
        let request = scoped(
            HttpRequest::post(self.config.endpoint("/stocks")).with_json_body(body),
            Some(identity),
        );
        self.send(Endpoint::AddSymbol, request).await
    }

    pub async fn remove_symbol(
        &self,
        identity: &Identity,
        symbol: &Symbol,
    ) -> Result<Ack, StoreError> {
        let path = format!("/stocks/{}", urlencoding::encode(symbol.as_str()));
        let request = scoped(HttpRequest::delete(self.config.endpoint(&path)), Some(identity));
        self.send(Endpoint::RemoveSymbol, request).await
    }

    /// Reports are global; no identity is attached.
    pub async fn list_reports(&self, filter: DateFilter) -> Result<Vec<Report>, StoreError> {
        let request = HttpRequest::get(self.config.endpoint("/reports"))
            .with_query("date_filter", filter.as_str());
        self.send(Endpoint::ListReports, request).await
    }

    pub async fn chart(&self, market: Market, symbol: &Symbol) -> Result<ChartSeries, StoreError> {
        let path = format!(
            "/stocks/{}/{}/chart",
            market.as_str(),
            urlencoding::encode(symbol.as_str())
        );
        let points: Vec<ChartPoint> = self
            .send(Endpoint::Chart, HttpRequest::get(self.config.endpoint(&path)))
            .await?;

        Ok(ChartSeries {
            symbol: symbol.clone(),
            market,
            points,
        })
    }

    /// The timer is global on the store; the identity header is still sent
    /// when known.
    pub async fn set_timer(
        &self,
        identity: Option<&Identity>,
        setting: &TimerSetting,
    ) -> Result<Ack, StoreError> {
        let body = serde_json::to_string(setting)
            .map_err(|e| StoreError::decode(Endpoint::SetTimer, e.to_string()))?;
        let mut request =
            HttpRequest::post(self.config.endpoint("/settings/timer")).with_json_body(body);
        if let Some(identity) = identity {
            request = request.with_header(IDENTITY_HEADER, identity.as_str());
        }
        self.send(Endpoint::SetTimer, request).await
    }

    pub async fn trigger_analysis(&self) -> Result<Ack, StoreError> {
        let request = HttpRequest::post(self.config.endpoint("/debug/trigger-analysis"));
        self.send(Endpoint::TriggerAnalysis, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: HttpRequest,
    ) -> Result<T, StoreError> {
        let request = request.with_timeout_ms(self.config.timeout_ms());
        tracing::debug!(
            %endpoint,
            method = request.method.as_str(),
            url = %request.full_url(),
            "store request"
        );

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| StoreError::transport(endpoint, error.message()))?;

        if !response.is_success() {
            tracing::debug!(%endpoint, status = response.status, "store returned failure status");
            return Err(StoreError::status(endpoint, response.status, &response.body));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            StoreError::decode(endpoint, format!("{endpoint} returned an unexpected payload: {e}"))
        })
    }
}

impl WatchlistStore for StoreClient {
    fn list<'a>(&'a self, identity: Option<&'a Identity>) -> StoreFuture<'a, Vec<TrackedSymbol>> {
        Box::pin(self.list_symbols(identity))
    }

    fn create<'a>(
        &'a self,
        identity: &'a Identity,
        symbol: &'a Symbol,
        market: Market,
    ) -> StoreFuture<'a, TrackedSymbol> {
        Box::pin(self.add_symbol(identity, symbol, market))
    }

    fn delete<'a>(&'a self, identity: &'a Identity, symbol: &'a Symbol) -> StoreFuture<'a, Ack> {
        Box::pin(self.remove_symbol(identity, symbol))
    }
}

fn scoped(request: HttpRequest, identity: Option<&Identity>) -> HttpRequest {
    match identity {
        Some(identity) => request
            .with_query(IDENTITY_QUERY, identity.as_str())
            .with_header(IDENTITY_HEADER, identity.as_str()),
        None => request,
    }
}
