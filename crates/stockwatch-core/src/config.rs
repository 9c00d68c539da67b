//! API base URL and transport settings, resolved once at startup.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

use crate::ValidationError;

pub const DEV_DEFAULT_URL: &str = "http://localhost:8000";
pub const PRODUCTION_FALLBACK_URL: &str = "https://stockwatchlist-dashboard.onrender.com";

pub const ENV_API_URL: &str = "STOCKWATCH_API_URL";
pub const ENV_RUNTIME: &str = "STOCKWATCH_RUNTIME";
pub const ENV_TIMEOUT_MS: &str = "STOCKWATCH_TIMEOUT_MS";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REPORT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Where the client runs. A hosted client must never talk to a local address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuntimeContext {
    #[default]
    Local,
    Hosted,
}

impl RuntimeContext {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Hosted => "hosted",
        }
    }
}

impl Display for RuntimeContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeContext {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "development" | "dev" => Ok(Self::Local),
            "hosted" | "production" | "prod" => Ok(Self::Hosted),
            other => Err(ValidationError::InvalidRuntimeContext {
                value: other.to_owned(),
            }),
        }
    }
}

/// Store client configuration. Passed explicitly to constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
    pub timeout: Duration,
    pub report_poll_interval: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEV_DEFAULT_URL),
            timeout: DEFAULT_TIMEOUT,
            report_poll_interval: DEFAULT_REPORT_POLL_INTERVAL,
        }
    }
}

impl ApiConfig {
    /// Config pinned to an explicit base URL, bypassing resolution.
    pub fn with_base_url(base_url: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            ..Self::default()
        })
    }

    /// Resolution order: a usable override, then the production fallback when
    /// hosted, then the development default.
    pub fn resolve(override_url: Option<&str>, context: RuntimeContext) -> Self {
        let candidate = override_url
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| (value, normalize_base_url(value)));

        let base_url = match (candidate, context) {
            (Some((_, Ok(url))), RuntimeContext::Local) => url,
            (Some((_, Ok(url))), RuntimeContext::Hosted) if !points_at_local_host(&url) => url,
            (candidate, RuntimeContext::Hosted) => {
                tracing::warn!(
                    configured = candidate.map(|(raw, _)| raw),
                    fallback = PRODUCTION_FALLBACK_URL,
                    "api url missing or local in hosted runtime; using production fallback"
                );
                String::from(PRODUCTION_FALLBACK_URL)
            }
            (Some((raw, Err(error))), RuntimeContext::Local) => {
                tracing::warn!(configured = raw, %error, "ignoring invalid api url override");
                String::from(DEV_DEFAULT_URL)
            }
            (None, RuntimeContext::Local) => String::from(DEV_DEFAULT_URL),
        };

        Self {
            base_url,
            ..Self::default()
        }
    }

    /// Reads `STOCKWATCH_API_URL`, `STOCKWATCH_RUNTIME` and
    /// `STOCKWATCH_TIMEOUT_MS`. An explicit `override_url` wins over the
    /// environment URL.
    pub fn from_env(override_url: Option<&str>) -> Result<Self, ValidationError> {
        let context = match std::env::var(ENV_RUNTIME) {
            Ok(value) => value.parse()?,
            Err(_) => RuntimeContext::default(),
        };

        let env_url = std::env::var(ENV_API_URL).ok();
        let mut config = Self::resolve(override_url.or(env_url.as_deref()), context);

        if let Some(timeout_ms) = std::env::var(ENV_TIMEOUT_MS)
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|timeout_ms| *timeout_ms > 0)
        {
            config.timeout = Duration::from_millis(timeout_ms);
        }

        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_report_poll_interval(mut self, interval: Duration) -> Self {
        self.report_poll_interval = interval;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Joins a path (starting with `/`) onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn normalize_base_url(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let invalid = || ValidationError::InvalidBaseUrl {
        value: value.to_owned(),
    };

    let parsed = Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }

    Ok(trimmed.trim_end_matches('/').to_owned())
}

fn points_at_local_host(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| {
            host == "localhost" || host == "127.0.0.1" || host == "[::1]" || host == "0.0.0.0"
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_without_override_uses_dev_default() {
        let config = ApiConfig::resolve(None, RuntimeContext::Local);
        assert_eq!(config.base_url(), DEV_DEFAULT_URL);
    }

    #[test]
    fn local_accepts_any_valid_override() {
        let config = ApiConfig::resolve(Some("http://127.0.0.1:9000/"), RuntimeContext::Local);
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn hosted_rejects_localhost_override() {
        let config = ApiConfig::resolve(Some("http://localhost:8000"), RuntimeContext::Hosted);
        assert_eq!(config.base_url(), PRODUCTION_FALLBACK_URL);
    }

    #[test]
    fn hosted_without_override_uses_production_fallback() {
        let config = ApiConfig::resolve(Some("   "), RuntimeContext::Hosted);
        assert_eq!(config.base_url(), PRODUCTION_FALLBACK_URL);
    }

    #[test]
    fn hosted_keeps_remote_override() {
        let config = ApiConfig::resolve(Some("https://api.example.com"), RuntimeContext::Hosted);
        assert_eq!(config.base_url(), "https://api.example.com");
    }

    #[test]
    fn local_ignores_malformed_override() {
        let config = ApiConfig::resolve(Some("not a url"), RuntimeContext::Local);
        assert_eq!(config.base_url(), DEV_DEFAULT_URL);
    }

    #[test]
    fn explicit_base_url_is_validated() {
        assert!(ApiConfig::with_base_url("ftp://example.com").is_err());
        let config = ApiConfig::with_base_url("http://store.test/").expect("valid");
        assert_eq!(config.endpoint("/stocks"), "http://store.test/stocks");
    }

    #[test]
    fn runtime_context_parses_aliases() {
        assert_eq!("production".parse::<RuntimeContext>().expect("valid"), RuntimeContext::Hosted);
        assert_eq!("LOCAL".parse::<RuntimeContext>().expect("valid"), RuntimeContext::Local);
        assert!("staging".parse::<RuntimeContext>().is_err());
    }
}
