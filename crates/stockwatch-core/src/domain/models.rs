use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::{Market, Symbol, Timestamp, ValidationError};

/// Display name shown for an optimistic entry until the store resolves it.
pub const PLACEHOLDER_NAME: &str = "Fetching name...";

const TIMER_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]");

/// One watched instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedSymbol {
    pub symbol: Symbol,
    pub market: Market,
    #[serde(default)]
    pub name: Option<String>,
    pub added_at: Timestamp,
}

impl TrackedSymbol {
    pub fn new(symbol: Symbol, market: Market, name: Option<String>, added_at: Timestamp) -> Self {
        Self {
            symbol,
            market,
            name,
            added_at,
        }
    }

    /// Provisional entry applied before the store confirms a create.
    pub fn placeholder(symbol: Symbol, market: Market, added_at: Timestamp) -> Self {
        Self::new(symbol, market, Some(String::from(PLACEHOLDER_NAME)), added_at)
    }

    pub fn is_placeholder(&self) -> bool {
        self.name.as_deref() == Some(PLACEHOLDER_NAME)
    }

    /// Whether this entry is the `(symbol, market)` listing. HK codes compare
    /// without zero padding since the store pads them to five digits.
    pub fn same_listing(&self, symbol: &Symbol, market: Market) -> bool {
        if self.market != market {
            return false;
        }

        match market {
            Market::Hk => self.symbol.hk_listing_code() == symbol.hk_listing_code(),
            Market::Us => self.symbol == *symbol,
        }
    }
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSymbol<'a> {
    pub symbol: &'a Symbol,
    pub market: Market,
}

/// News headline attached to a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Analysis report generated by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub stock_symbol: String,
    #[serde(default)]
    pub stock_name: Option<String>,
    pub report_content: String,
    pub generated_at: Timestamp,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub news_items: Vec<NewsItem>,
}

/// Report feed selector understood by `GET /reports`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    #[default]
    Today,
    Yesterday,
    All,
}

impl DateFilter {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::All => "all",
        }
    }
}

impl Display for DateFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateFilter {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "all" => Ok(Self::All),
            other => Err(ValidationError::InvalidDateFilter {
                value: other.to_owned(),
            }),
        }
    }
}

/// Single point of a per-symbol price series. Fields other than `price` are
/// kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub price: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Direction of a price series from its first to its last point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub symbol: Symbol,
    pub market: Market,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// `Flat` with fewer than two points, otherwise `Up` when the last price
    /// is at or above the first.
    pub fn trend(&self) -> Trend {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if self.points.len() > 1 => {
                if last.price >= first.price {
                    Trend::Up
                } else {
                    Trend::Down
                }
            }
            _ => Trend::Flat,
        }
    }
}

/// Daily analysis schedule, 24-hour `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSetting {
    time: String,
}

impl TimerSetting {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        time::Time::parse(trimmed, TIMER_FORMAT).map_err(|_| ValidationError::InvalidTimerTime {
            value: input.to_owned(),
        })?;

        Ok(Self {
            time: trimmed.to_owned(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.time
    }
}

/// Confirmation object returned by mutating endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
