use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Trading venue of a tracked instrument. Drives chart and lookup routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    Hk,
    Us,
}

impl Market {
    pub const ALL: [Self; 2] = [Self::Hk, Self::Us];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hk => "HK",
            Self::Us => "US",
        }
    }
}

impl Display for Market {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "HK" => Ok(Self::Hk),
            "US" => Ok(Self::Us),
            other => Err(ValidationError::InvalidMarket {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(" hk ".parse::<Market>().expect("valid"), Market::Hk);
        assert_eq!("US".parse::<Market>().expect("valid"), Market::Us);
    }

    #[test]
    fn rejects_unknown_venue() {
        let err = "LSE".parse::<Market>().expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidMarket { .. }));
    }

    #[test]
    fn serializes_upper_case() {
        let json = serde_json::to_string(&Market::Hk).expect("serialize");
        assert_eq!(json, "\"HK\"");
        let parsed: Market = serde_json::from_str("\"US\"").expect("deserialize");
        assert_eq!(parsed, Market::Us);
    }
}
