use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 15;

/// Normalized instrument code (`" aapl "` -> `"AAPL"`).
///
/// User input goes through [`Symbol::parse`]. Store payloads decode through
/// [`Symbol::from_store`], since the store keeps whatever code it was given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Trim and upper-case a symbol. Codes may start with a digit (`0700`).
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let code = input.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        if let Some((index, ch)) = code
            .chars()
            .enumerate()
            .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || matches!(*ch, '.' | '-')))
        {
            return Err(ValidationError::SymbolInvalidChar { ch, index });
        }

        // Only ASCII remains, so byte length is character count.
        if code.len() > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len: code.len(),
                max: MAX_SYMBOL_LEN,
            });
        }

        Ok(Self(code))
    }

    /// Code as held by the store: trimmed and upper-cased, never rejected.
    pub fn from_store(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Listing code with HK suffix and leading zeros removed, used to compare
    /// `700`, `0700` and `00700.HK` as one listing.
    pub(crate) fn hk_listing_code(&self) -> &str {
        let code = self.0.strip_suffix(".HK").unwrap_or(&self.0);
        let stripped = code.trim_start_matches('0');
        if stripped.is_empty() && !code.is_empty() {
            "0"
        } else {
            stripped
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|raw| Self::from_store(&raw))
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}
