use serde::Serialize;
use serde_json::Value;
use stockwatch_core::{StoreError, Timestamp};

/// Response envelope for all `stockwatch` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub meta: EnvelopeMeta,
    pub data: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeMeta {
    pub request_id: String,
    pub generated_at: Timestamp,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl EnvelopeMeta {
    pub fn new(request_id: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            request_id: request_id.into(),
            generated_at: Timestamp::now(),
            latency_ms,
            identity: None,
            warnings: Vec::new(),
        }
    }

    pub fn with_identity(mut self, identity: Option<String>) -> Self {
        self.identity = identity;
        self
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Non-fatal failure reported next to the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl EnvelopeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status: None,
        }
    }
}

impl From<&StoreError> for EnvelopeError {
    fn from(error: &StoreError) -> Self {
        Self {
            code: error.code().to_owned(),
            message: error.message().to_owned(),
            status: error.http_status(),
        }
    }
}
