use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the API on non-success statuses.
///
/// `detail` is usually a human-readable string, but request-validation failures
/// carry a structured array there instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ApiErrorBody {
    pub fn from_bytes(raw: &[u8]) -> Self {
        serde_json::from_slice(raw).unwrap_or_default()
    }

    /// The detail text when the server sent one as a plain string.
    pub fn message(&self) -> Option<&str> {
        match &self.detail {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        }
    }
}
