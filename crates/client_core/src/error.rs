use reqwest::StatusCode;
use thiserror::Error;

use crate::locale;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected locally before any request was made.
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("server responded with {status}: {}", .detail.as_deref().unwrap_or("<no detail>"))]
    Server {
        status: StatusCode,
        detail: Option<String>,
    },
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid server url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Server { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Server { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    /// Text shown to the user for a failed action. `fallback` covers server
    /// errors that came without a readable detail.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Server { detail, .. } => detail.clone().unwrap_or_else(|| fallback.to_string()),
            Self::Transport(_) => locale::NETWORK_ERROR.to_string(),
            Self::InvalidBaseUrl { .. } => fallback.to_string(),
        }
    }
}
