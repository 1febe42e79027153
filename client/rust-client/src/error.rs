use serde_json::Value;
use thiserror::Error;

/// Every failure the client can surface to the player.
///
/// Variants follow how the failure must be treated: `Validation` never left
/// the process, `Rejected` is the server's final word, `Network` may be
/// retried by the player, `SessionExpired` forces a fresh login.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Admin role required")]
    Forbidden,

    #[error("Not enough coins: {needed} needed, {available} available")]
    InsufficientCoins { needed: u32, available: u32 },

    #[error("Not allowed while {0}")]
    InvalidState(&'static str),

    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        ClientError::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Whether the player may simply try the same action again.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) => true,
            ClientError::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Builds a `Rejected` error from a non-success response body.
    ///
    /// The API reports failures as `{"error": ..}`, `{"detail": ..}`,
    /// `{"message": ..}` or, for form validation, `{"field": ["msg", ..]}`.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let message = extract_error_message(body)
            .unwrap_or_else(|| format!("Request failed with status {}", status));
        ClientError::rejected(status, message)
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    for key in ["error", "detail", "message"] {
        if let Some(text) = object.get(key).and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
    }

    object.values().find_map(|v| match v {
        Value::Array(items) => items.first().and_then(|i| i.as_str()).map(str::to_string),
        Value::String(text) => Some(text.clone()),
        _ => None,
    })
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .next()
            .unwrap_or_else(|| errors.to_string());
        ClientError::Validation(message)
    }
}
