//! Backend error types

use thiserror::Error;

/// Label prefixed to transport failures when shown to the user
pub const CONNECTION_ERROR_LABEL: &str = "Connection error";

/// Errors that can occur when talking to the intake backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Non-2xx response. `message` is the backend's `message` field, if any.
    #[error("{endpoint}: HTTP {status}{}", message.as_deref().map(|m| format!(" - {m}")).unwrap_or_default())]
    Request {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },

    /// Network, connection or timeout failure
    #[error("{endpoint}: network error - {message}")]
    Transport { endpoint: String, message: String },

    /// 2xx response whose body could not be understood
    #[error("{endpoint}: invalid response - {message}")]
    Decode { endpoint: String, message: String },
}

impl ApiError {
    /// Create a request error from a status and raw response body
    pub fn request(endpoint: impl Into<String>, status: u16, body: &str) -> Self {
        ApiError::Request {
            endpoint: endpoint.into(),
            status,
            message: backend_message(body),
        }
    }

    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Decode {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// HTTP status for request errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            ApiError::Request { endpoint, .. }
            | ApiError::Transport { endpoint, .. }
            | ApiError::Decode { endpoint, .. } => endpoint,
        }
    }

    /// Text shown to the user.
    ///
    /// Request errors use the backend's message when it sent one, otherwise
    /// `fallback`. Transport and decode failures carry the underlying detail
    /// behind the connection-error label.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Request {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Request { message: None, .. } => fallback.to_string(),
            ApiError::Transport { message, .. } | ApiError::Decode { message, .. } => {
                format!("{CONNECTION_ERROR_LABEL}: {message}")
            }
        }
    }
}

/// Extract a non-empty `message` string from a JSON error body
fn backend_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let message = value.get("message")?.as_str()?.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
