use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categories of backend errors for consistent handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Non-2xx response.
    HttpStatus,
    /// Request or connect timeout.
    Timeout,
    /// Response body was not the JSON we expected.
    Parse,
    /// Connection refused, DNS failure, broken pipe, ...
    Network,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Parse => write!(f, "parse"),
            ApiErrorKind::Network => write!(f, "network"),
        }
    }
}

/// Structured error from the chat backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display.
    pub message: String,
    /// Raw body or underlying error text, when available.
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error, lifting `{"error": "..."}` into the message.
    pub fn http_status(status: u16, body: &str) -> Self {
        let details = (!body.trim().is_empty()).then(|| body.to_string());
        let server_message = serde_json::from_str::<Value>(body).ok().and_then(|json| {
            match json.get("error") {
                Some(Value::String(msg)) => Some(msg.clone()),
                Some(obj) => obj
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                None => None,
            }
        });

        let message = match server_message {
            Some(msg) => format!("HTTP {status}: {msg}"),
            None => format!("HTTP {status}"),
        };

        Self {
            kind: ApiErrorKind::HttpStatus,
            message,
            details,
        }
    }

    pub fn parse(message: impl Into<String>, body: &str) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: message.into(),
            details: Some(truncate_for_error(body, 512)),
        }
    }

    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::new(ApiErrorKind::Timeout, format!("Request timed out: {e}"))
        } else if e.is_connect() {
            Self::new(ApiErrorKind::Network, format!("Connection failed: {e}"))
        } else if e.is_decode() {
            Self::new(ApiErrorKind::Parse, format!("Invalid response body: {e}"))
        } else {
            Self::new(ApiErrorKind::Network, format!("Network error: {e}"))
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

fn truncate_for_error(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{head}... (truncated)")
    }
}
