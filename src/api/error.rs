//! Error taxonomy for backend calls
//!
//! Every network-calling function returns `Result<T, ApiError>`; callers
//! branch on the variant instead of matching message strings themselves.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;

/// Message fragments the backend uses when a question is locked because
/// responses were already collected
const HAS_RESPONSES_MARKERS: &[&str] = &[
    "has responses",
    "have responses",
    "already has responses",
    "already have responses",
    "cannot modify",
    "cannot be modified",
    "cannot delete",
    "cannot be deleted",
];

/// Token phrases that mean the bearer token is no longer accepted.
/// Permission messages ("Unauthorized to delete ...") do not match.
static TOKEN_REJECTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:invalid|expired|missing|malformed)\s+(?:access\s+|bearer\s+)?token|(?:token|jwt)\s+(?:has\s+)?expired|jwt\s+malformed|no\s+token\s+provided)\b",
    )
    .expect("valid token pattern")
});

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Transport failure; never retried
    #[error("Cannot connect to the server: {0}")]
    Network(String),
    /// Missing, invalid or expired token
    #[error("Authentication required: {0}")]
    Unauthorized(String),
    /// Missing or malformed input, caught locally or reported by the backend
    #[error("{message}")]
    Validation { message: String, details: Vec<String> },
    /// The survey already collected responses, its questions are locked
    #[error("{0}")]
    HasResponses(String),
    /// Any other non-success response
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },
    /// The response body could not be decoded
    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }

    /// Classify a failed response from its status and envelope fields
    pub fn from_failure(status: StatusCode, message: Option<String>, details: Vec<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        if is_has_responses_message(&message) {
            return Self::HasResponses(message);
        }

        if status == StatusCode::UNAUTHORIZED || is_token_rejected_message(&message) {
            return Self::Unauthorized(message);
        }

        if status == StatusCode::BAD_REQUEST
            || status == StatusCode::UNPROCESSABLE_ENTITY
            || !details.is_empty()
        {
            return Self::Validation { message, details };
        }

        Self::Status {
            status: status.as_u16(),
            message,
        }
    }

    pub fn is_has_responses(&self) -> bool {
        matches!(self, Self::HasResponses(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

pub fn is_has_responses_message(message: &str) -> bool {
    contains_marker(message, HAS_RESPONSES_MARKERS)
}

pub fn is_token_rejected_message(message: &str) -> bool {
    TOKEN_REJECTED.is_match(message)
}

fn contains_marker(message: &str, markers: &[&str]) -> bool {
    let lowered = message.to_lowercase();
    markers.iter().any(|marker| lowered.contains(marker))
}

/// Flatten backend validation details into readable lines.
/// Accepts a list of strings, a list of `{field, message}` objects, or a
/// field → message(s) object.
pub fn flatten_details(details: &Value) -> Vec<String> {
    match details {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .flat_map(|item| match item {
                Value::Object(map) => {
                    let message = map
                        .get("message")
                        .or_else(|| map.get("msg"))
                        .and_then(|m| m.as_str())
                        .unwrap_or_default();
                    match map.get("field").or_else(|| map.get("path")).and_then(|f| f.as_str()) {
                        Some(field) => vec![format!("{}: {}", field, message)],
                        None => vec![message.to_string()],
                    }
                }
                other => flatten_details(other),
            })
            .filter(|line| !line.is_empty())
            .collect(),
        Value::Object(map) => map
            .iter()
            .flat_map(|(field, value)| {
                flatten_details(value)
                    .into_iter()
                    .map(move |message| format!("{}: {}", field, message))
            })
            .collect(),
        other => vec![other.to_string()],
    }
}
