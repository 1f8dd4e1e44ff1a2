//! # Resource Errors
//!
//! Every failure a resource client can produce is a [`ResourceError`]. The
//! variant is the classification: callers and the binding layer match on it
//! instead of inspecting messages.

use std::collections::BTreeMap;

/// Per-field validation messages reported by the server, keyed by field name.
///
/// Messages keep the order the server sent them in.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Message used when a validation failure carries no messages at all.
pub const DEFAULT_VALIDATION_MESSAGE: &str = "The given data was invalid.";

/// Errors that can occur while talking to a resource backend.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ResourceError {
    /// The server rejected the input (HTTP 422).
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },
    /// The request never reached the backend, or its answer never came back.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The backend dropped the request without answering.
    #[error("Request cancelled")]
    Cancelled,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthenticated")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
    /// Malformed identity or routing input, raised when a client is built.
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// The response body did not match the expected type.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ResourceError {
    /// Builds a validation failure with the summary message the server would send.
    ///
    /// The summary is the first message, followed by a count of the rest,
    /// e.g. `The name field is required. (and 1 more error)`.
    pub fn validation(errors: FieldErrors) -> Self {
        Self::Validation {
            message: summarize(&errors),
            errors,
        }
    }

    /// The field errors carried by a validation failure, `None` for any other kind.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

fn summarize(errors: &FieldErrors) -> String {
    let mut messages = errors.values().flatten();
    let Some(first) = messages.next() else {
        return DEFAULT_VALIDATION_MESSAGE.to_string();
    };
    match messages.count() {
        0 => first.clone(),
        1 => format!("{first} (and 1 more error)"),
        n => format!("{first} (and {n} more errors)"),
    }
}
