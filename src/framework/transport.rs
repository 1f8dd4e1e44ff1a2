//! # Transport
//!
//! The seam between a resource client and whatever carries its requests.
//! Clients build an [`ApiRequest`], hand it to a [`Transport`] and classify the
//! [`ApiResponse`] that comes back (see [`classify_response`]).
//!
//! Implementations live in [`crate::server`] (an in-process API server) and
//! [`crate::framework::mock`] (scripted responses for tests).

use crate::framework::error::{FieldErrors, ResourceError, DEFAULT_VALIDATION_MESSAGE};
use crate::framework::identity::Query;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

/// Status code a server answers with when it rejects input.
pub const UNPROCESSABLE_ENTITY: u16 = 422;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// One request, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    /// The route name the path was resolved from (e.g. `users.store`).
    pub route: String,
    pub query: Query,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            route: String::new(),
            query: Query::new(),
            headers: BTreeMap::new(),
            body: None,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn created(body: Value) -> Self {
        Self::new(201, body)
    }

    pub fn no_content() -> Self {
        Self::new(204, Value::Null)
    }

    /// A 422 answer in the `{message, errors}` shape.
    pub fn validation(errors: FieldErrors) -> Self {
        let message = ResourceError::validation(errors.clone()).to_string();
        Self::new(UNPROCESSABLE_ENTITY, json!({ "message": message, "errors": errors }))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Carries requests to a backend.
///
/// Errors returned here are transport-level (`Transport`, `Cancelled`); HTTP
/// failures come back as non-2xx [`ApiResponse`]s and are classified by the client.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ResourceError>;
}

/// The transport handle clients and bindings hold.
pub type SharedTransport = Arc<dyn Transport>;

/// Turns a response into its body, or into the [`ResourceError`] its status means.
///
/// Error bodies are read leniently: a `message` is kept whenever it is a
/// string, and each `errors` entry may be a list of messages or a single one.
pub fn classify_response(path: &str, response: ApiResponse) -> Result<Value, ResourceError> {
    if response.is_success() {
        return Ok(response.body);
    }

    let message = error_message(&response.body);
    Err(match response.status {
        UNPROCESSABLE_ENTITY => {
            let errors = field_errors(&response.body);
            match message {
                Some(message) => ResourceError::Validation { message, errors },
                None if errors.is_empty() => ResourceError::Validation {
                    message: DEFAULT_VALIDATION_MESSAGE.to_string(),
                    errors,
                },
                None => ResourceError::validation(errors),
            }
        }
        404 => ResourceError::NotFound(path.to_string()),
        401 => ResourceError::Unauthorized,
        403 => ResourceError::Forbidden,
        status => ResourceError::Server {
            status,
            message: message.unwrap_or_else(|| response.body.to_string()),
        },
    })
}

fn error_message(body: &Value) -> Option<String> {
    body.get("message").and_then(Value::as_str).map(str::to_string)
}

fn field_errors(body: &Value) -> FieldErrors {
    let Some(Value::Object(fields)) = body.get("errors") else {
        return FieldErrors::new();
    };
    fields
        .iter()
        .filter_map(|(field, entry)| {
            let messages: Vec<String> = match entry {
                Value::Array(items) => items.iter().filter_map(message_text).collect(),
                other => message_text(other).into_iter().collect(),
            };
            (!messages.is_empty()).then(|| (field.clone(), messages))
        })
        .collect()
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        other => Some(other.to_string()),
    }
}
