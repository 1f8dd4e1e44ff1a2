//! # Mock Transports
//!
//! Utilities for testing clients and bindings without a backend.
//!
//! - [`MockTransport`] answers from a queue of scripted expectations.
//! - [`channel_transport`] hands every request to the test, which answers it
//!   whenever (and in whatever order) it likes.

use crate::framework::error::{FieldErrors, ResourceError};
use crate::framework::transport::{ApiRequest, ApiResponse, Method, Transport};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

struct Expectation {
    method: Method,
    path: String,
    response: Result<ApiResponse, ResourceError>,
}

/// A transport with expectation tracking for fluent testing.
///
/// Requests are matched in order against the queued expectations; a request
/// that does not match the next expectation panics.
///
/// # Example
/// ```ignore
/// let mock = MockTransport::new();
/// mock.expect(Method::Get, "/users/1").return_ok(json!({"id": 1}));
///
/// let client: ApiResourceClient<User> = create_api_resource_client(ClientOptions {
///     transport: mock.clone(),
///     ..
/// })?;
/// // Use client in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
#[derive(Default)]
pub struct MockTransport {
    expectations: Mutex<VecDeque<Expectation>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    /// Creates a new mock transport with no expectations.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Expects a request with this method and path.
    pub fn expect(&self, method: Method, path: impl Into<String>) -> ExpectationBuilder<'_> {
        ExpectationBuilder {
            method,
            path: path.into(),
            transport: self,
        }
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ResourceError> {
        let expectation = self.expectations.lock().unwrap().pop_front();
        self.requests.lock().unwrap().push(request.clone());

        match expectation {
            Some(exp) if exp.method == request.method && exp.path == request.path => exp.response,
            Some(exp) => panic!(
                "Unexpected request {} {} (expected {} {})",
                request.method, request.path, exp.method, exp.path
            ),
            None => panic!("Unexpected request {} {}", request.method, request.path),
        }
    }
}

/// Builder returned by [`MockTransport::expect`].
pub struct ExpectationBuilder<'a> {
    method: Method,
    path: String,
    transport: &'a MockTransport,
}

impl ExpectationBuilder<'_> {
    /// Answers `200` with this body.
    pub fn return_ok(self, body: Value) {
        self.return_response(Ok(ApiResponse::ok(body)));
    }

    pub fn return_status(self, status: u16, body: Value) {
        self.return_response(Ok(ApiResponse::new(status, body)));
    }

    /// Answers `422` with these field errors.
    pub fn return_validation(self, errors: FieldErrors) {
        self.return_response(Ok(ApiResponse::validation(errors)));
    }

    /// Fails at the transport level.
    pub fn return_err(self, error: ResourceError) {
        self.return_response(Err(error));
    }

    fn return_response(self, response: Result<ApiResponse, ResourceError>) {
        self.transport.expectations.lock().unwrap().push_back(Expectation {
            method: self.method,
            path: self.path,
            response,
        });
    }
}

// =============================================================================
// MANUAL CHANNEL TRANSPORT
// =============================================================================

/// A request waiting for the test to answer it.
#[derive(Debug)]
pub struct PendingRequest {
    pub request: ApiRequest,
    respond_to: oneshot::Sender<Result<ApiResponse, ResourceError>>,
}

impl PendingRequest {
    pub fn respond(self, response: Result<ApiResponse, ResourceError>) {
        let _ = self.respond_to.send(response);
    }
}

/// Transport half of [`channel_transport`].
#[derive(Clone)]
pub struct ChannelTransport {
    sender: mpsc::Sender<PendingRequest>,
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ResourceError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(PendingRequest { request, respond_to })
            .await
            .map_err(|_| ResourceError::Transport("test receiver closed".into()))?;
        response.await.map_err(|_| ResourceError::Cancelled)?
    }
}

/// Creates a transport whose requests arrive on the returned receiver.
///
/// # Testing Strategy
/// Use this when a test needs to hold a request open (to observe state while
/// it is pending) or to answer overlapping requests out of order. Dropping a
/// [`PendingRequest`] unanswered surfaces as [`ResourceError::Cancelled`].
pub fn channel_transport(buffer_size: usize) -> (Arc<ChannelTransport>, mpsc::Receiver<PendingRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (Arc::new(ChannelTransport { sender }), receiver)
}

/// Helper to wait for the next request on a [`channel_transport`].
pub async fn expect_request(receiver: &mut mpsc::Receiver<PendingRequest>) -> Option<PendingRequest> {
    receiver.recv().await
}
