//! # In-process API Server
//!
//! An actor that answers [`ApiRequest`]s from in-memory collections, so resource
//! clients can run end to end without a network.
//!
//! **Concurrency Model**:
//! The server owns its collections and processes requests *sequentially* in
//! one task, so the collections need no locks. [`LocalTransport`] is the cheap,
//! cloneable handle that feeds it.

use crate::framework::{ApiRequest, ApiResponse, Method, ResourceError, Transport};
use crate::server::collection::{Collection, CollectionSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Server tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// How many requests may queue before senders wait.
    pub buffer_size: usize,
    /// Page size for index requests without `per_page`.
    pub default_per_page: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            buffer_size: 32,
            default_per_page: 15,
        }
    }
}

/// Internal message sent to the server.
#[derive(Debug)]
struct Envelope {
    request: ApiRequest,
    respond_to: oneshot::Sender<ApiResponse>,
}

/// The actor half: owns the collections and the receiving end of the channel.
pub struct ApiServer {
    receiver: mpsc::Receiver<Envelope>,
    collections: BTreeMap<String, Collection>,
    config: ServerConfig,
}

impl ApiServer {
    pub fn new(config: ServerConfig) -> (Self, LocalTransport) {
        let (sender, receiver) = mpsc::channel(config.buffer_size.max(1));
        let server = Self {
            receiver,
            collections: BTreeMap::new(),
            config,
        };
        (server, LocalTransport { sender })
    }

    /// Adds (or replaces) a collection. Call before [`run`](Self::run).
    pub fn register(&mut self, spec: CollectionSpec) {
        let key = spec.key.clone();
        let collection = Collection::from_spec(spec);
        debug!(collection = %key, size = collection.len(), "Registered");
        self.collections.insert(key, collection);
    }

    /// Processes requests until every [`LocalTransport`] clone is dropped.
    pub async fn run(mut self) {
        info!(collections = self.collections.len(), "API server started");

        while let Some(Envelope { request, respond_to }) = self.receiver.recv().await {
            let response = self.dispatch(&request);
            if response.is_success() {
                debug!(method = %request.method, path = %request.path, status = response.status, "Handled");
            } else {
                warn!(method = %request.method, path = %request.path, status = response.status, "Rejected");
            }
            let _ = respond_to.send(response);
        }

        info!("API server shutdown");
    }

    fn dispatch(&mut self, request: &ApiRequest) -> ApiResponse {
        let path = request.path.trim_matches('/');
        let (key, id) = if self.collections.contains_key(path) {
            (path, None)
        } else {
            match path.rsplit_once('/') {
                Some((key, id)) if self.collections.contains_key(key) => (key, Some(id)),
                _ => {
                    return ApiResponse::new(
                        404,
                        json!({ "message": format!("The route {path} could not be found.") }),
                    )
                }
            }
        };
        let default_per_page = self.config.default_per_page;
        let Some(collection) = self.collections.get_mut(key) else {
            return ApiResponse::new(404, json!({ "message": "Not Found" }));
        };

        match (request.method, id) {
            (Method::Get, None) => collection.index(&request.query, default_per_page),
            (Method::Post, None) => collection.store(request.body.clone()),
            (Method::Get, Some(id)) => collection.show(id),
            (Method::Put, Some(id)) => collection.update(id, request.body.clone()),
            (Method::Delete, Some(id)) => collection.destroy(id),
            (method, _) => ApiResponse::new(
                405,
                json!({ "message": format!("The {method} method is not supported for route {path}.") }),
            ),
        }
    }
}

/// Cloneable handle to a running [`ApiServer`].
#[derive(Debug, Clone)]
pub struct LocalTransport {
    sender: mpsc::Sender<Envelope>,
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ResourceError> {
        let timeout = request.timeout;
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(Envelope { request, respond_to })
            .await
            .map_err(|_| ResourceError::Transport("API server closed".into()))?;

        let received = match timeout {
            Some(limit) => tokio::time::timeout(limit, response).await.map_err(|_| {
                ResourceError::Transport(format!("timed out after {}ms", limit.as_millis()))
            })?,
            None => response.await,
        };
        received.map_err(|_| ResourceError::Cancelled)
    }
}
