//! # Client Memoization
//!
//! A binding keeps one client per distinct set of inputs. [`MemoKey`] captures
//! those inputs: identity and request configuration by value (canonical JSON,
//! maps are sorted), transport and route function by pointer.

use crate::framework::{ClientOptions, ResourceError, RouteFn, SharedTransport};
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// The inputs a client was built from, in comparable form.
#[derive(Clone)]
pub struct MemoKey {
    digest: String,
    transport: SharedTransport,
    route_fn: Option<RouteFn>,
}

impl MemoKey {
    /// Absent and empty route params (or config) produce the same key.
    pub fn from_options(options: &ClientOptions) -> Self {
        let identity = &options.identity;
        let canonical = json!({
            "resource_key": identity.resource_key,
            "resource_route_param": identity.resource_route_param,
            "additional_route_params": identity.additional_route_params.clone().unwrap_or_default(),
            "request_config": options.request_config.clone().unwrap_or_default(),
        });
        Self {
            digest: canonical.to_string(),
            transport: options.transport.clone(),
            route_fn: options.route_fn.clone(),
        }
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl PartialEq for MemoKey {
    fn eq(&self, other: &Self) -> bool {
        let same_route_fn = match (&self.route_fn, &other.route_fn) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.digest == other.digest && Arc::ptr_eq(&self.transport, &other.transport) && same_route_fn
    }
}

impl std::fmt::Debug for MemoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoKey")
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}

/// Holds the most recently built client and the key it was built from.
pub struct ClientMemo<C> {
    slot: Mutex<Option<(MemoKey, Arc<C>)>>,
}

impl<C> ClientMemo<C> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Returns the cached client if `key` matches, otherwise builds and caches a new one.
    ///
    /// A failed build leaves the previous entry in place.
    pub fn get_or_create(
        &self,
        key: MemoKey,
        create: impl FnOnce() -> Result<C, ResourceError>,
    ) -> Result<Arc<C>, ResourceError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached, client)) = slot.as_ref() {
            if *cached == key {
                return Ok(Arc::clone(client));
            }
        }

        let client = Arc::new(create()?);
        debug!(digest = key.digest(), "Client rebuilt");
        *slot = Some((key, Arc::clone(&client)));
        Ok(client)
    }

    pub fn is_empty(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl<C> Default for ClientMemo<C> {
    fn default() -> Self {
        Self::new()
    }
}
