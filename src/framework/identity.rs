//! # Resource Identity & Routing
//!
//! A resource is addressed by a key (`users`, `teams/{team}/members`) and the
//! name of the route parameter that selects one member (`id`, `user`).
//!
//! Routes are named the Laravel way, `{resource_key}.{action}`, and resolved to
//! paths either by [`default_route`] or by a caller-supplied [`RouteFn`].

use crate::framework::error::ResourceError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Named route parameters. Keys serialize in sorted order.
pub type RouteParams = serde_json::Map<String, Value>;

/// Query string parameters for a single request.
pub type Query = BTreeMap<String, Value>;

/// Resolves a route name and its parameters to a request path.
///
/// Compared by pointer identity when deciding whether a client must be rebuilt,
/// so keep one `Arc` alive instead of re-creating the closure.
pub type RouteFn = Arc<dyn Fn(&str, &RouteParams) -> Result<String, ResourceError> + Send + Sync>;

/// The identifier of one member of a resource collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

macro_rules! resource_id_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for ResourceId {
            fn from(id: $ty) -> Self {
                Self(id.to_string())
            }
        })*
    };
}

resource_id_from_int!(i32, i64, u32, u64, usize);

/// The five standard operations on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteAction {
    Index,
    Show,
    Store,
    Update,
    Destroy,
}

impl RouteAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Show => "show",
            Self::Store => "store",
            Self::Update => "update",
            Self::Destroy => "destroy",
        }
    }

    /// Whether the route addresses a single member (and so needs an id).
    pub fn is_member(self) -> bool {
        matches!(self, Self::Show | Self::Update | Self::Destroy)
    }
}

impl Display for RouteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backend collection a client talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceIdentity {
    pub resource_key: String,
    pub resource_route_param: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_route_params: Option<RouteParams>,
}

impl ResourceIdentity {
    pub fn new(resource_key: impl Into<String>, resource_route_param: impl Into<String>) -> Self {
        Self {
            resource_key: resource_key.into(),
            resource_route_param: resource_route_param.into(),
            additional_route_params: None,
        }
    }

    #[must_use]
    pub fn with_route_params(mut self, params: RouteParams) -> Self {
        self.additional_route_params = Some(params);
        self
    }

    /// Rejects identities no route can be built from.
    pub fn validate(&self) -> Result<(), ResourceError> {
        if self.resource_key.trim().is_empty() {
            return Err(ResourceError::Config("resource_key must not be empty".into()));
        }
        if self.resource_route_param.trim().is_empty() {
            return Err(ResourceError::Config(
                "resource_route_param must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// `users.index`, `users.show`, ...
    pub fn route_name(&self, action: RouteAction) -> String {
        format!("{}.{}", self.resource_key, action)
    }

    /// The additional route params, plus `{resource_route_param: id}` for member routes.
    pub fn route_params(&self, id: Option<&ResourceId>) -> RouteParams {
        let mut params = self.additional_route_params.clone().unwrap_or_default();
        if let Some(id) = id {
            params.insert(
                self.resource_route_param.clone(),
                Value::String(id.as_str().to_string()),
            );
        }
        params
    }
}

/// Resolves a route without a custom [`RouteFn`].
///
/// `{name}` placeholders in the resource key are filled from the additional
/// route params; member routes get `/{id}` appended. Filled-in values are
/// percent-encoded as single path segments, so an id can never add segments.
pub fn default_route(
    identity: &ResourceIdentity,
    action: RouteAction,
    id: Option<&ResourceId>,
) -> Result<String, ResourceError> {
    let params = identity.additional_route_params.clone().unwrap_or_default();
    let mut segments = Vec::new();
    for segment in identity.resource_key.trim_matches('/').split('/') {
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => {
                let value = params.get(name).ok_or_else(|| {
                    ResourceError::Config(format!("missing route parameter `{name}`"))
                })?;
                segments.push(param_segment(value));
            }
            None => segments.push(segment.to_string()),
        }
    }
    if action.is_member() {
        let id = id.ok_or_else(|| {
            ResourceError::Config(format!(
                "route `{}` requires `{}`",
                identity.route_name(action),
                identity.resource_route_param
            ))
        })?;
        segments.push(id.as_str().to_string());
    }
    encode_path(&segments)
}

/// Joins `segments` into an absolute path, escaping `/`, `?`, `#` and `%` inside each.
fn encode_path(segments: &[String]) -> Result<String, ResourceError> {
    let mut url = Url::parse("http://localhost/")
        .map_err(|e| ResourceError::Config(format!("route base: {e}")))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| ResourceError::Config("route base cannot hold a path".into()))?;
        path.clear();
        for segment in segments {
            // Dot segments would be normalized away by any HTTP stack.
            if segment == "." || segment == ".." {
                return Err(ResourceError::Config(format!(
                    "`{segment}` is not a valid route segment"
                )));
            }
            path.push(segment);
        }
    }
    Ok(url.path().to_string())
}

fn param_segment(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Options merged into each request a client sends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub query: Query,
    /// Enforced by the transport, not the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// `self` overlaid with `other`; entries in `other` win.
    pub fn merged(&self, other: Option<&RequestConfig>) -> RequestConfig {
        let mut merged = self.clone();
        if let Some(other) = other {
            merged
                .headers
                .extend(other.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
            merged
                .query
                .extend(other.query.iter().map(|(k, v)| (k.clone(), v.clone())));
            if other.timeout_ms.is_some() {
                merged.timeout_ms = other.timeout_ms;
            }
        }
        merged
    }
}
