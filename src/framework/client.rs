//! # Resource Client
//!
//! [`ResourceApi`] is the five-operation contract every resource client offers.
//! [`ApiResourceClient`] implements it on top of a [`Transport`]: it resolves
//! routes, merges request options, serializes payloads and classifies responses.
//!
//! Clients are built through a [`ClientFactory`], which is also where identity
//! problems surface as [`ResourceError::Config`].

use crate::framework::error::ResourceError;
use crate::framework::identity::{
    default_route, Query, RequestConfig, ResourceId, ResourceIdentity, RouteAction, RouteFn,
};
use crate::framework::transport::{classify_response, ApiRequest, Method, SharedTransport};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, instrument, warn};

/// Standard CRUD operations against one resource collection.
///
/// Each call performs exactly one request. Per-call `cfg` is merged over the
/// client's own [`RequestConfig`].
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// A single member as returned by `get`, `update` and `store`.
    type Resource: Send;
    /// Whatever the collection route answers with (usually a paginated envelope).
    type ListResponse: Send;
    type CreatePayload: Send + Sync;
    type UpdatePayload: Send + Sync;

    async fn get(
        &self,
        id: &ResourceId,
        cfg: Option<&RequestConfig>,
    ) -> Result<Self::Resource, ResourceError>;

    async fn list(
        &self,
        params: Option<&Query>,
        cfg: Option<&RequestConfig>,
    ) -> Result<Self::ListResponse, ResourceError>;

    async fn update(
        &self,
        id: &ResourceId,
        payload: &Self::UpdatePayload,
        cfg: Option<&RequestConfig>,
    ) -> Result<Self::Resource, ResourceError>;

    async fn store(
        &self,
        payload: &Self::CreatePayload,
        cfg: Option<&RequestConfig>,
    ) -> Result<Self::Resource, ResourceError>;

    async fn destroy(&self, id: &ResourceId, cfg: Option<&RequestConfig>)
        -> Result<(), ResourceError>;
}

/// Everything needed to build a client.
#[derive(Clone)]
pub struct ClientOptions {
    pub identity: ResourceIdentity,
    pub transport: SharedTransport,
    pub route_fn: Option<RouteFn>,
    pub request_config: Option<RequestConfig>,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("identity", &self.identity)
            .field("route_fn", &self.route_fn.is_some())
            .field("request_config", &self.request_config)
            .finish_non_exhaustive()
    }
}

/// Builds resource clients.
pub trait ClientFactory: Send + Sync {
    type Client: ResourceApi;

    fn create(&self, options: &ClientOptions) -> Result<Self::Client, ResourceError>;
}

/// A [`ResourceApi`] speaking JSON over a [`Transport`](crate::framework::Transport).
///
/// Type parameters: the member type, the list response, and the create and
/// update payloads. Untyped use is `ApiResourceClient<Value>`.
pub struct ApiResourceClient<R, L = Value, C = Value, U = C> {
    identity: ResourceIdentity,
    transport: SharedTransport,
    route_fn: Option<RouteFn>,
    config: RequestConfig,
    _types: PhantomData<fn() -> (R, L, C, U)>,
}

impl<R, L, C, U> fmt::Debug for ApiResourceClient<R, L, C, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiResourceClient")
            .field("identity", &self.identity)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builds an [`ApiResourceClient`], validating the identity first.
pub fn create_api_resource_client<R, L, C, U>(
    options: ClientOptions,
) -> Result<ApiResourceClient<R, L, C, U>, ResourceError> {
    options.identity.validate()?;
    debug!(resource = %options.identity.resource_key, "Client created");
    Ok(ApiResourceClient {
        identity: options.identity,
        transport: options.transport,
        route_fn: options.route_fn,
        config: options.request_config.unwrap_or_default(),
        _types: PhantomData,
    })
}

impl<R, L, C, U> ApiResourceClient<R, L, C, U> {
    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    fn resolve(&self, action: RouteAction, id: Option<&ResourceId>) -> Result<String, ResourceError> {
        match &self.route_fn {
            Some(route_fn) => route_fn(
                &self.identity.route_name(action),
                &self.identity.route_params(id),
            ),
            None => default_route(&self.identity, action, id),
        }
    }

    #[instrument(
        skip_all,
        fields(resource = %self.identity.resource_key, action = %action, id = ?id)
    )]
    async fn send(
        &self,
        action: RouteAction,
        id: Option<&ResourceId>,
        body: Option<Value>,
        params: Option<&Query>,
        cfg: Option<&RequestConfig>,
    ) -> Result<Value, ResourceError> {
        let path = self.resolve(action, id)?;
        let config = self.config.merged(cfg);

        let mut request = ApiRequest::new(method_for(action), path.clone());
        request.route = self.identity.route_name(action);
        request.headers = config.headers;
        request.query = config.query;
        if let Some(params) = params {
            request
                .query
                .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        request.body = body;
        request.timeout = config.timeout_ms.map(std::time::Duration::from_millis);

        debug!(method = %request.method, %path, "Sending request");
        let response = self.transport.send(request).await?;
        let status = response.status;
        classify_response(&path, response).inspect_err(|e| {
            warn!(%path, status, error = %e, "Request failed");
        })
    }
}

fn method_for(action: RouteAction) -> Method {
    match action {
        RouteAction::Index | RouteAction::Show => Method::Get,
        RouteAction::Store => Method::Post,
        RouteAction::Update => Method::Put,
        RouteAction::Destroy => Method::Delete,
    }
}

fn encode<T: Serialize>(payload: &T) -> Result<Value, ResourceError> {
    serde_json::to_value(payload).map_err(|e| ResourceError::Config(format!("unserializable payload: {e}")))
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ResourceError> {
    serde_json::from_value(body).map_err(|e| ResourceError::Decode(e.to_string()))
}

/// Member responses may come wrapped as `{"data": {...}}`.
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[async_trait]
impl<R, L, C, U> ResourceApi for ApiResourceClient<R, L, C, U>
where
    R: DeserializeOwned + Send,
    L: DeserializeOwned + Send,
    C: Serialize + Send + Sync,
    U: Serialize + Send + Sync,
{
    type Resource = R;
    type ListResponse = L;
    type CreatePayload = C;
    type UpdatePayload = U;

    async fn get(&self, id: &ResourceId, cfg: Option<&RequestConfig>) -> Result<R, ResourceError> {
        let body = self.send(RouteAction::Show, Some(id), None, None, cfg).await?;
        decode(unwrap_data(body))
    }

    async fn list(&self, params: Option<&Query>, cfg: Option<&RequestConfig>) -> Result<L, ResourceError> {
        let body = self.send(RouteAction::Index, None, None, params, cfg).await?;
        decode(body)
    }

    async fn update(
        &self,
        id: &ResourceId,
        payload: &U,
        cfg: Option<&RequestConfig>,
    ) -> Result<R, ResourceError> {
        let body = encode(payload)?;
        let body = self.send(RouteAction::Update, Some(id), Some(body), None, cfg).await?;
        decode(unwrap_data(body))
    }

    async fn store(&self, payload: &C, cfg: Option<&RequestConfig>) -> Result<R, ResourceError> {
        let body = encode(payload)?;
        let body = self.send(RouteAction::Store, None, Some(body), None, cfg).await?;
        decode(unwrap_data(body))
    }

    async fn destroy(&self, id: &ResourceId, cfg: Option<&RequestConfig>) -> Result<(), ResourceError> {
        self.send(RouteAction::Destroy, Some(id), None, None, cfg).await?;
        Ok(())
    }
}

/// The [`ClientFactory`] for [`ApiResourceClient`].
pub struct ApiResourceFactory<R, L = Value, C = Value, U = C> {
    _types: PhantomData<fn() -> (R, L, C, U)>,
}

impl<R, L, C, U> ApiResourceFactory<R, L, C, U> {
    pub fn new() -> Self {
        Self { _types: PhantomData }
    }
}

impl<R, L, C, U> Default for ApiResourceFactory<R, L, C, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, L, C, U> ClientFactory for ApiResourceFactory<R, L, C, U>
where
    R: DeserializeOwned + Send,
    L: DeserializeOwned + Send,
    C: Serialize + Send + Sync,
    U: Serialize + Send + Sync,
{
    type Client = ApiResourceClient<R, L, C, U>;

    fn create(&self, options: &ClientOptions) -> Result<Self::Client, ResourceError> {
        create_api_resource_client(options.clone())
    }
}
