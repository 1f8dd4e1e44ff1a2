//! # Validated Resource Binding
//!
//! [`ValidatedResource`] wraps a resource client so that validation failures
//! land in an observable [`FieldErrorState`] as a side effect of each call.
//!
//! ## The Trap
//!
//! Every operation runs the same sequence:
//!
//! 1. Clear the field errors (when `clear_errors_on_call` is set). This happens
//!    when the operation is *called*, before the returned future is polled.
//! 2. Await the underlying client call.
//! 3. On [`ResourceError::Validation`], store its field errors.
//! 4. Return the result exactly as the client produced it. Errors are never
//!    swallowed, so callers can still branch on them (stay on the form, show a
//!    toast for anything else, ...).
//!
//! Overlapping calls each run their own trap; whichever settles last decides
//! what the error state shows.

use crate::binding::memo::{ClientMemo, MemoKey};
use crate::binding::state::FieldErrorState;
use crate::framework::{
    ApiResourceFactory, ClientFactory, ClientOptions, FieldErrors, Query, RequestConfig,
    ResourceApi, ResourceError, ResourceId, ResourceIdentity, RouteFn, RouteParams,
    SharedTransport,
};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// The member type of the clients a factory builds.
pub type ResourceOf<F> = <<F as ClientFactory>::Client as ResourceApi>::Resource;
/// The list response type of the clients a factory builds.
pub type ListOf<F> = <<F as ClientFactory>::Client as ResourceApi>::ListResponse;
/// The create payload type of the clients a factory builds.
pub type CreateOf<F> = <<F as ClientFactory>::Client as ResourceApi>::CreatePayload;
/// The update payload type of the clients a factory builds.
pub type UpdateOf<F> = <<F as ClientFactory>::Client as ResourceApi>::UpdatePayload;

/// Inputs of a binding.
///
/// Start from [`BindingArgs::new`] and adjust with the `with_*` methods.
#[derive(Clone)]
pub struct BindingArgs {
    pub resource_key: String,
    pub resource_route_param: String,
    pub additional_route_params: Option<RouteParams>,
    pub client: SharedTransport,
    pub route_fn: Option<RouteFn>,
    pub request_config: Option<RequestConfig>,
    /// Clear errors before every call. Defaults to `true`.
    pub clear_errors_on_call: bool,
}

impl BindingArgs {
    pub fn new(
        resource_key: impl Into<String>,
        resource_route_param: impl Into<String>,
        client: SharedTransport,
    ) -> Self {
        Self {
            resource_key: resource_key.into(),
            resource_route_param: resource_route_param.into(),
            additional_route_params: None,
            client,
            route_fn: None,
            request_config: None,
            clear_errors_on_call: true,
        }
    }

    #[must_use]
    pub fn with_route_params(mut self, params: RouteParams) -> Self {
        self.additional_route_params = Some(params);
        self
    }

    #[must_use]
    pub fn with_route_fn(mut self, route_fn: RouteFn) -> Self {
        self.route_fn = Some(route_fn);
        self
    }

    #[must_use]
    pub fn with_request_config(mut self, config: RequestConfig) -> Self {
        self.request_config = Some(config);
        self
    }

    #[must_use]
    pub fn clear_errors_on_call(mut self, clear: bool) -> Self {
        self.clear_errors_on_call = clear;
        self
    }

    fn client_options(&self) -> ClientOptions {
        ClientOptions {
            identity: ResourceIdentity {
                resource_key: self.resource_key.clone(),
                resource_route_param: self.resource_route_param.clone(),
                additional_route_params: self.additional_route_params.clone(),
            },
            transport: self.client.clone(),
            route_fn: self.route_fn.clone(),
            request_config: self.request_config.clone(),
        }
    }
}

impl fmt::Debug for BindingArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingArgs")
            .field("resource_key", &self.resource_key)
            .field("resource_route_param", &self.resource_route_param)
            .field("additional_route_params", &self.additional_route_params)
            .field("request_config", &self.request_config)
            .field("clear_errors_on_call", &self.clear_errors_on_call)
            .finish_non_exhaustive()
    }
}

/// A resource client bound to a field-error cell.
///
/// The underlying client is built on first use and rebuilt only when
/// [`reconfigure`](Self::reconfigure) changes its inputs. Rebuilding never
/// touches the error state.
pub struct ValidatedResource<F: ClientFactory> {
    factory: F,
    args: BindingArgs,
    memo: ClientMemo<F::Client>,
    errors: FieldErrorState,
}

impl<R, L, C, U> ValidatedResource<ApiResourceFactory<R, L, C, U>>
where
    ApiResourceFactory<R, L, C, U>: ClientFactory,
{
    /// Binds an [`ApiResourceClient`](crate::framework::ApiResourceClient).
    pub fn api(args: BindingArgs) -> Self {
        Self::new(ApiResourceFactory::new(), args)
    }
}

impl<F: ClientFactory> ValidatedResource<F> {
    pub fn new(factory: F, args: BindingArgs) -> Self {
        Self {
            factory,
            args,
            memo: ClientMemo::new(),
            errors: FieldErrorState::new(),
        }
    }

    pub fn args(&self) -> &BindingArgs {
        &self.args
    }

    /// Replaces the binding's inputs.
    ///
    /// The client is rebuilt lazily, and only if the new inputs differ from the
    /// ones it was built from. Field errors are kept.
    pub fn reconfigure(&mut self, args: BindingArgs) {
        debug!(resource = %args.resource_key, "Binding reconfigured");
        self.args = args;
    }

    /// The client for the current inputs, built if needed.
    ///
    /// Identity problems surface here as [`ResourceError::Config`].
    pub fn client(&self) -> Result<Arc<F::Client>, ResourceError> {
        let options = self.args.client_options();
        let key = MemoKey::from_options(&options);
        self.memo.get_or_create(key, || self.factory.create(&options))
    }

    /// Field errors of the last validation failure, if any.
    pub fn errors(&self) -> Option<FieldErrors> {
        self.errors.get()
    }

    /// Clears the field errors. Safe to call at any time, including mid-call.
    pub fn reset_errors(&self) {
        self.errors.reset();
    }

    /// A handle to the error cell that stays valid across reconfiguration.
    pub fn error_state(&self) -> FieldErrorState {
        self.errors.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<FieldErrors>> {
        self.errors.subscribe()
    }

    /// Resolves the client, then clears stale errors if configured to.
    ///
    /// A construction failure is returned before the errors are touched.
    fn begin(&self) -> Result<Arc<F::Client>, ResourceError> {
        let client = self.client()?;
        if self.args.clear_errors_on_call {
            self.errors.reset();
        }
        Ok(client)
    }

    /// Mirrors a validation failure into the error state and hands the result back.
    fn settle<T>(&self, operation: &'static str, result: Result<T, ResourceError>) -> Result<T, ResourceError> {
        if let Err(ResourceError::Validation { errors, .. }) = &result {
            warn!(
                resource = %self.args.resource_key,
                operation,
                fields = errors.len(),
                "Validation failed"
            );
            self.errors.set(errors.clone());
        }
        result
    }

    pub fn get<'a>(
        &'a self,
        id: impl Into<ResourceId> + 'a,
        cfg: Option<&'a RequestConfig>,
    ) -> impl Future<Output = Result<ResourceOf<F>, ResourceError>> + Send + 'a {
        let id = id.into();
        let client = self.begin();
        async move {
            let client = client?;
            self.settle("get", client.get(&id, cfg).await)
        }
    }

    pub fn list<'a>(
        &'a self,
        params: Option<&'a Query>,
        cfg: Option<&'a RequestConfig>,
    ) -> impl Future<Output = Result<ListOf<F>, ResourceError>> + Send + 'a {
        let client = self.begin();
        async move {
            let client = client?;
            self.settle("list", client.list(params, cfg).await)
        }
    }

    pub fn update<'a>(
        &'a self,
        id: impl Into<ResourceId> + 'a,
        payload: &'a UpdateOf<F>,
        cfg: Option<&'a RequestConfig>,
    ) -> impl Future<Output = Result<ResourceOf<F>, ResourceError>> + Send + 'a {
        let id = id.into();
        let client = self.begin();
        async move {
            let client = client?;
            self.settle("update", client.update(&id, payload, cfg).await)
        }
    }

    pub fn store<'a>(
        &'a self,
        payload: &'a CreateOf<F>,
        cfg: Option<&'a RequestConfig>,
    ) -> impl Future<Output = Result<ResourceOf<F>, ResourceError>> + Send + 'a {
        let client = self.begin();
        async move {
            let client = client?;
            self.settle("store", client.store(payload, cfg).await)
        }
    }

    pub fn destroy<'a>(
        &'a self,
        id: impl Into<ResourceId> + 'a,
        cfg: Option<&'a RequestConfig>,
    ) -> impl Future<Output = Result<(), ResourceError>> + Send + 'a {
        let id = id.into();
        let client = self.begin();
        async move {
            let client = client?;
            self.settle("destroy", client.destroy(&id, cfg).await)
        }
    }
}
