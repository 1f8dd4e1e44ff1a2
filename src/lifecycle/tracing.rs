//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging with the `tracing` crate.
//!
//! ## What Gets Traced
//!
//! - **Client Requests**: a span per request with `resource`, `action` and `id`
//! - **Validation Failures**: the binding logs the operation and the number of failing fields
//! - **Server Lifecycle**: startup, registered collections, rejected requests, shutdown
//! - **Memoization**: a debug line whenever a binding rebuilds its client
//!
//! ## Usage Examples
//!
//! ```bash
//! # Compact logs (default)
//! RUST_LOG=info cargo run
//!
//! # Request paths and rebuilt clients
//! RUST_LOG=debug cargo run
//!
//! # Filter to specific modules
//! RUST_LOG=validated_resource::binding=debug cargo run
//! ```
//!
//! With `RUST_LOG=debug` a rejected store looks like:
//!
//! ```text
//! DEBUG send{resource=users action=store id=None}: Sending request method=POST path=/users
//! WARN Rejected method=POST path=/users status=422
//! WARN send{resource=users action=store id=None}: Request failed path=/users status=422 error=The name field is required.
//! WARN Validation failed resource=users operation="store" fields=1
//! ```

/// Initializes the tracing subscriber, filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // Spans carry the resource name instead
        .compact()
        .init();
}
