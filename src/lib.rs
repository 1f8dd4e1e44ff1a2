//! # Validated Resource
//!
//! > **Resource clients that remember what the server rejected.**
//!
//! This crate binds a resource-oriented CRUD client to an observable error
//! cell. Every call clears stale validation errors, awaits the server, and when
//! the server rejects the input with per-field messages, those messages land in
//! the cell for the UI to render. The failure itself is still returned to the
//! caller.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Observe, never swallow
//!
//! The binding has exactly one side effect: mirroring a validation failure into
//! its [`FieldErrorState`](binding::FieldErrorState). Every result reaches the
//! caller exactly as the client produced it, so code that decides "stay on the
//! form" or "show a toast" keeps working.
//!
//! ### One trap for five operations
//!
//! `get`, `list`, `update`, `store` and `destroy` share a single clear / await /
//! capture sequence. See [`binding::validated`] for the details.
//!
//! ### Errors are tagged, not inspected
//!
//! [`ResourceError`](framework::ResourceError) is an enum. A validation failure
//! is the `Validation` variant carrying [`FieldErrors`](framework::FieldErrors);
//! everything else (transport, not found, server errors) passes through.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Client ([`framework`])
//! The typed CRUD client and the seams around it.
//! - **Key items**: [`ResourceApi`](framework::ResourceApi), [`ApiResourceClient`](framework::ApiResourceClient),
//!   [`Transport`](framework::Transport), [`ResourceError`](framework::ResourceError).
//!
//! ### 2. The Binding ([`binding`])
//! Wraps a client with the error trap and keeps one client per set of inputs.
//! - **Key items**: [`ValidatedResource`](binding::ValidatedResource), [`BindingArgs`](binding::BindingArgs).
//!
//! ### 3. The Backend ([`server`])
//! An in-process API server (an actor over Tokio channels) with Laravel-style validation.
//! - **Key items**: [`ApiServer`](server::ApiServer), [`CollectionSpec`](server::CollectionSpec), [`Rules`](server::Rules).
//!
//! ### 4. The Orchestrator ([`lifecycle`])
//! Starts and stops the server; sets up tracing.
//! - **Key items**: [`LocalApi`](lifecycle::LocalApi), [`setup_tracing`](lifecycle::setup_tracing).
//!
//! ## 🚀 Quick Start
//!
//! ```rust
//! use serde_json::{json, Value};
//! use validated_resource::binding::{BindingArgs, ValidatedResource};
//! use validated_resource::framework::ApiResourceFactory;
//! use validated_resource::lifecycle::LocalApi;
//! use validated_resource::server::{CollectionSpec, FieldRule, Rules, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let api = LocalApi::start(
//!         ServerConfig::default(),
//!         [CollectionSpec::new("users").rules(Rules::new().field("name", [FieldRule::Required]))],
//!     );
//!
//!     let users = ValidatedResource::<ApiResourceFactory<Value>>::api(
//!         BindingArgs::new("users", "id", api.transport()),
//!     );
//!
//!     assert!(users.store(&json!({"name": ""}), None).await.is_err());
//!     assert_eq!(
//!         users.errors().unwrap()["name"],
//!         vec!["The name field is required.".to_string()]
//!     );
//!
//!     drop(users);
//!     api.shutdown().await.unwrap();
//! }
//! ```
//!
//! ### Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

pub mod binding;
pub mod framework;
pub mod lifecycle;
pub mod server;
