//! Resource client framework.
//!
//! This module provides the building blocks the binding layer wraps: a typed
//! CRUD client over a pluggable transport, with one error type whose variants
//! classify every failure.
//!
//! # Main Components
//!
//! - [`ResourceApi`] - The five operations every resource client offers
//! - [`ApiResourceClient`] - JSON client over a [`Transport`]
//! - [`ClientFactory`] - Builds clients from [`ClientOptions`]
//! - [`ResourceError`] / [`FieldErrors`] - Failure taxonomy and validation payload
//!
//! # Testing
//!
//! See [`mock`] module for transports that answer from scripted expectations.

pub mod client;
pub mod error;
pub mod identity;
pub mod mock;
pub mod transport;

pub use client::*;
pub use error::*;
pub use identity::*;
pub use transport::*;
