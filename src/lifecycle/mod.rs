//! Runtime orchestration and lifecycle management.
//!
//! # Main Components
//!
//! - [`LocalApi`] - Starts and stops the in-process API server
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod local_api;
pub mod tracing;

pub use self::local_api::*;
pub use self::tracing::*;
