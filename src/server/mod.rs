//! In-process API server: a [`Transport`](crate::framework::Transport) backed by
//! an actor holding in-memory collections.
//!
//! Collections validate writes with [`Rules`] and answer failures the way a
//! Laravel backend does (`422` with `{message, errors}`), which makes the
//! server a realistic stand-in for exercising validated bindings.

pub mod actor;
pub mod collection;
pub mod rules;

pub use actor::{ApiServer, LocalTransport, ServerConfig};
pub use collection::CollectionSpec;
pub use rules::{FieldRule, Rules};
