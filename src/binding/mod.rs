//! The binding layer: resource clients whose validation failures are mirrored
//! into observable state.
//!
//! # Main Components
//!
//! - [`ValidatedResource`] - Wraps a client with the clear / capture / return trap
//! - [`FieldErrorState`] - The observable field-error cell
//! - [`ClientMemo`] - Keeps one client per distinct set of inputs

pub mod memo;
pub mod state;
pub mod validated;

pub use memo::{ClientMemo, MemoKey};
pub use state::FieldErrorState;
pub use validated::*;
