//! # Field Error State
//!
//! The one mutable value a binding owns: the field errors of the last
//! validation failure, or `None`.
//!
//! Backed by a `tokio::sync::watch` channel so renderers can subscribe and be
//! woken on every change instead of polling.

use crate::framework::FieldErrors;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared handle to a field-error cell.
///
/// Clones point at the same cell, so a handle taken once (e.g. to wire a
/// "dismiss" button) keeps working for the binding's whole lifetime.
#[derive(Debug, Clone)]
pub struct FieldErrorState {
    sender: Arc<watch::Sender<Option<FieldErrors>>>,
}

impl FieldErrorState {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> Option<FieldErrors> {
        self.sender.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.borrow().is_none()
    }

    /// Replaces the current value and notifies subscribers.
    pub fn set(&self, errors: FieldErrors) {
        self.sender.send_replace(Some(errors));
    }

    /// Clears the current value. Subscribers are only notified if there was
    /// something to clear.
    pub fn reset(&self) {
        self.sender.send_if_modified(|current| current.take().is_some());
    }

    /// A receiver that observes every change from now on.
    pub fn subscribe(&self) -> watch::Receiver<Option<FieldErrors>> {
        self.sender.subscribe()
    }

    /// Whether both handles point at the same cell.
    pub fn same_cell(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.sender, &other.sender)
    }
}

impl Default for FieldErrorState {
    fn default() -> Self {
        Self::new()
    }
}
