//! Deferred execution of subscriptions.
//!
//! A [`Scheduler`] hands out [`Worker`]s. A worker runs the actions scheduled on it, and
//! disposing the worker drops every action that has not started yet.

use std::sync::Arc;

use crate::Error;

mod manual;
pub use manual::ManualScheduler;

#[cfg(feature = "thread")]
mod thread;
#[cfg(feature = "thread")]
pub use thread::NewThreadScheduler;

/// A unit of work for a [`Worker`].
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Source of workers.
pub trait Scheduler: Send + Sync + 'static {
    /// Acquire a new worker.
    fn create_worker(&self) -> Result<Arc<dyn Worker>, Error>;
}

/// Runs scheduled actions in order.
pub trait Worker: Send + Sync {
    /// Queue an action. Does nothing if the worker is disposed.
    fn schedule(&self, action: Action);

    /// Stop running actions. Actions not yet started are dropped.
    ///
    /// An action that is already running is not interrupted, it observes cancellation
    /// through its own subscription. Idempotent.
    fn dispose(&self);

    /// Tell if [`Worker::dispose`] was invoked.
    fn is_disposed(&self) -> bool;
}
