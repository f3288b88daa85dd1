//! Single-use, cancellable handles to a remote request.
//!
//! The transport is not part of this crate. Anything that can execute a request once and
//! produce a [`Response`] implements [`Call`].

use crate::{Error, Response};

#[cfg(feature = "canned")]
pub mod canned;

/// One remote request/response exchange.
///
/// A call is single-use: [`Call::execute`] succeeds at most once per instance and fails with
/// [`Error::AlreadyExecuted`] thereafter. [`Call::clone_call`] produces an independent,
/// unexecuted call for the same request, which is how a stream re-issues the request for
/// every subscription.
///
/// All methods take `&self`. Cancellation happens from another thread while `execute()` is
/// blocking, so implementations keep their flags in atomics or behind a lock.
pub trait Call: Send + Sync + 'static {
    /// The decoded body type.
    type Body: Send + 'static;

    /// Execute the request, blocking the current thread until the exchange is done.
    ///
    /// An HTTP error status is a successful execution, it is returned as an unsuccessful
    /// [`Response`]. Transport and body conversion failures are returned as `Err`.
    fn execute(&self) -> Result<Response<Self::Body>, Error>;

    /// Best-effort abort of the request. Idempotent and safe from any thread.
    fn cancel(&self);

    /// Tell if [`Call::cancel`] was invoked.
    fn is_canceled(&self) -> bool;

    /// Tell if [`Call::execute`] was invoked.
    fn is_executed(&self) -> bool;

    /// A fresh, unexecuted call for the same request.
    fn clone_call(&self) -> Self
    where
        Self: Sized;
}
