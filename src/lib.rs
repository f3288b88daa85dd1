//! Adapt single-shot HTTP calls into single-item streams.
//!
//! A [`Call`] is a cancellable, single-use handle to one request. This crate turns such a
//! call into a [`Stream`], which on every subscription clones the call, executes the clone
//! and pushes exactly one outcome to the [`Subscriber`].
//!
//! There are three shapes of stream:
//!
//! * **Body** - `Stream<T>`. Emits the decoded body. HTTP error statuses and transport
//!   failures both end the stream with `on_error`.
//! * **Response** - `Stream<Response<T>>`. Emits the response regardless of status. Only
//!   transport failures end the stream with `on_error`.
//! * **Result** - `Stream<CallResult<T>>`. Never ends with `on_error`, every outcome is
//!   delivered as a value.
//!
//! Execution happens on the subscribing thread, unless the [`CallAdapterFactory`] is
//! created with a [`Scheduler`], in which case the execution is deferred onto a worker.
//!
//! ```text
//!                 ┌──────────────────┐
//!                 │     Created      │───────────────┐
//!                 └──────────────────┘               │
//!                           │                        │
//!                           ▼                        │
//!                 ┌──────────────────┐               │
//!                 │ WorkerScheduled  │───────────────┤
//!                 └──────────────────┘               │
//!                           │                        │
//!                           ▼                        ▼
//!                 ┌──────────────────┐     ┌──────────────────┐
//!              ┌──│    Executing     │────▶│    Cancelled     │
//!              │  └──────────────────┘     └──────────────────┘
//!              │            │
//!              ▼            ▼
//!    ┌──────────────────┐ ┌──────────────────┐
//!    │    Completed     │ │      Failed      │
//!    └──────────────────┘ └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use callstream::*;
//!
//! let scheduler = ManualScheduler::new();
//! let factory = CallAdapterFactory::create_with_scheduler(scheduler.clone());
//!
//! let call = CannedCall::utf8(&b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nHi"[..]);
//! let stream = factory.body(call);
//!
//! struct Print;
//!
//! impl Subscriber<String> for Print {
//!     fn on_next(&mut self, value: String) {
//!         assert_eq!(value, "Hi");
//!     }
//!     fn on_completed(&mut self) {}
//!     fn on_error(&mut self, error: Error) {
//!         panic!("{}", error);
//!     }
//! }
//!
//! let subscription = stream.subscribe(Print);
//!
//! // Nothing is executed until the scheduler runs the action.
//! assert_eq!(scheduler.trigger_actions(), 1);
//! assert!(subscription.is_unsubscribed());
//! ```
//!
//! # In scope:
//!
//! * Bridging a blocking call into a single-item stream
//! * Cancellation of the in-flight call on unsubscription
//! * Deferring execution onto a scheduler worker
//! * Selecting the stream shape from a declared return type
//!
//! # Out of scope:
//!
//! * The HTTP transport (connections, TLS, retries)
//! * Request building and body converters
//! * Stream combinators and multi-subscriber fan-out
//!
//! # The http crate
//!
//! Statuses, versions and headers are from the [http crate](https://crates.io/crates/http).

#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![deny(missing_docs)]

#[macro_use]
extern crate log;

mod error;
pub use error::Error;

pub mod call;
pub use call::Call;

#[cfg(feature = "canned")]
pub use call::canned::CannedCall;

mod response;
pub use response::{CallResult, Response};

mod subscriber;
pub use subscriber::{Emitter, Subscriber, Subscription};

pub mod source;
pub use source::{Source, Stream};

pub mod scheduler;
pub use scheduler::{ManualScheduler, Scheduler, Worker};

#[cfg(feature = "thread")]
pub use scheduler::NewThreadScheduler;

mod adapter;
pub use adapter::{Adapted, CallAdapter, CallAdapterFactory, ReturnShape, ReturnType};

pub use http;

#[cfg(test)]
mod test;
