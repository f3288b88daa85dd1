//! Stream sources bridging a [`Call`] into subscriber signals.
//!
//! A [`CallSource`] holds a template call. Every subscription clones the template,
//! executes the clone on the subscribing thread and hands the [`Outcome`] to the shape,
//! which decides the signals:
//!
//! | Shape             | 2xx                        | HTTP error status          | Execution failure          |
//! |-------------------|----------------------------|----------------------------|----------------------------|
//! | [`BodyShape`]     | `on_next(body)`, complete  | `on_error(Error::Http)`    | `on_error(e)`              |
//! | [`ResponseShape`] | `on_next(response)`, complete | `on_next(response)`, complete | `on_error(e)`          |
//! | [`ResultShape`]   | `on_next(Response)`, complete | `on_next(Response)`, complete | `on_next(Error)`, complete |
//!
//! [`ScheduledSource`] wraps any source to move the subscription onto a scheduler worker.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::{Call, Emitter, Error, Response, Subscriber, Subscription};

mod shape;
use shape::Named;
pub use shape::{BodyShape, ResponseShape, ResultShape, Shape};

mod scheduled;
pub use scheduled::ScheduledSource;

/// Anything that can be subscribed to.
///
/// Implemented by the call sources and by [`ScheduledSource`], which composes over any
/// other source.
pub trait Source: Send + Sync + 'static {
    /// The type of values emitted.
    type Item: Send + 'static;

    /// Start producing signals into `emitter`.
    fn subscribe_emitter(&self, emitter: Emitter<Self::Item>);

    /// Bind per-subscription resources to `subscription` now, and start producing later.
    ///
    /// The returned closure must be given an emitter on the same `subscription`. If it is
    /// dropped without being run, unsubscribing still releases whatever was bound here.
    fn prepare(self: Arc<Self>, subscription: &Subscription) -> Prepared<Self::Item> {
        let _ = subscription;
        Box::new(move |emitter| self.subscribe_emitter(emitter))
    }
}

/// A subscription bound by [`Source::prepare`], waiting to start.
pub type Prepared<T> = Box<dyn FnOnce(Emitter<T>) + Send + 'static>;

/// A cloneable handle to a type erased [`Source`].
pub struct Stream<T> {
    source: Arc<dyn Source<Item = T>>,
}

impl<T: Send + 'static> Stream<T> {
    /// Erase the type of `source`.
    pub fn new<S>(source: S) -> Self
    where
        S: Source<Item = T>,
    {
        Stream {
            source: Arc::new(source),
        }
    }

    /// Subscribe with a new subscription.
    ///
    /// Unscheduled sources execute the call before this returns.
    pub fn subscribe<S>(&self, subscriber: S) -> Subscription
    where
        S: Subscriber<T> + Send + 'static,
    {
        let subscription = Subscription::new();
        self.subscribe_with(subscriber, subscription.clone());
        subscription
    }

    /// Subscribe under a subscription provided by the caller.
    ///
    /// If `subscription` is already unsubscribed, no call is executed.
    pub fn subscribe_with<S>(&self, subscriber: S, subscription: Subscription)
    where
        S: Subscriber<T> + Send + 'static,
    {
        self.source
            .subscribe_emitter(Emitter::new(subscriber, subscription));
    }
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Stream {
            source: self.source.clone(),
        }
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stream")
    }
}

/// The result of one execution.
#[derive(Debug)]
pub enum Outcome<B> {
    /// The exchange completed. The status may still be an error status.
    Completed(Response<B>),
    /// The call could not be executed to completion.
    Failed(Error),
    /// Unsubscribed before or during execution. Nothing is delivered.
    Cancelled,
}

/// Execute `call` unless `subscription` is unsubscribed.
///
/// The flag is checked again after execution, since a cancel that raced with a transport
/// read that already completed can't abort it. The outcome is then discarded.
pub(crate) fn execute<C: Call>(call: &C, subscription: &Subscription) -> Outcome<C::Body> {
    if subscription.is_unsubscribed() {
        debug!("Unsubscribed before execute");
        return Outcome::Cancelled;
    }

    let result = call.execute();

    if subscription.is_unsubscribed() {
        debug!("Unsubscribed during execute, discard outcome");
        return Outcome::Cancelled;
    }

    match result {
        Ok(v) => Outcome::Completed(v),
        Err(e) => Outcome::Failed(e),
    }
}

/// A source that executes a fresh clone of a template [`Call`] per subscription.
///
/// The shape `S` decides the emitted type and how outcomes map to signals.
pub struct CallSource<C, S> {
    template: C,
    _ph: PhantomData<fn() -> S>,
}

/// Emits the decoded body, HTTP error statuses become `on_error`.
pub type BodySource<C> = CallSource<C, BodyShape>;

/// Emits the full response, whatever the status.
pub type ResponseSource<C> = CallSource<C, ResponseShape>;

/// Emits every outcome as a [`CallResult`](crate::CallResult) value.
pub type ResultSource<C> = CallSource<C, ResultShape>;

impl<C: Call, S: Shape<C::Body>> CallSource<C, S> {
    /// Create a source from a template call.
    ///
    /// The template itself is never executed.
    pub fn new(template: C) -> Self {
        CallSource {
            template,
            _ph: PhantomData,
        }
    }
}

impl<C: Call, S: Shape<C::Body>> CallSource<C, S> {
    /// Clone the template and tie its cancellation to `subscription`.
    fn bind(&self, subscription: &Subscription) -> Arc<C> {
        let call = Arc::new(self.template.clone_call());

        debug!("{:?} subscribe", self);

        // Effective even if added after execution started, or after unsubscribe.
        let canceler = call.clone();
        subscription.add(move || canceler.cancel());

        call
    }

    fn run(&self, call: &C, emitter: Emitter<S::Item>) {
        match execute(call, emitter.subscription()) {
            Outcome::Completed(response) => {
                debug!("{:?} completed: {}", self, response.status());
                S::deliver(Ok(response), emitter);
            }
            Outcome::Failed(e) => {
                debug!("{:?} failed: {}", self, e);
                S::deliver(Err(e), emitter);
            }
            Outcome::Cancelled => {}
        }
    }
}

impl<C: Call, S: Shape<C::Body>> Source for CallSource<C, S> {
    type Item = S::Item;

    fn subscribe_emitter(&self, emitter: Emitter<S::Item>) {
        let call = self.bind(emitter.subscription());
        self.run(&call, emitter);
    }

    fn prepare(self: Arc<Self>, subscription: &Subscription) -> Prepared<S::Item> {
        let call = self.bind(subscription);
        Box::new(move |emitter| self.run(&call, emitter))
    }
}

impl<C, S: Named> fmt::Debug for CallSource<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallSource<{}>", S::name())
    }
}
