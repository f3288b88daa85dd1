use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::Error;

/// Receiver of stream signals.
///
/// A subscriber receives zero or one `on_next`, followed by exactly one of `on_completed`
/// or `on_error`. No signal arrives after the subscription is observed as unsubscribed.
pub trait Subscriber<T> {
    /// A value.
    fn on_next(&mut self, value: T);

    /// The stream ended successfully.
    fn on_completed(&mut self);

    /// The stream ended with a failure.
    fn on_error(&mut self, error: Error);
}

type Teardown = Box<dyn FnOnce() + Send>;

/// Handle to stop receiving signals and release the resources of a subscription.
///
/// Clones share the same state. Unsubscribing is idempotent and may be done from any thread.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Shared>,
}

struct Shared {
    unsubscribed: AtomicBool,
    teardown: Mutex<Vec<Teardown>>,
}

impl Subscription {
    /// Create a new, active subscription.
    pub fn new() -> Self {
        Subscription {
            inner: Arc::new(Shared {
                unsubscribed: AtomicBool::new(false),
                teardown: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Tell if this subscription has been unsubscribed.
    pub fn is_unsubscribed(&self) -> bool {
        self.inner.unsubscribed.load(Ordering::Acquire)
    }

    /// Stop receiving signals and run all teardown hooks.
    ///
    /// Only the first call has any effect.
    pub fn unsubscribe(&self) {
        if self.inner.unsubscribed.swap(true, Ordering::AcqRel) {
            return;
        }

        // The flag is set before draining, so a concurrent add() either lands in this
        // drain or observes the flag and runs its hook directly.
        let hooks = mem::take(&mut *self.teardown());

        debug!("Unsubscribe, run {} teardown hooks", hooks.len());

        for hook in hooks {
            hook();
        }
    }

    /// Register a hook to run on unsubscription.
    ///
    /// If the subscription is already unsubscribed, the hook runs immediately on the
    /// calling thread.
    pub fn add<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut teardown = self.teardown();

        if self.is_unsubscribed() {
            drop(teardown);
            hook();
            return;
        }

        teardown.push(Box::new(hook));
    }

    /// Tie the lifetime of `child` to this subscription.
    pub fn add_child(&self, child: &Subscription) {
        let child = child.clone();
        self.add(move || child.unsubscribe());
    }

    fn teardown(&self) -> MutexGuard<'_, Vec<Teardown>> {
        // A panicking hook runs outside the lock, the list can't be left half-updated.
        self.inner
            .teardown
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("unsubscribed", &self.is_unsubscribed())
            .finish()
    }
}

/// The producing side of a subscriber.
///
/// Enforces the subscriber contract: values are dropped once unsubscribed and the terminal
/// signals consume the emitter, so at most one of them is ever delivered. Delivering a
/// terminal signal releases the subscription.
pub struct Emitter<T> {
    subscriber: Box<dyn Subscriber<T> + Send>,
    subscription: Subscription,
}

impl<T> Emitter<T> {
    /// Bind a subscriber to a subscription.
    pub fn new<S>(subscriber: S, subscription: Subscription) -> Self
    where
        S: Subscriber<T> + Send + 'static,
    {
        Emitter {
            subscriber: Box::new(subscriber),
            subscription,
        }
    }

    /// The subscription this emitter delivers under.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Tell if the subscriber has unsubscribed.
    pub fn is_unsubscribed(&self) -> bool {
        self.subscription.is_unsubscribed()
    }

    /// Deliver a value, unless unsubscribed.
    pub fn next(&mut self, value: T) {
        if self.is_unsubscribed() {
            trace!("Drop on_next after unsubscribe");
            return;
        }
        self.subscriber.on_next(value);
    }

    /// Deliver completion, unless unsubscribed.
    pub fn complete(mut self) {
        if self.is_unsubscribed() {
            trace!("Drop on_completed after unsubscribe");
            return;
        }
        self.subscriber.on_completed();
        self.subscription.unsubscribe();
    }

    /// Deliver a failure, unless unsubscribed.
    pub fn error(mut self, error: Error) {
        if self.is_unsubscribed() {
            trace!("Drop on_error after unsubscribe: {}", error);
            return;
        }
        self.subscriber.on_error(error);
        self.subscription.unsubscribe();
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("subscription", &self.subscription)
            .finish()
    }
}
