use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::scheduler::Scheduler;
use crate::{Emitter, Error, Subscriber, Subscription};

use super::Source;

/// Defers subscription to another source onto a scheduler worker.
///
/// `subscribe_emitter` acquires a worker, prepares the inner subscription and schedules
/// its start, it never executes anything on the subscribing thread. Unsubscribing disposes
/// the worker, which drops the action if it has not run yet, and unsubscribes the inner
/// subscription either way.
pub struct ScheduledSource<S> {
    inner: Arc<S>,
    scheduler: Arc<dyn Scheduler>,
}

impl<S: Source> ScheduledSource<S> {
    /// Wrap `inner` to be subscribed on workers of `scheduler`.
    pub fn new(inner: S, scheduler: Arc<dyn Scheduler>) -> Self {
        ScheduledSource {
            inner: Arc::new(inner),
            scheduler,
        }
    }
}

impl<S: Source> Source for ScheduledSource<S> {
    type Item = S::Item;

    fn subscribe_emitter(&self, outer: Emitter<S::Item>) {
        let phase = Arc::new(PhaseCell::new());

        let worker = match self.scheduler.create_worker() {
            Ok(v) => v,
            Err(e) => {
                debug!("No worker: {}", e);
                phase.finish(Phase::Failed);
                return outer.error(e);
            }
        };

        // Bound now, so unsubscribing before the worker runs still cancels the call.
        let subscription = Subscription::new();
        outer.subscription().add_child(&subscription);
        let start = self.inner.clone().prepare(&subscription);

        {
            let phase = phase.clone();
            let worker = worker.clone();
            outer.subscription().add(move || {
                phase.cancel();
                worker.dispose();
            });
        }

        if !phase.advance(Phase::Created, Phase::WorkerScheduled) {
            // Unsubscribed before we got here. The hook already disposed the worker.
            return;
        }

        worker.schedule(Box::new(move || {
            if !phase.advance(Phase::WorkerScheduled, Phase::Executing) {
                return;
            }

            let forward = Forward {
                outer: Some(outer),
                phase,
            };

            start(Emitter::new(forward, subscription));
        }));
    }
}

impl<S> fmt::Debug for ScheduledSource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScheduledSource")
    }
}

/// Forwards inner signals to the outer emitter.
struct Forward<T> {
    outer: Option<Emitter<T>>,
    phase: Arc<PhaseCell>,
}

impl<T> Subscriber<T> for Forward<T> {
    fn on_next(&mut self, value: T) {
        if let Some(outer) = &mut self.outer {
            outer.next(value);
        }
    }

    fn on_completed(&mut self) {
        if let Some(outer) = self.outer.take() {
            self.phase.finish(Phase::Completed);
            outer.complete();
        }
    }

    fn on_error(&mut self, error: Error) {
        if let Some(outer) = self.outer.take() {
            self.phase.finish(Phase::Failed);
            outer.error(error);
        }
    }
}

/// Lifecycle of one scheduled subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Phase {
    Created = 0,
    WorkerScheduled = 1,
    Executing = 2,
    Completed = 3,
    Failed = 4,
    Cancelled = 5,
}

impl Phase {
    fn from_u8(v: u8) -> Phase {
        match v {
            0 => Phase::Created,
            1 => Phase::WorkerScheduled,
            2 => Phase::Executing,
            3 => Phase::Completed,
            4 => Phase::Failed,
            _ => Phase::Cancelled,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed | Phase::Cancelled)
    }
}

/// Atomic holder of a [`Phase`], written from the subscribing, unsubscribing and worker
/// threads.
#[derive(Debug)]
pub(crate) struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub fn new() -> Self {
        PhaseCell(AtomicU8::new(Phase::Created as u8))
    }

    pub fn get(&self) -> Phase {
        Phase::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move `from` -> `to`. Fails if another thread moved the phase first.
    pub fn advance(&self, from: Phase, to: Phase) -> bool {
        let ok = self
            .0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if ok {
            debug!("Scheduled {:?} -> {:?}", from, to);
        } else {
            debug!("Scheduled {:?} -> {:?} refused in {:?}", from, to, self.get());
        }

        ok
    }

    /// Move to `Cancelled` from any non-terminal phase.
    pub fn cancel(&self) -> bool {
        self.finish(Phase::Cancelled)
    }

    /// Move to a terminal phase from any non-terminal phase.
    pub fn finish(&self, to: Phase) -> bool {
        let mut current = self.get();

        while !current.is_terminal() {
            match self.0.compare_exchange(
                current as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    debug!("Scheduled {:?} -> {:?}", current, to);
                    return true;
                }
                Err(v) => current = Phase::from_u8(v),
            }
        }

        false
    }
}
