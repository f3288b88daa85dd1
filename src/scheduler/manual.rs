use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::Error;

use super::{Action, Scheduler, Worker};

/// A scheduler driven by hand.
///
/// Scheduled actions are queued and nothing runs until [`ManualScheduler::trigger_actions`]
/// is called, which runs them on the calling thread. This gives deterministic control over
/// when a subscription executes its call, which is what tests need.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<VecDeque<Queued>>>,
}

struct Queued {
    disposed: Arc<AtomicBool>,
    action: Action,
}

struct ManualWorker {
    queue: Arc<Mutex<VecDeque<Queued>>>,
    disposed: Arc<AtomicBool>,
}

impl ManualScheduler {
    /// Create a scheduler with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every queued action of a live worker, in the order scheduled.
    ///
    /// Actions scheduled by running actions are also run. Returns the number of actions run.
    pub fn trigger_actions(&self) -> usize {
        let mut ran = 0;

        loop {
            // The lock is released before running, actions may schedule more.
            let Some(next) = lock(&self.queue).pop_front() else {
                break;
            };

            if next.disposed.load(Ordering::Acquire) {
                trace!("Skip action of disposed worker");
                continue;
            }

            (next.action)();
            ran += 1;
        }

        debug!("Triggered {} actions", ran);

        ran
    }

    /// Number of queued actions belonging to live workers.
    pub fn pending(&self) -> usize {
        lock(&self.queue)
            .iter()
            .filter(|q| !q.disposed.load(Ordering::Acquire))
            .count()
    }
}

impl Scheduler for ManualScheduler {
    fn create_worker(&self) -> Result<Arc<dyn Worker>, Error> {
        Ok(Arc::new(ManualWorker {
            queue: self.queue.clone(),
            disposed: Arc::new(AtomicBool::new(false)),
        }))
    }
}

impl Worker for ManualWorker {
    fn schedule(&self, action: Action) {
        if self.is_disposed() {
            trace!("Schedule on disposed worker");
            return;
        }

        lock(&self.queue).push_back(Queued {
            disposed: self.disposed.clone(),
            action,
        });
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

fn lock(queue: &Mutex<VecDeque<Queued>>) -> MutexGuard<'_, VecDeque<Queued>> {
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
