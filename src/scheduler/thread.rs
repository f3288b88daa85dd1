use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::Error;

use super::{Action, Scheduler, Worker};

/// A scheduler that starts one OS thread per worker.
///
/// Every subscription gets its own thread, so a blocking call never holds up the
/// subscribing thread or another subscription. The thread ends when the worker is disposed.
#[derive(Debug, Clone)]
pub struct NewThreadScheduler {
    prefix: String,
}

static WORKER_ID: AtomicUsize = AtomicUsize::new(0);

impl NewThreadScheduler {
    /// Create a scheduler naming its threads `callstream-<n>`.
    pub fn new() -> Self {
        Self::with_prefix("callstream")
    }

    /// Create a scheduler naming its threads `<prefix>-<n>`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        NewThreadScheduler {
            prefix: prefix.into(),
        }
    }
}

impl Default for NewThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

struct ThreadWorker {
    sender: Mutex<Option<Sender<Action>>>,
    disposed: Arc<AtomicBool>,
}

impl Scheduler for NewThreadScheduler {
    fn create_worker(&self) -> Result<Arc<dyn Worker>, Error> {
        let (tx, rx) = mpsc::channel::<Action>();
        let disposed = Arc::new(AtomicBool::new(false));

        let name = format!(
            "{}-{}",
            self.prefix,
            WORKER_ID.fetch_add(1, Ordering::Relaxed)
        );

        let thread_disposed = disposed.clone();

        thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                // Ends when the worker is disposed and the sender dropped.
                while let Ok(action) = rx.recv() {
                    if thread_disposed.load(Ordering::Acquire) {
                        break;
                    }
                    action();
                }
                debug!("Worker thread exit");
            })
            .map_err(|e| Error::WorkerUnavailable(e.to_string()))?;

        debug!("Started worker thread: {}", name);

        Ok(Arc::new(ThreadWorker {
            sender: Mutex::new(Some(tx)),
            disposed,
        }))
    }
}

impl Worker for ThreadWorker {
    fn schedule(&self, action: Action) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let Some(tx) = sender.as_ref() else {
            trace!("Schedule on disposed worker");
            return;
        };

        if tx.send(action).is_err() {
            trace!("Worker thread gone, action dropped");
        }
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);

        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if sender.is_some() {
            debug!("Dispose worker");
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ThreadWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadWorker")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
