//! Designated engine execution thread
//!
//! Some engine operations bind to the identity of the calling thread, most
//! notably opening a hardware capture device. The worker owns one
//! long-lived OS thread and exposes a single primitive: run a closure on
//! that thread and block until it completes. Calls made from the worker
//! thread itself execute inline, so the gateway is safe to re-enter.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::Mutex;

use crate::error::{Error, Result};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Handle to the designated engine execution thread
pub struct EngineWorker {
    sender: Mutex<Option<mpsc::Sender<Task>>>,
    thread_id: ThreadId,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl EngineWorker {
    /// Spawn the worker thread
    pub fn spawn() -> Result<Self> {
        let (task_tx, task_rx) = mpsc::channel::<Task>();
        let (id_tx, id_rx) = mpsc::channel();

        let join = thread::Builder::new()
            .name("peerlink-engine".into())
            .spawn(move || {
                let _ = id_tx.send(thread::current().id());
                while let Ok(task) = task_rx.recv() {
                    // A panicking task must not take the worker down with it;
                    // the caller observes it as a dropped reply channel.
                    if catch_unwind(AssertUnwindSafe(task)).is_err() {
                        tracing::warn!("engine thread task panicked");
                    }
                }
                tracing::debug!("engine thread stopped");
            })
            .map_err(Error::engine)?;

        let thread_id = id_rx
            .recv()
            .map_err(|_| Error::Unknown("engine thread did not start".into()))?;

        Ok(Self {
            sender: Mutex::new(Some(task_tx)),
            thread_id,
            join: Mutex::new(Some(join)),
        })
    }

    /// Whether the calling thread is the designated thread
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Run `f` on the designated thread and block until it completes
    ///
    /// The closure's return value is handed back to the caller. When
    /// already on the designated thread the closure runs inline, so
    /// re-entrant use cannot deadlock.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` when the worker has shut down, `Unknown` when the
    /// closure panicked on the worker thread.
    pub fn invoke<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        if self.is_current() {
            return Ok(f());
        }

        let sender = self
            .sender
            .lock()
            .clone()
            .ok_or_else(|| Error::InvalidOperation("engine thread stopped".into()))?;

        let (reply_tx, reply_rx) = mpsc::channel();
        sender
            .send(Box::new(move || {
                let _ = reply_tx.send(f());
            }))
            .map_err(|_| Error::InvalidOperation("engine thread stopped".into()))?;

        reply_rx
            .recv()
            .map_err(|_| Error::Unknown("engine thread task panicked".into()))
    }
}

impl Drop for EngineWorker {
    fn drop(&mut self) {
        // Closing the queue ends the worker loop
        self.sender.lock().take();
        if let Some(join) = self.join.lock().take() {
            if thread::current().id() != self.thread_id {
                let _ = join.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn invoke_runs_on_worker_thread_and_returns_value() {
        let worker = EngineWorker::spawn().unwrap();
        let worker_name = worker
            .invoke(|| thread::current().name().map(String::from))
            .unwrap();
        assert_eq!(worker_name.as_deref(), Some("peerlink-engine"));
        assert!(!worker.is_current());
    }

    #[test]
    fn invoke_from_worker_thread_runs_inline() {
        let worker = Arc::new(EngineWorker::spawn().unwrap());
        let inner = Arc::clone(&worker);
        let nested = worker
            .invoke(move || {
                assert!(inner.is_current());
                // Must not deadlock
                inner.invoke(|| 41 + 1).unwrap()
            })
            .unwrap();
        assert_eq!(nested, 42);
    }

    #[test]
    fn panicking_task_does_not_kill_the_worker() {
        let worker = EngineWorker::spawn().unwrap();
        let err = worker.invoke(|| panic!("boom")).unwrap_err();
        assert!(matches!(err, Error::Unknown(_)));
        // Still serviceable afterwards
        assert_eq!(worker.invoke(|| 7).unwrap(), 7);
    }

    #[test]
    fn invoke_propagates_closure_errors_untouched() {
        let worker = EngineWorker::spawn().unwrap();
        let result: Result<i32> = worker
            .invoke(|| Err(Error::NotFound("gadget".into())))
            .unwrap();
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
