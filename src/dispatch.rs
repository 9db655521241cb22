//! Single-threaded completion context.
//!
//! Loader results are posted to a [`CallbackQueue`] instead of being invoked on
//! whichever worker finished the request. All jobs run in order on one
//! dedicated thread, so callers can touch non-`Sync` state from callbacks
//! without locking.
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tokio::sync::mpsc;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// The queue's thread has exited (all jobs after that are dropped).
#[derive(Debug, Error)]
#[error("callback queue is closed")]
pub struct QueueClosed;

/// Handle for posting jobs to the callback thread.
///
/// Cheap to clone. The thread exits once every handle is dropped and the
/// remaining jobs have run. A panicking job is logged and the thread moves on
/// to the next one.
#[derive(Debug, Clone)]
pub struct CallbackQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl CallbackQueue {
    /// Starts a named thread that runs posted jobs one at a time.
    pub fn spawn(name: &str) -> std::io::Result<(Self, JoinHandle<()>)> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                        tracing::error!(panic = panic_message(payload.as_ref()), "Callback panicked");
                    }
                }
                tracing::debug!("Callback queue drained, thread exiting");
            })?;

        Ok((Self { tx }, handle))
    }

    /// Posts `job` to run on the queue's thread.
    pub fn dispatch<F>(&self, job: F) -> Result<(), QueueClosed>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx.send(Box::new(job)).map_err(|_| QueueClosed)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}
