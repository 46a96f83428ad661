//! Per-sink delivery queue.
//!
//! Network sinks hand events to a bounded queue drained by a dedicated
//! writer thread, so a collector that stops reading only backs up its own
//! queue. Once the queue is full, further events for that sink are refused
//! rather than waited on.

use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::{self, error::TrySendError};

use super::SinkError;

/// Events a sink may have in flight before new ones are refused.
pub const QUEUE_DEPTH: usize = 1024;

/// Bounded queue plus the thread that drains it.
#[derive(Debug)]
pub struct Outbox<T> {
    name: &'static str,
    tx: Mutex<Option<mpsc::Sender<T>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Outbox<T> {
    /// Start a writer thread that feeds each queued item to `deliver`.
    ///
    /// The first delivery error stops the writer; later pushes report the
    /// sink as closed.
    pub fn spawn<F>(name: &'static str, depth: usize, mut deliver: F) -> Result<Self, SinkError>
    where
        F: FnMut(T) -> Result<(), SinkError> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<T>(depth);

        let worker = thread::Builder::new()
            .name(format!("{name}-writer"))
            .spawn(move || {
                while let Some(item) = rx.blocking_recv() {
                    if let Err(e) = deliver(item) {
                        tracing::warn!(sink = name, error = %e, "Sink writer stopped");
                        break;
                    }
                }
                tracing::debug!(sink = name, "Sink writer exited");
            })
            .map_err(SinkError::Delivery)?;

        Ok(Self {
            name,
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Queue an item without waiting.
    pub fn push(&self, item: T) -> Result<(), SinkError> {
        let guard = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        let tx = guard.as_ref().ok_or(SinkError::Closed)?;
        tx.try_send(item).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Backlogged { sink: self.name },
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.lock().unwrap_or_else(|e| e.into_inner()).is_none()
    }

    /// Stop accepting items and wait for the writer to drain what is queued.
    ///
    /// Returns false if the outbox was already closed.
    pub fn close(&self) -> bool {
        let tx = self.tx.lock().unwrap_or_else(|e| e.into_inner()).take();
        if tx.is_none() {
            return false;
        }
        drop(tx);

        let worker = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                tracing::warn!(sink = self.name, "Sink writer panicked");
            }
        }
        true
    }
}
