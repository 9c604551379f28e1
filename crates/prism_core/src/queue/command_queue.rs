//! # Command Queue Implementation
//!
//! Channel-backed FIFO of boxed closures. Cloning the queue clones both
//! channel ends, so the producer side and the consumer side share one
//! buffer; which end a clone uses is a matter of discipline, not types.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

/// A deferred, single-execution unit of work.
///
/// Created on a caller thread, executed exactly once on the consumer
/// thread, then dropped. Arguments are captured by value at call time.
pub type WorkItem = Box<dyn FnOnce() + Send + 'static>;

/// Thread-safe FIFO queue of [`WorkItem`]s.
///
/// Exactly one thread should consume (`wait_and_flush_one` / `flush_all`);
/// any number of threads may produce (`push` / `push_and_sync`). Ordering
/// is guaranteed per producer thread only: if two threads push
/// concurrently, their relative order at the consumer is unspecified.
///
/// The queue has no terminal state of its own. The consumer loop decides
/// when to stop, typically by running an "exit" work item that flips a
/// flag, then performing a final [`flush_all`](Self::flush_all).
#[derive(Clone)]
pub struct CommandQueue {
    tx: Sender<WorkItem>,
    rx: Receiver<WorkItem>,
}

impl CommandQueue {
    /// Creates a new, unbounded command queue.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Enqueues `work` for asynchronous execution on the consumer thread.
    ///
    /// Returns immediately; the caller never observes the result. Must not
    /// be called from the consumer thread itself while that thread is
    /// blocked in [`wait_and_flush_one`](Self::wait_and_flush_one) - the
    /// façade layer dispatches such calls directly instead of queueing.
    pub fn push<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // Infallible: we hold a receiver clone for the queue's lifetime.
        self.tx
            .send(Box::new(work))
            .expect("command queue disconnected");
    }

    /// Enqueues `work` and blocks until the consumer thread has executed
    /// it, returning the closure's result.
    ///
    /// The wait is a parked channel receive, not a spin loop. Used whenever
    /// the caller needs a return value or must observe a side effect before
    /// proceeding (resource creation, queries, barriers).
    ///
    /// # Panics
    ///
    /// Panics if the consumer tears the queue down without running the
    /// item. That cannot happen under the documented shutdown protocol
    /// (exit item followed by a final flush), so a panic here is a fatal
    /// programming bug, not a recoverable condition.
    pub fn push_and_sync<F, R>(&self, work: F) -> R
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (done_tx, done_rx) = bounded(1);
        self.push(move || {
            // Receiver may be gone only if the caller thread died mid-wait.
            let _ = done_tx.send(work());
        });
        done_rx.recv().expect("work item dropped before execution")
    }

    /// Consumer side: blocks until at least one work item is available,
    /// then executes exactly one.
    ///
    /// # Panics
    ///
    /// Panics if every producer handle has been dropped while the queue is
    /// empty, which the owning server never allows.
    pub fn wait_and_flush_one(&self) {
        let item = self.rx.recv().expect("command queue disconnected");
        item();
    }

    /// Consumer side: executes all currently queued items without blocking
    /// for more. A no-op on an empty queue.
    pub fn flush_all(&self) {
        while let Ok(item) = self.rx.try_recv() {
            item();
        }
    }

    /// Number of items currently queued. Approximate under concurrency;
    /// intended for instrumentation only.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Returns whether the queue is currently empty. Approximate under
    /// concurrency.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
