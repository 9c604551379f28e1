//! # Prism Core
//!
//! The generic cross-thread command queue underpinning the Prism render
//! server. One thread owns a piece of state; any number of other threads
//! submit closures that mutate or query it. The queue guarantees:
//!
//! 1. **FIFO per producer** - items from one thread run in submission order
//! 2. **Single consumer** - no two items of the same queue run concurrently
//! 3. **No silent drops** - every pushed item eventually executes while the
//!    queue is being drained
//!
//! ## Example
//!
//! ```rust,ignore
//! use prism_core::CommandQueue;
//!
//! let queue = CommandQueue::new();
//! let consumer = queue.clone();
//!
//! std::thread::spawn(move || loop {
//!     consumer.wait_and_flush_one();
//! });
//!
//! queue.push(|| println!("runs on the consumer thread"));
//! let answer = queue.push_and_sync(|| 42);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod queue;

pub use queue::{CommandQueue, WorkItem};
