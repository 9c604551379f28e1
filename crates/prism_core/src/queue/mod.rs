//! # Command Queue
//!
//! The thread-hop primitive: caller threads push closures, one consumer
//! thread executes them in order.
//!
//! ## The Problem
//!
//! ```text
//! Thread 1 (Logic):   wants texture_set_data(...)
//! Thread 2 (Render):  sole owner of renderer state
//!
//! Direct call:        RACE CONDITION
//! Lock everything:    CONTENTION on every setter
//! ```
//!
//! ## The Solution: deferred work items
//!
//! ```text
//! Caller:    push(closure)          -> returns immediately
//! Caller:    push_and_sync(closure) -> parks until the consumer ran it
//! Consumer:  wait_and_flush_one()   -> blocks for one item, runs it
//! Consumer:  flush_all()            -> drains the backlog, never waits
//! ```

mod command_queue;

pub use command_queue::{CommandQueue, WorkItem};
