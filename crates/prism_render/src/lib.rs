//! # Prism Render
//!
//! A synchronous-looking render API backed by exactly one render thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   push / push_and_sync   ┌───────────────┐
//! │ Caller       │ ───────────────────────> │ Render Thread │
//! │ Threads      │      CommandQueue        │ (sole owner   │
//! │ RenderServer │ <─────────────────────── │  of backend)  │
//! └──────┬───────┘     results / handles    └───────┬───────┘
//!        │                                          │
//!        │  warm pop (no thread hop)                │ batch create
//!        └────────────> HandlePools <───────────────┘
//! ```
//!
//! ## The three forwarding templates
//!
//! 1. **Fire-and-forget** - setters and commands: captured by value,
//!    submitted with `push`, caller never waits.
//! 2. **Call-and-wait** - creation and queries: submitted with
//!    `push_and_sync`, the result crosses back over the rendezvous.
//! 3. **Direct pass-through** - cached statistics only: atomic reads with
//!    no queue involvement, approximate by contract.
//!
//! ## Threading contract
//!
//! The render thread is the sole mutator of backend state. Operations from
//! one caller thread apply in submission order; cross-thread ordering needs
//! external synchronization. Violating the contract (for example calling a
//! blocking operation from inside a render-thread callback) is a bug caught
//! by debug assertions, not a recoverable error.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod arena;
pub mod backend;
pub mod config;
pub mod error;
pub mod handle;
pub mod pool;
pub mod raster;
pub mod server;

pub use arena::HandleArena;
pub use backend::{RenderBackend, RenderStats};
pub use config::RenderConfig;
pub use error::{ConfigError, ConfigResult};
pub use handle::{ResourceHandle, ResourceKind};
pub use pool::HandlePools;
pub use raster::RasterBackend;
pub use server::RenderServer;
