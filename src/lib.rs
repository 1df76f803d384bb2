//! syncpoint - A completion barrier for heterogeneous asynchronous work.
//!
//! A [`Barrier`] tracks a dynamic set of named pending items ("checkpoints")
//! and fires a single completion signal exactly once: either when every
//! checkpoint has been marked done, or when an optional timeout elapses
//! first, whichever happens earlier.
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use syncpoint::{Barrier, CompletionReason};
//!
//! # async fn run() {
//! let barrier = Barrier::with_timeout(Duration::from_secs(2));
//! barrier
//!     .add_checkpoints(["event1", "event2"])
//!     .start();
//!
//! barrier.mark_complete("event1");
//! barrier.mark_complete("event2");
//!
//! assert_eq!(barrier.wait().await.reason, CompletionReason::Completed);
//! # }
//! ```
//!
//! Checkpoints backed by remote fetches are registered via
//! [`Barrier::add_assets`], which delegates the actual work to an injected
//! [`ResourceLoader`] and wires fetch success back into the barrier.

pub mod barrier;
pub mod loader;
pub mod models;

// Re-exports for convenience
pub use barrier::Barrier;
pub use loader::{HttpLoader, HttpLoaderConfig, ResourceLoader};
pub use models::{Completion, CompletionReason, Result, SyncpointError};
