//! Core data models for syncpoint.
//!
//! Provides:
//! - `CompletionReason` / `Completion`: the terminal payload of a barrier
//! - Observer type aliases for progress and completion callbacks
//! - `SyncpointError`: error type for the resource-loader seam

mod completion;
mod error;

pub use completion::*;
pub use error::*;
