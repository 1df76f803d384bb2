//! Terminal payload and observer types for the barrier.

use serde::{Deserialize, Serialize};

/// Why a barrier finished.
///
/// There is no third state: a failed asset fetch is not distinguished from one
/// that never completes, it simply leaves its checkpoint pending until the
/// timeout path collects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionReason {
    /// Every registered checkpoint was marked complete.
    Completed,
    /// The timeout elapsed with checkpoints still pending.
    #[serde(rename = "timeout")]
    TimedOut,
}

impl std::fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionReason::Completed => write!(f, "completed"),
            CompletionReason::TimedOut => write!(f, "timeout"),
        }
    }
}

/// Terminal payload delivered exactly once per barrier, to the completion
/// observer and to every [`Barrier::wait`](crate::Barrier::wait) caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Terminal classification of why completion fired.
    pub reason: CompletionReason,
}

/// Progress observer: invoked with `(name, remaining, total)` after each
/// successful mark-complete. `remaining` is the pending count after removal,
/// `total` the lifetime count of distinct registered checkpoints.
pub type ProgressObserver = Box<dyn FnMut(&str, usize, usize) + Send>;

/// Completion observer: invoked exactly once with the terminal payload.
pub type CompletionObserver = Box<dyn FnOnce(Completion) + Send>;
