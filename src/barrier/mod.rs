//! The completion barrier.
//!
//! Provides:
//! - `Barrier`: tracks a set of named pending checkpoints toward a single
//!   completion signal
//!
//! Invariants:
//! - `pending` never contains duplicates; registration order is preserved
//! - the terminal flag is set exactly once, under the state lock, before any
//!   observer runs; the losing side of the exhaustion/timeout race finds it
//!   set and does nothing
//! - once finished, every mutator degrades to a logged no-op

use crate::loader::ResourceLoader;
use crate::models::{Completion, CompletionObserver, CompletionReason, ProgressObserver};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Internal state, shared between the caller's handle, the timer task and any
/// spawned asset fetches.
struct BarrierState {
    /// Pending checkpoint identifiers, insertion-ordered, duplicate-free
    pending: Vec<String>,
    /// Distinct identifiers ever registered (progress denominator)
    total: usize,
    /// Optional timeout; `None` means the barrier never times out
    timeout: Option<Duration>,
    /// At most one outstanding timer, owned exclusively by the barrier
    timer: Option<JoinHandle<()>>,
    /// Whether `start` has run
    armed: bool,
    /// Terminal flag; set exactly once, never reset
    finished: bool,
    on_complete: Option<CompletionObserver>,
    /// Injected collaborator for asset checkpoints
    loader: Option<Arc<dyn ResourceLoader>>,
    /// Broadcasts the terminal payload to `wait` callers
    done_tx: watch::Sender<Option<Completion>>,
}

/// Everything that must leave the lock when the barrier finishes, so that
/// observers run with the lock released.
struct FinishOutcome {
    timer: Option<JoinHandle<()>>,
    callback: Option<CompletionObserver>,
    completion: Completion,
}

impl BarrierState {
    /// Register one identifier; returns false if it was already pending.
    fn register(&mut self, name: String) -> bool {
        if self.pending.iter().any(|n| n == &name) {
            return false;
        }
        debug!(name = %name, "checkpoint registered");
        self.pending.push(name);
        self.total += 1;
        true
    }

    /// Transition to the terminal state. Caller must have checked `finished`.
    fn finish(&mut self, reason: CompletionReason) -> FinishOutcome {
        self.finished = true;
        self.pending.clear();
        let completion = Completion { reason };
        self.done_tx.send_replace(Some(completion));
        FinishOutcome {
            timer: self.timer.take(),
            callback: self.on_complete.take(),
            completion,
        }
    }
}

/// A completion barrier over a dynamic set of named checkpoints.
///
/// Register checkpoints with [`add_checkpoints`](Self::add_checkpoints) (or
/// [`add_assets`](Self::add_assets) for fetch-backed ones), arm the optional
/// timeout with [`start`](Self::start), and report each resolved checkpoint
/// with [`mark_complete`](Self::mark_complete). The completion observer fires
/// exactly once, with reason `completed` when the pending set empties or
/// `timeout` when the clock expires first.
///
/// Handles are cheap clones of the same barrier. Mutators are chainable and
/// never return errors: unknown names, double starts and post-completion
/// mutations are silent no-ops by design.
///
/// `start` (with a timeout configured) and `add_assets` spawn tasks and must
/// run within a tokio runtime.
#[derive(Clone)]
pub struct Barrier {
    inner: Arc<Mutex<BarrierState>>,
    /// Progress observer lives outside the state lock: completions racing on
    /// different threads serialize on delivery instead of skipping it.
    progress: Arc<Mutex<Option<ProgressObserver>>>,
}

impl Barrier {
    /// Create a barrier that never times out.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a barrier that fires with reason `timeout` if checkpoints are
    /// still pending when `timeout` elapses after [`start`](Self::start).
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Self {
        let (done_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(Mutex::new(BarrierState {
                pending: Vec::new(),
                total: 0,
                timeout,
                timer: None,
                armed: false,
                finished: false,
                on_complete: None,
                loader: None,
                done_tx,
            })),
            progress: Arc::new(Mutex::new(None)),
        }
    }

    /// Lock poisoning cannot corrupt the terminal-flag discipline (observers
    /// run outside the state lock), so recover the guard instead of
    /// propagating.
    fn state(&self) -> MutexGuard<'_, BarrierState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn progress_slot(&self) -> MutexGuard<'_, Option<ProgressObserver>> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inject the resource loader used by [`add_assets`](Self::add_assets).
    pub fn set_loader(&self, loader: Arc<dyn ResourceLoader>) -> &Self {
        self.state().loader = Some(loader);
        self
    }

    /// Register a single checkpoint. Already-pending names are skipped.
    pub fn add_checkpoint(&self, name: impl Into<String>) -> &Self {
        self.add_checkpoints([name.into()])
    }

    /// Register one or more checkpoints, skipping duplicates.
    ///
    /// Legal before or after arming. After the barrier has finished this is a
    /// no-op: the barrier does not reactivate.
    pub fn add_checkpoints<I, S>(&self, names: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state();
        if state.finished {
            debug!("checkpoints added after completion; ignored");
            return self;
        }
        for name in names {
            state.register(name.into());
        }
        self
    }

    /// Register fetch-backed checkpoints.
    ///
    /// Each URI not already pending is registered as a checkpoint and fetched
    /// through the injected loader; fetch success marks the checkpoint
    /// complete. Fetch failure is logged and nothing else: the checkpoint
    /// stays pending and only resolves via the timeout path. In-flight
    /// fetches cannot be cancelled; a result arriving after completion finds
    /// its checkpoint gone and does nothing.
    pub fn add_assets<I, S>(&self, uris: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for uri in uris {
            let uri = uri.into();
            let loader = {
                let mut state = self.state();
                if state.finished {
                    debug!(uri = %uri, "asset added after completion; ignored");
                    continue;
                }
                if !state.register(uri.clone()) {
                    continue;
                }
                state.loader.clone()
            };

            let Some(loader) = loader else {
                warn!(
                    uri = %uri,
                    "no resource loader configured; checkpoint will only resolve via mark_complete or timeout"
                );
                continue;
            };

            let fetch = loader.fetch(&uri);
            let barrier = self.clone();
            tokio::spawn(async move {
                match fetch.await {
                    Ok(body) => {
                        debug!(uri = %uri, bytes = body.len(), "asset loaded");
                        barrier.mark_complete(&uri);
                    }
                    // Failure is deliberately not wired to the barrier.
                    Err(err) => warn!(uri = %uri, error = %err, "asset load failed"),
                }
            });
        }
        self
    }

    /// Arm the barrier: schedule the timeout timer, if one is configured.
    ///
    /// Idempotent; a second call never schedules a second timer.
    pub fn start(&self) -> &Self {
        let mut state = self.state();
        if state.finished || state.armed {
            debug!("barrier already started; ignored");
            return self;
        }
        state.armed = true;

        if let Some(timeout) = state.timeout {
            let barrier = self.clone();
            state.timer = Some(tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                barrier.finish(CompletionReason::TimedOut);
            }));
            debug!(timeout_ms = timeout.as_millis() as u64, "barrier armed");
        } else {
            debug!("barrier armed without timeout");
        }
        self
    }

    /// Mark a single checkpoint as complete.
    ///
    /// Unknown or already-completed names are ignored. When the last pending
    /// checkpoint resolves, the completion sequence runs with reason
    /// `completed` and any outstanding timer is cancelled.
    pub fn mark_complete(&self, name: &str) -> &Self {
        let (remaining, total, outcome) = {
            let mut state = self.state();
            if state.finished {
                debug!(name = %name, "mark_complete after completion; ignored");
                return self;
            }
            let Some(index) = state.pending.iter().position(|n| n == name) else {
                debug!(name = %name, "unknown or already completed checkpoint; ignored");
                return self;
            };
            state.pending.remove(index);

            let remaining = state.pending.len();
            let total = state.total;
            debug!(name = %name, remaining, total, "checkpoint complete");

            let outcome = (remaining == 0).then(|| state.finish(CompletionReason::Completed));
            (remaining, total, outcome)
        };

        // Progress delivery holds only the observer's own lock (the state
        // lock is already released): completions racing on different threads
        // queue up here and each report, none are skipped.
        if let Some(cb) = self.progress_slot().as_mut() {
            cb(name, remaining, total);
        }

        if let Some(outcome) = outcome {
            self.deliver(outcome);
        }
        self
    }

    /// Timer path into the completion sequence.
    fn finish(&self, reason: CompletionReason) {
        let outcome = {
            let mut state = self.state();
            if state.finished {
                debug!(reason = %reason, "barrier already finished; ignored");
                return;
            }
            state.finish(reason)
        };
        self.deliver(outcome);
    }

    fn deliver(&self, outcome: FinishOutcome) {
        // No progress signals after the terminal one.
        self.progress_slot().take();

        // The timeout path runs on the timer task itself; aborting that here
        // would cancel the callback below. Exhaustion is the only path with a
        // live timer to cancel.
        if outcome.completion.reason == CompletionReason::Completed {
            if let Some(timer) = outcome.timer {
                timer.abort();
            }
        }

        debug!(reason = %outcome.completion.reason, "barrier finished");
        if let Some(callback) = outcome.callback {
            callback(outcome.completion);
        }
    }

    /// Replace the progress observer. Ignored after completion.
    pub fn set_progress_observer<F>(&self, observer: F)
    where
        F: FnMut(&str, usize, usize) + Send + 'static,
    {
        if self.state().finished {
            debug!("progress observer set after completion; ignored");
            return;
        }
        *self.progress_slot() = Some(Box::new(observer));
    }

    /// Replace the completion observer. Ignored after completion (no replay).
    pub fn set_completion_observer<F>(&self, observer: F)
    where
        F: FnOnce(Completion) + Send + 'static,
    {
        let mut state = self.state();
        if state.finished {
            debug!("completion observer set after completion; ignored");
            return;
        }
        state.on_complete = Some(Box::new(observer));
    }

    /// Number of checkpoints still pending.
    pub fn pending(&self) -> usize {
        self.state().pending.len()
    }

    /// Pending checkpoint names, in registration order.
    pub fn pending_names(&self) -> Vec<String> {
        self.state().pending.clone()
    }

    /// Distinct checkpoints ever registered.
    pub fn total(&self) -> usize {
        self.state().total
    }

    /// Whether `start` has run.
    pub fn is_armed(&self) -> bool {
        self.state().armed
    }

    /// Whether the completion signal has fired.
    pub fn is_finished(&self) -> bool {
        self.state().finished
    }

    /// Wait for the barrier to finish.
    ///
    /// Resolves with the same terminal payload the completion observer
    /// received. Any number of waiters may subscribe; waiters arriving after
    /// completion resolve immediately.
    pub async fn wait(&self) -> Completion {
        let mut rx = self.state().done_tx.subscribe();
        let value = rx
            .wait_for(|c| c.is_some())
            .await
            .unwrap(); // safe: the sender lives in our own state
        (*value).unwrap() // safe: wait_for guarantees Some
    }
}

impl Default for Barrier {
    fn default() -> Self {
        Self::new()
    }
}
