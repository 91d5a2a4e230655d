//! Trailing-edge debouncing
//!
//! A [`Debounced`] wrapper delays its callable until a quiet period has
//! passed since the wrapper was last called. Calls that arrive while a
//! timer is pending cancel it and take its place, so only the most recent
//! arguments are ever delivered.
//!
//! Invariants:
//! - at most one timer is pending per wrapper
//! - the callable runs at most once per quiet period, with the arguments
//!   of the last call
//! - failures of the callable are reported, never propagated, and leave
//!   the wrapper ready for the next call

use crate::config::{DebounceConfig, MAX_DELAY_MS};
use crate::error::DebounceError;
use crate::report::{panic_message, FailureKind, FailureReporter, InvocationFailure, TracingReporter};
use crate::timer::{Timer, TimerHandle, TokioTimer};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, error, trace};

type Invoke<A> = Box<dyn Fn(A) -> Result<(), String> + Send + Sync>;

/// Debounce `callable` with the given quiet period
///
/// Timers run on the current tokio runtime and failures are logged
/// through `tracing`. Use [`Debounced::builder`] to pick another timer or
/// reporter.
pub fn debounce<A, F, E>(callable: F, delay: Duration) -> Result<Debounced<A>, DebounceError>
where
    A: Send + 'static,
    F: Fn(A) -> Result<(), E> + Send + Sync + 'static,
    E: fmt::Display,
{
    Debounced::builder(callable).delay(delay).build()
}

/// Counters describing a wrapper's history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceStats {
    /// Calls made to the wrapper
    pub calls: u64,
    /// Times the callable was invoked
    pub fires: u64,
    /// Calls discarded because a newer call replaced them
    pub superseded: u64,
    /// Invocations that returned an error or panicked
    pub failures: u64,
}

#[derive(Default)]
struct Counters {
    calls: AtomicU64,
    fires: AtomicU64,
    superseded: AtomicU64,
    failures: AtomicU64,
}

struct Pending<A> {
    generation: u64,
    handle: TimerHandle,
    args: A,
}

struct State<A> {
    /// Bumped on every call; a fire only proceeds if it matches the pending entry
    generation: u64,
    pending: Option<Pending<A>>,
    /// Invocations currently executing
    running: usize,
}

struct Shared<A> {
    label: String,
    delay: Duration,
    invoke: Invoke<A>,
    timer: Arc<dyn Timer>,
    reporter: Arc<dyn FailureReporter>,
    state: Mutex<State<A>>,
    counters: Counters,
    /// Signalled whenever an invocation finishes with nothing left pending
    settled: Notify,
}

/// A debounced wrapper around a callable
///
/// Cloning yields another handle to the same wrapper; all clones share
/// one pending timer.
pub struct Debounced<A> {
    shared: Arc<Shared<A>>,
}

impl<A> Clone for Debounced<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A> fmt::Debug for Debounced<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounced")
            .field("label", &self.shared.label)
            .field("delay", &self.shared.delay)
            .field("stats", &self.stats())
            .finish()
    }
}

impl<A: Send + 'static> Debounced<A> {
    /// Start building a wrapper around `callable`
    pub fn builder<F, E>(callable: F) -> DebounceBuilder<A>
    where
        F: Fn(A) -> Result<(), E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        DebounceBuilder::new(callable)
    }

    /// Trigger the wrapper
    ///
    /// Cancels any pending timer, records `args` as the arguments to
    /// deliver, and schedules a fresh timer. Never blocks on the callable
    /// and never fails.
    pub fn call(&self, args: A) {
        let shared = &self.shared;
        shared.counters.calls.fetch_add(1, Ordering::Relaxed);

        let mut state = shared.state.lock();
        state.generation += 1;
        let generation = state.generation;

        if let Some(previous) = state.pending.take() {
            shared.timer.cancel(previous.handle);
            shared.counters.superseded.fetch_add(1, Ordering::Relaxed);
            trace!(label = %shared.label, generation = previous.generation, "Superseded pending call");
        }

        // Schedule while holding the state lock: a timer that fires
        // immediately on another thread waits here until the pending
        // entry it belongs to has been recorded.
        let fire_target = Arc::clone(shared);
        let handle = shared
            .timer
            .schedule(shared.delay, Box::new(move || fire_target.fire(generation)));

        state.pending = Some(Pending {
            generation,
            handle,
            args,
        });
        debug!(label = %shared.label, delay = ?shared.delay, generation, "Scheduled debounced call");
    }
}

impl<A> Debounced<A> {
    /// Whether a timer is waiting to fire
    pub fn is_pending(&self) -> bool {
        self.shared.state.lock().pending.is_some()
    }

    /// Whether nothing is pending and no invocation is running
    pub fn is_settled(&self) -> bool {
        self.shared.state.lock().is_settled()
    }

    /// Wait until nothing is pending and no invocation is running
    ///
    /// Returns immediately if the wrapper is already settled. A call made
    /// while waiting extends the wait to cover its own fire.
    pub async fn settled(&self) {
        loop {
            let notified = self.shared.settled.notified();
            tokio::pin!(notified);
            // Register before checking so a fire finishing in between is not missed
            notified.as_mut().enable();

            if self.is_settled() {
                return;
            }
            notified.await;
        }
    }

    /// Snapshot of the wrapper's counters
    pub fn stats(&self) -> DebounceStats {
        let counters = &self.shared.counters;
        DebounceStats {
            calls: counters.calls.load(Ordering::Relaxed),
            fires: counters.fires.load(Ordering::Relaxed),
            superseded: counters.superseded.load(Ordering::Relaxed),
            failures: counters.failures.load(Ordering::Relaxed),
        }
    }

    /// Configured quiet period
    pub fn delay(&self) -> Duration {
        self.shared.delay
    }

    /// Label used in logs and failure reports
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Number of live handles to this wrapper, pending timers included
    #[cfg(test)]
    fn handle_count(&self) -> usize {
        Arc::strong_count(&self.shared)
    }
}

impl<A> State<A> {
    fn is_settled(&self) -> bool {
        self.pending.is_none() && self.running == 0
    }
}

/// Marks one invocation as running until dropped, even on unwind
struct RunningGuard<'a, A> {
    shared: &'a Shared<A>,
}

impl<A> Drop for RunningGuard<'_, A> {
    fn drop(&mut self) {
        let settled = {
            let mut state = self.shared.state.lock();
            state.running -= 1;
            state.is_settled()
        };
        if settled {
            self.shared.settled.notify_waiters();
        }
    }
}

impl<A: Send + 'static> Shared<A> {
    /// Timer callback: deliver the pending arguments if they are still current
    fn fire(&self, generation: u64) {
        let args = {
            let mut state = self.state.lock();
            match state.pending.take() {
                Some(pending) if pending.generation == generation => {
                    state.running += 1;
                    pending.args
                }
                other => {
                    // A newer call owns the pending slot; this timer lost a
                    // cancellation race and must not deliver anything.
                    state.pending = other;
                    trace!(label = %self.label, generation, "Ignoring stale timer");
                    return;
                }
            }
        };
        let _running = RunningGuard { shared: self };

        self.counters.fires.fetch_add(1, Ordering::Relaxed);
        debug!(label = %self.label, generation, "Invoking debounced callable");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.invoke)(args)));
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(msg)) => Some(FailureKind::Error(msg)),
            Err(payload) => Some(FailureKind::Panic(panic_message(payload.as_ref()))),
        };

        if let Some(kind) = failure {
            self.counters.failures.fetch_add(1, Ordering::Relaxed);
            let failure = InvocationFailure {
                label: self.label.clone(),
                kind,
            };
            let reported = panic::catch_unwind(AssertUnwindSafe(|| self.reporter.report(&failure)));
            if let Err(payload) = reported {
                error!(
                    label = %self.label,
                    panic = %panic_message(payload.as_ref()),
                    "Failure reporter panicked while reporting: {}",
                    failure
                );
            }
        }
    }
}

/// Builder for [`Debounced`]
pub struct DebounceBuilder<A> {
    invoke: Invoke<A>,
    delay: Duration,
    label: Option<String>,
    timer: Option<Arc<dyn Timer>>,
    reporter: Option<Arc<dyn FailureReporter>>,
}

impl<A: Send + 'static> DebounceBuilder<A> {
    fn new<F, E>(callable: F) -> Self
    where
        F: Fn(A) -> Result<(), E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self {
            invoke: Box::new(move |args| callable(args).map_err(|e| e.to_string())),
            delay: DebounceConfig::default().delay(),
            label: None,
            timer: None,
            reporter: None,
        }
    }

    /// Quiet period before the callable fires
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Name used in logs and failure reports (default: "debounce")
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Apply delay and label from a configuration section
    pub fn config(mut self, config: &DebounceConfig) -> Self {
        self.delay = config.delay();
        if let Some(label) = &config.label {
            self.label = Some(label.clone());
        }
        self
    }

    /// Timer backend (default: [`TokioTimer`] on the current runtime)
    pub fn timer<T: Timer + 'static>(mut self, timer: T) -> Self {
        self.timer = Some(Arc::new(timer));
        self
    }

    /// Failure reporter (default: [`TracingReporter`])
    pub fn reporter<R: FailureReporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    /// Validate settings and create the wrapper
    pub fn build(self) -> Result<Debounced<A>, DebounceError> {
        if self.delay > Duration::from_millis(MAX_DELAY_MS) {
            return Err(DebounceError::DelayTooLarge {
                millis: self.delay.as_millis(),
                max: MAX_DELAY_MS,
            });
        }

        let timer: Arc<dyn Timer> = match self.timer {
            Some(timer) => timer,
            None => Arc::new(TokioTimer::current()?),
        };

        Ok(Debounced {
            shared: Arc::new(Shared {
                label: self.label.unwrap_or_else(|| "debounce".to_string()),
                delay: self.delay,
                invoke: self.invoke,
                timer,
                reporter: self.reporter.unwrap_or_else(|| Arc::new(TracingReporter)),
                state: Mutex::new(State {
                    generation: 0,
                    pending: None,
                    running: 0,
                }),
                counters: Counters::default(),
                settled: Notify::new(),
            }),
        })
    }
}
