//! Timer backends
//!
//! A [`Timer`] runs a callback once after a delay, unless the timer is
//! cancelled first. Two backends are provided:
//! - [`TokioTimer`]: one spawned task per timer, cancelled by abort
//! - [`ManualTimer`]: a virtual clock advanced explicitly by the host

use crate::error::DebounceError;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Callback run when a timer fires
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Opaque handle identifying a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Scheduling facility consumed by the debouncer
///
/// Contract:
/// - a cancelled timer never runs its callback
/// - a timer that is not cancelled runs its callback exactly once, no
///   earlier than `delay` after scheduling (best effort, not real-time)
/// - cancelling an unknown or already-fired handle is a no-op
pub trait Timer: Send + Sync {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;
    fn cancel(&self, handle: TimerHandle);
}

/// Timer backed by tokio tasks
#[derive(Clone)]
pub struct TokioTimer {
    runtime: Handle,
    next_id: Arc<AtomicU64>,
    tasks: Arc<Mutex<HashMap<u64, JoinHandle<()>>>>,
}

impl TokioTimer {
    /// Create a timer on the tokio runtime of the calling thread
    pub fn current() -> Result<Self, DebounceError> {
        let runtime = Handle::try_current().map_err(|_| DebounceError::NoRuntime)?;
        Ok(Self::with_handle(runtime))
    }

    /// Create a timer that spawns onto the given runtime
    ///
    /// Use this when scheduling from threads outside the runtime.
    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: Arc::new(AtomicU64::new(1)),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of timers scheduled but not yet fired or cancelled
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }
}

impl Timer for TokioTimer {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let tasks = Arc::clone(&self.tasks);

        // Hold the table lock across the spawn so a zero-delay task cannot
        // remove its entry before it has been inserted.
        let mut table = self.tasks.lock();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if tasks.lock().remove(&id).is_some() {
                callback();
            }
        });
        table.insert(id, task);

        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(task) = self.tasks.lock().remove(&handle.0) {
            task.abort();
        }
    }
}

/// Deterministic timer driven by a virtual clock
///
/// Nothing fires until [`ManualTimer::advance`] is called. Clones share
/// the same clock and queue.
#[derive(Clone, Default)]
pub struct ManualTimer {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Default)]
struct ManualState {
    /// Virtual time elapsed since creation
    now: Duration,
    next_id: u64,
    /// (deadline, id) -> callback; ids increase, so ties fire in scheduling order
    queue: BTreeMap<(Duration, u64), TimerCallback>,
    /// id -> deadline, for cancellation
    deadlines: HashMap<u64, Duration>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.inner.lock().now
    }

    /// Number of timers waiting to fire
    pub fn pending(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Move the clock forward by `by`, firing every timer that falls due
    ///
    /// Timers fire in deadline order, with the clock set to each deadline
    /// while its callback runs. Timers scheduled by a callback fire in the
    /// same call if their deadline is within the window. Returns the number
    /// of callbacks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.inner.lock().now + by;
        let mut fired = 0;

        loop {
            let callback = {
                let mut state = self.inner.lock();
                let due = match state.queue.keys().next() {
                    Some(&(deadline, id)) if deadline <= target => (deadline, id),
                    _ => break,
                };
                state.deadlines.remove(&due.1);
                state.now = due.0;
                state.queue.remove(&due)
            };

            // Run without the lock so callbacks can schedule and cancel.
            if let Some(callback) = callback {
                callback();
                fired += 1;
            }
        }

        self.inner.lock().now = target;
        fired
    }
}

impl Timer for ManualTimer {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let mut state = self.inner.lock();
        state.next_id += 1;
        let id = state.next_id;
        let deadline = state.now + delay;
        state.queue.insert((deadline, id), callback);
        state.deadlines.insert(id, deadline);
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        let mut state = self.inner.lock();
        if let Some(deadline) = state.deadlines.remove(&handle.0) {
            state.queue.remove(&(deadline, handle.0));
        }
    }
}
