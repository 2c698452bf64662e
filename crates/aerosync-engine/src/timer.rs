//! Deadline timers for pending setting changes.
//!
//! A timer never calls back into engine state directly. When it expires it
//! produces a [`TimerFired`] message that the owner of the registry feeds to
//! [`ComponentRegistry::fire_timer`](crate::ComponentRegistry::fire_timer) on
//! its own serialized context. Stale firings are recognised by handle
//! identity: every [`TimerHandle`] carries a process-unique generation, so a
//! firing that raced with a cancel can never resolve a newer update cycle.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::kind::ComponentKind;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Identity of one armed deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Allocate a fresh, never reused handle.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }

    /// The generation number backing this handle.
    #[must_use]
    pub fn generation(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Message produced when an armed deadline expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    /// Kind of the component whose setting armed the timer.
    pub kind: ComponentKind,
    /// Handle returned when the timer was armed.
    pub handle: TimerHandle,
}

/// Source of deadline timers for a device session.
pub trait TimerService {
    /// Arm a one-shot timer on behalf of a setting of `kind`.
    fn arm(&mut self, kind: ComponentKind, duration: Duration) -> TimerHandle;

    /// Cancel a previously armed timer. Cancelling an unknown or already
    /// fired handle is a no-op.
    fn cancel(&mut self, handle: TimerHandle);
}

#[derive(Debug, Clone, Copy)]
struct ArmedTimer {
    kind: ComponentKind,
    deadline: Duration,
}

/// Deterministic timers driven by an explicit virtual clock.
///
/// Hosts that own their event loop, and tests, call [`ManualTimers::advance`]
/// and feed the returned firings back into the registry.
#[derive(Debug, Default)]
pub struct ManualTimers {
    now: Duration,
    armed: BTreeMap<TimerHandle, ArmedTimer>,
}

impl ManualTimers {
    /// Create a timer source with its virtual clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the virtual clock forward and collect every timer that expired,
    /// ordered by deadline and then by arming order.
    pub fn advance(&mut self, by: Duration) -> Vec<TimerFired> {
        self.now = self.now.saturating_add(by);
        let now = self.now;

        let mut due: Vec<(Duration, TimerHandle, ComponentKind)> = self
            .armed
            .iter()
            .filter(|(_, timer)| timer.deadline <= now)
            .map(|(handle, timer)| (timer.deadline, *handle, timer.kind))
            .collect();
        due.sort_by_key(|(deadline, handle, _)| (*deadline, *handle));

        for (_, handle, _) in &due {
            self.armed.remove(handle);
        }

        due.into_iter()
            .map(|(_, handle, kind)| TimerFired { kind, handle })
            .collect()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Whether `handle` is still armed.
    #[must_use]
    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.armed.contains_key(&handle)
    }

    /// Number of armed timers.
    #[must_use]
    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }
}

impl TimerService for ManualTimers {
    fn arm(&mut self, kind: ComponentKind, duration: Duration) -> TimerHandle {
        let handle = TimerHandle::next();
        let deadline = self.now.saturating_add(duration);
        self.armed.insert(handle, ArmedTimer { kind, deadline });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.armed.remove(&handle);
    }
}

/// Timers backed by the tokio runtime.
///
/// Each armed timer is a task sleeping for the requested duration that then
/// posts a [`TimerFired`] message on the channel returned by
/// [`TokioTimers::new`]. Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioTimers {
    tx: mpsc::UnboundedSender<TimerFired>,
    tasks: HashMap<TimerHandle, JoinHandle<()>>,
}

impl TokioTimers {
    /// Create a timer source and the receiver its firings are delivered on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                tasks: HashMap::new(),
            },
            rx,
        )
    }

    /// Forget the task of a timer whose firing has been received.
    pub fn reap(&mut self, handle: TimerHandle) {
        self.tasks.remove(&handle);
    }

    /// Number of timers armed and not yet reaped or cancelled.
    #[must_use]
    pub fn armed_count(&self) -> usize {
        self.tasks.len()
    }
}

impl TimerService for TokioTimers {
    fn arm(&mut self, kind: ComponentKind, duration: Duration) -> TimerHandle {
        let handle = TimerHandle::next();
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if tx.send(TimerFired { kind, handle }).is_err() {
                tracing::trace!(%handle, "Timer fired after its session closed");
            }
        });
        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
