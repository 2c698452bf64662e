//! Recording command backend.

use std::sync::Arc;

use aerosync_engine::Backend;
use parking_lot::Mutex;

/// A [`Backend`] that records every command it is handed.
///
/// Clones share the same log, so a test keeps one clone and gives the other
/// to the peripheral under test.
///
/// ```rust
/// use aerosync_engine::Backend;
/// use aerosync_test_helpers::backend::CommandLog;
///
/// let log = CommandLog::new();
/// let mut backend = log.clone();
/// assert!(backend.submit(7u8));
/// log.set_accepting(false);
/// assert!(!backend.submit(8u8));
/// assert_eq!(log.commands(), vec![7, 8]);
/// ```
#[derive(Debug)]
pub struct CommandLog<C> {
    inner: Arc<Mutex<LogState<C>>>,
}

#[derive(Debug)]
struct LogState<C> {
    commands: Vec<C>,
    accepting: bool,
}

impl<C> CommandLog<C> {
    /// Create an empty log that accepts every command.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(LogState {
                commands: Vec::new(),
                accepting: true,
            })),
        }
    }

    /// Create an empty log that rejects every command.
    pub fn rejecting() -> Self {
        let log = Self::new();
        log.set_accepting(false);
        log
    }

    /// Choose whether later submissions are accepted. Rejected commands are
    /// still recorded.
    pub fn set_accepting(&self, accepting: bool) {
        self.inner.lock().accepting = accepting;
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.inner.lock().commands.len()
    }

    /// Whether nothing was submitted.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().commands.is_empty()
    }

    /// Remove and return the recorded commands.
    pub fn take(&self) -> Vec<C> {
        std::mem::take(&mut self.inner.lock().commands)
    }
}

impl<C: Clone> CommandLog<C> {
    /// Snapshot of the recorded commands.
    pub fn commands(&self) -> Vec<C> {
        self.inner.lock().commands.clone()
    }

    /// Most recently recorded command.
    pub fn last(&self) -> Option<C> {
        self.inner.lock().commands.last().cloned()
    }
}

impl<C> Clone for CommandLog<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> Default for CommandLog<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Send> Backend<C> for CommandLog<C> {
    fn submit(&mut self, command: C) -> bool {
        let mut state = self.inner.lock();
        state.commands.push(command);
        state.accepting
    }
}
