//! Reference-counted live resources.
//!
//! Some components front an open external resource (a video stream, a media
//! download) that should stay open exactly as long as someone is interested
//! in it. A [`LiveResource`] hands out [`ResourceGuard`]s; when the last guard
//! is dropped the teardown runs, once. Guards can be attached to a
//! subscription so that dropping the last subscription closes the resource.

use std::sync::Arc;

use parking_lot::Mutex;

type Teardown = Box<dyn FnOnce() + Send>;

struct ResourceState {
    refs: usize,
    closed: bool,
    teardown: Option<Teardown>,
}

struct ResourceInner {
    name: String,
    state: Mutex<ResourceState>,
}

/// Handle to a resource that is torn down when its last guard is released.
#[derive(Clone)]
pub struct LiveResource {
    inner: Arc<ResourceInner>,
}

impl LiveResource {
    /// Create an open resource with no guards yet.
    pub fn new(name: impl Into<String>, teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(ResourceInner {
                name: name.into(),
                state: Mutex::new(ResourceState {
                    refs: 0,
                    closed: false,
                    teardown: Some(Box::new(teardown)),
                }),
            }),
        }
    }

    /// Take a reference on the resource. Returns `None` once it was torn down.
    #[must_use]
    pub fn acquire(&self) -> Option<ResourceGuard> {
        let mut state = self.inner.state.lock();
        if state.closed {
            return None;
        }
        state.refs = state.refs.saturating_add(1);
        Some(ResourceGuard {
            inner: Arc::clone(&self.inner),
        })
    }

    /// Name used in log output.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of outstanding guards.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        self.inner.state.lock().refs
    }

    /// Whether the teardown has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }
}

impl std::fmt::Debug for LiveResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("LiveResource")
            .field("name", &self.inner.name)
            .field("refs", &state.refs)
            .field("closed", &state.closed)
            .finish()
    }
}

/// One reference on a [`LiveResource`].
pub struct ResourceGuard {
    inner: Arc<ResourceInner>,
}

impl Clone for ResourceGuard {
    fn clone(&self) -> Self {
        let mut state = self.inner.state.lock();
        state.refs = state.refs.saturating_add(1);
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        let teardown = {
            let mut state = self.inner.state.lock();
            state.refs = state.refs.saturating_sub(1);
            if state.refs == 0 && !state.closed {
                state.closed = true;
                state.teardown.take()
            } else {
                None
            }
        };

        if let Some(teardown) = teardown {
            tracing::info!(resource = %self.inner.name, "Last reference released, tearing down");
            teardown();
        }
    }
}

impl std::fmt::Debug for ResourceGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceGuard")
            .field("resource", &self.inner.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted(name: &str) -> (LiveResource, Arc<AtomicUsize>) {
        let closed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&closed);
        let resource = LiveResource::new(name, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (resource, closed)
    }

    #[test]
    fn test_teardown_runs_at_zero_once() -> Result<(), &'static str> {
        let (resource, closed) = counted("stream");
        let first = resource.acquire().ok_or("open resource")?;
        let second = first.clone();
        assert_eq!(resource.ref_count(), 2);

        drop(first);
        assert_eq!(closed.load(Ordering::SeqCst), 0);
        assert!(!resource.is_closed());

        drop(second);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert!(resource.is_closed());
        Ok(())
    }

    #[test]
    fn test_closed_resource_cannot_be_reacquired() -> Result<(), &'static str> {
        let (resource, closed) = counted("download");
        drop(resource.acquire().ok_or("open resource")?);
        assert!(resource.acquire().is_none());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn test_unacquired_resource_stays_open() {
        let (resource, closed) = counted("idle");
        assert!(!resource.is_closed());
        assert_eq!(resource.ref_count(), 0);
        assert_eq!(closed.load(Ordering::SeqCst), 0);
    }
}
