//! Backend adapters.
//!
//! A backend pushes commands towards the device and reports whether the
//! command was accepted for sending. Peripherals hold one as
//! `Box<dyn Backend<TheirCommand>>` and call it from
//! [`Setting::request_change`](crate::Setting::request_change).
//!
//! Closures implement [`Backend`] directly:
//!
//! ```rust
//! use aerosync_engine::Backend;
//!
//! let mut sent = Vec::new();
//! let mut backend = |channel: u8| {
//!     sent.push(channel);
//!     channel != 13
//! };
//! assert!(backend.submit(6));
//! assert!(!backend.submit(13));
//! assert_eq!(sent, vec![6, 13]);
//! ```

/// Sink for device commands of type `C`.
pub trait Backend<C>: Send {
    /// Attempt to send `command`. Returns `false` when it was rejected.
    fn submit(&mut self, command: C) -> bool;
}

impl<C, F> Backend<C> for F
where
    F: FnMut(C) -> bool + Send,
{
    fn submit(&mut self, command: C) -> bool {
        self(command)
    }
}

/// Backend of a device whose link is not up. Rejects every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disconnected;

impl<C> Backend<C> for Disconnected {
    fn submit(&mut self, _command: C) -> bool {
        tracing::trace!("Command dropped, device link is down");
        false
    }
}
