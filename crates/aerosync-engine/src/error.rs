//! Error types for the synchronization engine.
//!
//! Setting operations themselves are total and never fail: rejections,
//! clamping and stale confirmations are reported through plain return values.
//! The errors here cover the API surface around them (registry lookups,
//! typed access, the session mailbox and configuration).

use thiserror::Error;

use crate::kind::ComponentKind;

/// Errors that can occur when addressing components or the device session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// No component is currently published under this kind.
    #[error("Component not published: {0}")]
    ComponentNotPublished(ComponentKind),

    /// A component is published under this kind but has a different type.
    #[error("Component {kind} is not a {expected}")]
    ComponentTypeMismatch {
        /// The kind that was addressed.
        kind: ComponentKind,
        /// The Rust type the caller asked for.
        expected: &'static str,
    },

    /// A component is already published under this kind.
    #[error("Component already published: {0}")]
    AlreadyPublished(ComponentKind),

    /// The device session has shut down and no longer accepts commands.
    #[error("Device session is closed")]
    SessionClosed,

    /// The device session mailbox is full.
    #[error("Device session mailbox is full")]
    MailboxFull,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SyncError {
    /// Create a component not published error.
    #[must_use]
    pub fn not_published(kind: ComponentKind) -> Self {
        Self::ComponentNotPublished(kind)
    }

    /// Create a type mismatch error for the requested component type.
    #[must_use]
    pub fn type_mismatch<C>(kind: ComponentKind) -> Self {
        Self::ComponentTypeMismatch {
            kind,
            expected: std::any::type_name::<C>(),
        }
    }

    /// Create an already published error.
    #[must_use]
    pub fn already_published(kind: ComponentKind) -> Self {
        Self::AlreadyPublished(kind)
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Whether retrying the operation later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ComponentNotPublished(_) | Self::MailboxFull)
    }
}

/// A specialized `Result` type for engine operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
