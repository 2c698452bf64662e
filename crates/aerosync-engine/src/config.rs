//! Device session configuration.

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Configuration of a [`DeviceSession`](crate::DeviceSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the device, used in log output.
    pub name: String,
    /// Capacity of the command mailbox.
    pub mailbox_capacity: usize,
    /// Whether losing the link promotes every pending setting.
    ///
    /// When disabled, pending settings keep waiting for their deadline and
    /// roll back when it fires.
    pub promote_pending_on_link_loss: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: String::from("device"),
            mailbox_capacity: 64,
            promote_pending_on_link_loss: true,
        }
    }
}

impl SessionConfig {
    /// Start from the defaults.
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Check that the configuration can be used to start a session.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfiguration`] if the mailbox capacity is
    /// zero or the name is blank.
    pub fn validate(&self) -> SyncResult<()> {
        if self.mailbox_capacity == 0 {
            return Err(SyncError::invalid_configuration(
                "mailbox_capacity must be greater than 0",
            ));
        }
        if self.name.trim().is_empty() {
            return Err(SyncError::invalid_configuration("name must not be empty"));
        }
        Ok(())
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Set the device name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the command mailbox capacity.
    #[must_use]
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.config.mailbox_capacity = capacity;
        self
    }

    /// Choose what link loss does to pending settings.
    #[must_use]
    pub fn promote_pending_on_link_loss(mut self, promote: bool) -> Self {
        self.config.promote_pending_on_link_loss = promote;
        self
    }

    /// Validate and return the configuration.
    ///
    /// # Errors
    ///
    /// See [`SessionConfig::validate`].
    pub fn build(self) -> SyncResult<SessionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
