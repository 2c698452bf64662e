//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use aerosync_test_helpers::prelude::*;
//! ```

pub use crate::backend::CommandLog;
pub use crate::harness::{ManualHarness, NotificationCounter};
pub use crate::must::{must, must_some, must_with};
pub use crate::{assert_approx_eq, assert_synced, assert_updating};

#[cfg(feature = "async")]
pub use crate::must::must_async;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
