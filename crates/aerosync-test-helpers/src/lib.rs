//! Shared test utilities for aerosync.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`assertions`] - Assertion macros for synchronized settings
//! - [`backend`] - Recording command backend
//! - [`harness`] - Registry on a manual clock with notification counting
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! aerosync-test-helpers = { path = "crates/aerosync-test-helpers" }
//! ```
//!
//! ```rust,ignore
//! use aerosync_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]

pub mod assertions;
pub mod backend;
pub mod harness;
pub mod must;
pub mod prelude;

pub use must::*;
