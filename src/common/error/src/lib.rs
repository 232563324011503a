//! Error types and result aliases for sift.
//!
//! Errors are split by [`ErrorCategory`] so that front ends can report
//! query mistakes as ordinary compile errors and treat engine defects separately.

mod error;

pub use error::{ErrorCategory, SiftError, SiftResult};
