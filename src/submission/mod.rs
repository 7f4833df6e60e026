//! Submission subsystem
//!
//! Loads a stored schema, then validates, sanitizes and normalizes an
//! end-user submission against it. Failures are always returned as data in
//! a [`ValidationResult`]; nothing in this module panics or returns `Err`
//! for malformed input.

mod payload;
mod result;
pub mod sanitize;
mod validator;

pub use payload::SubmissionPayload;
pub use result::{ErrorCode, FieldError, ValidationResult};
pub use validator::SubmissionValidator;
