//! formgate - form schema and submission validation engine
//!
//! Forms are defined by a versioned JSON schema. Submissions are validated,
//! sanitized and normalized against it before they are stored and before a
//! notification is sent.

pub mod cli;
pub mod config;
pub mod forms;
pub mod notification;
pub mod observability;
pub mod schema;
pub mod store;
pub mod submission;
