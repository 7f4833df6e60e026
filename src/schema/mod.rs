//! Form schema subsystem
//!
//! A schema is a versioned JSON document declaring a form's fields and
//! notification settings. Untyped JSON is decoded into [`SchemaDocument`] in
//! a single pass; both the authoring validator and the submission validator
//! go through the same decode so that anything accepted at save time loads
//! cleanly at submit time.
//!
//! # Design Principles
//!
//! - Closed set of field types
//! - No unknown keys at any level
//! - No truthy coercion for flags
//! - First violation wins, reported with the field index

pub mod decode;
mod authoring;
mod errors;
mod types;

pub use authoring::SchemaAuthoringValidator;
pub use errors::{SchemaResult, SchemaViolation, ViolationScope};
pub use types::{
    FieldDefinition, FieldType, NotificationConfig, SchemaDocument, Settings, ValidationRules,
    ALLOWED_FIELD_KEYS, ALLOWED_NOTIFICATION_KEYS, ALLOWED_SCHEMA_KEYS, ALLOWED_SETTINGS_KEYS,
    ALLOWED_VALIDATION_KEYS, REQUIRED_FIELD_KEYS, SCHEMA_VERSION,
};
