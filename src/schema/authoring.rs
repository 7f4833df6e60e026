//! Authoring-time schema validation
//!
//! Runs when an editor saves a form. The first violated rule wins and its
//! reason is returned; nothing is persisted on failure.
//!
//! Check order:
//! 1. Top-level keys limited to version/fields/settings
//! 2. version and fields present
//! 3. version reads as 1
//! 4. fields is a list
//! 5. each field, in order
//! 6. settings block

use serde_json::Value;

use super::decode::{decode_fields, decode_settings, decode_version, unknown_keys};
use super::errors::{SchemaResult, SchemaViolation};
use super::types::{SchemaDocument, ALLOWED_SCHEMA_KEYS};

/// Structural validator for candidate schemas.
///
/// Stateless; one instance can serve any number of saves.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaAuthoringValidator;

impl SchemaAuthoringValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates a candidate schema and returns its typed form.
    ///
    /// # Errors
    ///
    /// Returns the first `SchemaViolation` found; its `Display` output is
    /// the reason shown to the editor.
    pub fn validate(&self, schema: &Value) -> SchemaResult<SchemaDocument> {
        let obj = schema.as_object().ok_or(SchemaViolation::NotAnObject)?;

        let unsupported = unknown_keys(obj, &ALLOWED_SCHEMA_KEYS);
        if !unsupported.is_empty() {
            return Err(SchemaViolation::UnsupportedKeys(unsupported));
        }

        let (version, fields) = match (obj.get("version"), obj.get("fields")) {
            (Some(version), Some(fields)) => (version, fields),
            _ => return Err(SchemaViolation::MissingVersionOrFields),
        };

        let version = decode_version(version)?;
        let fields = decode_fields(fields)?;

        let settings = match obj.get("settings") {
            Some(settings) => Some(decode_settings(settings)?),
            None => None,
        };

        Ok(SchemaDocument {
            version,
            fields,
            settings,
        })
    }

    /// Pass/fail form of [`validate`](Self::validate) that keeps only the reason.
    pub fn check(&self, schema: &Value) -> Result<(), String> {
        self.validate(schema).map(|_| ()).map_err(|e| e.reason())
    }
}
