//! Submission validator
//!
//! Validation semantics:
//! - Schema load failures abort with one top-level error
//! - Every undeclared key is reported as unknown_field
//! - Fields are evaluated in schema order; each field reports at most one
//!   error
//! - Length limits apply to the sanitized value, counted in code points
//! - Passing fields are returned even when others fail
//!
//! The validator never mutates its inputs and holds no state, so identical
//! inputs always produce identical results.

use indexmap::IndexMap;
use serde_json::Value;

use super::payload::SubmissionPayload;
use super::result::{ErrorCode, FieldError, ValidationResult};
use super::sanitize::{is_email, sanitize_for};
use crate::schema::decode::{coerce_version, decode_fields, scalar_to_string};
use crate::schema::{FieldDefinition, FieldType, SchemaDocument, SCHEMA_VERSION};

/// Validates submissions against stored form schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmissionValidator;

impl SubmissionValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates against schema text as persisted by the store.
    ///
    /// Absent, empty, undecodable or non-object text is `schema_missing`.
    pub fn validate_raw(&self, raw_schema: Option<&str>, submission: &SubmissionPayload) -> ValidationResult {
        let raw = match raw_schema {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return ValidationResult::schema_failure(ErrorCode::SchemaMissing),
        };

        match serde_json::from_str::<Value>(raw) {
            Ok(schema) => self.validate_value(&schema, submission),
            Err(_) => ValidationResult::schema_failure(ErrorCode::SchemaMissing),
        }
    }

    /// Validates against an already decoded JSON schema.
    pub fn validate_value(&self, schema: &Value, submission: &SubmissionPayload) -> ValidationResult {
        match load_schema(schema) {
            Ok(fields) => evaluate(&fields, submission),
            Err(code) => ValidationResult::schema_failure(code),
        }
    }

    /// Validates against a typed schema.
    pub fn validate(&self, schema: &SchemaDocument, submission: &SubmissionPayload) -> ValidationResult {
        if schema.version != SCHEMA_VERSION {
            return ValidationResult::schema_failure(ErrorCode::SchemaVersion);
        }
        evaluate(&schema.fields, submission)
    }
}

/// Extracts the field list, mapping load failures to their error code.
///
/// Top-level keys other than version/fields and the settings block are
/// not inspected here; they were policed when the schema was saved.
fn load_schema(schema: &Value) -> Result<Vec<FieldDefinition>, ErrorCode> {
    let obj = schema.as_object().ok_or(ErrorCode::SchemaMissing)?;

    let version = obj
        .get("version")
        .filter(|v| !v.is_null())
        .ok_or(ErrorCode::SchemaVersion)?;
    if coerce_version(version) != Some(SCHEMA_VERSION) {
        return Err(ErrorCode::SchemaVersion);
    }

    let fields = obj.get("fields").ok_or(ErrorCode::SchemaFields)?;
    decode_fields(fields).map_err(|_| ErrorCode::SchemaFields)
}

fn evaluate(fields: &[FieldDefinition], submission: &SubmissionPayload) -> ValidationResult {
    let submission = submission.normalized();
    let mut errors = Vec::new();
    let mut data = IndexMap::new();

    for key in submission.keys() {
        if !fields.iter().any(|f| &f.id == key) {
            errors.push(FieldError::field(key.clone(), ErrorCode::UnknownField));
        }
    }

    for field in fields {
        match check_field(field, submission.get(&field.id)) {
            FieldOutcome::Accepted(value) => {
                data.insert(field.id.clone(), value);
            }
            FieldOutcome::Rejected(code) => errors.push(FieldError::field(field.id.clone(), code)),
            FieldOutcome::Skipped => {}
        }
    }

    ValidationResult::from_parts(data, errors)
}

enum FieldOutcome {
    Accepted(String),
    Rejected(ErrorCode),
    Skipped,
}

fn check_field(field: &FieldDefinition, value: Option<&Value>) -> FieldOutcome {
    let value = match value {
        Some(value) if !is_empty_value(value) => value,
        _ if field.is_required() => return FieldOutcome::Rejected(ErrorCode::Required),
        _ => return FieldOutcome::Skipped,
    };

    let Some(raw) = scalar_to_string(value) else {
        return FieldOutcome::Rejected(ErrorCode::InvalidType);
    };

    let sanitized = sanitize_for(field.field_type, &raw);
    // A non-empty address that sanitizes away entirely is not an address.
    if field.field_type == FieldType::Email && (sanitized.is_empty() || !is_email(&sanitized)) {
        return FieldOutcome::Rejected(ErrorCode::InvalidEmail);
    }

    let length = sanitized.chars().count() as i64;
    if field.min_length().is_some_and(|min| length < min) {
        return FieldOutcome::Rejected(ErrorCode::MinLength);
    }
    if field.max_length().is_some_and(|max| length > max) {
        return FieldOutcome::Rejected(ErrorCode::MaxLength);
    }

    FieldOutcome::Accepted(sanitized)
}

/// Null and whitespace-only strings count as not submitted.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
