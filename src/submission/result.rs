//! Submission validation results
//!
//! Error codes:
//! - schema_missing, schema_version, schema_fields (top-level, field = null)
//! - unknown_field, required, invalid_type, invalid_email, min_length,
//!   max_length (per field)

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Stored schema absent or not decodable
    SchemaMissing,
    /// Stored schema has an unsupported version
    SchemaVersion,
    /// Stored schema's field list is malformed
    SchemaFields,
    /// Submitted key not declared by the schema
    UnknownField,
    /// Mandatory field missing or blank
    Required,
    /// Value is not a scalar
    InvalidType,
    /// Email field fails syntax check
    InvalidEmail,
    /// Value shorter than min_length
    MinLength,
    /// Value longer than max_length
    MaxLength,
}

impl ErrorCode {
    /// Returns the wire code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SchemaMissing => "schema_missing",
            ErrorCode::SchemaVersion => "schema_version",
            ErrorCode::SchemaFields => "schema_fields",
            ErrorCode::UnknownField => "unknown_field",
            ErrorCode::Required => "required",
            ErrorCode::InvalidType => "invalid_type",
            ErrorCode::InvalidEmail => "invalid_email",
            ErrorCode::MinLength => "min_length",
            ErrorCode::MaxLength => "max_length",
        }
    }

    /// Fixed English message attached to every error of this code
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::SchemaMissing => "Form schema could not be loaded.",
            ErrorCode::SchemaVersion => "Unsupported form schema version.",
            ErrorCode::SchemaFields => "Form schema fields are invalid.",
            ErrorCode::UnknownField => "Field is not part of the form schema.",
            ErrorCode::Required => "Field is required.",
            ErrorCode::InvalidType => "Field value must be a string.",
            ErrorCode::InvalidEmail => "Email address is invalid.",
            ErrorCode::MinLength => "Field value is too short.",
            ErrorCode::MaxLength => "Field value is too long.",
        }
    }

    /// Whether the code reports a schema load failure rather than a field
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::SchemaMissing | ErrorCode::SchemaVersion | ErrorCode::SchemaFields
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field id, or `None` for schema-level failures
    pub field: Option<String>,
    pub code: ErrorCode,
    pub message: String,
}

impl FieldError {
    /// Error against a specific field
    pub fn field(field: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            field: Some(field.into()),
            code,
            message: code.message().to_string(),
        }
    }

    /// Schema-level error
    pub fn schema(code: ErrorCode) -> Self {
        Self {
            field: None,
            code,
            message: code.message().to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{} [{}]: {}", field, self.code, self.message),
            None => write!(f, "[{}]: {}", self.code, self.message),
        }
    }
}

/// Outcome of validating one submission.
///
/// `data` holds every field that passed, in schema order, even when other
/// fields failed, so a retry form can be pre-filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    is_valid: bool,
    data: IndexMap<String, String>,
    errors: Vec<FieldError>,
}

impl ValidationResult {
    pub(crate) fn from_parts(data: IndexMap<String, String>, errors: Vec<FieldError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            data,
            errors,
        }
    }

    /// Failure with a single schema-level error and no data
    pub(crate) fn schema_failure(code: ErrorCode) -> Self {
        Self::from_parts(IndexMap::new(), vec![FieldError::schema(code)])
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Sanitized values keyed by field id
    pub fn data(&self) -> &IndexMap<String, String> {
        &self.data
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Errors reported against `field`
    pub fn errors_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors
            .iter()
            .filter(move |e| e.field.as_deref() == Some(field))
    }

    /// Whether any error carries `code`
    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn into_parts(self) -> (bool, IndexMap<String, String>, Vec<FieldError>) {
        (self.is_valid, self.data, self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_wire_names() {
        for code in [
            ErrorCode::SchemaMissing,
            ErrorCode::SchemaVersion,
            ErrorCode::SchemaFields,
            ErrorCode::UnknownField,
            ErrorCode::Required,
            ErrorCode::InvalidType,
            ErrorCode::InvalidEmail,
            ErrorCode::MinLength,
            ErrorCode::MaxLength,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
    }

    #[test]
    fn test_validity_follows_errors() {
        let ok = ValidationResult::from_parts(IndexMap::new(), Vec::new());
        assert!(ok.is_valid());

        let failed = ValidationResult::schema_failure(ErrorCode::SchemaMissing);
        assert!(!failed.is_valid());
        assert!(failed.data().is_empty());
        assert_eq!(failed.errors()[0].field, None);
        assert!(failed.errors()[0].code.is_schema_error());
    }

    #[test]
    fn test_serialized_shape() {
        let mut data = IndexMap::new();
        data.insert("name".to_string(), "Alice".to_string());
        let result = ValidationResult::from_parts(
            data,
            vec![FieldError::field("ghost", ErrorCode::UnknownField)],
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["is_valid"], false);
        assert_eq!(json["data"]["name"], "Alice");
        assert_eq!(json["errors"][0]["field"], "ghost");
        assert_eq!(json["errors"][0]["code"], "unknown_field");
        assert_eq!(json["errors"][0]["message"], "Field is not part of the form schema.");
    }
}
