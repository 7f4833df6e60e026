//! Schema violation types
//!
//! Each violation renders as the reason shown to the editor whose save was
//! rejected. Violations are grouped by the part of the document they concern
//! so the submission path can map them onto its load error codes.

use thiserror::Error;

/// Part of the schema document a violation concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationScope {
    /// Top-level shape and keys
    Document,
    /// The `version` value
    Version,
    /// The `fields` list or one of its entries
    Fields,
    /// The `settings` block
    Settings,
}

/// First structural rule a candidate schema breaks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("Schema must be a JSON object.")]
    NotAnObject,

    #[error("Schema contains unsupported keys: {}.", .0.join(", "))]
    UnsupportedKeys(Vec<String>),

    #[error("Schema must include version and fields.")]
    MissingVersionOrFields,

    /// Carries the offending value rendered as text, or `unknown`
    #[error("Unsupported schema version: {0}.")]
    UnsupportedVersion(String),

    #[error("Schema fields must be an array.")]
    FieldsNotArray,

    #[error("Field at index {0} must be an object.")]
    FieldNotObject(usize),

    #[error("Field at index {index} is missing required keys: {}.", .keys.join(", "))]
    FieldMissingKeys { index: usize, keys: Vec<String> },

    #[error("Field at index {index} contains unsupported keys: {}.", .keys.join(", "))]
    FieldUnsupportedKeys { index: usize, keys: Vec<String> },

    #[error("Field at index {0} must include a non-empty id.")]
    FieldMissingId(usize),

    #[error("Field at index {index} reuses the id '{id}'.")]
    DuplicateFieldId { index: usize, id: String },

    #[error("Field at index {0} has an unsupported type.")]
    UnsupportedFieldType(usize),

    #[error("Field at index {0} must include a non-empty label.")]
    FieldMissingLabel(usize),

    #[error("Field at index {0} must include a boolean required flag.")]
    FieldRequiredNotBoolean(usize),

    #[error("Field at index {0} has invalid validation rules.")]
    InvalidValidationRules(usize),

    #[error("Field at index {index} has unsupported validation keys: {}.", .keys.join(", "))]
    UnsupportedValidationKeys { index: usize, keys: Vec<String> },

    #[error("Field at index {0} validation.required must be boolean.")]
    ValidationRequiredNotBoolean(usize),

    #[error("Field at index {index} validation.{key} must be int or null.")]
    ValidationLengthNotInteger { index: usize, key: &'static str },

    #[error("Field at index {0} meta must be an object.")]
    FieldMetaNotObject(usize),

    #[error("Schema settings must be an object.")]
    SettingsNotObject,

    #[error("Schema settings has unsupported keys: {}.", .0.join(", "))]
    UnsupportedSettingsKeys(Vec<String>),

    #[error("Schema settings.notifications must be an object.")]
    NotificationsNotObject,

    #[error("Schema settings.notifications has unsupported keys: {}.", .0.join(", "))]
    UnsupportedNotificationKeys(Vec<String>),

    #[error("Schema settings.notifications.enabled must be boolean.")]
    NotificationEnabledNotBoolean,

    #[error("Schema settings.notifications.{0} must be string.")]
    NotificationValueNotString(&'static str),
}

impl SchemaViolation {
    /// Human-readable reason surfaced to the editor
    pub fn reason(&self) -> String {
        self.to_string()
    }

    /// Returns the part of the document this violation concerns
    pub fn scope(&self) -> ViolationScope {
        use SchemaViolation::*;
        match self {
            NotAnObject | UnsupportedKeys(_) | MissingVersionOrFields => ViolationScope::Document,
            UnsupportedVersion(_) => ViolationScope::Version,
            SettingsNotObject
            | UnsupportedSettingsKeys(_)
            | NotificationsNotObject
            | UnsupportedNotificationKeys(_)
            | NotificationEnabledNotBoolean
            | NotificationValueNotString(_) => ViolationScope::Settings,
            _ => ViolationScope::Fields,
        }
    }

    /// Index of the offending field, when the violation concerns one
    pub fn field_index(&self) -> Option<usize> {
        use SchemaViolation::*;
        match self {
            FieldNotObject(i)
            | FieldMissingId(i)
            | UnsupportedFieldType(i)
            | FieldMissingLabel(i)
            | FieldRequiredNotBoolean(i)
            | InvalidValidationRules(i)
            | ValidationRequiredNotBoolean(i)
            | FieldMetaNotObject(i) => Some(*i),
            FieldMissingKeys { index, .. }
            | FieldUnsupportedKeys { index, .. }
            | DuplicateFieldId { index, .. }
            | UnsupportedValidationKeys { index, .. }
            | ValidationLengthNotInteger { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Result type for schema decoding
pub type SchemaResult<T> = Result<T, SchemaViolation>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons_list_offending_keys() {
        let err = SchemaViolation::UnsupportedKeys(vec!["extra".into(), "other".into()]);
        assert_eq!(err.reason(), "Schema contains unsupported keys: extra, other.");

        let err = SchemaViolation::FieldMissingKeys {
            index: 2,
            keys: vec!["label".into(), "required".into()],
        };
        assert_eq!(
            err.reason(),
            "Field at index 2 is missing required keys: label, required."
        );
    }

    #[test]
    fn test_length_reason_names_key() {
        let err = SchemaViolation::ValidationLengthNotInteger { index: 0, key: "max_length" };
        assert_eq!(err.reason(), "Field at index 0 validation.max_length must be int or null.");
    }

    #[test]
    fn test_scopes() {
        assert_eq!(SchemaViolation::NotAnObject.scope(), ViolationScope::Document);
        assert_eq!(
            SchemaViolation::UnsupportedVersion("2".into()).scope(),
            ViolationScope::Version
        );
        assert_eq!(SchemaViolation::FieldsNotArray.scope(), ViolationScope::Fields);
        assert_eq!(SchemaViolation::FieldMissingLabel(3).scope(), ViolationScope::Fields);
        assert_eq!(SchemaViolation::SettingsNotObject.scope(), ViolationScope::Settings);
    }

    #[test]
    fn test_field_index() {
        assert_eq!(SchemaViolation::FieldMissingId(4).field_index(), Some(4));
        assert_eq!(
            SchemaViolation::DuplicateFieldId { index: 1, id: "a".into() }.field_index(),
            Some(1)
        );
        assert_eq!(SchemaViolation::FieldsNotArray.field_index(), None);
    }
}
