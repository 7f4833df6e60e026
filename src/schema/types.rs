//! Form schema type definitions
//!
//! Supported field types:
//! - text: single-line text
//! - email: email address
//! - textarea: multi-line text

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The only schema version this engine understands.
pub const SCHEMA_VERSION: i64 = 1;

/// Keys permitted at the top level of a schema document.
pub const ALLOWED_SCHEMA_KEYS: [&str; 3] = ["version", "fields", "settings"];

/// Keys every field definition must carry.
pub const REQUIRED_FIELD_KEYS: [&str; 4] = ["id", "type", "label", "required"];

/// Keys a field definition may carry.
pub const ALLOWED_FIELD_KEYS: [&str; 6] = ["id", "type", "label", "required", "validation", "meta"];

/// Keys permitted inside a field's `validation` object.
pub const ALLOWED_VALIDATION_KEYS: [&str; 3] = ["required", "min_length", "max_length"];

/// Keys permitted inside `settings`.
pub const ALLOWED_SETTINGS_KEYS: [&str; 1] = ["notifications"];

/// Keys permitted inside `settings.notifications`.
pub const ALLOWED_NOTIFICATION_KEYS: [&str; 4] = ["enabled", "to", "subject", "message"];

/// Closed set of field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line text
    Text,
    /// Email address
    Email,
    /// Multi-line text
    Textarea,
}

impl FieldType {
    /// All supported types in wire order.
    pub fn all() -> &'static [FieldType] {
        &[FieldType::Text, FieldType::Email, FieldType::Textarea]
    }

    /// Returns the wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Textarea => "textarea",
        }
    }

    /// Decodes a wire name. Matching is exact and case-sensitive.
    pub fn parse(name: &str) -> Option<FieldType> {
        FieldType::all().iter().copied().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field validation rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
}

/// One entry of a schema's field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Submission key and placeholder name
    pub id: String,
    /// Field type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Human-readable label
    pub label: String,
    /// Whether a value must be submitted
    pub required: bool,
    /// Optional length and requirement rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
    /// Free-form editor metadata, never interpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl FieldDefinition {
    /// Create a field without validation rules or metadata
    pub fn new(
        id: impl Into<String>,
        field_type: FieldType,
        label: impl Into<String>,
        required: bool,
    ) -> Self {
        Self {
            id: id.into(),
            field_type,
            label: label.into(),
            required,
            validation: None,
            meta: None,
        }
    }

    /// Attach validation rules
    pub fn with_validation(mut self, rules: ValidationRules) -> Self {
        self.validation = Some(rules);
        self
    }

    /// A field is mandatory when either the top-level flag or
    /// `validation.required` is set.
    pub fn is_required(&self) -> bool {
        self.required
            || self
                .validation
                .as_ref()
                .and_then(|v| v.required)
                .unwrap_or(false)
    }

    pub fn min_length(&self) -> Option<i64> {
        self.validation.as_ref().and_then(|v| v.min_length)
    }

    pub fn max_length(&self) -> Option<i64> {
        self.validation.as_ref().and_then(|v| v.max_length)
    }
}

/// Notification settings attached to a form.
///
/// Absent keys decode to `false` / empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

/// The `settings` block of a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationConfig>,
}

/// A decoded, structurally valid form schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub version: i64,
    pub fields: Vec<FieldDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl SchemaDocument {
    /// Create a version 1 schema with the given fields
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            fields,
            settings: None,
        }
    }

    /// Looks up a field by id.
    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Notification settings, if the schema declares any.
    pub fn notifications(&self) -> Option<&NotificationConfig> {
        self.settings.as_ref().and_then(|s| s.notifications.as_ref())
    }

    /// Starting point offered to editors creating a new form.
    pub fn starter() -> Self {
        Self {
            version: SCHEMA_VERSION,
            fields: vec![FieldDefinition::new("name", FieldType::Text, "Name", true)],
            settings: Some(Settings {
                notifications: Some(NotificationConfig {
                    enabled: true,
                    to: "admin@example.com".to_string(),
                    subject: "New submission for {form_title}".to_string(),
                    message: "New submission:\n{name}".to_string(),
                }),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_wire_names() {
        assert_eq!(FieldType::Text.as_str(), "text");
        assert_eq!(FieldType::Email.as_str(), "email");
        assert_eq!(FieldType::Textarea.as_str(), "textarea");
        assert_eq!(FieldType::parse("email"), Some(FieldType::Email));
        assert_eq!(FieldType::parse("Email"), None);
        assert_eq!(FieldType::parse("number"), None);
    }

    #[test]
    fn test_effective_required() {
        let plain = FieldDefinition::new("name", FieldType::Text, "Name", false);
        assert!(!plain.is_required());

        let via_rules = plain.clone().with_validation(ValidationRules {
            required: Some(true),
            ..Default::default()
        });
        assert!(via_rules.is_required());

        let flag = FieldDefinition::new("name", FieldType::Text, "Name", true)
            .with_validation(ValidationRules {
                required: Some(false),
                ..Default::default()
            });
        assert!(flag.is_required());
    }

    #[test]
    fn test_starter_serializes_without_empty_blocks() {
        let value = serde_json::to_value(SchemaDocument::starter()).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["fields"][0]["type"], "text");
        assert!(value["fields"][0].get("validation").is_none());
        assert_eq!(value["settings"]["notifications"]["enabled"], true);
    }

    #[test]
    fn test_field_lookup() {
        let schema = SchemaDocument::new(vec![
            FieldDefinition::new("name", FieldType::Text, "Name", true),
            FieldDefinition::new("email", FieldType::Email, "Email", false),
        ]);
        assert_eq!(schema.field("email").unwrap().field_type, FieldType::Email);
        assert!(schema.field("ghost").is_none());
        assert!(schema.notifications().is_none());
    }
}
