//! One-pass decode from untyped JSON into the typed schema model
//!
//! Decoding never coerces field-level values: booleans must be booleans,
//! lengths must be integers. The only coercion is the integer reading of
//! `version`, which tolerates numeric strings, floats and booleans.

use serde_json::{Map, Value};
use std::collections::HashSet;

use super::errors::{SchemaResult, SchemaViolation};
use super::types::{
    FieldDefinition, FieldType, NotificationConfig, Settings, ValidationRules,
    ALLOWED_FIELD_KEYS, ALLOWED_NOTIFICATION_KEYS, ALLOWED_SETTINGS_KEYS,
    ALLOWED_VALIDATION_KEYS, REQUIRED_FIELD_KEYS, SCHEMA_VERSION,
};

/// Reads a `version` value as an integer.
///
/// Returns `None` for arrays and objects, which have no integer reading.
pub fn coerce_version(value: &Value) -> Option<i64> {
    match value {
        Value::Null => Some(0),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => Some(leading_integer(s)),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Checks the version value and returns it on success.
pub fn decode_version(value: &Value) -> SchemaResult<i64> {
    match coerce_version(value) {
        Some(SCHEMA_VERSION) => Ok(SCHEMA_VERSION),
        _ => Err(SchemaViolation::UnsupportedVersion(
            scalar_to_string(value).unwrap_or_else(|| "unknown".to_string()),
        )),
    }
}

/// Decodes the `fields` list, rejecting the first malformed entry.
pub fn decode_fields(value: &Value) -> SchemaResult<Vec<FieldDefinition>> {
    let entries = value.as_array().ok_or(SchemaViolation::FieldsNotArray)?;

    let mut seen = HashSet::with_capacity(entries.len());
    let mut fields = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let field = decode_field(index, entry)?;
        if !seen.insert(field.id.clone()) {
            return Err(SchemaViolation::DuplicateFieldId { index, id: field.id });
        }
        fields.push(field);
    }

    Ok(fields)
}

/// Decodes one field definition. `index` is only used for reporting.
pub fn decode_field(index: usize, value: &Value) -> SchemaResult<FieldDefinition> {
    let obj = value
        .as_object()
        .ok_or(SchemaViolation::FieldNotObject(index))?;

    let missing: Vec<String> = REQUIRED_FIELD_KEYS
        .iter()
        .filter(|k| !obj.contains_key(**k))
        .map(|k| k.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SchemaViolation::FieldMissingKeys { index, keys: missing });
    }

    let unsupported = unknown_keys(obj, &ALLOWED_FIELD_KEYS);
    if !unsupported.is_empty() {
        return Err(SchemaViolation::FieldUnsupportedKeys { index, keys: unsupported });
    }

    let id = match obj.get("id").and_then(Value::as_str) {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => return Err(SchemaViolation::FieldMissingId(index)),
    };

    let field_type = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(FieldType::parse)
        .ok_or(SchemaViolation::UnsupportedFieldType(index))?;

    let label = match obj.get("label").and_then(Value::as_str) {
        Some(label) if !label.trim().is_empty() => label.to_string(),
        _ => return Err(SchemaViolation::FieldMissingLabel(index)),
    };

    let required = obj
        .get("required")
        .and_then(Value::as_bool)
        .ok_or(SchemaViolation::FieldRequiredNotBoolean(index))?;

    let validation = match obj.get("validation") {
        Some(rules) => Some(decode_rules(index, rules)?),
        None => None,
    };

    let meta = match obj.get("meta") {
        Some(Value::Object(meta)) => Some(meta.clone()),
        Some(_) => return Err(SchemaViolation::FieldMetaNotObject(index)),
        None => None,
    };

    Ok(FieldDefinition {
        id,
        field_type,
        label,
        required,
        validation,
        meta,
    })
}

fn decode_rules(index: usize, value: &Value) -> SchemaResult<ValidationRules> {
    let obj = value
        .as_object()
        .ok_or(SchemaViolation::InvalidValidationRules(index))?;

    let unsupported = unknown_keys(obj, &ALLOWED_VALIDATION_KEYS);
    if !unsupported.is_empty() {
        return Err(SchemaViolation::UnsupportedValidationKeys { index, keys: unsupported });
    }

    let required = match obj.get("required") {
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => return Err(SchemaViolation::ValidationRequiredNotBoolean(index)),
        None => None,
    };

    Ok(ValidationRules {
        required,
        min_length: decode_length(index, obj, "min_length")?,
        max_length: decode_length(index, obj, "max_length")?,
    })
}

fn decode_length(
    index: usize,
    obj: &Map<String, Value>,
    key: &'static str,
) -> SchemaResult<Option<i64>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) if n.is_i64() => Ok(n.as_i64()),
        Some(_) => Err(SchemaViolation::ValidationLengthNotInteger { index, key }),
    }
}

/// Decodes the `settings` block.
pub fn decode_settings(value: &Value) -> SchemaResult<Settings> {
    let obj = value.as_object().ok_or(SchemaViolation::SettingsNotObject)?;

    let unsupported = unknown_keys(obj, &ALLOWED_SETTINGS_KEYS);
    if !unsupported.is_empty() {
        return Err(SchemaViolation::UnsupportedSettingsKeys(unsupported));
    }

    let notifications = match obj.get("notifications") {
        Some(value) => Some(decode_notifications(value)?),
        None => None,
    };

    Ok(Settings { notifications })
}

fn decode_notifications(value: &Value) -> SchemaResult<NotificationConfig> {
    let obj = value
        .as_object()
        .ok_or(SchemaViolation::NotificationsNotObject)?;

    let unsupported = unknown_keys(obj, &ALLOWED_NOTIFICATION_KEYS);
    if !unsupported.is_empty() {
        return Err(SchemaViolation::UnsupportedNotificationKeys(unsupported));
    }

    let enabled = match obj.get("enabled") {
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(SchemaViolation::NotificationEnabledNotBoolean),
        None => false,
    };

    let mut config = NotificationConfig {
        enabled,
        ..Default::default()
    };
    for key in ["to", "subject", "message"] {
        let text = match obj.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(SchemaViolation::NotificationValueNotString(key)),
            None => continue,
        };
        match key {
            "to" => config.to = text,
            "subject" => config.subject = text,
            _ => config.message = text,
        }
    }

    Ok(config)
}

/// Keys of `obj` outside `allowed`, in document order.
pub fn unknown_keys(obj: &Map<String, Value>, allowed: &[&str]) -> Vec<String> {
    obj.keys()
        .filter(|k| !allowed.contains(&k.as_str()))
        .cloned()
        .collect()
}

/// Renders a scalar the way it reads in text.
///
/// `true` is `"1"`, `false` is the empty string, integral floats drop
/// their fraction. Null, arrays and objects have no text form.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some(String::new()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(format_float)
            }
        }
        Value::String(s) => Some(s.clone()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// Integer reading of a string: whole numeric strings convert exactly
/// (floats truncate), otherwise the leading signed digit run is used and
/// anything non-numeric reads as zero.
fn leading_integer(s: &str) -> i64 {
    let trimmed = s.trim_start_matches([' ', '\t', '\n', '\r', '\x0b', '\x0c']);
    let whole = trimmed.trim_end();
    if let Ok(i) = whole.parse::<i64>() {
        return i;
    }
    if let Ok(f) = whole.parse::<f64>() {
        if f.is_finite() {
            return f.trunc() as i64;
        }
    }

    let mut end = 0;
    for (i, c) in trimmed.char_indices() {
        if c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+')) {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    trimmed[..end].parse::<i64>().unwrap_or(0)
}

/// Returns the JSON type name for messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "float"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
