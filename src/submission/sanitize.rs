//! Per-type value sanitation
//!
//! - text: single line, markup and control characters stripped
//! - textarea: as text, but line breaks and tabs survive
//! - email: reduced to an email-safe character set, empty if hopeless
//!
//! All functions are pure and total: any input yields a (possibly empty)
//! string.

use regex::Regex;
use std::sync::OnceLock;

use crate::schema::FieldType;

/// Characters `trim` strips from email domains besides the edge char.
const EDGE_WHITESPACE: [char; 6] = [' ', '\t', '\n', '\r', '\0', '\x0b'];

struct Patterns {
    script: Regex,
    style: Regex,
    comment: Regex,
    tag: Regex,
    line_whitespace: Regex,
    octet: Regex,
    spaces: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        script: compile(r"(?is)<script[^>]*?>.*?</script\s*>"),
        style: compile(r"(?is)<style[^>]*?>.*?</style\s*>"),
        comment: compile(r"(?s)<!--.*?-->"),
        tag: compile(r"<[^>]*>"),
        line_whitespace: compile(r"[\r\n\t ]+"),
        octet: compile(r"(?i)%[a-f0-9]{2}"),
        spaces: compile(r" +"),
    })
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("sanitizer patterns are valid literals")
}

/// Reverses backslash escaping applied by the inbound request pipeline.
///
/// `\x` becomes `x`, `\0` becomes NUL and a trailing lone backslash is
/// dropped.
pub fn unslash(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('\0'),
            Some(next) => out.push(next),
            None => {}
        }
    }
    out
}

/// Single-line text sanitation.
pub fn sanitize_text(value: &str) -> String {
    sanitize_text_fields(value, false)
}

/// Multi-line text sanitation; keeps internal line breaks.
pub fn sanitize_textarea(value: &str) -> String {
    sanitize_text_fields(value, true)
}

/// Applies the sanitizer matching `field_type`.
pub fn sanitize_for(field_type: FieldType, value: &str) -> String {
    match field_type {
        FieldType::Textarea => sanitize_textarea(value),
        FieldType::Email => sanitize_email(value),
        FieldType::Text => sanitize_text(value),
    }
}

fn sanitize_text_fields(value: &str, keep_newlines: bool) -> String {
    let p = patterns();
    let mut filtered = value.to_string();

    if filtered.contains('<') {
        filtered = escape_lone_less_than(&filtered);
        filtered = strip_tags(&filtered);
    }

    filtered.retain(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'));

    if !keep_newlines {
        filtered = p.line_whitespace.replace_all(&filtered, " ").into_owned();
    }
    filtered = filtered.trim().to_string();

    let mut found = false;
    while p.octet.is_match(&filtered) {
        filtered = p.octet.replace_all(&filtered, "").into_owned();
        found = true;
    }
    if found {
        filtered = p.spaces.replace_all(filtered.trim(), " ").into_owned();
    }

    filtered
}

/// Escapes every `<` that does not open a tag closed before the next `<`.
fn escape_lone_less_than(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let closes = match (after.find('>'), after.find('<')) {
            (Some(gt), Some(lt)) => gt < lt,
            (Some(_), None) => true,
            (None, _) => false,
        };
        out.push_str(if closes { "<" } else { "&lt;" });
        rest = after;
    }
    out.push_str(rest);
    out
}

fn strip_tags(value: &str) -> String {
    let p = patterns();
    let stripped = p.script.replace_all(value, "");
    let stripped = p.style.replace_all(&stripped, "");
    let stripped = p.comment.replace_all(&stripped, "");
    p.tag.replace_all(&stripped, "").into_owned()
}

fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c)
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

/// Splits at the first `@`, requiring one at or after the second byte.
fn split_address(value: &str) -> Option<(&str, &str)> {
    if value.len() < 6 {
        return None;
    }
    value.get(1..)?.find('@')?;
    value.split_once('@')
}

/// Reduces a value to an email-safe form, or the empty string.
pub fn sanitize_email(value: &str) -> String {
    let value = value.trim();
    let Some((local, domain)) = split_address(value) else {
        return String::new();
    };

    let local: String = local.chars().filter(|c| is_local_char(*c)).collect();
    if local.is_empty() || domain.contains("..") {
        return String::new();
    }

    let domain = domain.trim_matches(|c: char| c == '.' || EDGE_WHITESPACE.contains(&c));
    if domain.is_empty() {
        return String::new();
    }

    let labels: Vec<String> = domain
        .split('.')
        .map(|label| {
            label
                .trim_matches(|c: char| c == '-' || EDGE_WHITESPACE.contains(&c))
                .chars()
                .filter(|c| is_label_char(*c))
                .collect::<String>()
        })
        .filter(|label| !label.is_empty())
        .collect();
    if labels.len() < 2 {
        return String::new();
    }

    format!("{}@{}", local, labels.join("."))
}

/// Email syntax check.
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = split_address(value) else {
        return false;
    };

    if local.is_empty() || !local.chars().all(is_local_char) {
        return false;
    }

    if domain.contains("..") {
        return false;
    }
    if domain.trim_matches(|c: char| c == '.' || EDGE_WHITESPACE.contains(&c)) != domain {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| {
        label.trim_matches(|c: char| c == '-' || EDGE_WHITESPACE.contains(&c)) == *label
            && !label.is_empty()
            && label.chars().all(is_label_char)
    })
}
