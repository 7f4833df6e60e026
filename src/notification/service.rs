//! Submission notifications
//!
//! Runs after a submission has been stored. Delivery problems are reported
//! as a [`NotificationOutcome`] and never reach the validation result.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use super::mailer::{MailTransport, OutgoingMail};
use super::placeholder::PlaceholderRenderer;
use crate::schema::NotificationConfig;
use crate::submission::sanitize::{is_email, sanitize_email};

/// Subject used when the form does not configure one.
pub const DEFAULT_SUBJECT: &str = "New submission for {form_title}";

/// What happened to a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Settings absent or notifications disabled
    Disabled,
    /// Recipient missing or not a valid address
    NoRecipient,
    /// Handed to the transport
    Sent { to: String },
    /// Transport rejected the message
    Failed { reason: String },
}

impl NotificationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationOutcome::Disabled => "disabled",
            NotificationOutcome::NoRecipient => "no_recipient",
            NotificationOutcome::Sent { .. } => "sent",
            NotificationOutcome::Failed { .. } => "failed",
        }
    }
}

/// A stored submission to announce
#[derive(Debug, Clone, Copy)]
pub struct SubmissionNotice<'a> {
    pub submission_id: u64,
    pub form_title: &'a str,
    pub data: &'a IndexMap<String, String>,
    /// Stored UTC timestamp, `YYYY-MM-DD HH:MM:SS`
    pub submitted_at: &'a str,
}

/// Renders and sends submission notifications.
pub struct NotificationService {
    transport: Arc<dyn MailTransport>,
    renderer: PlaceholderRenderer,
}

impl NotificationService {
    pub fn new(transport: Arc<dyn MailTransport>, renderer: PlaceholderRenderer) -> Self {
        Self { transport, renderer }
    }

    pub fn renderer(&self) -> &PlaceholderRenderer {
        &self.renderer
    }

    /// Reads notification settings from stored schema text.
    ///
    /// Lenient by design of the storage contract: the schema was checked
    /// when saved, so anything odd here reads as "not configured".
    pub fn settings_from_schema(raw_schema: Option<&str>) -> Option<NotificationConfig> {
        let schema: Value = serde_json::from_str(raw_schema?).ok()?;
        let settings = schema.get("settings")?.get("notifications")?.as_object()?;

        let text = |key: &str| {
            settings
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Some(NotificationConfig {
            enabled: settings.get("enabled").map(is_truthy).unwrap_or(false),
            to: text("to"),
            subject: text("subject"),
            message: text("message"),
        })
    }

    /// Renders and sends the notification for `notice`.
    pub fn notify(
        &self,
        settings: Option<&NotificationConfig>,
        notice: &SubmissionNotice<'_>,
    ) -> NotificationOutcome {
        let settings = match settings {
            Some(settings) if settings.enabled => settings,
            _ => return NotificationOutcome::Disabled,
        };

        let Some(to) = sanitize_recipient(&settings.to) else {
            return NotificationOutcome::NoRecipient;
        };

        let mail = self.compose(settings, to, notice);
        match self.transport.send(&mail) {
            Ok(()) => NotificationOutcome::Sent { to: mail.to },
            Err(e) => NotificationOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    /// Builds the message without sending it.
    pub fn compose(
        &self,
        settings: &NotificationConfig,
        to: String,
        notice: &SubmissionNotice<'_>,
    ) -> OutgoingMail {
        let context = self.renderer.context_for_submission(
            notice.form_title,
            notice.submission_id,
            notice.submitted_at,
            notice.data,
        );

        let subject_template = if settings.subject.is_empty() {
            DEFAULT_SUBJECT
        } else {
            settings.subject.as_str()
        };

        let body = if settings.message.is_empty() {
            self.renderer.render(&default_message(notice.data), &context)
        } else {
            self.renderer.render(&settings.message, &context)
        };

        OutgoingMail {
            to,
            subject: self.renderer.render_subject(subject_template, &context),
            body,
        }
    }
}

/// Sanitized recipient, or `None` when it is not a usable address.
pub fn sanitize_recipient(recipient: &str) -> Option<String> {
    let recipient = sanitize_email(recipient);
    if recipient.is_empty() || !is_email(&recipient) {
        return None;
    }
    Some(recipient)
}

fn default_message(data: &IndexMap<String, String>) -> String {
    let mut lines = vec!["New submission received.".to_string()];
    lines.extend(data.iter().map(|(key, value)| format!("{}: {}", key, value)));
    lines.join("\n")
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
