//! Form engine
//!
//! Wires the validators, the store and the notification service together.
//! Every collaborator is passed in explicitly; there is no global registry.
//!
//! Submit flow:
//! 1. Load stored schema text
//! 2. Validate and sanitize the payload
//! 3. Persist the sanitized data (accepted submissions only)
//! 4. Notify; the outcome is logged and reported but never changes the result

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use super::errors::{FormsError, FormsResult};
use crate::config::FormsConfig;
use crate::notification::{
    create_mail_transport, MailTransport, NotificationOutcome, NotificationService,
    PlaceholderRenderer, SubmissionNotice, TIMESTAMP_FORMAT,
};
use crate::observability::{Event, Logger};
use crate::schema::{SchemaAuthoringValidator, SchemaDocument};
use crate::store::{FileFormStore, FormStore, NewSubmission, SubmissionRecord};
use crate::submission::{SubmissionPayload, SubmissionValidator, ValidationResult};

/// Result of a schema save
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveOutcome {
    /// No schema text was supplied
    Unchanged,
    /// Empty text removed the stored schema
    Cleared,
    Saved { schema: SchemaDocument },
}

/// Result of a submit
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    #[serde(flatten)]
    pub result: ValidationResult,
    /// Id of the stored row; `None` when validation failed
    pub submission_id: Option<u64>,
    #[serde(serialize_with = "serialize_outcome")]
    pub notification: Option<NotificationOutcome>,
}

fn serialize_outcome<S>(outcome: &Option<NotificationOutcome>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match outcome {
        Some(outcome) => serializer.serialize_some(outcome.as_str()),
        None => serializer.serialize_none(),
    }
}

pub struct FormEngine {
    store: Arc<dyn FormStore>,
    authoring: SchemaAuthoringValidator,
    validator: SubmissionValidator,
    notifications: NotificationService,
    list_limit: usize,
}

impl FormEngine {
    /// Builds an engine backed by the file store under `config.data_dir`.
    pub fn assemble(config: &FormsConfig) -> FormsResult<Self> {
        config.validate()?;

        let store = FileFormStore::open(config.data_path())?;
        let transport = create_mail_transport(config.mail.clone());
        let renderer = PlaceholderRenderer::new(config.timezone_offset()?);

        Ok(Self::with_parts(Arc::new(store), transport, renderer)
            .with_list_limit(config.submission_list_limit))
    }

    pub fn with_parts(
        store: Arc<dyn FormStore>,
        transport: Arc<dyn MailTransport>,
        renderer: PlaceholderRenderer,
    ) -> Self {
        Self {
            store,
            authoring: SchemaAuthoringValidator::new(),
            validator: SubmissionValidator::new(),
            notifications: NotificationService::new(transport, renderer),
            list_limit: 100,
        }
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn FormStore> {
        &self.store
    }

    pub fn register_form(&self, form_id: u64, title: &str) -> FormsResult<()> {
        self.store.register_form(form_id, title)?;
        Ok(())
    }

    /// Validates and stores editor-supplied schema text.
    ///
    /// `None` leaves the stored schema untouched and empty text deletes it.
    /// The text is taken as-is, so JSON escapes reach the parser intact.
    /// Accepted schemas are stored as compact JSON.
    pub fn save_schema(&self, form_id: u64, raw: Option<&str>) -> FormsResult<SaveOutcome> {
        let Some(raw) = raw else {
            return Ok(SaveOutcome::Unchanged);
        };

        if raw.is_empty() {
            self.store.delete_schema(form_id)?;
            Logger::event(Event::SchemaCleared, &[("form_id", form_id.to_string().as_str())]);
            return Ok(SaveOutcome::Cleared);
        }

        let candidate = match serde_json::from_str::<Value>(raw) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
            _ => {
                self.log_rejected(form_id, &FormsError::InvalidPayload);
                return Err(FormsError::InvalidPayload);
            }
        };

        let schema = match self.authoring.validate(&candidate) {
            Ok(schema) => schema,
            Err(violation) => {
                let err = FormsError::Schema(violation);
                self.log_rejected(form_id, &err);
                return Err(err);
            }
        };

        self.store.save_schema(form_id, &candidate.to_string())?;
        let field_count = schema.fields.len().to_string();
        let form_label = form_id.to_string();
        Logger::event(
            Event::SchemaSaved,
            &[("fields", field_count.as_str()), ("form_id", form_label.as_str())],
        );
        Ok(SaveOutcome::Saved { schema })
    }

    /// Stored schema for display: pretty-printed when it decodes, verbatim
    /// otherwise.
    pub fn show_schema(&self, form_id: u64) -> FormsResult<Option<String>> {
        let Some(raw) = self.store.load_schema(form_id)? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }

        let shown = match serde_json::from_str::<Value>(&raw) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => {
                serde_json::to_string_pretty(&value).unwrap_or(raw)
            }
            _ => raw,
        };
        Ok(Some(shown))
    }

    /// Validates without storing or notifying.
    pub fn validate_submission(
        &self,
        form_id: u64,
        payload: &SubmissionPayload,
    ) -> FormsResult<ValidationResult> {
        let raw = self.store.load_schema(form_id)?;
        Ok(self.validator.validate_raw(raw.as_deref(), payload))
    }

    pub fn submit(
        &self,
        form_id: u64,
        payload: &SubmissionPayload,
        client_ip: Option<&str>,
    ) -> FormsResult<SubmitOutcome> {
        let raw = self.store.load_schema(form_id)?;
        let result = self.validator.validate_raw(raw.as_deref(), payload);
        let form_label = form_id.to_string();

        if !result.is_valid() {
            let codes: Vec<&str> = result.errors().iter().map(|e| e.code.as_str()).collect();
            let codes = codes.join(",");
            Logger::event(
                Event::SubmissionRejected,
                &[("codes", codes.as_str()), ("form_id", form_label.as_str())],
            );
            return Ok(SubmitOutcome {
                result,
                submission_id: None,
                notification: None,
            });
        }

        let submitted_at = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let submission_id = self.store.insert_submission(NewSubmission {
            form_id,
            data: result.data().clone(),
            client_ip: client_ip.map(str::to_string),
            submitted_at: submitted_at.clone(),
        })?;
        let id_label = submission_id.to_string();
        Logger::event(
            Event::SubmissionAccepted,
            &[("form_id", form_label.as_str()), ("submission_id", id_label.as_str())],
        );

        let form_title = self.store.form_title(form_id)?.unwrap_or_default();
        let settings = NotificationService::settings_from_schema(raw.as_deref());
        let outcome = self.notifications.notify(
            settings.as_ref(),
            &SubmissionNotice {
                submission_id,
                form_title: &form_title,
                data: result.data(),
                submitted_at: &submitted_at,
            },
        );
        log_notification(&outcome, id_label.as_str());

        Ok(SubmitOutcome {
            result,
            submission_id: Some(submission_id),
            notification: Some(outcome),
        })
    }

    /// Newest first; `limit` is capped by the configured list limit.
    pub fn list_submissions(
        &self,
        form_id: Option<u64>,
        limit: Option<usize>,
    ) -> FormsResult<Vec<SubmissionRecord>> {
        let limit = limit.unwrap_or(self.list_limit).min(self.list_limit);
        Ok(self.store.list_submissions(form_id, limit)?)
    }

    /// Starter schema offered to editors of a new form
    pub fn template() -> String {
        serde_json::to_string_pretty(&SchemaDocument::starter()).unwrap_or_default()
    }

    fn log_rejected(&self, form_id: u64, err: &FormsError) {
        let form_label = form_id.to_string();
        let reason = err.to_string();
        Logger::event(
            Event::SchemaRejected,
            &[("form_id", form_label.as_str()), ("reason", reason.as_str())],
        );
    }
}

fn log_notification(outcome: &NotificationOutcome, submission_id: &str) {
    match outcome {
        NotificationOutcome::Sent { to } => Logger::event(
            Event::NotificationSent,
            &[("submission_id", submission_id), ("to", to.as_str())],
        ),
        NotificationOutcome::Failed { reason } => Logger::event(
            Event::NotificationFailed,
            &[("reason", reason.as_str()), ("submission_id", submission_id)],
        ),
        skipped => Logger::event(
            Event::NotificationSkipped,
            &[("reason", skipped.as_str()), ("submission_id", submission_id)],
        ),
    }
}
