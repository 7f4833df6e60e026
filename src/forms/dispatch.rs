//! Request dispatch
//!
//! One tagged request type per engine operation, routed by a single match.
//!
//! ```json
//! {"action": "submit", "form_id": 1, "submission": {"name": "Alice"}, "client_ip": "192.0.2.1"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::engine::{FormEngine, SaveOutcome, SubmitOutcome};
use super::errors::{FormsError, FormsResult};
use crate::store::SubmissionRecord;
use crate::submission::{SubmissionPayload, ValidationResult};

/// Engine request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    RegisterForm {
        form_id: u64,
        title: String,
    },

    /// `schema` absent leaves the stored schema alone; empty clears it
    SaveSchema {
        form_id: u64,
        #[serde(default)]
        schema: Option<String>,
    },

    ShowSchema {
        form_id: u64,
    },

    /// Validate only, nothing is stored
    Validate {
        form_id: u64,
        #[serde(default)]
        submission: Value,
    },

    Submit {
        form_id: u64,
        #[serde(default)]
        submission: Value,
        #[serde(default)]
        client_ip: Option<String>,
    },

    ListSubmissions {
        #[serde(default)]
        form_id: Option<u64>,
        #[serde(default)]
        limit: Option<usize>,
    },

    Template,
}

impl Request {
    pub fn from_json(line: &str) -> FormsResult<Self> {
        serde_json::from_str(line).map_err(|e| FormsError::InvalidRequest(e.to_string()))
    }
}

/// Engine response
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum Response {
    Registered {
        form_id: u64,
    },
    SchemaSaved {
        form_id: u64,
        #[serde(flatten)]
        outcome: SaveOutcome,
    },
    Schema {
        form_id: u64,
        schema: Option<String>,
    },
    Validation {
        #[serde(flatten)]
        result: ValidationResult,
    },
    Submission {
        #[serde(flatten)]
        outcome: SubmitOutcome,
    },
    Submissions {
        submissions: Vec<SubmissionRecord>,
    },
    Template {
        schema: String,
    },
}

impl FormEngine {
    pub fn dispatch(&self, request: Request) -> FormsResult<Response> {
        match request {
            Request::RegisterForm { form_id, title } => {
                self.register_form(form_id, &title)?;
                Ok(Response::Registered { form_id })
            }
            Request::SaveSchema { form_id, schema } => {
                let outcome = self.save_schema(form_id, schema.as_deref())?;
                Ok(Response::SchemaSaved { form_id, outcome })
            }
            Request::ShowSchema { form_id } => Ok(Response::Schema {
                form_id,
                schema: self.show_schema(form_id)?,
            }),
            Request::Validate {
                form_id,
                submission,
            } => {
                let payload = SubmissionPayload::from_json(&submission);
                Ok(Response::Validation {
                    result: self.validate_submission(form_id, &payload)?,
                })
            }
            Request::Submit {
                form_id,
                submission,
                client_ip,
            } => {
                let payload = SubmissionPayload::from_json(&submission);
                Ok(Response::Submission {
                    outcome: self.submit(form_id, &payload, client_ip.as_deref())?,
                })
            }
            Request::ListSubmissions { form_id, limit } => Ok(Response::Submissions {
                submissions: self.list_submissions(form_id, limit)?,
            }),
            Request::Template => Ok(Response::Template {
                schema: FormEngine::template(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::notification::{MemoryMailTransport, PlaceholderRenderer};
    use crate::store::MemoryFormStore;
    use serde_json::json;

    fn engine() -> FormEngine {
        FormEngine::with_parts(
            Arc::new(MemoryFormStore::new()),
            Arc::new(MemoryMailTransport::new()),
            PlaceholderRenderer::default(),
        )
    }

    fn run(engine: &FormEngine, request: Value) -> Value {
        let request = Request::from_json(&request.to_string()).unwrap();
        serde_json::to_value(engine.dispatch(request).unwrap()).unwrap()
    }

    #[test]
    fn test_round_trip_through_dispatch() {
        let engine = engine();
        let registered = run(&engine, json!({"action": "register_form", "form_id": 1, "title": "Contact"}));
        assert_eq!(registered, json!({"response": "registered", "form_id": 1}));

        let schema = r#"{"version":1,"fields":[{"id":"email","type":"email","label":"Email","required":true}]}"#;
        let saved = run(&engine, json!({"action": "save_schema", "form_id": 1, "schema": schema}));
        assert_eq!(saved["response"], "schema_saved");
        assert_eq!(saved["outcome"], "saved");

        let submitted = run(
            &engine,
            json!({"action": "submit", "form_id": 1, "submission": {"email": "bad"}}),
        );
        assert_eq!(submitted["response"], "submission");
        assert_eq!(submitted["is_valid"], false);
        assert_eq!(submitted["errors"][0]["code"], "invalid_email");
        assert_eq!(submitted["submission_id"], Value::Null);

        let listed = run(&engine, json!({"action": "list_submissions"}));
        assert_eq!(listed["submissions"], json!([]));
    }

    #[test]
    fn test_save_without_schema_is_unchanged() {
        let engine = engine();
        run(&engine, json!({"action": "register_form", "form_id": 3, "title": "T"}));
        let saved = run(&engine, json!({"action": "save_schema", "form_id": 3}));
        assert_eq!(saved["outcome"], "unchanged");
    }

    #[test]
    fn test_validate_reports_schema_missing() {
        let engine = engine();
        let response = run(&engine, json!({"action": "validate", "form_id": 8, "submission": {"a": "b"}}));
        assert_eq!(response["response"], "validation");
        assert_eq!(response["errors"][0]["code"], "schema_missing");
        assert_eq!(response["errors"][0]["field"], Value::Null);
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = Request::from_json(r#"{"action": "explode"}"#).unwrap_err();
        assert_eq!(err.code(), "invalid_request");
    }

    #[test]
    fn test_engine_errors_surface() {
        let engine = engine();
        let err = engine
            .dispatch(Request::SaveSchema {
                form_id: 1,
                schema: Some("{broken".into()),
            })
            .unwrap_err();
        assert_eq!(err.code(), "invalid_payload");
    }
}
