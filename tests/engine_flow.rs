//! Engine Flow Tests
//!
//! End-to-end behavior of the assembled engine:
//! - Schemas are validated before they are persisted
//! - Accepted submissions are stored, then announced
//! - Rejected submissions leave no trace
//! - Notification problems never change the validation result
//! - State survives reopening the data directory

use std::sync::Arc;

use chrono::FixedOffset;
use formgate::config::FormsConfig;
use formgate::forms::{FormEngine, FormsError, Request, Response, SaveOutcome};
use formgate::notification::{MemoryMailTransport, NotificationOutcome, PlaceholderRenderer};
use formgate::store::{FileFormStore, FormStore};
use formgate::submission::{ErrorCode, SubmissionPayload};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const CONTACT_FORM: u64 = 42;

fn contact_schema() -> String {
    json!({
        "version": 1,
        "fields": [
            {"id": "name", "type": "text", "label": "Name", "required": true},
            {"id": "email", "type": "email", "label": "Email", "required": true},
            {"id": "message", "type": "textarea", "label": "Message", "required": false}
        ],
        "settings": {
            "notifications": {
                "enabled": true,
                "to": "owner@example.com",
                "subject": "[{form_title}] {name}",
                "message": "From: {name} <{email}> at {submission_date}: {message}"
            }
        }
    })
    .to_string()
}

fn setup_engine() -> (TempDir, FormEngine, Arc<MemoryMailTransport>) {
    let tmp = TempDir::new().unwrap();
    let store = FileFormStore::open(tmp.path()).unwrap();
    let transport = Arc::new(MemoryMailTransport::new());
    let renderer = PlaceholderRenderer::new(FixedOffset::east_opt(3600).unwrap());

    let engine = FormEngine::with_parts(Arc::new(store), transport.clone(), renderer);
    engine.register_form(CONTACT_FORM, "Contact").unwrap();
    engine.save_schema(CONTACT_FORM, Some(&contact_schema())).unwrap();

    (tmp, engine, transport)
}

fn alice() -> SubmissionPayload {
    SubmissionPayload::new()
        .with("name", "Alice")
        .with("email", "alice@example.com")
        .with("message", "Hello\nthere")
}

// =============================================================================
// Schema Save Tests
// =============================================================================

/// A rejected schema leaves the previous one in place.
#[test]
fn test_rejected_schema_keeps_previous() {
    let (_tmp, engine, _) = setup_engine();
    let before = engine.show_schema(CONTACT_FORM).unwrap();

    let err = engine
        .save_schema(CONTACT_FORM, Some(r#"{"version":1,"fields":[],"extra":true}"#))
        .unwrap_err();
    assert!(matches!(err, FormsError::Schema(_)));
    assert_eq!(engine.show_schema(CONTACT_FORM).unwrap(), before);
}

#[test]
fn test_schema_for_unregistered_form() {
    let (_tmp, engine, _) = setup_engine();
    let err = engine
        .save_schema(7, Some(r#"{"version":1,"fields":[]}"#))
        .unwrap_err();
    assert_eq!(err.code(), "form_not_found");
}

#[test]
fn test_clearing_schema_makes_form_unusable() {
    let (_tmp, engine, _) = setup_engine();
    assert_eq!(engine.save_schema(CONTACT_FORM, Some("")).unwrap(), SaveOutcome::Cleared);

    let outcome = engine.submit(CONTACT_FORM, &alice(), None).unwrap();
    assert!(outcome.result.has_code(ErrorCode::SchemaMissing));
    assert_eq!(outcome.submission_id, None);
}

// =============================================================================
// Submission Tests
// =============================================================================

#[test]
fn test_accepted_submission_stored_and_announced() {
    let (_tmp, engine, transport) = setup_engine();

    let outcome = engine
        .submit(CONTACT_FORM, &alice(), Some("198.51.100.4"))
        .unwrap();
    assert!(outcome.result.is_valid());
    assert_eq!(outcome.submission_id, Some(1));
    assert_eq!(
        outcome.notification,
        Some(NotificationOutcome::Sent {
            to: "owner@example.com".to_string()
        })
    );

    let records = engine.list_submissions(Some(CONTACT_FORM), None).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].data["message"], "Hello\nthere");
    assert_eq!(records[0].ip_address.as_deref(), Some("198.51.100.4"));

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "[Contact] Alice");
    assert!(sent[0].body.starts_with("From: Alice <alice@example.com> at "));
    assert!(sent[0].body.ends_with(": Hello\nthere"));
}

#[test]
fn test_rejected_submission_not_stored() {
    let (_tmp, engine, transport) = setup_engine();
    let payload = SubmissionPayload::new()
        .with("name", "Mallory")
        .with("email", "mallory-at-example")
        .with("admin", "1");

    let outcome = engine.submit(CONTACT_FORM, &payload, None).unwrap();
    assert!(!outcome.result.is_valid());
    assert!(outcome.result.has_code(ErrorCode::UnknownField));
    assert!(outcome.result.has_code(ErrorCode::InvalidEmail));
    assert_eq!(outcome.result.data()["name"], "Mallory");

    assert!(engine.list_submissions(None, None).unwrap().is_empty());
    assert_eq!(transport.sent_count(), 0);
}

/// Notifications with a bad recipient are skipped; the submission stands.
#[test]
fn test_bad_recipient_skips_notification() {
    let (_tmp, engine, transport) = setup_engine();
    let schema = contact_schema().replace("owner@example.com", "owner");
    engine.save_schema(CONTACT_FORM, Some(&schema)).unwrap();

    let outcome = engine.submit(CONTACT_FORM, &alice(), None).unwrap();
    assert!(outcome.result.is_valid());
    assert_eq!(outcome.notification, Some(NotificationOutcome::NoRecipient));
    assert_eq!(transport.sent_count(), 0);
    assert_eq!(engine.list_submissions(None, None).unwrap().len(), 1);
}

#[test]
fn test_validate_only_stores_nothing() {
    let (_tmp, engine, transport) = setup_engine();
    let result = engine.validate_submission(CONTACT_FORM, &alice()).unwrap();
    assert!(result.is_valid());
    assert!(engine.list_submissions(None, None).unwrap().is_empty());
    assert_eq!(transport.sent_count(), 0);
}

// =============================================================================
// Persistence Tests
// =============================================================================

/// Schemas and submissions survive a fresh engine over the same directory.
#[test]
fn test_assembled_engine_reopens_data() {
    let tmp = TempDir::new().unwrap();
    let mut config = FormsConfig::new(tmp.path().to_string_lossy());
    config.timezone = "+02:00".to_string();

    {
        let engine = FormEngine::assemble(&config).unwrap();
        engine.register_form(1, "Signup").unwrap();
        engine.save_schema(1, Some(&contact_schema())).unwrap();
        engine.submit(1, &alice(), None).unwrap();
    }

    let engine = FormEngine::assemble(&config).unwrap();
    assert!(engine.show_schema(1).unwrap().unwrap().contains("\"version\": 1"));
    let outcome = engine.submit(1, &alice(), None).unwrap();
    assert_eq!(outcome.submission_id, Some(2));

    let store = FileFormStore::open(tmp.path()).unwrap();
    assert_eq!(store.list_submissions(Some(1), 10).unwrap().len(), 2);
}

#[test]
fn test_assemble_rejects_bad_config() {
    let tmp = TempDir::new().unwrap();
    let mut config = FormsConfig::new(tmp.path().to_string_lossy());
    config.timezone = "Mars/Olympus".to_string();
    assert!(matches!(
        FormEngine::assemble(&config),
        Err(FormsError::Config(_))
    ));
}

// =============================================================================
// Dispatch Tests
// =============================================================================

#[test]
fn test_dispatch_submit_and_list() {
    let (_tmp, engine, _) = setup_engine();

    let request = Request::from_json(
        &json!({
            "action": "submit",
            "form_id": CONTACT_FORM,
            "submission": {"name": "Bob", "email": "bob@example.com"},
            "client_ip": "not-an-ip"
        })
        .to_string(),
    )
    .unwrap();
    let response = serde_json::to_value(engine.dispatch(request).unwrap()).unwrap();
    assert_eq!(response["response"], "submission");
    assert_eq!(response["is_valid"], true);
    assert_eq!(response["submission_id"], 1);
    assert_eq!(response["notification"], "sent");

    match engine
        .dispatch(Request::ListSubmissions {
            form_id: Some(CONTACT_FORM),
            limit: Some(5),
        })
        .unwrap()
    {
        Response::Submissions { submissions } => {
            assert_eq!(submissions.len(), 1);
            assert_eq!(submissions[0].ip_address, None);
        }
        other => panic!("unexpected response: {:?}", other),
    }
}
