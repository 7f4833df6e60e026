//! Form persistence
//!
//! The engine reaches storage only through [`FormStore`]. Schemas are kept
//! as the exact text that passed authoring; submissions are append-only.

mod errors;
mod file;
mod memory;

pub use errors::{StoreError, StoreResult};
pub use file::FileFormStore;
pub use memory::MemoryFormStore;

use std::net::IpAddr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::submission::sanitize::unslash;

/// Persistence collaborator
pub trait FormStore: Send + Sync {
    /// Registers a form or renames an existing one. Any stored schema is kept.
    fn register_form(&self, form_id: u64, title: &str) -> StoreResult<()>;

    /// Title of a registered form
    fn form_title(&self, form_id: u64) -> StoreResult<Option<String>>;

    /// Stored schema text, `None` when the form has no schema
    fn load_schema(&self, form_id: u64) -> StoreResult<Option<String>>;

    fn save_schema(&self, form_id: u64, raw: &str) -> StoreResult<()>;

    /// Removes the stored schema; a form without one is left unchanged.
    fn delete_schema(&self, form_id: u64) -> StoreResult<()>;

    /// Appends a submission and returns its id
    fn insert_submission(&self, submission: NewSubmission) -> StoreResult<u64>;

    /// Newest first, optionally filtered by form
    fn list_submissions(&self, form_id: Option<u64>, limit: usize) -> StoreResult<Vec<SubmissionRecord>>;
}

/// A validated submission ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub form_id: u64,
    pub data: IndexMap<String, String>,
    /// Raw client address as received from the transport
    pub client_ip: Option<String>,
    /// UTC, `YYYY-MM-DD HH:MM:SS`
    pub submitted_at: String,
}

/// A persisted submission row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: u64,
    pub form_id: u64,
    pub data: IndexMap<String, String>,
    pub submitted_at: String,
    pub ip_address: Option<String>,
}

impl SubmissionRecord {
    pub(crate) fn from_new(id: u64, submission: NewSubmission) -> Self {
        Self {
            id,
            form_id: submission.form_id,
            data: submission.data,
            submitted_at: submission.submitted_at,
            ip_address: sanitize_client_ip(submission.client_ip.as_deref()),
        }
    }
}

/// Unslashes a client address and keeps it only if it is a valid IPv4 or
/// IPv6 literal.
pub fn sanitize_client_ip(ip: Option<&str>) -> Option<String> {
    let ip = unslash(ip.filter(|ip| !ip.is_empty())?);
    ip.parse::<IpAddr>().ok().map(|_| ip)
}

/// Orders newest first and applies `limit`.
pub(crate) fn newest_first(mut records: Vec<SubmissionRecord>, limit: usize) -> Vec<SubmissionRecord> {
    records.sort_by(|a, b| {
        b.submitted_at
            .cmp(&a.submitted_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    records.truncate(limit);
    records
}
