//! # File-Backed Form Store
//!
//! Layout under the data directory:
//!
//! ```text
//! forms/form_<id>.json   one record per form (title + schema text)
//! submissions.jsonl      one submission record per line, append-only
//! ```
//!
//! Form records are replaced through a temporary file and a rename.
//! A failed append is rolled back to the previous log length, and an
//! unterminated last line (a torn append) is cut off on open.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};
use super::{newest_first, FormStore, NewSubmission, SubmissionRecord};

const FORMS_DIR: &str = "forms";
const SUBMISSIONS_FILE: &str = "submissions.jsonl";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FormRecord {
    id: u64,
    title: String,
    schema: Option<String>,
}

/// Durable store rooted at a data directory
#[derive(Debug)]
pub struct FileFormStore {
    root: PathBuf,
    /// Guards the submissions log and holds the next id
    next_submission_id: RwLock<u64>,
}

impl FileFormStore {
    /// Opens (and creates, if needed) a store under `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(FORMS_DIR))?;

        let log_path = root.join(SUBMISSIONS_FILE);
        let log = read_submissions(&log_path)?;
        if log.clean_len < log.file_len {
            OpenOptions::new().write(true).open(&log_path)?.set_len(log.clean_len)?;
        }

        let next = log
            .records
            .iter()
            .map(|record| record.id)
            .max()
            .unwrap_or(0)
            + 1;

        Ok(Self {
            root,
            next_submission_id: RwLock::new(next),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn form_path(&self, form_id: u64) -> PathBuf {
        self.root.join(FORMS_DIR).join(format!("form_{}.json", form_id))
    }

    fn read_form(&self, form_id: u64) -> StoreResult<Option<FormRecord>> {
        let path = self.form_path(form_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                location: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    fn write_form(&self, record: &FormRecord) -> StoreResult<()> {
        let path = self.form_path(record.id);
        let tmp = path.with_extension("json.tmp");

        let content = serde_json::to_vec_pretty(record).map_err(|e| StoreError::Corrupt {
            location: path.display().to_string(),
            reason: e.to_string(),
        })?;

        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn update_schema(&self, form_id: u64, schema: Option<&str>) -> StoreResult<()> {
        let mut record = self
            .read_form(form_id)?
            .ok_or(StoreError::FormNotFound(form_id))?;
        record.schema = schema.map(str::to_string);
        self.write_form(&record)
    }
}

impl FormStore for FileFormStore {
    fn register_form(&self, form_id: u64, title: &str) -> StoreResult<()> {
        let schema = self.read_form(form_id)?.and_then(|record| record.schema);
        self.write_form(&FormRecord {
            id: form_id,
            title: title.to_string(),
            schema,
        })
    }

    fn form_title(&self, form_id: u64) -> StoreResult<Option<String>> {
        Ok(self.read_form(form_id)?.map(|record| record.title))
    }

    fn load_schema(&self, form_id: u64) -> StoreResult<Option<String>> {
        Ok(self.read_form(form_id)?.and_then(|record| record.schema))
    }

    fn save_schema(&self, form_id: u64, raw: &str) -> StoreResult<()> {
        self.update_schema(form_id, Some(raw))
    }

    fn delete_schema(&self, form_id: u64) -> StoreResult<()> {
        self.update_schema(form_id, None)
    }

    fn insert_submission(&self, submission: NewSubmission) -> StoreResult<u64> {
        if self.read_form(submission.form_id)?.is_none() {
            return Err(StoreError::FormNotFound(submission.form_id));
        }

        let mut next = self
            .next_submission_id
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let id = *next;
        let record = SubmissionRecord::from_new(id, submission);

        let mut line = serde_json::to_string(&record).map_err(|e| StoreError::Corrupt {
            location: SUBMISSIONS_FILE.to_string(),
            reason: e.to_string(),
        })?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(SUBMISSIONS_FILE))?;
        let len_before = file.metadata()?.len();
        if let Err(e) = append_line(&mut file, &line) {
            file.set_len(len_before)?;
            return Err(e.into());
        }

        *next += 1;
        Ok(id)
    }

    fn list_submissions(&self, form_id: Option<u64>, limit: usize) -> StoreResult<Vec<SubmissionRecord>> {
        let _guard = self
            .next_submission_id
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        let records = read_submissions(&self.root.join(SUBMISSIONS_FILE))?
            .records
            .into_iter()
            .filter(|record| form_id.map_or(true, |id| record.form_id == id))
            .collect();
        Ok(newest_first(records, limit))
    }
}

fn append_line(file: &mut File, line: &str) -> std::io::Result<()> {
    file.write_all(line.as_bytes())?;
    file.sync_data()
}

/// Parsed submissions log
struct SubmissionLog {
    records: Vec<SubmissionRecord>,
    /// Length up to and including the last newline
    clean_len: u64,
    file_len: u64,
}

/// Reads every complete line of the log. Bytes after the last newline
/// belong to an append that never finished and are not parsed.
fn read_submissions(path: &Path) -> StoreResult<SubmissionLog> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(SubmissionLog {
                records: Vec::new(),
                clean_len: 0,
                file_len: 0,
            })
        }
        Err(e) => return Err(e.into()),
    };

    let clean_len = bytes
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    let content = std::str::from_utf8(&bytes[..clean_len]).map_err(|e| StoreError::Corrupt {
        location: SUBMISSIONS_FILE.to_string(),
        reason: e.to_string(),
    })?;

    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|e| StoreError::Corrupt {
            location: format!("{} line {}", SUBMISSIONS_FILE, index + 1),
            reason: e.to_string(),
        })?;
        records.push(record);
    }

    Ok(SubmissionLog {
        records,
        clean_len: clean_len as u64,
        file_len: bytes.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use tempfile::TempDir;

    fn submission(form_id: u64, ip: Option<&str>) -> NewSubmission {
        let mut data = IndexMap::new();
        data.insert("name".to_string(), "Alice".to_string());
        data.insert("email".to_string(), "alice@example.com".to_string());
        NewSubmission {
            form_id,
            data,
            client_ip: ip.map(str::to_string),
            submitted_at: "2024-05-01 09:00:00".to_string(),
        }
    }

    #[test]
    fn test_schema_persists_across_open() {
        let temp = TempDir::new().unwrap();
        {
            let store = FileFormStore::open(temp.path()).unwrap();
            store.register_form(4, "Contact").unwrap();
            store.save_schema(4, r#"{"version":1,"fields":[]}"#).unwrap();
        }

        let store = FileFormStore::open(temp.path()).unwrap();
        assert_eq!(store.form_title(4).unwrap().as_deref(), Some("Contact"));
        assert_eq!(
            store.load_schema(4).unwrap().as_deref(),
            Some(r#"{"version":1,"fields":[]}"#)
        );
        assert!(temp.path().join("forms").join("form_4.json").exists());
    }

    #[test]
    fn test_delete_schema_keeps_form() {
        let temp = TempDir::new().unwrap();
        let store = FileFormStore::open(temp.path()).unwrap();
        store.register_form(1, "Contact").unwrap();
        store.save_schema(1, "{}").unwrap();
        store.delete_schema(1).unwrap();

        assert_eq!(store.load_schema(1).unwrap(), None);
        assert_eq!(store.form_title(1).unwrap().as_deref(), Some("Contact"));
    }

    #[test]
    fn test_unknown_form() {
        let temp = TempDir::new().unwrap();
        let store = FileFormStore::open(temp.path()).unwrap();
        assert!(matches!(store.save_schema(2, "{}"), Err(StoreError::FormNotFound(2))));
        assert!(matches!(
            store.insert_submission(submission(2, None)),
            Err(StoreError::FormNotFound(2))
        ));
    }

    #[test]
    fn test_submission_ids_continue_after_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let store = FileFormStore::open(temp.path()).unwrap();
            store.register_form(1, "Contact").unwrap();
            assert_eq!(store.insert_submission(submission(1, None)).unwrap(), 1);
            assert_eq!(store.insert_submission(submission(1, None)).unwrap(), 2);
        }

        let store = FileFormStore::open(temp.path()).unwrap();
        assert_eq!(store.insert_submission(submission(1, None)).unwrap(), 3);
        assert_eq!(store.list_submissions(Some(1), 100).unwrap().len(), 3);
    }

    #[test]
    fn test_record_preserves_data_order_and_ip() {
        let temp = TempDir::new().unwrap();
        let store = FileFormStore::open(temp.path()).unwrap();
        store.register_form(1, "Contact").unwrap();
        store.insert_submission(submission(1, Some(r"::1"))).unwrap();
        store.insert_submission(submission(1, Some("bogus"))).unwrap();

        let records = store.list_submissions(None, 10).unwrap();
        assert_eq!(records[0].ip_address, None);
        assert_eq!(records[1].ip_address.as_deref(), Some("::1"));
        let keys: Vec<&String> = records[1].data.keys().collect();
        assert_eq!(keys, vec!["name", "email"]);
    }

    #[test]
    fn test_corrupt_log_reported() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(SUBMISSIONS_FILE), "{not json}\n").unwrap();
        assert!(matches!(
            FileFormStore::open(temp.path()),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_torn_append_dropped_on_open() {
        let temp = TempDir::new().unwrap();
        {
            let store = FileFormStore::open(temp.path()).unwrap();
            store.register_form(1, "Contact").unwrap();
            store.insert_submission(submission(1, None)).unwrap();
            store.insert_submission(submission(1, None)).unwrap();
        }

        let log = temp.path().join(SUBMISSIONS_FILE);
        let mut file = OpenOptions::new().append(true).open(&log).unwrap();
        file.write_all(br#"{"id":3,"form_id":1,"da"#).unwrap();
        drop(file);

        let store = FileFormStore::open(temp.path()).unwrap();
        let records = store.list_submissions(Some(1), 10).unwrap();
        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);

        assert_eq!(store.insert_submission(submission(1, None)).unwrap(), 3);
        let reopened = FileFormStore::open(temp.path()).unwrap();
        assert_eq!(reopened.list_submissions(None, 10).unwrap().len(), 3);
        assert!(fs::read_to_string(&log).unwrap().ends_with("}\n"));
    }
}
