//! # In-Memory Form Store

use std::collections::HashMap;
use std::sync::RwLock;

use super::errors::{StoreError, StoreResult};
use super::{newest_first, FormStore, NewSubmission, SubmissionRecord};

#[derive(Debug, Clone)]
struct FormEntry {
    title: String,
    schema: Option<String>,
}

/// Volatile store for tests and one-shot commands
#[derive(Debug, Default)]
pub struct MemoryFormStore {
    forms: RwLock<HashMap<u64, FormEntry>>,
    submissions: RwLock<Vec<SubmissionRecord>>,
}

impl MemoryFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.read().map(|s| s.len()).unwrap_or(0)
    }
}

impl FormStore for MemoryFormStore {
    fn register_form(&self, form_id: u64, title: &str) -> StoreResult<()> {
        let mut forms = self.forms.write().map_err(|_| StoreError::LockPoisoned)?;
        forms
            .entry(form_id)
            .and_modify(|entry| entry.title = title.to_string())
            .or_insert_with(|| FormEntry {
                title: title.to_string(),
                schema: None,
            });
        Ok(())
    }

    fn form_title(&self, form_id: u64) -> StoreResult<Option<String>> {
        let forms = self.forms.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(forms.get(&form_id).map(|entry| entry.title.clone()))
    }

    fn load_schema(&self, form_id: u64) -> StoreResult<Option<String>> {
        let forms = self.forms.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(forms.get(&form_id).and_then(|entry| entry.schema.clone()))
    }

    fn save_schema(&self, form_id: u64, raw: &str) -> StoreResult<()> {
        let mut forms = self.forms.write().map_err(|_| StoreError::LockPoisoned)?;
        let entry = forms
            .get_mut(&form_id)
            .ok_or(StoreError::FormNotFound(form_id))?;
        entry.schema = Some(raw.to_string());
        Ok(())
    }

    fn delete_schema(&self, form_id: u64) -> StoreResult<()> {
        let mut forms = self.forms.write().map_err(|_| StoreError::LockPoisoned)?;
        let entry = forms
            .get_mut(&form_id)
            .ok_or(StoreError::FormNotFound(form_id))?;
        entry.schema = None;
        Ok(())
    }

    fn insert_submission(&self, submission: NewSubmission) -> StoreResult<u64> {
        if self.form_title(submission.form_id)?.is_none() {
            return Err(StoreError::FormNotFound(submission.form_id));
        }

        let mut submissions = self.submissions.write().map_err(|_| StoreError::LockPoisoned)?;
        let id = submissions.len() as u64 + 1;
        submissions.push(SubmissionRecord::from_new(id, submission));
        Ok(id)
    }

    fn list_submissions(&self, form_id: Option<u64>, limit: usize) -> StoreResult<Vec<SubmissionRecord>> {
        let submissions = self.submissions.read().map_err(|_| StoreError::LockPoisoned)?;
        let matching = submissions
            .iter()
            .filter(|record| form_id.map_or(true, |id| record.form_id == id))
            .cloned()
            .collect();
        Ok(newest_first(matching, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn submission(form_id: u64, at: &str) -> NewSubmission {
        let mut data = IndexMap::new();
        data.insert("name".to_string(), "Alice".to_string());
        NewSubmission {
            form_id,
            data,
            client_ip: Some("127.0.0.1".to_string()),
            submitted_at: at.to_string(),
        }
    }

    #[test]
    fn test_register_and_rename_keeps_schema() {
        let store = MemoryFormStore::new();
        store.register_form(1, "Contact").unwrap();
        store.save_schema(1, "{}").unwrap();
        store.register_form(1, "Contact us").unwrap();

        assert_eq!(store.form_title(1).unwrap().as_deref(), Some("Contact us"));
        assert_eq!(store.load_schema(1).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_schema_requires_registered_form() {
        let store = MemoryFormStore::new();
        assert!(matches!(store.save_schema(9, "{}"), Err(StoreError::FormNotFound(9))));
        assert_eq!(store.load_schema(9).unwrap(), None);
    }

    #[test]
    fn test_delete_schema() {
        let store = MemoryFormStore::new();
        store.register_form(1, "Contact").unwrap();
        store.save_schema(1, "{}").unwrap();
        store.delete_schema(1).unwrap();
        assert_eq!(store.load_schema(1).unwrap(), None);
    }

    #[test]
    fn test_insert_and_list() {
        let store = MemoryFormStore::new();
        store.register_form(1, "A").unwrap();
        store.register_form(2, "B").unwrap();

        assert_eq!(store.insert_submission(submission(1, "2024-01-01 00:00:00")).unwrap(), 1);
        assert_eq!(store.insert_submission(submission(2, "2024-01-02 00:00:00")).unwrap(), 2);
        assert_eq!(store.insert_submission(submission(1, "2024-01-03 00:00:00")).unwrap(), 3);

        let all = store.list_submissions(None, 10).unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2, 1]);

        let form_one = store.list_submissions(Some(1), 1).unwrap();
        assert_eq!(form_one.len(), 1);
        assert_eq!(form_one[0].id, 3);
        assert_eq!(form_one[0].ip_address.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn test_insert_unknown_form() {
        let store = MemoryFormStore::new();
        assert!(store.insert_submission(submission(5, "2024-01-01 00:00:00")).is_err());
        assert_eq!(store.submission_count(), 0);
    }
}
