//! `{placeholder}` substitution for notification templates
//!
//! Substitution is a single literal pass, not a template language:
//! - at each position the longest matching `{key}` token wins
//! - replaced values are never rescanned
//! - tokens without a context entry stay verbatim
//! - no escaping is applied; values are plain text already

use chrono::{FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use indexmap::IndexMap;

use crate::submission::sanitize::sanitize_text;

/// Storage format of submission timestamps (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Values available to a template, keyed without braces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderContext {
    values: IndexMap<String, String>,
}

impl PlaceholderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `{key}` to `value`, replacing any earlier value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Renders notification templates against a [`PlaceholderContext`].
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderRenderer {
    offset: FixedOffset,
}

impl Default for PlaceholderRenderer {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl PlaceholderRenderer {
    /// Creates a renderer that presents dates in `offset`.
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Builds the context for one accepted submission.
    ///
    /// Field entries are added after the built-ins, so a field whose id
    /// collides with a built-in name overrides it.
    pub fn context_for_submission<'a, I>(
        &self,
        form_title: &str,
        submission_id: u64,
        submitted_at: &str,
        data: I,
    ) -> PlaceholderContext
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut context = PlaceholderContext::new();
        context.insert("form_title", form_title);
        context.insert("submission_id", submission_id.to_string());
        context.insert("submission_date", self.submission_date(submitted_at));
        for (key, value) in data {
            context.insert(key.clone(), value.clone());
        }
        context
    }

    /// Presents a stored UTC timestamp in the configured offset.
    ///
    /// Empty input yields the current time in UTC; unparsable input is
    /// returned unchanged.
    pub fn submission_date(&self, submitted_at: &str) -> String {
        if submitted_at.is_empty() {
            return Utc::now().format(TIMESTAMP_FORMAT).to_string();
        }

        match NaiveDateTime::parse_from_str(submitted_at, TIMESTAMP_FORMAT) {
            Ok(naive) => self
                .offset
                .from_utc_datetime(&naive)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
            Err(_) => submitted_at.to_string(),
        }
    }

    /// Replaces every known `{key}` token in `template`.
    pub fn render(&self, template: &str, context: &PlaceholderContext) -> String {
        let tokens: Vec<(String, &str)> = context
            .values
            .iter()
            .map(|(key, value)| (format!("{{{}}}", key), value.as_str()))
            .collect();

        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let candidate = &rest[pos..];

            let longest = tokens
                .iter()
                .filter(|(token, _)| candidate.starts_with(token.as_str()))
                .max_by_key(|(token, _)| token.len());

            match longest {
                Some((token, value)) => {
                    out.push_str(value);
                    rest = &candidate[token.len()..];
                }
                None => {
                    out.push('{');
                    rest = &candidate[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Renders a subject line and flattens it to a single line.
    pub fn render_subject(&self, template: &str, context: &PlaceholderContext) -> String {
        sanitize_text(&self.render(template, context))
    }
}
