//! Observable events
//!
//! Every log line the engine writes names one of these.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    ConfigLoaded,
    Serving,

    // Schema authoring
    SchemaSaved,
    SchemaRejected,
    SchemaCleared,

    // Submissions
    SubmissionAccepted,
    SubmissionRejected,

    // Notifications
    NotificationSent,
    NotificationSkipped,
    /// Transport error; the submission itself is already stored
    NotificationFailed,

    /// A request could not be decoded or failed at a boundary
    RequestFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::Serving => "SERVING",
            Event::SchemaSaved => "SCHEMA_SAVED",
            Event::SchemaRejected => "SCHEMA_REJECTED",
            Event::SchemaCleared => "SCHEMA_CLEARED",
            Event::SubmissionAccepted => "SUBMISSION_ACCEPTED",
            Event::SubmissionRejected => "SUBMISSION_REJECTED",
            Event::NotificationSent => "NOTIFICATION_SENT",
            Event::NotificationSkipped => "NOTIFICATION_SKIPPED",
            Event::NotificationFailed => "NOTIFICATION_FAILED",
            Event::RequestFailed => "REQUEST_FAILED",
        }
    }

    /// Severity used by [`Logger::event`](super::Logger::event)
    pub fn severity(&self) -> Severity {
        match self {
            Event::NotificationSkipped => Severity::Trace,
            Event::SchemaRejected | Event::SubmissionRejected | Event::NotificationFailed => {
                Severity::Warn
            }
            Event::RequestFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake() {
        for event in [
            Event::ConfigLoaded,
            Event::SchemaSaved,
            Event::SubmissionRejected,
            Event::NotificationFailed,
        ] {
            let name = event.as_str();
            assert!(name.chars().all(|c| c.is_ascii_uppercase() || c == '_'), "{}", name);
        }
    }

    #[test]
    fn test_failures_are_not_info() {
        assert_eq!(Event::NotificationFailed.severity(), Severity::Warn);
        assert_eq!(Event::RequestFailed.severity(), Severity::Error);
        assert_eq!(Event::SchemaSaved.severity(), Severity::Info);
    }
}
