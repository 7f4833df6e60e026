//! Notification subsystem
//!
//! Renders `{placeholder}` templates for accepted submissions and hands
//! the result to a [`MailTransport`].

mod mailer;
mod placeholder;
mod service;

pub use mailer::{
    create_mail_transport, MailConfig, MailError, MailResult, MailTransport, MemoryMailTransport,
    OutgoingMail, SmtpMailTransport,
};
pub use placeholder::{PlaceholderContext, PlaceholderRenderer, TIMESTAMP_FORMAT};
pub use service::{
    sanitize_recipient, NotificationOutcome, NotificationService, SubmissionNotice,
    DEFAULT_SUBJECT,
};
