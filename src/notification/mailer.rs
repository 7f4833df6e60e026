//! # Mail Transport
//!
//! Delivery of rendered notifications. The engine only depends on the
//! [`MailTransport`] trait; SMTP delivery goes through lettre.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for mail delivery
pub type MailResult<T> = Result<T, MailError>;

/// Mail delivery failures
#[derive(Debug, Clone, Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// SMTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP server host
    pub smtp_host: String,

    /// SMTP server port
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username; empty means no authentication
    #[serde(default)]
    pub smtp_user: String,

    /// SMTP password
    #[serde(default)]
    pub smtp_password: String,

    /// Sender address
    pub from_email: String,

    /// Sender display name
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_port() -> u16 {
    25
}

fn default_from_name() -> String {
    "Forms".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_user: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@forms.local".to_string(),
            from_name: default_from_name(),
        }
    }
}

/// A fully rendered plain-text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail transport abstraction
pub trait MailTransport: Send + Sync {
    /// Deliver one message
    fn send(&self, mail: &OutgoingMail) -> MailResult<()>;
}

/// Transport that keeps messages in memory
#[derive(Debug, Default)]
pub struct MemoryMailTransport {
    sent: RwLock<Vec<OutgoingMail>>,
    fail_with: Option<String>,
}

impl MemoryMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every send fails with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            fail_with: Some(reason.into()),
        }
    }

    /// Messages delivered so far
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.read().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.write() {
            sent.clear();
        }
    }
}

impl MailTransport for MemoryMailTransport {
    fn send(&self, mail: &OutgoingMail) -> MailResult<()> {
        if let Some(reason) = &self.fail_with {
            return Err(MailError::Transport(reason.clone()));
        }
        self.sent
            .write()
            .map_err(|_| MailError::Transport("mailbox lock poisoned".into()))?
            .push(mail.clone());
        Ok(())
    }
}

/// SMTP transport
pub struct SmtpMailTransport {
    config: MailConfig,
}

impl SmtpMailTransport {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, mail: &OutgoingMail) -> MailResult<lettre::Message> {
        use lettre::message::header::ContentType;

        lettre::Message::builder()
            .from(
                format!("{} <{}>", self.config.from_name, self.config.from_email)
                    .parse()
                    .map_err(|e| MailError::InvalidAddress(format!("from: {}", e)))?,
            )
            .to(mail
                .to
                .parse()
                .map_err(|e| MailError::InvalidAddress(format!("to: {}", e)))?)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

impl MailTransport for SmtpMailTransport {
    fn send(&self, mail: &OutgoingMail) -> MailResult<()> {
        use lettre::{transport::smtp::authentication::Credentials, SmtpTransport, Transport};

        let message = self.build_message(mail)?;

        let mailer = if self.config.smtp_user.is_empty() {
            // Unauthenticated relays (local development servers)
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_user.clone(),
                self.config.smtp_password.clone(),
            );

            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(|e| MailError::Transport(format!("relay: {}", e)))?
                .credentials(creds)
                .port(self.config.smtp_port)
                .build()
        };

        mailer
            .send(&message)
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Create a transport from optional SMTP settings
pub fn create_mail_transport(config: Option<MailConfig>) -> Arc<dyn MailTransport> {
    match config {
        Some(cfg) => Arc::new(SmtpMailTransport::new(cfg)),
        None => Arc::new(MemoryMailTransport::new()),
    }
}
