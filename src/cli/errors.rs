//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit status.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::forms::FormsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file missing or invalid
    ConfigError,
    /// stdin/stdout or input file failure
    IoError,
    /// Input file is not the expected JSON
    InvalidInput,
    /// Schema broke an authoring rule
    InvalidSchema,
    /// Submission failed validation
    SubmissionRejected,
    /// Engine could not be started or failed outside a request
    EngineError,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "FORMGATE_CLI_CONFIG_ERROR",
            Self::IoError => "FORMGATE_CLI_IO_ERROR",
            Self::InvalidInput => "FORMGATE_CLI_INVALID_INPUT",
            Self::InvalidSchema => "FORMGATE_CLI_INVALID_SCHEMA",
            Self::SubmissionRejected => "FORMGATE_CLI_SUBMISSION_REJECTED",
            Self::EngineError => "FORMGATE_CLI_ENGINE_ERROR",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidInput, msg)
    }

    pub fn invalid_schema(reason: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidSchema, reason)
    }

    pub fn submission_rejected(error_count: usize) -> Self {
        Self::new(
            CliErrorCode::SubmissionRejected,
            format!("Submission rejected with {} error(s)", error_count),
        )
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<FormsError> for CliError {
    fn from(e: FormsError) -> Self {
        match e {
            FormsError::Config(inner) => inner.into(),
            FormsError::Schema(violation) => Self::invalid_schema(violation.reason()),
            FormsError::InvalidPayload => Self::invalid_input(e.to_string()),
            other => Self::new(CliErrorCode::EngineError, other.to_string()),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
