//! CLI command implementations

use std::path::Path;

use serde_json::{json, Value};

use crate::config::FormsConfig;
use crate::forms::{FormEngine, Request};
use crate::observability::{Event, Logger};
use crate::schema::SchemaAuthoringValidator;
use crate::submission::{SubmissionPayload, SubmissionValidator};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_file, read_lines, write_error, write_response, write_text};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args().command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::CheckSchema { file } => check_schema(&file),
        Command::Validate { schema, submission } => validate(&schema, &submission),
        Command::Template => write_text(&FormEngine::template()),
        Command::Serve { config } => serve(&config),
        Command::Submissions {
            config,
            form,
            limit,
        } => submissions(&config, form, limit),
    }
}

/// Checks a schema file and reports its field ids
pub fn check_schema(path: &Path) -> CliResult<()> {
    let raw = read_file(path)?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|_| CliError::invalid_input("Invalid schema payload. Expected JSON data."))?;

    let schema = SchemaAuthoringValidator::new()
        .validate(&value)
        .map_err(|violation| CliError::invalid_schema(violation.reason()))?;

    let ids: Vec<&str> = schema.fields.iter().map(|f| f.id.as_str()).collect();
    write_response(json!({
        "version": schema.version,
        "fields": ids,
        "notifications": schema.notifications().map(|n| n.enabled).unwrap_or(false),
    }))
}

/// Validates a submission file against a schema file without storing it
pub fn validate(schema_path: &Path, submission_path: &Path) -> CliResult<()> {
    let raw_schema = read_file(schema_path)?;
    let submission: Value = serde_json::from_str(&read_file(submission_path)?)
        .map_err(|e| CliError::invalid_input(format!("Invalid submission JSON: {}", e)))?;

    let payload = SubmissionPayload::from_json(&submission);
    let result = SubmissionValidator::new().validate_raw(Some(&raw_schema), &payload);

    write_response(serde_json::to_value(&result)?)?;
    if !result.is_valid() {
        return Err(CliError::submission_rejected(result.errors().len()));
    }
    Ok(())
}

/// Serving loop: one JSON request per stdin line, one response per stdout
/// line. Request-level failures are answered and the loop continues; a
/// failed read ends it.
pub fn serve(config_path: &Path) -> CliResult<()> {
    let engine = boot(config_path)?;
    Logger::event(Event::Serving, &[]);

    for line in read_lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                write_error(e.code_str(), e.message())?;
                break;
            }
        };

        match Request::from_json(&line).and_then(|request| engine.dispatch(request)) {
            Ok(response) => write_response(serde_json::to_value(response)?)?,
            Err(e) => {
                let message = e.to_string();
                Logger::event(
                    Event::RequestFailed,
                    &[("code", e.code()), ("message", message.as_str())],
                );
                write_error(e.code(), &message)?;
            }
        }
    }

    Ok(())
}

pub fn submissions(config_path: &Path, form: Option<u64>, limit: Option<usize>) -> CliResult<()> {
    let engine = boot(config_path)?;
    let records = engine.list_submissions(form, limit)?;
    write_response(json!({ "submissions": records }))
}

fn boot(config_path: &Path) -> CliResult<FormEngine> {
    let config = FormsConfig::load(config_path)?;
    let data_dir = config.data_dir.clone();
    Logger::event(
        Event::ConfigLoaded,
        &[
            ("data_dir", data_dir.as_str()),
            ("timezone", config.timezone.as_str()),
        ],
    );
    Ok(FormEngine::assemble(&config)?)
}
