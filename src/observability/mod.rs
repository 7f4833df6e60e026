//! Observability
//!
//! Structured JSON-line logging of typed engine events. Logging is
//! read-only: it never changes the outcome of an operation.
//!
//! ```ignore
//! use formgate::observability::{Event, Logger};
//!
//! Logger::event(Event::SchemaSaved, &[("form_id", "7")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
