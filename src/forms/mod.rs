//! Form engine and request dispatch
//!
//! [`FormEngine`] is the composition root: it owns the store, both
//! validators and the notification service. [`Request`]/[`Response`] give
//! every operation a serializable shape for the line protocol.

mod dispatch;
mod engine;
mod errors;

pub use dispatch::{Request, Response};
pub use engine::{FormEngine, SaveOutcome, SubmitOutcome};
pub use errors::{FormsError, FormsResult};
