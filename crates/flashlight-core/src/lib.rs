//! Core infrastructure shared across flashlight's crates.
//!
//! This crate provides:
//! - the error taxonomy ([`FlashlightError`]/[`ErrorKind`]) and message
//!   sanitization used by the reporter and the HTTP error writer
//! - canonical UUID normalization ([`CanonicalUuid`])
//! - a small event system used for observability in the cache and rate
//!   limiters

pub mod context;
pub mod error;
pub mod events;
pub mod report;
pub mod uuid;

pub use context::RequestContext;
pub use error::{sanitize_message, ErrorKind, FlashlightError};
pub use events::{EventListener, EventListeners, FlashlightEvent, FnListener};
pub use report::{report_if_noteworthy, ErrorReporter, ReportEvent, TracingReporter};
pub use uuid::CanonicalUuid;
