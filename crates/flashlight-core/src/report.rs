//! External error reporting hook.
//!
//! Distinct from [`crate::events`]: events are internal, high-volume
//! instrumentation signals; a [`ReportEvent`] is a single noteworthy failure
//! headed to an external sink (Sentry, a log aggregator), already sanitized
//! and deduplication-ready.

use crate::error::{sanitize_message, ErrorKind, FlashlightError};

/// A single reportable failure, carrying enough context for an external sink
/// to group and triage it without leaking identifying information.
#[derive(Debug, Clone)]
pub struct ReportEvent {
    pub kind: ErrorKind,
    pub message: String,
    pub uuid: Option<String>,
    pub status_code: Option<u16>,
    pub data: Option<String>,
}

impl ReportEvent {
    /// Builds a [`ReportEvent`] from a [`FlashlightError`], sanitizing the
    /// message for use as an alert-grouping fingerprint.
    pub fn from_error(error: &FlashlightError) -> Self {
        Self {
            kind: error.kind,
            message: sanitize_message(&error.message),
            uuid: None,
            status_code: None,
            data: None,
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(sanitize_message(&data.into()));
        self
    }
}

/// Forwards reportable failures to an external sink. Implementations must be
/// cheap to call from the hot path: reporting only happens for
/// [`ErrorKind::ServerError`] and [`ErrorKind::TemporarilyUnavailable`].
pub trait ErrorReporter: Send + Sync {
    fn report(&self, event: &ReportEvent);
}

/// Reports through `tracing`, at `error!` for `ServerError` and `warn!` for
/// everything else reportable. The default reporter outside of tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, event: &ReportEvent) {
        match event.kind {
            ErrorKind::ServerError => tracing::error!(
                kind = %event.kind,
                uuid = event.uuid.as_deref(),
                status_code = event.status_code,
                data = event.data.as_deref(),
                "{}",
                event.message
            ),
            _ => tracing::warn!(
                kind = %event.kind,
                uuid = event.uuid.as_deref(),
                status_code = event.status_code,
                data = event.data.as_deref(),
                "{}",
                event.message
            ),
        }
    }
}

/// Reports an error only if its kind is reportable per [`ErrorKind::should_report`].
pub fn report_if_noteworthy(reporter: &dyn ErrorReporter, error: &FlashlightError) {
    if error.kind.should_report() {
        reporter.report(&ReportEvent::from_error(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingReporter(Arc<Mutex<Vec<ReportEvent>>>);

    impl ErrorReporter for RecordingReporter {
        fn report(&self, event: &ReportEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn reports_server_error_and_temporarily_unavailable() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let reporter = RecordingReporter(Arc::clone(&log));

        report_if_noteworthy(&reporter, &FlashlightError::server_error("boom"));
        report_if_noteworthy(&reporter, &FlashlightError::temporarily_unavailable("slow"));
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn does_not_report_client_error_or_not_found() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let reporter = RecordingReporter(Arc::clone(&log));

        report_if_noteworthy(&reporter, &FlashlightError::client_error("bad input"));
        report_if_noteworthy(&reporter, &FlashlightError::player_not_found());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn sanitizes_message_and_data() {
        let event = ReportEvent::from_error(&FlashlightError::server_error(
            "failed for 1234abcd-1234-5678-9abc-1234567890ab",
        ))
        .with_data("from 192.0.2.7:8080");

        assert_eq!(event.message, "failed for <uuid>");
        assert_eq!(event.data.as_deref(), Some("<host>"));
    }
}
