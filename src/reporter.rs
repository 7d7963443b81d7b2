//! The `sentry`-backed `ErrorReporter`, only compiled with the `sentry`
//! feature. Outside it, `flashlight_core::TracingReporter` is the whole
//! story.

use flashlight_core::{ErrorReporter, ReportEvent};

pub struct SentryReporter;

impl ErrorReporter for SentryReporter {
    fn report(&self, event: &ReportEvent) {
        sentry::configure_scope(|scope| {
            if let Some(uuid) = &event.uuid {
                scope.set_tag("uuid", uuid);
            }
            if let Some(status_code) = event.status_code {
                scope.set_tag("status_code", status_code);
            }
            if let Some(data) = &event.data {
                scope.set_extra("data", data.clone().into());
            }
            scope.set_tag("kind", event.kind.to_string());
        });
        sentry::capture_message(&event.message, sentry::Level::Error);
    }
}
