//! Events emitted by the rate limiters, for logging and tests.

use std::time::{Duration, Instant};

use flashlight_core::FlashlightEvent;

/// An event emitted by a [`crate::TokenBucket`] or [`crate::WindowLimiter`].
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    /// A permit was granted, optionally after waiting.
    PermitAcquired {
        limiter: String,
        timestamp: Instant,
        wait: Duration,
    },
    /// A permit was refused.
    PermitRejected {
        limiter: String,
        timestamp: Instant,
    },
}

impl FlashlightEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RateLimiterEvent::PermitAcquired { .. } => "permit_acquired",
            RateLimiterEvent::PermitRejected { .. } => "permit_rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RateLimiterEvent::PermitAcquired { timestamp, .. }
            | RateLimiterEvent::PermitRejected { timestamp, .. } => *timestamp,
        }
    }

    fn component_name(&self) -> &str {
        match self {
            RateLimiterEvent::PermitAcquired { limiter, .. }
            | RateLimiterEvent::PermitRejected { limiter, .. } => limiter,
        }
    }
}
