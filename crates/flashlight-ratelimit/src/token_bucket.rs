//! Per-key token-bucket limiter: `consume(key) -> bool`, never blocks.

use std::time::{Duration, Instant};

use flashlight_core::EventListeners;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::events::RateLimiterEvent;

struct Bucket {
    credits: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl Bucket {
    fn new(burst_size: f64, now: Instant) -> Self {
        Self {
            credits: burst_size,
            last_refill: now,
            last_seen: now,
        }
    }

    fn refill(&mut self, refill_per_second: f64, burst_size: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.credits = (self.credits + elapsed * refill_per_second).min(burst_size);
        self.last_refill = now;
    }
}

/// A token bucket per key, with continuous refill and idle-bucket reaping.
///
/// Unseen keys start with a full bucket. `consume` never blocks: it either
/// takes a credit immediately or refuses.
pub struct TokenBucket {
    name: String,
    refill_per_second: f64,
    burst_size: f64,
    idle_timeout: Duration,
    buckets: Mutex<HashMap<String, Bucket>>,
    events: EventListeners<RateLimiterEvent>,
}

impl TokenBucket {
    /// Creates a bucket keyed by string, refilling at `refill_per_second`
    /// credits/second up to `burst_size`, reaping entries idle longer than
    /// `idle_timeout`.
    pub fn new(
        name: impl Into<String>,
        refill_per_second: f64,
        burst_size: f64,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            refill_per_second,
            burst_size,
            idle_timeout,
            buckets: Mutex::new(HashMap::new()),
            events: EventListeners::new(),
        }
    }

    /// Registers an observer for permit-acquired/rejected events.
    pub fn with_listener<L>(mut self, listener: L) -> Self
    where
        L: flashlight_core::EventListener<RateLimiterEvent> + 'static,
    {
        self.events.add(listener);
        self
    }

    /// Attempts to consume one credit for `key`. Never blocks.
    pub fn consume(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock();
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(self.burst_size, now));

        bucket.refill(self.refill_per_second, self.burst_size, now);
        bucket.last_seen = now;

        let admitted = if bucket.credits >= 1.0 {
            bucket.credits -= 1.0;
            true
        } else {
            false
        };
        drop(buckets);

        if admitted {
            self.events.emit(&RateLimiterEvent::PermitAcquired {
                limiter: self.name.clone(),
                timestamp: now,
                wait: Duration::ZERO,
            });
        } else {
            self.events.emit(&RateLimiterEvent::PermitRejected {
                limiter: self.name.clone(),
                timestamp: now,
            });
        }
        admitted
    }

    /// Removes buckets that haven't been touched in longer than
    /// `idle_timeout`. Intended to be called periodically by a background
    /// task so idle keys don't accumulate forever.
    pub fn reap_idle(&self) {
        let now = Instant::now();
        let idle_timeout = self.idle_timeout;
        self.buckets
            .lock()
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_seen) < idle_timeout);
    }

    /// Number of tracked keys. Exposed for tests and diagnostics.
    pub fn tracked_keys(&self) -> usize {
        self.buckets.lock().len()
    }
}
