//! `N` permits per sliding window `W`, with forced per-call pacing.

use std::collections::VecDeque;
use std::future::Future;
use std::time::{Duration, Instant};

use flashlight_core::{EventListeners, RequestContext};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::time::sleep;

use crate::events::RateLimiterEvent;

/// Sliding log of admission timestamps capped at `limit` entries within
/// `window`. Mirrors the sliding-log rate limiter: an entry counts against
/// the budget until `window` has elapsed since it was recorded, regardless
/// of how quickly the call that recorded it actually finished.
struct SlidingLog {
    limit: usize,
    window: Duration,
    log: VecDeque<Instant>,
}

impl SlidingLog {
    fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            log: VecDeque::with_capacity(limit),
        }
    }

    /// Returns `Ok(())` if a slot was reserved, or `Err(wait)` with how long
    /// until the oldest entry expires.
    fn try_reserve(&mut self, now: Instant) -> Result<(), Duration> {
        while let Some(&oldest) = self.log.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.log.pop_front();
            } else {
                break;
            }
        }

        if self.log.len() < self.limit {
            self.log.push_back(now);
            Ok(())
        } else {
            let oldest = *self.log.front().expect("limit > 0 implies log non-empty");
            let wait = (oldest + self.window).saturating_duration_since(now);
            Err(wait)
        }
    }
}

/// Admits at most `N` concurrently-held permits, where each admission also
/// counts against an `N`-per-window-`W` throughput budget. After the guarded
/// call returns, the caller is forced to sleep until `max(elapsed, min_op_time)`
/// has passed before the concurrency permit is released, which smooths
/// bursts down to roughly `N / min_op_time` sustained throughput even when
/// the guarded call is fast.
pub struct WindowLimiter {
    name: String,
    wait_timeout: Duration,
    semaphore: Semaphore,
    log: Mutex<SlidingLog>,
    events: EventListeners<RateLimiterEvent>,
}

impl WindowLimiter {
    /// `limit` permits per `window`; a caller that can't be admitted within
    /// `wait_timeout` is refused.
    pub fn new(name: impl Into<String>, limit: usize, window: Duration, wait_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            wait_timeout,
            semaphore: Semaphore::new(limit),
            log: Mutex::new(SlidingLog::new(limit, window)),
            events: EventListeners::new(),
        }
    }

    pub fn with_listener<L>(mut self, listener: L) -> Self
    where
        L: flashlight_core::EventListener<RateLimiterEvent> + 'static,
    {
        self.events.add(listener);
        self
    }

    /// Runs `f` under the limiter. Returns `None` if admission was refused
    /// or `ctx` was cancelled before or during the call; otherwise `Some`
    /// with `f`'s result.
    pub async fn limit<F, Fut, T>(&self, ctx: &RequestContext, min_op_time: Duration, f: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let wait_start = Instant::now();
        let permit = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                self.emit_rejected();
                return None;
            }
            acquired = self.acquire(ctx) => acquired?,
        };

        self.events.emit(&RateLimiterEvent::PermitAcquired {
            limiter: self.name.clone(),
            timestamp: Instant::now(),
            wait: wait_start.elapsed(),
        });

        let start = Instant::now();
        let output = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                drop(permit);
                return None;
            }
            out = f() => out,
        };

        let elapsed = start.elapsed();
        let extra_sleep = min_op_time.saturating_sub(elapsed);
        if extra_sleep > Duration::ZERO {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => {}
                _ = sleep(extra_sleep) => {}
            }
        }

        drop(permit);
        Some(output)
    }

    async fn acquire(&self, ctx: &RequestContext) -> Option<tokio::sync::SemaphorePermit<'_>> {
        loop {
            if ctx.is_cancelled() {
                return None;
            }

            let now = Instant::now();
            let wait = {
                let mut log = self.log.lock();
                match log.try_reserve(now) {
                    Ok(()) => None,
                    Err(wait) => Some(wait),
                }
            };

            match wait {
                None => {
                    return self.semaphore.acquire().await.ok();
                }
                Some(wait) if wait <= self.wait_timeout => {
                    tokio::select! {
                        biased;
                        _ = ctx.cancelled() => return None,
                        _ = sleep(wait) => continue,
                    }
                }
                Some(_) => {
                    self.emit_rejected();
                    return None;
                }
            }
        }
    }

    fn emit_rejected(&self) {
        self.events.emit(&RateLimiterEvent::PermitRejected {
            limiter: self.name.clone(),
            timestamp: Instant::now(),
        });
    }
}
