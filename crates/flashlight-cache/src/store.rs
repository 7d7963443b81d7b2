//! The coalescing cache store: at most one `build` runs per key at a time.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};

use flashlight_core::{FlashlightError, RequestContext};
use parking_lot::Mutex;
use tokio::time::sleep;

/// Default interval waiters sleep between polls of a claimed-but-not-yet-valid
/// entry. Kept well under the 100ms bound so waiters don't busy-loop hotter
/// than it.
const DEFAULT_WAIT_INTERVAL: Duration = Duration::from_millis(25);
const MAX_WAIT_INTERVAL: Duration = Duration::from_millis(100);

enum Entry<V> {
    /// A claim has been taken and no value is available yet.
    Pending,
    Valid { value: V, inserted_at: Instant },
}

/// A cache where concurrent `get_or_create` calls for the same key coalesce:
/// the first arrival runs `build`, everyone else waits for its result.
pub struct CoalescingCache<K, V> {
    ttl: Duration,
    wait_interval: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> CoalescingCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache whose valid entries expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            wait_interval: DEFAULT_WAIT_INTERVAL,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the waiter poll interval. Clamped to [`MAX_WAIT_INTERVAL`].
    pub fn with_wait_interval(mut self, interval: Duration) -> Self {
        self.wait_interval = interval.min(MAX_WAIT_INTERVAL);
        self
    }

    /// Returns the cached value for `key`, running `build` if absent, expired,
    /// or if a concurrent caller's `build` failed.
    ///
    /// At most one `build` runs per key concurrently. Other callers arriving
    /// while a build is in flight wait for it and return its result, cloned.
    /// If the context is cancelled while waiting, or while this call is the
    /// claim holder and its surrounding future is dropped before `build`
    /// finishes, the claim is released for the next arrival to retry.
    pub async fn get_or_create<F, Fut>(
        &self,
        key: K,
        ctx: &RequestContext,
        build: F,
    ) -> Result<V, FlashlightError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, FlashlightError>>,
    {
        loop {
            if ctx.is_cancelled() {
                return Err(FlashlightError::server_error(
                    "cancelled while waiting for cache entry",
                ));
            }

            let claimed = {
                let mut entries = self.entries.lock();
                match entries.get(&key) {
                    Some(Entry::Valid { value, inserted_at }) => {
                        if inserted_at.elapsed() < self.ttl {
                            return Ok(value.clone());
                        }
                        entries.insert(key.clone(), Entry::Pending);
                        true
                    }
                    Some(Entry::Pending) => false,
                    None => {
                        entries.insert(key.clone(), Entry::Pending);
                        true
                    }
                }
            };

            if !claimed {
                tokio::select! {
                    biased;
                    _ = ctx.cancelled() => {
                        return Err(FlashlightError::server_error(
                            "cancelled while waiting for cache entry",
                        ));
                    }
                    _ = sleep(self.wait_interval) => continue,
                }
            }

            let guard = ClaimGuard {
                cache: self,
                key: key.clone(),
                done: false,
            };

            return match build().await {
                Ok(value) => {
                    guard.commit(value.clone());
                    Ok(value)
                }
                Err(err) => {
                    guard.release();
                    Err(err)
                }
            };
        }
    }

    /// Number of tracked entries, pending or valid. For tests/diagnostics.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Guarantees the `Pending` sentinel is removed if the claim holder fails,
/// is cancelled, or its future is dropped before it writes a result.
struct ClaimGuard<'a, K, V>
where
    K: Eq + Hash + Clone,
{
    cache: &'a CoalescingCache<K, V>,
    key: K,
    done: bool,
}

impl<K, V> ClaimGuard<'_, K, V>
where
    K: Eq + Hash + Clone,
{
    fn commit(mut self, value: V) {
        self.cache.entries.lock().insert(
            self.key.clone(),
            Entry::Valid {
                value,
                inserted_at: Instant::now(),
            },
        );
        self.done = true;
    }

    fn release(mut self) {
        self.cache.entries.lock().remove(&self.key);
        self.done = true;
    }
}

impl<K, V> Drop for ClaimGuard<'_, K, V>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        if !self.done {
            self.cache.entries.lock().remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn first_arrival_runs_build_and_caches_result() {
        let cache = CoalescingCache::new(Duration::from_secs(60));
        let ctx = RequestContext::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);

        let value = cache
            .get_or_create("k", &ctx, || async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, FlashlightError>(42)
            })
            .await
            .unwrap();
        assert_eq!(value, 42);

        let calls2 = Arc::clone(&calls);
        let value2 = cache
            .get_or_create("k", &ctx, || async move {
                calls2.fetch_add(1, Ordering::SeqCst);
                Ok::<_, FlashlightError>(99)
            })
            .await
            .unwrap();
        // Second call hits the cached value; build did not run again.
        assert_eq!(value2, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_waiters_coalesce_onto_one_build() {
        let cache = Arc::new(CoalescingCache::new(Duration::from_secs(60)).with_wait_interval(Duration::from_millis(5)));
        let calls = Arc::new(AtomicUsize::new(0));
        let ctx = RequestContext::new();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_create("k", &ctx, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Ok::<_, FlashlightError>("value")
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "value");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_build_releases_the_claim_for_the_next_arrival() {
        let cache = CoalescingCache::new(Duration::from_secs(60));
        let ctx = RequestContext::new();

        let first = cache
            .get_or_create("k", &ctx, || async {
                Err::<i32, _>(FlashlightError::server_error("boom"))
            })
            .await;
        assert!(first.is_err());

        let second = cache
            .get_or_create("k", &ctx, || async { Ok::<_, FlashlightError>(7) })
            .await;
        assert_eq!(second.unwrap(), 7);
    }

    #[tokio::test]
    async fn expired_entry_is_treated_as_absent() {
        let cache = CoalescingCache::new(Duration::from_millis(10));
        let ctx = RequestContext::new();

        let first = cache
            .get_or_create("k", &ctx, || async { Ok::<_, FlashlightError>(1) })
            .await
            .unwrap();
        assert_eq!(first, 1);

        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = cache
            .get_or_create("k", &ctx, || async { Ok::<_, FlashlightError>(2) })
            .await
            .unwrap();
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn a_dropped_claim_holder_releases_the_sentinel() {
        let cache = Arc::new(CoalescingCache::new(Duration::from_secs(60)));
        let ctx = RequestContext::new();

        let cache2 = Arc::clone(&cache);
        let ctx2 = ctx.clone();
        let handle = tokio::spawn(async move {
            cache2
                .get_or_create("k", &ctx2, || async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok::<_, FlashlightError>(1)
                })
                .await
        });

        // Give the claim holder a chance to insert the sentinel, then abort
        // it before it ever writes a value.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.len(), 1);
        handle.abort();
        let _ = handle.await;

        let value = cache
            .get_or_create("k", &ctx, || async { Ok::<_, FlashlightError>(5) })
            .await
            .unwrap();
        assert_eq!(value, 5);
    }
}
