//! Shared application state handed to every route and middleware.

use std::sync::Arc;
use std::time::Duration;

use flashlight_cache::CoalescingCache;
use flashlight_core::{CanonicalUuid, ErrorReporter, FlashlightError};
use flashlight_domain::PlayerPit;
use flashlight_ratelimit::TokenBucket;
use flashlight_repository::PlayerRepository;
use flashlight_upstream::{AccountClient, StatsClient};
use serde_json::Value;

use crate::error::ApiError;

/// The cache entry's TTL: how long a fetched player record is served without
/// another upstream round trip.
pub const PLAYER_CACHE_TTL: Duration = Duration::from_secs(60);

/// Deadline for the detached persistence write issued after a cache-filling
/// fetch, so a client disconnect doesn't also lose the data point.
pub const PERSIST_DEADLINE: Duration = Duration::from_secs(1);

/// A cached player lookup: the untouched upstream JSON (returned verbatim to
/// HTTP callers, byte-for-byte stable across cache hits) alongside the
/// classified domain value (used for persistence and session derivation).
pub type CachedPlayer = (Value, PlayerPit);

#[derive(Clone)]
pub struct AppState(Arc<Inner>);

struct Inner {
    pub cache: CoalescingCache<CanonicalUuid, CachedPlayer>,
    pub stats_client: StatsClient,
    pub account_client: AccountClient,
    pub repository: Arc<dyn PlayerRepository>,
    pub reporter: Arc<dyn ErrorReporter>,
    pub ip_limiter: Arc<TokenBucket>,
    pub user_limiter: Arc<TokenBucket>,
}

impl AppState {
    pub fn new(
        stats_client: StatsClient,
        account_client: AccountClient,
        repository: Arc<dyn PlayerRepository>,
        reporter: Arc<dyn ErrorReporter>,
        ip_limiter: Arc<TokenBucket>,
        user_limiter: Arc<TokenBucket>,
    ) -> Self {
        Self(Arc::new(Inner {
            cache: CoalescingCache::new(PLAYER_CACHE_TTL),
            stats_client,
            account_client,
            repository,
            reporter,
            ip_limiter,
            user_limiter,
        }))
    }

    pub fn cache(&self) -> &CoalescingCache<CanonicalUuid, CachedPlayer> {
        &self.0.cache
    }

    pub fn stats_client(&self) -> &StatsClient {
        &self.0.stats_client
    }

    pub fn account_client(&self) -> &AccountClient {
        &self.0.account_client
    }

    pub fn repository(&self) -> &Arc<dyn PlayerRepository> {
        &self.0.repository
    }

    pub fn reporter(&self) -> &Arc<dyn ErrorReporter> {
        &self.0.reporter
    }

    pub fn ip_limiter(&self) -> &TokenBucket {
        &self.0.ip_limiter
    }

    pub fn user_limiter(&self) -> &TokenBucket {
        &self.0.user_limiter
    }

    pub fn user_limiter_handle(&self) -> Arc<TokenBucket> {
        Arc::clone(&self.0.user_limiter)
    }

    pub fn ip_limiter_handle(&self) -> Arc<TokenBucket> {
        Arc::clone(&self.0.ip_limiter)
    }

    /// Wraps an error together with this state's reporter, so converting it
    /// to a response (via `?` into `Result<_, ApiError>`) also reports it per
    /// §7 when its kind is noteworthy.
    pub fn api_error(&self, error: FlashlightError) -> ApiError {
        ApiError::new(error, Arc::clone(&self.0.reporter))
    }
}
