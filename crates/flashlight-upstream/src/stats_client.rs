//! Hypixel Bedwars stats client: fetch + classify, budget-controlled by a
//! [`WindowLimiter`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use flashlight_core::{CanonicalUuid, FlashlightError, RequestContext};
use flashlight_domain::{response_to_domain, PlayerPit};
use flashlight_ratelimit::WindowLimiter;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

const USER_AGENT: &str = "flashlight";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MIN_OP_TIME: Duration = Duration::ZERO;

/// Default budget: 600 requests per 5 minutes, per spec.
pub fn default_limiter() -> WindowLimiter {
    WindowLimiter::new(
        "hypixel-stats",
        600,
        Duration::from_secs(5 * 60),
        Duration::from_secs(1),
    )
}

pub struct StatsClient {
    http: Client,
    base_url: String,
    api_key: String,
    limiter: Arc<WindowLimiter>,
}

impl StatsClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, limiter: Arc<WindowLimiter>) -> Self {
        Self {
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client builder should not fail with static config"),
            base_url: base_url.into(),
            api_key: api_key.into(),
            limiter,
        }
    }

    /// Fetches and classifies the current Bedwars stats for `uuid`.
    pub async fn get_player(
        &self,
        uuid: &CanonicalUuid,
        ctx: &RequestContext,
    ) -> Result<PlayerPit, FlashlightError> {
        self.get_player_raw(uuid, ctx).await.map(|(_, pit)| pit)
    }

    /// Fetches the current Bedwars stats for `uuid`, returning both the
    /// untouched upstream JSON (for pass-through to the HTTP caller, whose
    /// contract requires exact upstream field names, per §6.3) and the
    /// classified [`PlayerPit`] (for caching, persistence, and session
    /// derivation). Both are derived from the one upstream call/validation
    /// pass, so they always agree on success/failure.
    pub async fn get_player_raw(
        &self,
        uuid: &CanonicalUuid,
        ctx: &RequestContext,
    ) -> Result<(Value, PlayerPit), FlashlightError> {
        let raw = self
            .limiter
            .limit(ctx, MIN_OP_TIME, || self.fetch_raw(uuid))
            .await
            .ok_or_else(|| {
                FlashlightError::temporarily_unavailable("stats window limiter refused admission")
            })?;

        let (body, status, queried_at) = raw?;
        let pit = response_to_domain(&body, status, queried_at)?;
        let value: Value = serde_json::from_slice(&body).map_err(|e| {
            FlashlightError::server_error(format!("failed to parse upstream body as JSON: {e}"))
        })?;
        Ok((value, pit))
    }

    async fn fetch_raw(&self, uuid: &CanonicalUuid) -> Result<(Vec<u8>, u16, chrono::DateTime<Utc>), FlashlightError> {
        let response = self
            .http
            .get(format!("{}/player", self.base_url))
            .header("User-Agent", USER_AGENT)
            .header("API-Key", &self.api_key)
            .query(&[("uuid", uuid.to_compact())])
            .send()
            .await
            .map_err(|e| FlashlightError::temporarily_unavailable(format!("hypixel request failed: {e}")))?;

        let queried_at = Utc::now();
        let status = response.status().as_u16();
        debug!(status, "stats upstream responded");

        let body = response
            .bytes()
            .await
            .map_err(|e| FlashlightError::temporarily_unavailable(format!("failed to read hypixel body: {e}")))?;

        if status >= 500 {
            warn!(status, "hypixel upstream returned server error");
        }

        Ok((body.to_vec(), status, queried_at))
    }
}
