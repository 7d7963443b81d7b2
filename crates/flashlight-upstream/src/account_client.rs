//! Mojang identity client: direct UUID lookup plus a batching username
//! lookup that coalesces concurrent callers into bulk upstream requests.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use flashlight_core::{CanonicalUuid, FlashlightError, RequestContext};
use flashlight_domain::Account;
use flashlight_ratelimit::{ComposedLimiter, WindowLimiter};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

const USER_AGENT: &str = "flashlight";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MIN_OP_TIME: Duration = Duration::ZERO;

const BATCH_SIZE: usize = 10;
const BATCH_TIMEOUT: Duration = Duration::from_millis(50);

/// Composed budget: a 50-per-8s burst layer in front of a 600-per-10min base
/// layer, per spec.
pub fn default_limiter() -> ComposedLimiter {
    ComposedLimiter::new(vec![
        Arc::new(WindowLimiter::new(
            "mojang-burst",
            50,
            Duration::from_secs(8),
            Duration::from_secs(1),
        )),
        Arc::new(WindowLimiter::new(
            "mojang-base",
            600,
            Duration::from_secs(10 * 60),
            Duration::from_secs(1),
        )),
    ])
}

#[derive(Debug, Deserialize)]
struct MojangProfile {
    id: String,
    name: String,
}

struct BatchItem {
    username: String,
    reply: oneshot::Sender<Result<Account, FlashlightError>>,
}

pub struct AccountClient {
    http: Client,
    base_url: String,
    limiter: Arc<ComposedLimiter>,
    batch_tx: mpsc::UnboundedSender<BatchItem>,
}

impl AccountClient {
    pub fn new(base_url: impl Into<String>, limiter: ComposedLimiter) -> Self {
        let base_url = base_url.into();
        let limiter = Arc::new(limiter);
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client builder should not fail with static config");

        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        tokio::spawn(batch_worker(
            batch_rx,
            http.clone(),
            base_url.clone(),
            Arc::clone(&limiter),
        ));

        Self {
            http,
            base_url,
            limiter,
            batch_tx,
        }
    }

    pub async fn get_by_uuid(
        &self,
        uuid: &CanonicalUuid,
        ctx: &RequestContext,
    ) -> Result<Account, FlashlightError> {
        let uuid = uuid.clone();
        let http = &self.http;
        let base_url = &self.base_url;
        self.limiter
            .limit(ctx, MIN_OP_TIME, || fetch_by_uuid(http, base_url, &uuid))
            .await
            .ok_or_else(|| {
                FlashlightError::temporarily_unavailable("account window limiter refused admission")
            })?
    }

    /// Coalesces with other concurrent `get_by_username` calls into a bulk
    /// request, issued by the background batching worker.
    pub async fn get_by_username(&self, username: &str) -> Result<Account, FlashlightError> {
        let (reply, receiver) = oneshot::channel();
        self.batch_tx
            .send(BatchItem {
                username: username.to_string(),
                reply,
            })
            .map_err(|_| FlashlightError::server_error("account batching worker is not running"))?;

        receiver
            .await
            .map_err(|_| FlashlightError::server_error("account batching worker dropped its reply"))?
    }
}

async fn batch_worker(
    mut rx: mpsc::UnboundedReceiver<BatchItem>,
    http: Client,
    base_url: String,
    limiter: Arc<ComposedLimiter>,
) {
    loop {
        let first = match rx.recv().await {
            Some(item) => item,
            None => return,
        };
        let mut batch = vec![first];
        let deadline = tokio::time::sleep(BATCH_TIMEOUT);
        tokio::pin!(deadline);

        let mut channel_closed = false;
        while batch.len() < BATCH_SIZE {
            tokio::select! {
                biased;
                item = rx.recv() => {
                    match item {
                        Some(item) => batch.push(item),
                        None => {
                            channel_closed = true;
                            break;
                        }
                    }
                }
                _ = &mut deadline => break,
            }
        }

        debug!(batch_size = batch.len(), "dispatching username batch");
        process_batch(&http, &base_url, &limiter, batch).await;

        if channel_closed {
            return;
        }
    }
}

async fn process_batch(http: &Client, base_url: &str, limiter: &ComposedLimiter, batch: Vec<BatchItem>) {
    let ctx = RequestContext::new();
    let usernames: Vec<String> = batch.iter().map(|item| item.username.clone()).collect();

    let bulk = limiter
        .limit(&ctx, MIN_OP_TIME, || fetch_bulk(http, base_url, &usernames))
        .await;

    match bulk {
        Some(Ok(accounts)) => {
            for item in batch {
                let found = accounts
                    .iter()
                    .find(|account| account.username.eq_ignore_ascii_case(&item.username))
                    .cloned();
                let result = found.ok_or_else(|| FlashlightError::username_not_found(&item.username));
                let _ = item.reply.send(result);
            }
        }
        Some(Err(e)) => {
            warn!(error = %e, "bulk account lookup failed, falling back to per-item GET");
            fall_back_to_individual_lookups(http, base_url, limiter, &ctx, batch).await;
        }
        None => {
            fall_back_to_individual_lookups(http, base_url, limiter, &ctx, batch).await;
        }
    }
}

async fn fall_back_to_individual_lookups(
    http: &Client,
    base_url: &str,
    limiter: &ComposedLimiter,
    ctx: &RequestContext,
    batch: Vec<BatchItem>,
) {
    for item in batch {
        let result = limiter
            .limit(ctx, MIN_OP_TIME, || fetch_by_username(http, base_url, &item.username))
            .await
            .unwrap_or_else(|| {
                Err(FlashlightError::temporarily_unavailable(
                    "account window limiter refused admission",
                ))
            });
        let _ = item.reply.send(result);
    }
}

async fn fetch_bulk(http: &Client, base_url: &str, usernames: &[String]) -> Result<Vec<Account>, FlashlightError> {
    let queried_at = Utc::now();
    let response = http
        .post(format!("{base_url}/profiles/minecraft"))
        .header("User-Agent", USER_AGENT)
        .json(usernames)
        .send()
        .await
        .map_err(|e| FlashlightError::temporarily_unavailable(format!("mojang bulk request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(FlashlightError::temporarily_unavailable(format!(
            "mojang bulk endpoint returned {}",
            response.status()
        )));
    }

    let profiles: Vec<MojangProfile> = response
        .json()
        .await
        .map_err(|e| FlashlightError::server_error(format!("failed to parse mojang bulk response: {e}")))?;

    profiles
        .into_iter()
        .map(|profile| {
            CanonicalUuid::parse(&profile.id)
                .map(|uuid| Account {
                    uuid,
                    username: profile.name,
                    queried_at,
                })
                .map_err(|e| e.with_context("mojang bulk response id"))
        })
        .collect()
}

async fn fetch_by_username(http: &Client, base_url: &str, username: &str) -> Result<Account, FlashlightError> {
    let queried_at = Utc::now();
    let response = http
        .get(format!("{base_url}/users/profiles/minecraft/{username}"))
        .header("User-Agent", USER_AGENT)
        .send()
        .await
        .map_err(|e| FlashlightError::temporarily_unavailable(format!("mojang request failed: {e}")))?;

    let status = response.status();
    if status == reqwest::StatusCode::NO_CONTENT || status == reqwest::StatusCode::NOT_FOUND {
        return Err(FlashlightError::username_not_found(username));
    }
    if !status.is_success() {
        return Err(FlashlightError::temporarily_unavailable(format!(
            "mojang username lookup returned {status}"
        )));
    }

    let profile: MojangProfile = response
        .json()
        .await
        .map_err(|e| FlashlightError::server_error(format!("failed to parse mojang profile: {e}")))?;

    let uuid = CanonicalUuid::parse(&profile.id).map_err(|e| e.with_context("mojang response id"))?;
    Ok(Account {
        uuid,
        username: profile.name,
        queried_at,
    })
}

async fn fetch_by_uuid(http: &Client, base_url: &str, uuid: &CanonicalUuid) -> Result<Account, FlashlightError> {
    let queried_at = Utc::now();
    let response = http
        .get(format!("{base_url}/session/minecraft/profile/{}", uuid.to_compact()))
        .header("User-Agent", USER_AGENT)
        .send()
        .await
        .map_err(|e| FlashlightError::temporarily_unavailable(format!("mojang request failed: {e}")))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(FlashlightError::username_not_found(uuid.as_str()));
    }
    if !status.is_success() {
        return Err(FlashlightError::temporarily_unavailable(format!(
            "mojang uuid lookup returned {status}"
        )));
    }

    let profile: MojangProfile = response
        .json()
        .await
        .map_err(|e| FlashlightError::server_error(format!("failed to parse mojang profile: {e}")))?;

    Ok(Account {
        uuid: uuid.clone(),
        username: profile.name,
        queried_at,
    })
}
