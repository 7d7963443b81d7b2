mod config;
#[cfg(feature = "sentry")]
mod reporter;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use flashlight_core::{ErrorReporter, TracingReporter};
use flashlight_http::build_router;
use flashlight_ratelimit::TokenBucket;
use flashlight_repository::{InMemoryPlayerRepository, PlayerRepository, PostgresPlayerRepository};
use flashlight_upstream::{limiters, AccountClient, StatsClient};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use config::{Config, Environment};

const HYPIXEL_BASE_URL: &str = "https://api.hypixel.net";
const MOJANG_BASE_URL: &str = "https://api.mojang.com";
const DATABASE_NAME: &str = "flashlight";

/// How often idle rate-limit bucket entries are reaped so memory doesn't
/// grow with every distinct caller ever seen.
const BUCKET_REAP_INTERVAL: Duration = Duration::from_secs(5 * 60);
const BUCKET_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let _sentry_guard = init_sentry(&config);

    tracing::info!(environment = ?config.environment, port = config.port, "starting flashlight");

    let reporter: Arc<dyn ErrorReporter> = build_reporter(&config);
    let repository: Arc<dyn PlayerRepository> = build_repository(&config).await?;

    let stats_client = StatsClient::new(
        HYPIXEL_BASE_URL,
        config.hypixel_api_key.clone().unwrap_or_default(),
        Arc::new(limiters::default_stats_limiter()),
    );
    let account_client = AccountClient::new(MOJANG_BASE_URL, limiters::default_account_limiter());

    let ip_limiter = Arc::new(TokenBucket::new("http-ip", 480.0, 480.0, BUCKET_IDLE_TIMEOUT));
    let user_limiter = Arc::new(TokenBucket::new("http-user", 480.0, 480.0, BUCKET_IDLE_TIMEOUT));

    spawn_bucket_reaper(Arc::clone(&ip_limiter));
    spawn_bucket_reaper(Arc::clone(&user_limiter));

    let state = flashlight_http::AppState::new(
        stats_client,
        account_client,
        repository,
        reporter,
        ip_limiter,
        user_limiter,
    );
    let router = build_router(state, config.cors_allowed_suffixes.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();
}

#[cfg(feature = "sentry")]
fn init_sentry(config: &Config) -> Option<sentry::ClientInitGuard> {
    config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    })
}

#[cfg(not(feature = "sentry"))]
fn init_sentry(_config: &Config) -> Option<()> {
    None
}

#[cfg(feature = "sentry")]
fn build_reporter(config: &Config) -> Arc<dyn ErrorReporter> {
    if config.sentry_dsn.is_some() {
        Arc::new(reporter::SentryReporter)
    } else {
        Arc::new(TracingReporter)
    }
}

#[cfg(not(feature = "sentry"))]
fn build_reporter(_config: &Config) -> Arc<dyn ErrorReporter> {
    Arc::new(TracingReporter)
}

async fn build_repository(config: &Config) -> anyhow::Result<Arc<dyn PlayerRepository>> {
    if config.environment == Environment::Development {
        return Ok(Arc::new(InMemoryPlayerRepository::new()));
    }

    let socket = config
        .cloudsql_unix_socket
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("CLOUDSQL_UNIX_SOCKET is required outside development"))?;
    let username = config.db_username.clone().unwrap_or_default();
    let password = config.db_password.clone().unwrap_or_default();

    let repository = PostgresPlayerRepository::connect(socket, &username, &password, DATABASE_NAME).await?;
    repository.migrate().await?;
    Ok(Arc::new(repository))
}

fn spawn_bucket_reaper(bucket: Arc<TokenBucket>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(BUCKET_REAP_INTERVAL);
        loop {
            interval.tick().await;
            bucket.reap_idle();
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received, draining in-flight requests");
}
