//! Postgres-backed [`PlayerRepository`], storing the four gamemode
//! substructures as a single JSONB column alongside indexed scalar columns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flashlight_core::{CanonicalUuid, FlashlightError};
use flashlight_domain::{BedwarsModeStats, PlayerPit};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::repository::PlayerRepository;

const MAX_CONNECTIONS: u32 = 10;

/// The four gamemode substructures, serialized together into the `stats`
/// JSONB column. `overall` is not part of this blob: it's promoted to its
/// own columns because `history` queries filter on it (session derivation
/// walks the `overall` counters).
#[derive(Debug, Serialize, Deserialize)]
struct ModeStatsColumn {
    solo: BedwarsModeStats,
    doubles: BedwarsModeStats,
    threes: BedwarsModeStats,
    fours: BedwarsModeStats,
}

pub struct PostgresPlayerRepository {
    pool: PgPool,
}

impl PostgresPlayerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to Postgres over a Unix socket (Cloud SQL's connection
    /// style), with credentials from the environment. Does not run
    /// migrations; call [`Self::migrate`] afterwards.
    pub async fn connect(
        socket: &str,
        username: &str,
        password: &str,
        database: &str,
    ) -> Result<Self, FlashlightError> {
        let connect_options = PgConnectOptions::new()
            .socket(socket)
            .username(username)
            .password(password)
            .database(database);

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(connect_options)
            .await
            .map_err(|e| FlashlightError::server_error(format!("failed to connect to postgres: {e}")))?;

        Ok(Self::new(pool))
    }

    /// Runs the embedded schema migrations. Call once at startup.
    pub async fn migrate(&self) -> Result<(), FlashlightError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| FlashlightError::server_error(format!("migration failed: {e}")))
    }
}

#[async_trait]
impl PlayerRepository for PostgresPlayerRepository {
    async fn store(&self, pit: &PlayerPit) -> Result<(), FlashlightError> {
        let modes = ModeStatsColumn {
            solo: pit.solo.clone(),
            doubles: pit.doubles.clone(),
            threes: pit.threes.clone(),
            fours: pit.fours.clone(),
        };
        let stats = serde_json::to_value(&modes)
            .map_err(|e| FlashlightError::server_error(format!("failed to encode stats: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO player_snapshots (
                uuid, queried_at, display_name, last_login, last_logout,
                experience, games_played, wins, losses, beds_broken, beds_lost,
                final_kills, final_deaths, kills, deaths, winstreak, stats
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (uuid, queried_at) DO NOTHING
            "#,
        )
        .bind(pit.uuid.as_str())
        .bind(pit.queried_at)
        .bind(&pit.display_name)
        .bind(pit.last_login)
        .bind(pit.last_logout)
        .bind(pit.experience)
        .bind(pit.overall.games_played as i64)
        .bind(pit.overall.wins as i64)
        .bind(pit.overall.losses as i64)
        .bind(pit.overall.beds_broken as i64)
        .bind(pit.overall.beds_lost as i64)
        .bind(pit.overall.final_kills as i64)
        .bind(pit.overall.final_deaths as i64)
        .bind(pit.overall.kills as i64)
        .bind(pit.overall.deaths as i64)
        .bind(pit.overall.winstreak.map(|w| w as i64))
        .bind(&stats)
        .execute(&self.pool)
        .await
        .map_err(|e| FlashlightError::server_error(format!("failed to store player snapshot: {e}")))?;

        Ok(())
    }

    async fn history(
        &self,
        uuid: &CanonicalUuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PlayerPit>, FlashlightError> {
        let rows = sqlx::query_as::<_, PlayerSnapshotRow>(
            r#"
            SELECT uuid, queried_at, display_name, last_login, last_logout,
                   experience, games_played, wins, losses, beds_broken, beds_lost,
                   final_kills, final_deaths, kills, deaths, winstreak, stats
            FROM player_snapshots
            WHERE uuid = $1 AND queried_at >= $2 AND queried_at <= $3
            ORDER BY queried_at ASC
            LIMIT $4
            "#,
        )
        .bind(uuid.as_str())
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FlashlightError::server_error(format!("failed to query history: {e}")))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct PlayerSnapshotRow {
    uuid: String,
    queried_at: DateTime<Utc>,
    display_name: Option<String>,
    last_login: Option<DateTime<Utc>>,
    last_logout: Option<DateTime<Utc>>,
    experience: f64,
    games_played: i64,
    wins: i64,
    losses: i64,
    beds_broken: i64,
    beds_lost: i64,
    final_kills: i64,
    final_deaths: i64,
    kills: i64,
    deaths: i64,
    winstreak: Option<i64>,
    stats: serde_json::Value,
}

impl TryFrom<PlayerSnapshotRow> for PlayerPit {
    type Error = FlashlightError;

    fn try_from(row: PlayerSnapshotRow) -> Result<Self, Self::Error> {
        let modes: ModeStatsColumn = serde_json::from_value(row.stats)
            .map_err(|e| FlashlightError::server_error(format!("failed to decode stats: {e}")))?;
        let uuid = CanonicalUuid::parse(&row.uuid).map_err(|e| e.with_context("stored player uuid"))?;

        Ok(PlayerPit {
            queried_at: row.queried_at,
            uuid,
            display_name: row.display_name,
            last_login: row.last_login,
            last_logout: row.last_logout,
            experience: row.experience,
            overall: BedwarsModeStats {
                winstreak: row.winstreak.map(|w| w as u64),
                games_played: row.games_played as u64,
                wins: row.wins as u64,
                losses: row.losses as u64,
                beds_broken: row.beds_broken as u64,
                beds_lost: row.beds_lost as u64,
                final_kills: row.final_kills as u64,
                final_deaths: row.final_deaths as u64,
                kills: row.kills as u64,
                deaths: row.deaths as u64,
            },
            solo: modes.solo,
            doubles: modes.doubles,
            threes: modes.threes,
            fours: modes.fours,
        })
    }
}
