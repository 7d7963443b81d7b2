//! The storage-agnostic contract the core depends on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flashlight_core::{CanonicalUuid, FlashlightError};
use flashlight_domain::PlayerPit;

/// Stores and queries [`PlayerPit`] snapshots. Implementations must make
/// `store` idempotent on `(uuid, queried_at)` and `history` must return
/// results ordered ascending by `queried_at`.
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    async fn store(&self, pit: &PlayerPit) -> Result<(), FlashlightError>;

    async fn history(
        &self,
        uuid: &CanonicalUuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PlayerPit>, FlashlightError>;
}
