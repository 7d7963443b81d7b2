//! A `Mutex<Vec<PlayerPit>>`-backed repository for tests and
//! `FLASHLIGHT_ENVIRONMENT=development`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flashlight_core::{CanonicalUuid, FlashlightError};
use flashlight_domain::PlayerPit;
use parking_lot::Mutex;

use crate::repository::PlayerRepository;

#[derive(Default)]
pub struct InMemoryPlayerRepository {
    snapshots: Mutex<Vec<PlayerPit>>,
}

impl InMemoryPlayerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.lock().is_empty()
    }
}

#[async_trait]
impl PlayerRepository for InMemoryPlayerRepository {
    async fn store(&self, pit: &PlayerPit) -> Result<(), FlashlightError> {
        let mut snapshots = self.snapshots.lock();
        let already_present = snapshots
            .iter()
            .any(|existing| existing.uuid == pit.uuid && existing.queried_at == pit.queried_at);
        if !already_present {
            snapshots.push(pit.clone());
        }
        Ok(())
    }

    async fn history(
        &self,
        uuid: &CanonicalUuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PlayerPit>, FlashlightError> {
        let snapshots = self.snapshots.lock();
        let mut matching: Vec<PlayerPit> = snapshots
            .iter()
            .filter(|pit| pit.uuid == *uuid && pit.queried_at >= start && pit.queried_at <= end)
            .cloned()
            .collect();
        matching.sort_by_key(|pit| pit.queried_at);
        matching.truncate(limit.max(0) as usize);
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use flashlight_domain::BedwarsModeStats;

    fn pit(hour: i64, uuid: &str) -> PlayerPit {
        PlayerPit {
            queried_at: Utc.timestamp_opt(1_700_000_000 + hour * 3600, 0).unwrap(),
            uuid: CanonicalUuid::parse(uuid).unwrap(),
            display_name: None,
            last_login: None,
            last_logout: None,
            experience: 500.0,
            overall: BedwarsModeStats::default(),
            solo: BedwarsModeStats::default(),
            doubles: BedwarsModeStats::default(),
            threes: BedwarsModeStats::default(),
            fours: BedwarsModeStats::default(),
        }
    }

    #[tokio::test]
    async fn store_then_history_round_trips() {
        let repo = InMemoryPlayerRepository::new();
        let uuid = "1234abcd123456789abc1234567890ab";
        repo.store(&pit(0, uuid)).await.unwrap();
        repo.store(&pit(1, uuid)).await.unwrap();

        let history = repo
            .history(
                &CanonicalUuid::parse(uuid).unwrap(),
                Utc.timestamp_opt(0, 0).unwrap(),
                Utc.timestamp_opt(2_000_000_000, 0).unwrap(),
                10,
            )
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].queried_at < history[1].queried_at);
    }

    #[tokio::test]
    async fn store_is_idempotent_on_uuid_and_queried_at() {
        let repo = InMemoryPlayerRepository::new();
        let uuid = "1234abcd123456789abc1234567890ab";
        repo.store(&pit(0, uuid)).await.unwrap();
        repo.store(&pit(0, uuid)).await.unwrap();
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn history_is_scoped_by_uuid() {
        let repo = InMemoryPlayerRepository::new();
        repo.store(&pit(0, "1234abcd123456789abc1234567890ab")).await.unwrap();
        repo.store(&pit(0, "aaaaaaaabbbbccccddddeeeeffff0000")).await.unwrap();

        let history = repo
            .history(
                &CanonicalUuid::parse("1234abcd123456789abc1234567890ab").unwrap(),
                Utc.timestamp_opt(0, 0).unwrap(),
                Utc.timestamp_opt(2_000_000_000, 0).unwrap(),
                10,
            )
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn history_respects_limit() {
        let repo = InMemoryPlayerRepository::new();
        let uuid = "1234abcd123456789abc1234567890ab";
        for hour in 0..5 {
            repo.store(&pit(hour, uuid)).await.unwrap();
        }
        let history = repo
            .history(
                &CanonicalUuid::parse(uuid).unwrap(),
                Utc.timestamp_opt(0, 0).unwrap(),
                Utc.timestamp_opt(2_000_000_000, 0).unwrap(),
                2,
            )
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }
}
