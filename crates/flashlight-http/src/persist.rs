//! Detached persistence: a fetched `PlayerPit` is stored on a spawned task so
//! a client disconnect after a successful upstream fetch doesn't also lose
//! the data point. Bounded by `PERSIST_DEADLINE` so a stuck write doesn't
//! accumulate tasks forever.

use std::sync::Arc;

use flashlight_domain::PlayerPit;
use flashlight_repository::PlayerRepository;
use tracing::warn;

use crate::state::PERSIST_DEADLINE;

pub fn persist_detached(repository: Arc<dyn PlayerRepository>, pit: PlayerPit) {
    tokio::spawn(async move {
        let uuid = pit.uuid.clone();
        match tokio::time::timeout(PERSIST_DEADLINE, repository.store(&pit)).await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => warn!(%uuid, %error, "detached persistence write failed"),
            Err(_) => warn!(%uuid, "detached persistence write exceeded its deadline"),
        }
    });
}
