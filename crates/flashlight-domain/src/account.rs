//! Identity mapping between a Minecraft username and its canonical UUID.

use chrono::{DateTime, Utc};
use flashlight_core::CanonicalUuid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub uuid: CanonicalUuid,
    pub username: String,
    pub queried_at: DateTime<Utc>,
}
