//! `PlayerPIT` and its gamemode substructures.

use chrono::{DateTime, Utc};
use flashlight_core::CanonicalUuid;
use serde::{Deserialize, Serialize};

/// Counters shared by `overall` and each of the four Bedwars gamemodes.
///
/// Upstream represents these as flat, mode-prefixed keys (e.g.
/// `eight_one_wins_bedwars`); this struct is the single reusable shape for
/// all five of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BedwarsModeStats {
    pub winstreak: Option<u64>,
    pub games_played: u64,
    pub wins: u64,
    pub losses: u64,
    pub beds_broken: u64,
    pub beds_lost: u64,
    pub final_kills: u64,
    pub final_deaths: u64,
    pub kills: u64,
    pub deaths: u64,
}

/// The default `experience` value upstream assigns a brand-new player.
pub const DEFAULT_EXPERIENCE: f64 = 500.0;

/// A point-in-time snapshot of one player's Bedwars stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPit {
    pub queried_at: DateTime<Utc>,
    pub uuid: CanonicalUuid,
    pub display_name: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_logout: Option<DateTime<Utc>>,
    pub experience: f64,
    pub overall: BedwarsModeStats,
    pub solo: BedwarsModeStats,
    pub doubles: BedwarsModeStats,
    pub threes: BedwarsModeStats,
    pub fours: BedwarsModeStats,
}

impl PlayerPit {
    /// The three strictly-monotonic counters session derivation watches for
    /// increases: total games played, final kills, and wins, all from the
    /// `overall` substructure.
    pub fn monotone_counters(&self) -> (u64, u64, u64) {
        (
            self.overall.games_played,
            self.overall.final_kills,
            self.overall.wins,
        )
    }
}
