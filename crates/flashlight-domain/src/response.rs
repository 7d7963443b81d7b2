//! Classifies a raw upstream stats response and translates it into a
//! [`PlayerPit`], per the status/body classification table.

use chrono::{DateTime, TimeZone, Utc};
use flashlight_core::{CanonicalUuid, FlashlightError};
use serde_json::Value;

use crate::stats::{BedwarsModeStats, PlayerPit, DEFAULT_EXPERIENCE};

/// `(substructure name, upstream key prefix)`. Overall has no prefix; the
/// four gamemodes use Hypixel's flat `<mode>_<metric>_bedwars` naming.
const MODE_PREFIXES: [(&str, &str); 5] = [
    ("overall", ""),
    ("solo", "eight_one_"),
    ("doubles", "eight_two_"),
    ("threes", "four_three_"),
    ("fours", "four_four_"),
];

const RETRIABLE_STATUSES: [u16; 9] = [500, 502, 503, 504, 520, 521, 522, 523, 524];

fn is_retriable_status(status: u16) -> bool {
    status == 429 || status == 527 || status == 530 || RETRIABLE_STATUSES.contains(&status)
}

/// Classifies `body`/`status` and, on a populated-player response, parses it
/// into a [`PlayerPit`] stamped with `queried_at`.
pub fn response_to_domain(
    body: &[u8],
    status: u16,
    queried_at: DateTime<Utc>,
) -> Result<PlayerPit, FlashlightError> {
    if is_retriable_status(status) {
        return Err(FlashlightError::temporarily_unavailable(format!(
            "Hypixel API returned {status}"
        )));
    }

    if status != 200 {
        return Err(FlashlightError::server_error(format!(
            "Hypixel API returned unexpected status {status}"
        )));
    }

    let trimmed = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|start| &body[start..])
        .unwrap_or(body);
    if trimmed.first() == Some(&b'<') {
        return Err(FlashlightError::temporarily_unavailable(
            "Hypixel API returned HTML (temporarily unavailable)",
        ));
    }

    let parsed: Value = serde_json::from_slice(body).map_err(|e| {
        FlashlightError::server_error(format!("failed to parse upstream body as JSON: {e}"))
    })?;

    let success = parsed
        .get("success")
        .and_then(Value::as_bool)
        .ok_or_else(|| FlashlightError::server_error("upstream body missing `success` field"))?;

    if !success {
        let cause = parsed
            .get("cause")
            .and_then(Value::as_str)
            .unwrap_or("unknown upstream error");
        return Err(FlashlightError::server_error(format!(
            "upstream reported failure: {cause}"
        )));
    }

    match parsed.get("player") {
        None | Some(Value::Null) => Err(FlashlightError::player_not_found()),
        Some(player) => parse_player(player, queried_at),
    }
}

fn parse_player(player: &Value, queried_at: DateTime<Utc>) -> Result<PlayerPit, FlashlightError> {
    let uuid_str = player
        .get("uuid")
        .and_then(Value::as_str)
        .ok_or_else(|| FlashlightError::server_error("player object missing `uuid`"))?;
    let uuid = CanonicalUuid::parse(uuid_str)
        .map_err(|e| e.with_context("upstream player uuid"))?;

    let display_name = player
        .get("displayname")
        .and_then(Value::as_str)
        .map(str::to_string);

    let last_login = parse_millis(player.get("lastLogin"))?;
    let last_logout = parse_millis(player.get("lastLogout"))?;

    let bedwars = player
        .get("stats")
        .and_then(|stats| stats.get("Bedwars"))
        .cloned()
        .unwrap_or(Value::Object(Default::default()));

    let experience = match bedwars.get("Experience") {
        None => DEFAULT_EXPERIENCE,
        Some(value) => flexible_f64(value, "Experience")?,
    };

    let mut modes = MODE_PREFIXES
        .iter()
        .map(|(_, prefix)| extract_mode_stats(&bedwars, prefix))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();

    Ok(PlayerPit {
        queried_at,
        uuid,
        display_name,
        last_login,
        last_logout,
        experience,
        overall: modes.next().expect("5 mode prefixes"),
        solo: modes.next().expect("5 mode prefixes"),
        doubles: modes.next().expect("5 mode prefixes"),
        threes: modes.next().expect("5 mode prefixes"),
        fours: modes.next().expect("5 mode prefixes"),
    })
}

fn extract_mode_stats(bedwars: &Value, prefix: &str) -> Result<BedwarsModeStats, FlashlightError> {
    let counter = |metric: &str| -> Result<u64, FlashlightError> {
        let key = format!("{prefix}{metric}_bedwars");
        match bedwars.get(&key) {
            None => Ok(0),
            Some(value) => flexible_u64(value, &key),
        }
    };

    let winstreak_key = format!("{prefix}winstreak");
    let winstreak = match bedwars.get(&winstreak_key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(flexible_u64(value, &winstreak_key)?),
    };

    Ok(BedwarsModeStats {
        winstreak,
        games_played: counter("games_played")?,
        wins: counter("wins")?,
        losses: counter("losses")?,
        beds_broken: counter("beds_broken")?,
        beds_lost: counter("beds_lost")?,
        final_kills: counter("final_kills")?,
        final_deaths: counter("final_deaths")?,
        kills: counter("kills")?,
        deaths: counter("deaths")?,
    })
}

fn parse_millis(value: Option<&Value>) -> Result<Option<DateTime<Utc>>, FlashlightError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let millis = flexible_u64(v, "timestamp")? as i64;
            Utc.timestamp_millis_opt(millis)
                .single()
                .map(Some)
                .ok_or_else(|| FlashlightError::server_error("timestamp out of range"))
        }
    }
}

/// Accepts an integer or a float with a zero fractional part; rejects
/// anything else (strings, booleans, negative numbers).
fn flexible_u64(value: &Value, field: &str) -> Result<u64, FlashlightError> {
    if let Some(u) = value.as_u64() {
        return Ok(u);
    }
    if let Some(f) = value.as_f64() {
        if f.is_finite() && f >= 0.0 && f.fract() == 0.0 {
            return Ok(f as u64);
        }
    }
    Err(FlashlightError::server_error(format!(
        "field `{field}` is not a non-negative integer"
    )))
}

/// Accepts integers, floats, and scientific notation, e.g. `1.2227806E7`.
fn flexible_f64(value: &Value, field: &str) -> Result<f64, FlashlightError> {
    value
        .as_f64()
        .ok_or_else(|| FlashlightError::server_error(format!("field `{field}` is not numeric")))
}
