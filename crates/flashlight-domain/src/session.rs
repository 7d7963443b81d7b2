//! Session derivation: turning a time-ordered run of [`PlayerPit`] snapshots
//! into discrete play sessions.

use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};

use crate::stats::PlayerPit;

/// The gap between two PITs with non-increasing counters past which they're
/// considered different sessions rather than the same one idling.
pub const DEFAULT_IDLE_THRESHOLD: ChronoDuration = ChronoDuration::minutes(30);

/// One contiguous run of increasing play, bounded by its first and last
/// observed snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub start: PlayerPit,
    pub end: PlayerPit,
    /// True when this session picked up within the idle threshold of the
    /// previous one ending, i.e. no meaningful gap between them.
    pub consecutive: bool,
}

/// Derives sessions from a time-ordered sequence of PITs for one player.
///
/// `history` must already be sorted ascending by `queried_at` (ties broken by
/// `games_played`, larger sorting later). Returns sessions in the same order,
/// satisfying `start[i].queried_at <= end[i].queried_at < start[i+1].queried_at`.
pub fn derive_sessions(history: &[PlayerPit]) -> Vec<Session> {
    derive_sessions_with_idle_threshold(history, DEFAULT_IDLE_THRESHOLD)
}

pub fn derive_sessions_with_idle_threshold(
    history: &[PlayerPit],
    idle_threshold: ChronoDuration,
) -> Vec<Session> {
    if history.len() < 2 {
        return Vec::new();
    }

    let mut sessions = Vec::new();
    let mut run_start = 0usize;

    for i in 1..history.len() {
        let prev = &history[i - 1];
        let curr = &history[i];
        let gap = curr.queried_at - prev.queried_at;
        let counters_increased = counters_increased(prev, curr);
        let counters_reset = counters_decreased(prev, curr);

        let run_continues = counters_increased || (!counters_reset && gap <= idle_threshold);

        if !run_continues || counters_reset {
            push_session(&mut sessions, history, run_start, i - 1, idle_threshold);
            run_start = i;
        }
    }
    push_session(
        &mut sessions,
        history,
        run_start,
        history.len() - 1,
        idle_threshold,
    );

    sessions
}

fn push_session(
    sessions: &mut Vec<Session>,
    history: &[PlayerPit],
    start_idx: usize,
    end_idx: usize,
    idle_threshold: ChronoDuration,
) {
    let start = &history[start_idx];
    let end = &history[end_idx];
    if start.queried_at == end.queried_at {
        return;
    }

    let consecutive = match sessions.last() {
        None => false,
        Some(previous) => is_consecutive(previous, start, idle_threshold),
    };

    sessions.push(Session {
        start: start.clone(),
        end: end.clone(),
        consecutive,
    });
}

fn is_consecutive(previous: &Session, start: &PlayerPit, idle_threshold: ChronoDuration) -> bool {
    match (previous.end.last_logout, start.last_login) {
        (Some(logout), Some(_)) => {
            let gap = start.queried_at - logout;
            gap.abs() < idle_threshold
        }
        _ => start.queried_at - previous.end.queried_at < idle_threshold,
    }
}

fn counters_increased(prev: &PlayerPit, curr: &PlayerPit) -> bool {
    let (pg, pk, pw) = prev.monotone_counters();
    let (cg, ck, cw) = curr.monotone_counters();
    cg > pg || ck > pk || cw > pw
}

fn counters_decreased(prev: &PlayerPit, curr: &PlayerPit) -> bool {
    let (pg, pk, pw) = prev.monotone_counters();
    let (cg, ck, cw) = curr.monotone_counters();
    cg < pg || ck < pk || cw < pw
}

/// Orders two PITs by `queried_at`, breaking ties by `games_played` (larger
/// sorts later).
pub fn compare_pits(a: &PlayerPit, b: &PlayerPit) -> std::cmp::Ordering {
    a.queried_at
        .cmp(&b.queried_at)
        .then_with(|| a.overall.games_played.cmp(&b.overall.games_played))
}
