//! Milestone detection over a before/after snapshot of a recorded result.
//!
//! Every predicate here is pure. Callers decide when to advance the win-rate
//! watermarks the crossing checks compare against.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    PERFECT_STREAK_LENGTH, SEASON_WIN_RATE_LADDER, SEASON_WIN_RATE_MIN_GAMES,
    SESSION_WIN_RATE_LADDER, SESSION_WIN_RATE_MIN_GAMES, WIN_COUNT_MILESTONES,
};
use crate::rank::{RankState, Tier};
use crate::stats::{GameResult, SessionStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Milestone {
    TierPromotion { from: Tier, to: Tier },
    SessionWins { wins: u32 },
    SeasonWins { wins: u32 },
    SessionWinRate { threshold: u8 },
    SeasonWinRate { threshold: u8 },
    PerfectStreak,
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TierPromotion { from, to } => write!(f, "Promoted from {from} to {to}"),
            Self::SessionWins { wins } => write!(f, "{wins} wins this session"),
            Self::SeasonWins { wins } => write!(f, "{wins} wins this season"),
            Self::SessionWinRate { threshold } => {
                write!(f, "Session win rate reached {threshold}%")
            }
            Self::SeasonWinRate { threshold } => write!(f, "Season win rate reached {threshold}%"),
            Self::PerfectStreak => write!(f, "{PERFECT_STREAK_LENGTH} wins in a row"),
        }
    }
}

#[must_use]
pub fn tier_promotion(before: &RankState, after: &RankState) -> Option<Milestone> {
    (after.tier() > before.tier()).then(|| Milestone::TierPromotion {
        from: before.tier(),
        to: after.tier(),
    })
}

#[must_use]
pub fn is_win_count_milestone(wins: u32) -> bool {
    WIN_COUNT_MILESTONES.contains(&wins)
}

/// Highest threshold in `ladder` (descending) that `current` reached while
/// `previous` was still below it. Nothing fires until `games` reaches
/// `min_games`.
#[must_use]
pub fn win_rate_crossing(
    previous: f64,
    current: f64,
    games: u32,
    min_games: u32,
    ladder: &[u8],
) -> Option<u8> {
    if games < min_games {
        return None;
    }
    ladder.iter().copied().find(|&threshold| {
        let threshold = f64::from(threshold);
        current >= threshold && previous < threshold
    })
}

/// The last ten results are all wins and the run has only just formed.
#[must_use]
pub fn is_new_perfect_streak(results: &[GameResult]) -> bool {
    let len = results.len();
    if len < PERFECT_STREAK_LENGTH {
        return false;
    }
    let window = &results[len - PERFECT_STREAK_LENGTH..];
    if !window.iter().all(|result| result.is_win()) {
        return false;
    }
    len == PERFECT_STREAK_LENGTH || results[len - PERFECT_STREAK_LENGTH - 1] == GameResult::Loss
}

/// Evaluate every milestone for a result that moved the rank from `before`
/// to `after`. `stats` must already include the result. Only wins
/// trigger count, rate and streak milestones.
#[must_use]
pub fn detect(
    result: GameResult,
    before: &RankState,
    after: &RankState,
    stats: &SessionStats,
) -> Vec<Milestone> {
    let mut found = Vec::new();
    found.extend(tier_promotion(before, after));
    if !result.is_win() {
        return found;
    }
    if is_win_count_milestone(stats.session_wins) {
        found.push(Milestone::SessionWins {
            wins: stats.session_wins,
        });
    }
    if is_win_count_milestone(stats.season_wins) {
        found.push(Milestone::SeasonWins {
            wins: stats.season_wins,
        });
    }
    if let Some(threshold) = win_rate_crossing(
        stats.last_session_win_rate,
        stats.session_win_rate(),
        stats.session_games(),
        SESSION_WIN_RATE_MIN_GAMES,
        &SESSION_WIN_RATE_LADDER,
    ) {
        found.push(Milestone::SessionWinRate { threshold });
    }
    if let Some(threshold) = win_rate_crossing(
        stats.last_season_win_rate,
        stats.season_win_rate(),
        stats.season_games(),
        SEASON_WIN_RATE_MIN_GAMES,
        &SEASON_WIN_RATE_LADDER,
    ) {
        found.push(Milestone::SeasonWinRate { threshold });
    }
    if is_new_perfect_streak(&stats.session_game_results) {
        found.push(Milestone::PerfectStreak);
    }
    found
}
