//! Session and season statistics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::clock::Clock;
use crate::constants::{
    RECENT_FORM_WINDOW, SEASON_WIN_RATE_MIN_GAMES, SESSION_HISTORY_LIMIT,
    SESSION_WIN_RATE_MIN_GAMES,
};
use crate::numbers::percentage;
use crate::rank::{Format, RankState, Tier};
use crate::timer::SessionClock;

/// Outcome of one game, persisted as `"W"` or `"L"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
}

impl GameResult {
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Win => 'W',
            Self::Loss => 'L',
        }
    }

    #[must_use]
    pub const fn is_win(self) -> bool {
        matches!(self, Self::Win)
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Summary of a finished session kept in the bounded history. Missing
/// fields load as zero values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CompletedSession {
    pub date: NaiveDate,
    pub wins: u32,
    pub losses: u32,
    #[serde(deserialize_with = "crate::timestamp::deserialize_or_epoch")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "crate::timestamp::deserialize_or_epoch")]
    pub end_time: DateTime<Utc>,
    pub start_rank: Option<RankState>,
    pub end_rank: Option<RankState>,
    pub format_type: Format,
    /// Net pips gained (negative when the session lost ground).
    pub bar_progress: i64,
}

impl CompletedSession {
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        percentage(self.wins, self.wins + self.losses)
    }
}

/// Target position for the live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGoal {
    pub tier: Tier,
    #[serde(default)]
    pub division: Option<u8>,
}

impl SessionGoal {
    /// A goal without a division counts as division 4 of its tier.
    #[must_use]
    pub fn reached_by(&self, rank: &RankState) -> bool {
        if rank.is_mythic() {
            return true;
        }
        if self.tier.is_mythic() {
            return false;
        }
        match rank.tier().cmp(&self.tier) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => {
                let target = self.division.unwrap_or(crate::constants::BOTTOM_DIVISION);
                rank.division().is_some_and(|division| division <= target)
            }
        }
    }
}

impl fmt::Display for SessionGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.division {
            Some(division) => write!(f, "{} {division}", self.tier),
            None => write!(f, "{}", self.tier),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GameNote {
    #[serde(deserialize_with = "crate::timestamp::deserialize_or_epoch")]
    pub timestamp: DateTime<Utc>,
    pub note: String,
}

/// Stored goal shape; a goal without a tier loads as no goal.
#[derive(Deserialize)]
struct GoalRecord {
    #[serde(default)]
    tier: Option<Tier>,
    #[serde(default)]
    division: Option<u8>,
}

fn deserialize_goal<'de, D>(deserializer: D) -> Result<Option<SessionGoal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let record = Option::<GoalRecord>::deserialize(deserializer)?;
    Ok(record.and_then(|record| {
        record.tier.map(|tier| SessionGoal {
            tier,
            division: record.division,
        })
    }))
}

/// Win/loss counters, streaks and history for the live session and season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionStats {
    pub session_wins: u32,
    pub session_losses: u32,
    pub season_wins: u32,
    pub season_losses: u32,
    pub current_win_streak: u32,
    pub current_loss_streak: u32,
    pub best_win_streak: u32,
    pub worst_loss_streak: u32,
    pub session_start_rank: Option<RankState>,
    pub season_start_rank: Option<RankState>,
    #[serde(deserialize_with = "crate::timestamp::deserialize_option")]
    pub season_end_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "deserialize_goal")]
    pub session_goal: Option<SessionGoal>,
    pub session_history: VecDeque<CompletedSession>,
    pub game_notes: Vec<GameNote>,
    pub session_game_results: Vec<GameResult>,
    pub last_session_win_rate: f64,
    pub last_season_win_rate: f64,
    #[serde(flatten)]
    pub clock: SessionClock,
}

impl SessionStats {
    /// Stats for a brand-new season starting at `rank`.
    #[must_use]
    pub fn new(rank: &RankState, season_end: Option<DateTime<Utc>>, clock: &impl Clock) -> Self {
        let mut stats = Self {
            season_start_rank: Some(*rank),
            season_end_date: season_end,
            ..Self::default()
        };
        stats.reset_session(rank, clock);
        stats
    }

    #[must_use]
    pub const fn session_games(&self) -> u32 {
        self.session_wins + self.session_losses
    }

    #[must_use]
    pub const fn season_games(&self) -> u32 {
        self.season_wins + self.season_losses
    }

    #[must_use]
    pub fn session_win_rate(&self) -> f64 {
        percentage(self.session_wins, self.session_games())
    }

    #[must_use]
    pub fn season_win_rate(&self) -> f64 {
        percentage(self.season_wins, self.season_games())
    }

    pub fn record_win(&mut self, clock: &impl Clock) {
        self.session_wins += 1;
        self.season_wins += 1;
        self.current_win_streak += 1;
        self.current_loss_streak = 0;
        self.best_win_streak = self.best_win_streak.max(self.current_win_streak);
        self.record_result(GameResult::Win, clock);
    }

    pub fn record_loss(&mut self, clock: &impl Clock) {
        self.session_losses += 1;
        self.season_losses += 1;
        self.current_loss_streak += 1;
        self.current_win_streak = 0;
        self.worst_loss_streak = self.worst_loss_streak.max(self.current_loss_streak);
        self.record_result(GameResult::Loss, clock);
    }

    fn record_result(&mut self, result: GameResult, clock: &impl Clock) {
        self.clock.mark_result(clock);
        self.session_game_results.push(result);
    }

    /// Push the live session into history if it has any results. Returns
    /// whether a record was added.
    pub fn complete_current_session(&mut self, current_rank: &RankState, clock: &impl Clock) -> bool {
        if self.session_games() == 0 {
            return false;
        }
        let now = clock.now();
        let start_time = self.clock.session_start_time().unwrap_or(now);
        let bar_progress = self.session_start_rank.map_or(0, |start| {
            i64::from(current_rank.total_bars()) - i64::from(start.total_bars())
        });
        let record = CompletedSession {
            date: now.date_naive(),
            wins: self.session_wins,
            losses: self.session_losses,
            start_time,
            end_time: now,
            start_rank: self.session_start_rank,
            end_rank: Some(*current_rank),
            format_type: current_rank.format(),
            bar_progress,
        };
        log::info!(
            "session completed: {}-{} ({:+} bars)",
            record.wins,
            record.losses,
            record.bar_progress
        );
        self.session_history.push_back(record);
        while self.session_history.len() > SESSION_HISTORY_LIMIT {
            self.session_history.pop_front();
        }
        true
    }

    /// Start a fresh session at `current_rank`. Season totals, best/worst
    /// streaks and game duration history are kept.
    pub fn reset_session(&mut self, current_rank: &RankState, clock: &impl Clock) {
        self.session_wins = 0;
        self.session_losses = 0;
        self.current_win_streak = 0;
        self.current_loss_streak = 0;
        self.session_start_rank = Some(*current_rank);
        self.last_session_win_rate = 0.0;
        self.session_game_results.clear();
        self.game_notes.clear();
        self.clock.start_session(clock);
    }

    /// Zero season totals and history; the live session restarts too.
    pub fn start_new_season(
        &mut self,
        current_rank: &RankState,
        season_end: Option<DateTime<Utc>>,
        clock: &impl Clock,
    ) {
        self.season_wins = 0;
        self.season_losses = 0;
        self.best_win_streak = 0;
        self.worst_loss_streak = 0;
        self.last_season_win_rate = 0.0;
        self.season_start_rank = Some(*current_rank);
        self.season_end_date = season_end;
        self.session_history.clear();
        self.reset_session(current_rank, clock);
    }

    /// The last `count` results of the live session, oldest first.
    #[must_use]
    pub fn recent_form(&self, count: usize) -> &[GameResult] {
        let start = self.session_game_results.len().saturating_sub(count);
        &self.session_game_results[start..]
    }

    /// Wins among the last ten results.
    #[must_use]
    pub fn recent_wins(&self) -> usize {
        self.recent_form(RECENT_FORM_WINDOW)
            .iter()
            .filter(|result| result.is_win())
            .count()
    }

    pub fn set_goal(&mut self, tier: Tier, division: Option<u8>) {
        let division = if tier.is_mythic() {
            None
        } else {
            division.map(|division| division.clamp(1, crate::constants::BOTTOM_DIVISION))
        };
        self.session_goal = Some(SessionGoal { tier, division });
    }

    pub fn clear_goal(&mut self) {
        self.session_goal = None;
    }

    #[must_use]
    pub fn goal_reached(&self, rank: &RankState) -> bool {
        self.session_goal.is_some_and(|goal| goal.reached_by(rank))
    }

    pub fn add_game_note(&mut self, note: impl Into<String>, clock: &impl Clock) {
        self.game_notes.push(GameNote {
            timestamp: clock.now(),
            note: note.into(),
        });
    }

    /// Whole days until the season ends, never negative.
    #[must_use]
    pub fn days_left_in_season(&self, clock: &impl Clock) -> Option<i64> {
        self.season_end_date
            .map(|end| (end - clock.now()).num_days().max(0))
    }

    /// Record current win rates as the milestone baseline. A rate only
    /// becomes a baseline once its sample size is large enough to count.
    pub fn advance_win_rate_watermarks(&mut self) {
        if self.session_games() >= SESSION_WIN_RATE_MIN_GAMES {
            self.last_session_win_rate = self.session_win_rate();
        }
        if self.season_games() >= SEASON_WIN_RATE_MIN_GAMES {
            self.last_season_win_rate = self.season_win_rate();
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.clock.normalize();
        while self.session_history.len() > SESSION_HISTORY_LIMIT {
            self.session_history.pop_front();
        }
        if self.current_win_streak > 0 && self.current_loss_streak > 0 {
            self.current_loss_streak = 0;
        }
    }
}
