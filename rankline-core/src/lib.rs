//! Rankline Engine
//!
//! Ranked ladder progression and session analytics for a personal ladder
//! tracker. This crate holds the rank transition rules, the session timers
//! and statistics, and the persisted state model. It has no terminal or
//! log-ingestion dependencies; drivers call into [`Tracker`].

pub mod app_data;
pub mod clock;
pub mod config;
pub mod constants;
pub mod milestones;
pub mod numbers;
pub mod rank;
pub mod snapshot;
pub mod stats;
pub mod storage;
pub mod timer;
pub mod timestamp;

use chrono::TimeDelta;
use serde::Serialize;

// Re-export commonly used types
pub use app_data::{AppData, TierDisplay};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TrackerConfig;
pub use milestones::Milestone;
pub use rank::{Format, ParseLabelError, RankError, RankState, Tier};
pub use snapshot::SnapshotError;
pub use stats::{CompletedSession, GameNote, GameResult, SessionGoal, SessionStats};
pub use storage::{FileStorage, MemoryStorage, StorageError};
pub use timer::SessionClock;

/// Trait for abstracting snapshot persistence.
/// Platform-specific implementations should provide this
pub trait SnapshotStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the stored snapshot text, `None` when nothing has been saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored snapshot exists but cannot be read.
    fn read_snapshot(&self) -> Result<Option<String>, Self::Error>;

    /// Replace the stored snapshot text.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn write_snapshot(&self, contents: &str) -> Result<(), Self::Error>;
}

/// Read-only view of the tracker for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerStatus {
    pub format: Format,
    pub rank: RankState,
    pub rank_label: String,
    pub bars_remaining_to_mythic: u32,
    pub boss_fight: bool,
    pub next_tier: Option<Tier>,
    pub session_wins: u32,
    pub session_losses: u32,
    pub session_win_rate: f64,
    pub season_wins: u32,
    pub season_losses: u32,
    pub season_win_rate: f64,
    pub current_win_streak: u32,
    pub current_loss_streak: u32,
    pub recent_form: String,
    pub paused: bool,
    pub active_session_secs: i64,
    pub current_game_secs: f64,
    pub average_game_secs: f64,
    pub secs_since_last_result: (i64, i64),
    pub goal: Option<SessionGoal>,
    pub goal_reached: bool,
    pub season_high: Option<RankState>,
    pub days_left_in_season: Option<i64>,
}

/// Single owner of the tracker state. Every mutation persists the snapshot
/// afterwards; a failed write is logged and the in-memory state stays
/// authoritative.
pub struct Tracker<C, S>
where
    C: Clock,
    S: SnapshotStorage,
{
    data: AppData,
    clock: C,
    storage: S,
    config: TrackerConfig,
}

impl<C, S> Tracker<C, S>
where
    C: Clock,
    S: SnapshotStorage,
{
    /// Load the stored snapshot (or fresh state) and make sure a session is running.
    pub fn open(config: TrackerConfig, clock: C, storage: S) -> Self {
        let mut data = snapshot::load_or_default(&storage, &clock, &config);
        if data.stats.clock.session_start_time().is_none() {
            let rank = *data.current_rank();
            data.stats.reset_session(&rank, &clock);
        }
        let tracker = Self {
            data,
            clock,
            storage,
            config,
        };
        tracker.persist();
        tracker
    }

    #[must_use]
    pub const fn data(&self) -> &AppData {
        &self.data
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Record a win and return the milestones it triggered.
    pub fn record_win(&mut self) -> Vec<Milestone> {
        self.record_result(GameResult::Win)
    }

    /// Record a loss and return the milestones it triggered.
    pub fn record_loss(&mut self) -> Vec<Milestone> {
        self.record_result(GameResult::Loss)
    }

    fn record_result(&mut self, result: GameResult) -> Vec<Milestone> {
        let before = *self.data.current_rank();
        let after = match result {
            GameResult::Win => before.add_win(),
            GameResult::Loss => before.add_loss(),
        };
        self.data.set_current_rank(after);
        match result {
            GameResult::Win => self.data.stats.record_win(&self.clock),
            GameResult::Loss => self.data.stats.record_loss(&self.clock),
        }
        self.data.stats.clock.end_game_timer(&self.clock);
        let found = milestones::detect(result, &before, &after, &self.data.stats);
        self.data.stats.advance_win_rate_watermarks();
        log::debug!("{result}: {before} -> {after}");
        for milestone in &found {
            log::info!("milestone: {milestone}");
        }
        self.persist();
        found
    }

    /// Manually move the active format's rank.
    pub fn set_position(&mut self, tier: Tier, division: Option<u8>, pips: u8) {
        let rank = self.data.current_rank().set_to_position(tier, division, pips);
        self.data.set_current_rank(rank);
        self.persist();
    }

    /// Ignored unless the active rank is Mythic.
    pub fn set_mythic_percentage(&mut self, percentage: f64) {
        let rank = self.data.current_rank().with_mythic_percentage(percentage);
        self.data.set_current_rank(rank);
        self.persist();
    }

    /// Ignored unless the active rank is Mythic.
    pub fn set_mythic_rank(&mut self, rank: u32) {
        let rank = self.data.current_rank().with_mythic_rank(rank);
        self.data.set_current_rank(rank);
        self.persist();
    }

    pub fn switch_format(&mut self, format: Format) {
        self.data.switch_format(format);
        self.persist();
    }

    pub fn pause(&mut self) -> bool {
        let changed = self.data.stats.clock.pause_session(&self.clock);
        if changed {
            self.persist();
        }
        changed
    }

    pub fn resume(&mut self) -> bool {
        let changed = self.data.stats.clock.resume_session(&self.clock);
        if changed {
            self.persist();
        }
        changed
    }

    pub fn start_game(&mut self) {
        self.data.stats.clock.start_game_timer(&self.clock);
        self.persist();
    }

    /// Close the game timer without recording a result.
    pub fn end_game(&mut self) -> Option<f64> {
        let duration = self.data.stats.clock.end_game_timer(&self.clock);
        self.persist();
        duration
    }

    pub fn set_goal(&mut self, tier: Tier, division: Option<u8>) {
        self.data.stats.set_goal(tier, division);
        self.persist();
    }

    pub fn clear_goal(&mut self) {
        self.data.stats.clear_goal();
        self.persist();
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        self.data.stats.add_game_note(note, &self.clock);
        self.persist();
    }

    /// Archive the live session (if it has results) and start a new one.
    pub fn new_session(&mut self) {
        let rank = *self.data.current_rank();
        self.data.stats.complete_current_session(&rank, &self.clock);
        self.data.stats.reset_session(&rank, &self.clock);
        self.persist();
    }

    /// Start a season lasting `length_days` (the configured length when `None`).
    pub fn start_new_season(&mut self, length_days: Option<i64>) {
        let days = length_days.unwrap_or(self.config.season_length_days);
        let season_end = TimeDelta::try_days(days).map(|length| self.clock.now() + length);
        self.data.start_new_season(season_end, &self.clock);
        self.persist();
    }

    pub fn collapse_completed_tiers(&mut self) {
        self.data.collapse_completed_tiers();
        self.persist();
    }

    pub fn hide_completed_tiers(&mut self) {
        self.data.hide_completed_tiers();
        self.persist();
    }

    pub fn expand_all_tiers(&mut self) {
        self.data.expand_all_tiers();
        self.persist();
    }

    pub fn set_auto_collapse(&mut self, enabled: bool) {
        self.data.set_auto_collapse(enabled);
        self.persist();
    }

    pub fn set_auto_hide(&mut self, enabled: bool) {
        self.data.set_auto_hide(enabled);
        self.persist();
    }

    pub fn toggle_mythic_progress(&mut self) {
        self.data.toggle_mythic_progress();
        self.persist();
    }

    /// Periodic refresh hook; persists the current state.
    pub fn tick(&self) -> TrackerStatus {
        self.persist();
        self.status()
    }

    /// Final persist; returns the state for callers that keep it.
    pub fn shutdown(self) -> AppData {
        self.persist();
        self.data
    }

    /// Write the snapshot. Returns whether it was stored; failures are only logged.
    pub fn persist(&self) -> bool {
        if !self.config.save_enabled {
            return false;
        }
        let encoded = match snapshot::encode(&self.data) {
            Ok(encoded) => encoded,
            Err(err) => {
                log::warn!("failed to encode snapshot: {err}");
                return false;
            }
        };
        match self.storage.write_snapshot(&encoded) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("failed to write snapshot: {err}");
                false
            }
        }
    }

    #[must_use]
    pub fn status(&self) -> TrackerStatus {
        let rank = *self.data.current_rank();
        let stats = &self.data.stats;
        let timer = &stats.clock;
        TrackerStatus {
            format: self.data.current_format,
            rank,
            rank_label: rank.to_string(),
            bars_remaining_to_mythic: rank.bars_remaining_to_mythic(),
            boss_fight: rank.is_boss_fight(),
            next_tier: rank.next_tier(),
            session_wins: stats.session_wins,
            session_losses: stats.session_losses,
            session_win_rate: stats.session_win_rate(),
            season_wins: stats.season_wins,
            season_losses: stats.season_losses,
            season_win_rate: stats.season_win_rate(),
            current_win_streak: stats.current_win_streak,
            current_loss_streak: stats.current_loss_streak,
            recent_form: stats
                .recent_form(constants::RECENT_FORM_WINDOW)
                .iter()
                .map(|result| result.as_char())
                .collect(),
            paused: timer.is_paused(),
            active_session_secs: timer.active_session_duration(&self.clock).num_seconds(),
            current_game_secs: timer.current_game_duration(&self.clock),
            average_game_secs: timer.average_game_duration(),
            secs_since_last_result: timer.time_since_last_result(&self.clock),
            goal: stats.session_goal,
            goal_reached: stats.goal_reached(&rank),
            season_high: self.data.season_highest_rank,
            days_left_in_season: stats.days_left_in_season(&self.clock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    struct FailingStorage;

    impl SnapshotStorage for FailingStorage {
        type Error = DiskFull;

        fn read_snapshot(&self) -> Result<Option<String>, Self::Error> {
            Err(DiskFull)
        }

        fn write_snapshot(&self, _contents: &str) -> Result<(), Self::Error> {
            Err(DiskFull)
        }
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 19, 0, 0).unwrap())
    }

    #[test]
    fn tracker_persists_after_each_action() {
        let storage = MemoryStorage::default();
        let mut tracker = Tracker::open(TrackerConfig::default(), clock(), storage.clone());
        assert!(storage.contents().is_some());
        tracker.record_win();
        let saved = snapshot::decode(&storage.contents().unwrap()).unwrap();
        assert_eq!(saved.stats.session_wins, 1);
        assert_eq!(saved.constructed_rank.pips(), 2);
    }

    #[test]
    fn failing_storage_does_not_block_play() {
        let mut tracker = Tracker::open(TrackerConfig::default(), clock(), FailingStorage);
        tracker.record_win();
        tracker.record_win();
        assert!(!tracker.persist());
        assert_eq!(tracker.data().stats.session_wins, 2);
        assert_eq!(tracker.data().constructed_rank.pips(), 4);
    }

    #[test]
    fn disabled_saving_writes_nothing() {
        let storage = MemoryStorage::default();
        let config = TrackerConfig {
            save_enabled: false,
            ..TrackerConfig::default()
        };
        let mut tracker = Tracker::open(config, clock(), storage.clone());
        tracker.record_loss();
        assert!(storage.contents().is_none());
    }

    #[test]
    fn recording_closes_running_game() {
        let clock = clock();
        let mut tracker = Tracker::open(TrackerConfig::default(), clock.clone(), MemoryStorage::default());
        tracker.start_game();
        clock.advance_secs(480);
        tracker.record_loss();
        let timer = &tracker.data().stats.clock;
        assert!(!timer.is_game_running());
        assert_eq!(timer.game_durations().back().copied(), Some(480.0));
    }

    #[test]
    fn status_reflects_rank_and_timers() {
        let clock = clock();
        let mut tracker = Tracker::open(TrackerConfig::default(), clock.clone(), MemoryStorage::default());
        tracker.set_position(Tier::Platinum, Some(1), 5);
        tracker.record_loss();
        clock.advance_secs(75);
        let status = tracker.status();
        assert_eq!(status.rank_label, "Platinum 1 (4/6)");
        assert!(!status.boss_fight);
        assert_eq!(status.next_tier, Some(Tier::Diamond));
        assert_eq!(status.recent_form, "L");
        assert_eq!(status.secs_since_last_result, (75, 75));
        assert_eq!(status.season_high.map(|rank| rank.pips()), Some(5));
    }

    #[test]
    fn new_session_archives_and_resets() {
        let clock = clock();
        let mut tracker = Tracker::open(TrackerConfig::default(), clock.clone(), MemoryStorage::default());
        tracker.record_win();
        tracker.record_loss();
        clock.advance_secs(1_200);
        tracker.new_session();
        let stats = &tracker.data().stats;
        assert_eq!(stats.session_history.len(), 1);
        assert_eq!(stats.session_games(), 0);
        assert_eq!(stats.season_games(), 2);
        assert_eq!(stats.clock.session_start_time(), Some(clock.now()));
    }
}
