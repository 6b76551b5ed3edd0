//! Session wall-clock bookkeeping: pause/resume, per-game timing and the
//! gap since the last recorded result.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::clock::Clock;
use crate::constants::GAME_DURATION_WINDOW;
use crate::numbers::{delta_secs, secs_to_delta, truncate_secs};

/// Timer state for the live session. Paused time is stored in seconds.
///
/// `pause_start_time` is set exactly while `session_paused` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionClock {
    #[serde(deserialize_with = "crate::timestamp::deserialize_option")]
    session_start_time: Option<DateTime<Utc>>,
    session_paused: bool,
    total_paused_time: f64,
    #[serde(deserialize_with = "crate::timestamp::deserialize_option")]
    pause_start_time: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "crate::timestamp::deserialize_option")]
    game_start_time: Option<DateTime<Utc>>,
    game_paused_time: f64,
    game_durations: VecDeque<f64>,
    #[serde(deserialize_with = "crate::timestamp::deserialize_option")]
    last_result_time: Option<DateTime<Utc>>,
    paused_time_since_last_result: f64,
}

impl SessionClock {
    /// Restart the session timer. Completed game durations are kept.
    pub fn start_session(&mut self, clock: &impl Clock) {
        let durations = std::mem::take(&mut self.game_durations);
        *self = Self {
            session_start_time: Some(clock.now()),
            game_durations: durations,
            ..Self::default()
        };
    }

    #[must_use]
    pub const fn session_start_time(&self) -> Option<DateTime<Utc>> {
        self.session_start_time
    }

    #[must_use]
    pub const fn last_result_time(&self) -> Option<DateTime<Utc>> {
        self.last_result_time
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.session_paused
    }

    #[must_use]
    pub const fn is_game_running(&self) -> bool {
        self.game_start_time.is_some()
    }

    #[must_use]
    pub const fn total_paused_secs(&self) -> f64 {
        self.total_paused_time
    }

    #[must_use]
    pub const fn game_durations(&self) -> &VecDeque<f64> {
        &self.game_durations
    }

    pub fn start_game_timer(&mut self, clock: &impl Clock) {
        self.game_start_time = Some(clock.now());
        self.game_paused_time = 0.0;
        log::debug!("game timer started");
    }

    /// Close the running game timer and record its active length in seconds.
    /// Returns `None` when no game was running.
    pub fn end_game_timer(&mut self, clock: &impl Clock) -> Option<f64> {
        let duration = self.current_game_secs(clock.now())?;
        self.game_durations.push_back(duration);
        while self.game_durations.len() > GAME_DURATION_WINDOW {
            self.game_durations.pop_front();
        }
        self.game_start_time = None;
        self.game_paused_time = 0.0;
        log::debug!("game timer stopped after {duration:.1}s");
        Some(duration)
    }

    /// Active seconds in the running game, 0 when none is running.
    #[must_use]
    pub fn current_game_duration(&self, clock: &impl Clock) -> f64 {
        self.current_game_secs(clock.now()).unwrap_or(0.0)
    }

    #[must_use]
    pub fn average_game_duration(&self) -> f64 {
        if self.game_durations.is_empty() {
            return 0.0;
        }
        let count = u32::try_from(self.game_durations.len()).unwrap_or(u32::MAX);
        self.game_durations.iter().sum::<f64>() / f64::from(count)
    }

    /// Returns whether the session was actually paused.
    pub fn pause_session(&mut self, clock: &impl Clock) -> bool {
        if self.session_paused || self.session_start_time.is_none() {
            return false;
        }
        self.session_paused = true;
        self.pause_start_time = Some(clock.now());
        true
    }

    /// Returns whether a pause was actually closed.
    pub fn resume_session(&mut self, clock: &impl Clock) -> bool {
        if !self.session_paused {
            return false;
        }
        let now = clock.now();
        self.total_paused_time += self.open_pause_secs(now);
        self.game_paused_time += self.open_pause_since_game_secs(now);
        self.paused_time_since_last_result += self.open_pause_since_result_secs(now);
        self.session_paused = false;
        self.pause_start_time = None;
        true
    }

    /// Wall-clock time since the session started, minus every pause.
    #[must_use]
    pub fn active_session_duration(&self, clock: &impl Clock) -> TimeDelta {
        let Some(start) = self.session_start_time else {
            return TimeDelta::zero();
        };
        let now = clock.now();
        let active = delta_secs(now - start) - self.total_paused_time - self.open_pause_secs(now);
        secs_to_delta(active.max(0.0))
    }

    /// Whole seconds since the last result as `(real, active)`; `(0, 0)`
    /// before any result is recorded.
    #[must_use]
    pub fn time_since_last_result(&self, clock: &impl Clock) -> (i64, i64) {
        let Some(last) = self.last_result_time else {
            return (0, 0);
        };
        let now = clock.now();
        let real = delta_secs(now - last);
        let active =
            real - self.paused_time_since_last_result - self.open_pause_since_result_secs(now);
        (truncate_secs(real), truncate_secs(active.max(0.0)))
    }

    pub(crate) fn mark_result(&mut self, clock: &impl Clock) {
        self.last_result_time = Some(clock.now());
        self.paused_time_since_last_result = 0.0;
    }

    /// Repair a loaded clock so the pause flag and its start time agree.
    pub(crate) fn normalize(&mut self) {
        if self.session_paused != self.pause_start_time.is_some() {
            log::warn!("inconsistent pause state in snapshot; clearing pause");
            self.session_paused = false;
            self.pause_start_time = None;
        }
        while self.game_durations.len() > GAME_DURATION_WINDOW {
            self.game_durations.pop_front();
        }
    }

    fn current_game_secs(&self, now: DateTime<Utc>) -> Option<f64> {
        let start = self.game_start_time?;
        let active =
            delta_secs(now - start) - self.game_paused_time - self.open_pause_since_game_secs(now);
        Some(active.max(0.0))
    }

    fn open_pause_secs(&self, now: DateTime<Utc>) -> f64 {
        self.open_pause_after(now, None)
    }

    /// The part of the open pause that falls inside the running game.
    fn open_pause_since_game_secs(&self, now: DateTime<Utc>) -> f64 {
        if self.game_start_time.is_none() {
            return 0.0;
        }
        self.open_pause_after(now, self.game_start_time)
    }

    /// The part of the open pause that falls after the last result.
    fn open_pause_since_result_secs(&self, now: DateTime<Utc>) -> f64 {
        self.open_pause_after(now, self.last_result_time)
    }

    fn open_pause_after(&self, now: DateTime<Utc>, floor: Option<DateTime<Utc>>) -> f64 {
        match (self.session_paused, self.pause_start_time) {
            (true, Some(since)) => {
                let since = floor.map_or(since, |floor| since.max(floor));
                delta_secs(now - since).max(0.0)
            }
            _ => 0.0,
        }
    }
}
