//! Complete tracker state: both format ranks, statistics, season high and
//! tier display bookkeeping.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::clock::Clock;
use crate::rank::{Format, RankState, Tier};
use crate::stats::SessionStats;

/// How a ladder tier should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierDisplay {
    Expanded,
    Collapsed,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppData {
    pub constructed_rank: RankState,
    pub limited_rank: RankState,
    pub current_format: Format,
    pub stats: SessionStats,
    /// Best position reached this season in any format.
    pub season_highest_rank: Option<RankState>,
    pub show_mythic_progress: bool,
    pub collapsed_tiers: BTreeSet<Tier>,
    pub hidden_tiers: BTreeSet<Tier>,
    pub auto_collapse_mode: bool,
    pub auto_hide_mode: bool,
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            constructed_rank: RankState::starting(Format::ConstructedBo1),
            limited_rank: RankState::starting(Format::Limited),
            current_format: Format::ConstructedBo1,
            stats: SessionStats::default(),
            season_highest_rank: None,
            show_mythic_progress: true,
            collapsed_tiers: BTreeSet::new(),
            hidden_tiers: BTreeSet::new(),
            auto_collapse_mode: false,
            auto_hide_mode: false,
        }
    }
}

impl AppData {
    /// Fresh state for a first run: Bronze 4 in both formats, a running
    /// session and a season ending `season_length_days` from now.
    #[must_use]
    pub fn fresh(clock: &impl Clock, season_length_days: i64) -> Self {
        let mut data = Self::default();
        let season_end = TimeDelta::try_days(season_length_days).map(|length| clock.now() + length);
        data.stats = SessionStats::new(&data.constructed_rank, season_end, clock);
        data
    }

    #[must_use]
    pub const fn current_rank(&self) -> &RankState {
        if self.current_format.is_constructed() {
            &self.constructed_rank
        } else {
            &self.limited_rank
        }
    }

    /// Replace the rank for the active format, then refresh the season high
    /// and tier visibility.
    pub fn set_current_rank(&mut self, rank: RankState) {
        if self.current_format.is_constructed() {
            self.constructed_rank = rank;
        } else {
            self.limited_rank = rank;
        }
        self.update_season_high(&rank);
        self.refresh_tier_visibility(&rank);
    }

    /// Both constructed formats share one rank; moving between them retags it
    /// so the matching pip rates apply.
    pub fn switch_format(&mut self, format: Format) {
        if format == self.current_format {
            return;
        }
        self.current_format = format;
        if format.is_constructed() {
            self.constructed_rank = self.constructed_rank.with_format(format);
        }
        log::debug!("switched to {format}");
        let rank = *self.current_rank();
        self.refresh_tier_visibility(&rank);
    }

    /// Returns whether `candidate` became the new season high.
    pub fn update_season_high(&mut self, candidate: &RankState) -> bool {
        let improved = self
            .season_highest_rank
            .is_none_or(|highest| candidate.outranks(&highest));
        if improved {
            log::debug!("new season high: {candidate}");
            self.season_highest_rank = Some(*candidate);
        }
        improved
    }

    /// Ladder tiers strictly below `rank`'s tier.
    pub fn completed_tiers(rank: &RankState) -> impl Iterator<Item = Tier> + use<> {
        let current = rank.tier();
        Tier::ALL.into_iter().filter(move |tier| *tier < current)
    }

    /// Tiers at or above the current one are never collapsed or hidden; in
    /// auto modes every completed tier is folded away.
    pub fn refresh_tier_visibility(&mut self, rank: &RankState) {
        let current = rank.tier();
        self.collapsed_tiers.retain(|tier| *tier < current);
        self.hidden_tiers.retain(|tier| *tier < current);
        if self.auto_collapse_mode {
            self.collapsed_tiers.extend(Self::completed_tiers(rank));
        }
        if self.auto_hide_mode {
            self.hidden_tiers.extend(Self::completed_tiers(rank));
        }
    }

    pub fn collapse_completed_tiers(&mut self) {
        let rank = *self.current_rank();
        self.collapsed_tiers.extend(Self::completed_tiers(&rank));
    }

    pub fn hide_completed_tiers(&mut self) {
        let rank = *self.current_rank();
        self.hidden_tiers.extend(Self::completed_tiers(&rank));
    }

    pub fn expand_all_tiers(&mut self) {
        self.collapsed_tiers.clear();
        self.hidden_tiers.clear();
    }

    pub fn set_auto_collapse(&mut self, enabled: bool) {
        self.auto_collapse_mode = enabled;
        let rank = *self.current_rank();
        self.refresh_tier_visibility(&rank);
    }

    pub fn set_auto_hide(&mut self, enabled: bool) {
        self.auto_hide_mode = enabled;
        let rank = *self.current_rank();
        self.refresh_tier_visibility(&rank);
    }

    pub fn toggle_mythic_progress(&mut self) {
        self.show_mythic_progress = !self.show_mythic_progress;
    }

    #[must_use]
    pub fn tier_display(&self, tier: Tier) -> TierDisplay {
        if self.hidden_tiers.contains(&tier) {
            TierDisplay::Hidden
        } else if self.collapsed_tiers.contains(&tier) {
            TierDisplay::Collapsed
        } else {
            TierDisplay::Expanded
        }
    }

    /// Zero season totals and reset the season high to the current rank.
    pub fn start_new_season(&mut self, season_end: Option<DateTime<Utc>>, clock: &impl Clock) {
        let rank = *self.current_rank();
        self.stats.start_new_season(&rank, season_end, clock);
        self.season_highest_rank = Some(rank);
        log::info!("new season started at {rank}");
    }

    /// Bring loaded data back in line with its invariants.
    pub(crate) fn normalize(&mut self) {
        self.limited_rank = self.limited_rank.with_format(Format::Limited);
        let constructed = if self.current_format.is_constructed() {
            self.current_format
        } else if self.constructed_rank.format().is_constructed() {
            self.constructed_rank.format()
        } else {
            Format::ConstructedBo1
        };
        self.constructed_rank = self.constructed_rank.with_format(constructed);
        self.stats.normalize();
        let rank = *self.current_rank();
        self.refresh_tier_visibility(&rank);
    }
}
