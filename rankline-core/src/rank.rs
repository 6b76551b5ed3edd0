//! Ranked ladder positions and the pure transitions between them.
//!
//! A [`RankState`] is an immutable value: every win, loss or manual edit
//! produces a fresh state and the previous one is discarded.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{
    BO3_RATE_MULTIPLIER, BOTTOM_DIVISION, CONSTRUCTED_MAX_PIPS, DIVISIONS_PER_TIER,
    HIGH_TIER_PIPS_PER_WIN, LIMITED_MAX_PIPS, LOW_TIER_PIPS_PER_WIN, MYTHIC_DEFAULT_PERCENTAGE,
    MYTHIC_ENTRY_PERCENTAGE, MYTHIC_PERCENTAGE_MAX, MYTHIC_PERCENTAGE_MIN, MYTHIC_RANK_MIN,
    PIPS_PER_LOSS, TOP_DIVISION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Mythic,
}

impl Tier {
    pub const ALL: [Self; 6] = [
        Self::Bronze,
        Self::Silver,
        Self::Gold,
        Self::Platinum,
        Self::Diamond,
        Self::Mythic,
    ];

    /// Tiers that are climbed through divisions and pips.
    pub const LADDER: [Self; 5] = [
        Self::Bronze,
        Self::Silver,
        Self::Gold,
        Self::Platinum,
        Self::Diamond,
    ];

    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Bronze => 0,
            Self::Silver => 1,
            Self::Gold => 2,
            Self::Platinum => 3,
            Self::Diamond => 4,
            Self::Mythic => 5,
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold => Some(Self::Platinum),
            Self::Platinum => Some(Self::Diamond),
            Self::Diamond => Some(Self::Mythic),
            Self::Mythic => None,
        }
    }

    #[must_use]
    pub const fn is_mythic(self) -> bool {
        matches!(self, Self::Mythic)
    }

    /// Bronze and Silver never lose pips.
    #[must_use]
    pub const fn has_loss_protection(self) -> bool {
        matches!(self, Self::Bronze | Self::Silver)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
            Self::Diamond => "Diamond",
            Self::Mythic => "Mythic",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseLabelError::new("tier", s))
    }
}

/// Queue format. Determines pips per division and per-result pip deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Format {
    #[default]
    #[serde(rename = "Constructed BO1")]
    ConstructedBo1,
    #[serde(rename = "Constructed BO3")]
    ConstructedBo3,
    Limited,
}

impl Format {
    pub const ALL: [Self; 3] = [Self::ConstructedBo1, Self::ConstructedBo3, Self::Limited];

    #[must_use]
    pub const fn max_pips(self) -> u8 {
        match self {
            Self::ConstructedBo1 | Self::ConstructedBo3 => CONSTRUCTED_MAX_PIPS,
            Self::Limited => LIMITED_MAX_PIPS,
        }
    }

    #[must_use]
    pub const fn is_constructed(self) -> bool {
        matches!(self, Self::ConstructedBo1 | Self::ConstructedBo3)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConstructedBo1 => "Constructed BO1",
            Self::ConstructedBo3 => "Constructed BO3",
            Self::Limited => "Limited",
        }
    }

    const fn rate_multiplier(self) -> u8 {
        match self {
            Self::ConstructedBo3 => BO3_RATE_MULTIPLIER,
            Self::ConstructedBo1 | Self::Limited => 1,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "constructed bo1" | "constructed" | "bo1" => Ok(Self::ConstructedBo1),
            "constructed bo3" | "bo3" => Ok(Self::ConstructedBo3),
            "limited" => Ok(Self::Limited),
            _ => Err(ParseLabelError::new("format", s)),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} label: {value:?}")]
pub struct ParseLabelError {
    kind: &'static str,
    value: String,
}

impl ParseLabelError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Errors raised when a rank is built from inconsistent parts.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RankError {
    #[error("Mythic rank cannot carry a division (got {0})")]
    MythicDivision(u8),
    #[error("Mythic rank cannot carry pips (got {0})")]
    MythicPips(u8),
    #[error("{0} rank requires a division")]
    MissingDivision(Tier),
    #[error("division must be between 1 and 4 (got {0})")]
    DivisionOutOfRange(u8),
    #[error("pips must be below {max} (got {pips})")]
    PipsOutOfRange { pips: u8, max: u8 },
    #[error("{0} rank cannot carry Mythic percentage or rank")]
    MythicDataOnLadderTier(Tier),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Standing {
    Ladder { tier: Tier, division: u8, pips: u8 },
    Mythic { percentage: Option<f64>, rank: Option<u32> },
}

/// A player's position on the ranked ladder for one format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RankRecord", into = "RankRecord")]
pub struct RankState {
    standing: Standing,
    format: Format,
}

impl RankState {
    /// Validating constructor.
    ///
    /// # Errors
    ///
    /// Returns an error when the division or pips are inconsistent with the tier.
    pub fn new(
        tier: Tier,
        division: Option<u8>,
        pips: u8,
        format: Format,
    ) -> Result<Self, RankError> {
        if tier.is_mythic() {
            if let Some(division) = division {
                return Err(RankError::MythicDivision(division));
            }
            if pips > 0 {
                return Err(RankError::MythicPips(pips));
            }
            return Ok(Self::mythic(format, None, None));
        }
        let division = division.ok_or(RankError::MissingDivision(tier))?;
        if !(TOP_DIVISION..=BOTTOM_DIVISION).contains(&division) {
            return Err(RankError::DivisionOutOfRange(division));
        }
        let max = format.max_pips();
        if pips >= max {
            return Err(RankError::PipsOutOfRange { pips, max });
        }
        Ok(Self::ladder(tier, division, pips, format))
    }

    /// Bottom of the ladder: Bronze 4 with no pips.
    #[must_use]
    pub const fn starting(format: Format) -> Self {
        Self::ladder(Tier::Bronze, BOTTOM_DIVISION, 0, format)
    }

    /// Mythic position. Percentage is clamped to 0..=100 and rank to at least 1.
    #[must_use]
    pub fn mythic(format: Format, percentage: Option<f64>, rank: Option<u32>) -> Self {
        Self {
            standing: Standing::Mythic {
                percentage: percentage.map(clamp_percentage),
                rank: rank.map(|rank| rank.max(MYTHIC_RANK_MIN)),
            },
            format,
        }
    }

    const fn ladder(tier: Tier, division: u8, pips: u8, format: Format) -> Self {
        Self {
            standing: Standing::Ladder {
                tier,
                division,
                pips,
            },
            format,
        }
    }

    #[must_use]
    pub const fn tier(&self) -> Tier {
        match self.standing {
            Standing::Ladder { tier, .. } => tier,
            Standing::Mythic { .. } => Tier::Mythic,
        }
    }

    #[must_use]
    pub const fn division(&self) -> Option<u8> {
        match self.standing {
            Standing::Ladder { division, .. } => Some(division),
            Standing::Mythic { .. } => None,
        }
    }

    #[must_use]
    pub const fn pips(&self) -> u8 {
        match self.standing {
            Standing::Ladder { pips, .. } => pips,
            Standing::Mythic { .. } => 0,
        }
    }

    #[must_use]
    pub const fn mythic_percentage(&self) -> Option<f64> {
        match self.standing {
            Standing::Mythic { percentage, .. } => percentage,
            Standing::Ladder { .. } => None,
        }
    }

    #[must_use]
    pub const fn mythic_rank(&self) -> Option<u32> {
        match self.standing {
            Standing::Mythic { rank, .. } => rank,
            Standing::Ladder { .. } => None,
        }
    }

    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    #[must_use]
    pub const fn max_pips(&self) -> u8 {
        self.format.max_pips()
    }

    #[must_use]
    pub const fn is_mythic(&self) -> bool {
        matches!(self.standing, Standing::Mythic { .. })
    }

    /// Same position, different format. Only meaningful between formats that
    /// share a pip count; pips are clamped otherwise.
    #[must_use]
    pub fn with_format(&self, format: Format) -> Self {
        let standing = match self.standing {
            Standing::Ladder {
                tier,
                division,
                pips,
            } => Standing::Ladder {
                tier,
                division,
                pips: pips.min(format.max_pips() - 1),
            },
            mythic @ Standing::Mythic { .. } => mythic,
        };
        Self { standing, format }
    }

    #[must_use]
    pub fn with_mythic_percentage(&self, percentage: f64) -> Self {
        match self.standing {
            Standing::Mythic { rank, .. } => Self::mythic(self.format, Some(percentage), rank),
            Standing::Ladder { .. } => *self,
        }
    }

    #[must_use]
    pub fn with_mythic_rank(&self, rank: u32) -> Self {
        match self.standing {
            Standing::Mythic { percentage, .. } => Self::mythic(self.format, percentage, Some(rank)),
            Standing::Ladder { .. } => *self,
        }
    }

    /// Pips a win is worth at the current tier and format. Zero at Mythic.
    #[must_use]
    pub const fn pips_per_win(&self) -> u8 {
        let base = match self.tier() {
            Tier::Bronze | Tier::Silver | Tier::Gold => LOW_TIER_PIPS_PER_WIN,
            Tier::Platinum | Tier::Diamond => HIGH_TIER_PIPS_PER_WIN,
            Tier::Mythic => return 0,
        };
        base * self.format.rate_multiplier()
    }

    #[must_use]
    pub const fn pips_per_loss(&self) -> u8 {
        if self.tier().has_loss_protection() || self.is_mythic() {
            return 0;
        }
        PIPS_PER_LOSS * self.format.rate_multiplier()
    }

    /// Advance after a win.
    ///
    /// Overflow rolls into higher divisions. Reaching Mythic discards any
    /// leftover pips; any other tier promotion carries the overflow into
    /// division 4 of the new tier.
    #[must_use]
    pub fn add_win(&self) -> Self {
        let Standing::Ladder {
            tier,
            mut division,
            pips,
        } = self.standing
        else {
            return *self;
        };
        let max = self.max_pips();
        let mut new_pips = pips.saturating_add(self.pips_per_win());

        while new_pips >= max && division > TOP_DIVISION {
            new_pips -= max;
            division -= 1;
        }

        if new_pips >= max {
            return match tier.next() {
                Some(Tier::Mythic) => {
                    Self::mythic(self.format, Some(MYTHIC_ENTRY_PERCENTAGE), None)
                }
                Some(next) => {
                    let carry = (new_pips - max).min(max - 1);
                    Self::ladder(next, BOTTOM_DIVISION, carry, self.format)
                }
                None => *self,
            };
        }

        Self::ladder(tier, division, new_pips.min(max - 1), self.format)
    }

    /// Regress after a loss. Bronze, Silver and Mythic never move, and no
    /// loss can drop a player below division 4 of the tier they hold.
    #[must_use]
    pub fn add_loss(&self) -> Self {
        let Standing::Ladder {
            tier,
            division,
            pips,
        } = self.standing
        else {
            return *self;
        };
        if tier.has_loss_protection() {
            return *self;
        }
        let lost = self.pips_per_loss();
        let (division, pips) = if pips >= lost {
            (division, pips - lost)
        } else if division < BOTTOM_DIVISION {
            (division + 1, self.max_pips() - 1)
        } else {
            (division, 0)
        };
        Self::ladder(tier, division, pips, self.format)
    }

    /// Jump to a position by hand. Out-of-range input is clamped; moving to
    /// Mythic keeps existing Mythic data or starts at 50%.
    #[must_use]
    pub fn set_to_position(&self, tier: Tier, division: Option<u8>, pips: u8) -> Self {
        if tier.is_mythic() {
            return match self.standing {
                Standing::Mythic { .. } => *self,
                Standing::Ladder { .. } => {
                    Self::mythic(self.format, Some(MYTHIC_DEFAULT_PERCENTAGE), None)
                }
            };
        }
        let division = division
            .unwrap_or(BOTTOM_DIVISION)
            .clamp(TOP_DIVISION, BOTTOM_DIVISION);
        let pips = pips.min(self.max_pips() - 1);
        Self::ladder(tier, division, pips, self.format)
    }

    /// The next win is guaranteed to promote the tier.
    #[must_use]
    pub const fn is_boss_fight(&self) -> bool {
        match self.standing {
            Standing::Ladder { division, pips, .. } => {
                division == TOP_DIVISION && pips + self.pips_per_win() >= self.max_pips()
            }
            Standing::Mythic { .. } => false,
        }
    }

    /// Pips still needed to reach Mythic.
    #[must_use]
    pub fn bars_remaining_to_mythic(&self) -> u32 {
        let Standing::Ladder {
            tier,
            division,
            pips,
        } = self.standing
        else {
            return 0;
        };
        let max = u32::from(self.max_pips());
        let in_division = max - u32::from(pips);
        let in_tier = u32::from(division - TOP_DIVISION) * max;
        let tiers_above = u32::from(Tier::Diamond.index() - tier.index());
        in_division + in_tier + tiers_above * u32::from(DIVISIONS_PER_TIER) * max
    }

    /// Absolute ladder position in pips, counted from Bronze 4 with none.
    #[must_use]
    pub fn total_bars(&self) -> u32 {
        let max = u32::from(self.max_pips());
        let per_tier = u32::from(DIVISIONS_PER_TIER) * max;
        match self.standing {
            Standing::Ladder {
                tier,
                division,
                pips,
            } => {
                u32::from(tier.index()) * per_tier
                    + u32::from(BOTTOM_DIVISION - division) * max
                    + u32::from(pips)
            }
            Standing::Mythic { .. } => u32::from(Tier::Mythic.index()) * per_tier,
        }
    }

    #[must_use]
    pub const fn next_tier(&self) -> Option<Tier> {
        self.tier().next()
    }

    /// Season-high ordering. Any Mythic beats any ladder tier; among Mythic
    /// positions a numbered rank beats a percentage, lower numbers and higher
    /// percentages are better. Ladder positions compare tier, then division
    /// (1 is best), then pips. Format is ignored.
    #[must_use]
    pub fn compare_standing(&self, other: &Self) -> Ordering {
        match (self.standing, other.standing) {
            (Standing::Mythic { .. }, Standing::Ladder { .. }) => Ordering::Greater,
            (Standing::Ladder { .. }, Standing::Mythic { .. }) => Ordering::Less,
            (
                Standing::Mythic {
                    percentage: lhs_pct,
                    rank: lhs_rank,
                },
                Standing::Mythic {
                    percentage: rhs_pct,
                    rank: rhs_rank,
                },
            ) => match (lhs_rank, rhs_rank) {
                (Some(lhs), Some(rhs)) => rhs.cmp(&lhs),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => match (lhs_pct, rhs_pct) {
                    (Some(lhs), Some(rhs)) => lhs.total_cmp(&rhs),
                    (Some(_), None) => Ordering::Greater,
                    (None, Some(_)) => Ordering::Less,
                    (None, None) => Ordering::Equal,
                },
            },
            (
                Standing::Ladder {
                    tier: lhs_tier,
                    division: lhs_div,
                    pips: lhs_pips,
                },
                Standing::Ladder {
                    tier: rhs_tier,
                    division: rhs_div,
                    pips: rhs_pips,
                },
            ) => lhs_tier
                .cmp(&rhs_tier)
                .then(rhs_div.cmp(&lhs_div))
                .then(lhs_pips.cmp(&rhs_pips)),
        }
    }

    #[must_use]
    pub fn outranks(&self, other: &Self) -> bool {
        self.compare_standing(other) == Ordering::Greater
    }
}

impl Default for RankState {
    fn default() -> Self {
        Self::starting(Format::default())
    }
}

impl fmt::Display for RankState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.standing {
            Standing::Mythic {
                rank: Some(rank), ..
            } => write!(f, "Mythic #{rank}"),
            Standing::Mythic {
                percentage: Some(percentage),
                ..
            } => write!(f, "Mythic {percentage:.1}%"),
            Standing::Mythic { .. } => f.write_str("Mythic"),
            Standing::Ladder {
                tier,
                division,
                pips,
            } => write!(f, "{tier} {division} ({pips}/{})", self.max_pips()),
        }
    }
}

fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        return MYTHIC_PERCENTAGE_MIN;
    }
    value.clamp(MYTHIC_PERCENTAGE_MIN, MYTHIC_PERCENTAGE_MAX)
}

/// Flat wire form of a rank, matching the persisted snapshot layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RankRecord {
    tier: Tier,
    #[serde(default)]
    division: Option<u8>,
    #[serde(default)]
    pips: u8,
    #[serde(default)]
    mythic_percentage: Option<f64>,
    #[serde(default)]
    mythic_rank: Option<u32>,
    #[serde(default)]
    format_type: Format,
}

impl TryFrom<RankRecord> for RankState {
    type Error = RankError;

    fn try_from(record: RankRecord) -> Result<Self, Self::Error> {
        if record.tier.is_mythic() {
            let base = Self::new(record.tier, record.division, record.pips, record.format_type)?;
            return Ok(Self::mythic(
                base.format,
                record.mythic_percentage,
                record.mythic_rank,
            ));
        }
        if record.mythic_percentage.is_some() || record.mythic_rank.is_some() {
            return Err(RankError::MythicDataOnLadderTier(record.tier));
        }
        Self::new(record.tier, record.division, record.pips, record.format_type)
    }
}

impl From<RankState> for RankRecord {
    fn from(rank: RankState) -> Self {
        Self {
            tier: rank.tier(),
            division: rank.division(),
            pips: rank.pips(),
            mythic_percentage: rank.mythic_percentage(),
            mythic_rank: rank.mythic_rank(),
            format_type: rank.format(),
        }
    }
}
