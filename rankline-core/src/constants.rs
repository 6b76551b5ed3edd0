//! Centralized ladder and session tuning constants for Rankline.
//!
//! These values define the deterministic math for rank progression and
//! session bookkeeping. Keeping them together means the ladder can only be
//! adjusted via reviewed code changes, never through the saved snapshot.

// Ladder shape ------------------------------------------------------------
pub const DIVISIONS_PER_TIER: u8 = 4;
pub const TOP_DIVISION: u8 = 1;
pub const BOTTOM_DIVISION: u8 = DIVISIONS_PER_TIER;
pub const CONSTRUCTED_MAX_PIPS: u8 = 6;
pub const LIMITED_MAX_PIPS: u8 = 4;

// Pip rates ---------------------------------------------------------------
pub const LOW_TIER_PIPS_PER_WIN: u8 = 2;
pub const HIGH_TIER_PIPS_PER_WIN: u8 = 1;
pub const BO3_RATE_MULTIPLIER: u8 = 2;
pub const PIPS_PER_LOSS: u8 = 1;

// Mythic ------------------------------------------------------------------
pub const MYTHIC_ENTRY_PERCENTAGE: f64 = 95.0;
pub const MYTHIC_DEFAULT_PERCENTAGE: f64 = 50.0;
pub const MYTHIC_PERCENTAGE_MIN: f64 = 0.0;
pub const MYTHIC_PERCENTAGE_MAX: f64 = 100.0;
pub const MYTHIC_RANK_MIN: u32 = 1;

// Session bookkeeping -----------------------------------------------------
pub const GAME_DURATION_WINDOW: usize = 50;
pub const SESSION_HISTORY_LIMIT: usize = 5;
pub const RECENT_FORM_WINDOW: usize = 10;
pub const DEFAULT_SEASON_LENGTH_DAYS: i64 = 30;

// Milestones --------------------------------------------------------------
pub const WIN_COUNT_MILESTONES: [u32; 9] = [10, 25, 50, 100, 200, 300, 500, 750, 1000];
pub const SESSION_WIN_RATE_LADDER: [u8; 7] = [80, 75, 70, 65, 60, 55, 50];
pub const SEASON_WIN_RATE_LADDER: [u8; 6] = [75, 70, 65, 60, 55, 50];
pub const SESSION_WIN_RATE_MIN_GAMES: u32 = 10;
pub const SEASON_WIN_RATE_MIN_GAMES: u32 = 50;
pub const PERFECT_STREAK_LENGTH: usize = 10;

// Persistence -------------------------------------------------------------
pub const SNAPSHOT_SCHEMA_VERSION: u64 = 2;
pub const SCHEMA_VERSION_KEY: &str = "schema_version";
pub const DEFAULT_STATE_FILE: &str = "tracker_state.json";
pub const DATA_DIR_ENV_VAR: &str = "RANKLINE_DATA_DIR";
pub const DATA_DIR_NAME: &str = "rankline";
