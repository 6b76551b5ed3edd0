//! Versioned snapshot schema for [`AppData`].
//!
//! The saved document is the serde form of `AppData` plus a top-level
//! `schema_version`. Documents written before versioning are version 0.
//! Older documents are brought forward by an ordered list of migrations
//! applied to the raw JSON before it is decoded.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::SnapshotStorage;
use crate::app_data::AppData;
use crate::clock::Clock;
use crate::config::TrackerConfig;
use crate::constants::{SCHEMA_VERSION_KEY, SNAPSHOT_SCHEMA_VERSION};

const LEGACY_CONSTRUCTED_LABEL: &str = "Constructed";
const CONSTRUCTED_BO1_LABEL: &str = "Constructed BO1";
const FORMAT_KEYS: [&str; 2] = ["format_type", "current_format"];

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot root must be a JSON object")]
    NotAnObject,
    #[error("snapshot schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u64, supported: u64 },
}

type Migration = fn(&mut Map<String, Value>);

/// Ordered migrations; entry `(v, step)` upgrades a version `v` document to `v + 1`.
const MIGRATIONS: [(u64, Migration); 2] = [
    (0, migrate_legacy_format_labels),
    (1, migrate_goal_and_season_high),
];

/// Serialize `data` as a pretty-printed, versioned document.
///
/// # Errors
///
/// Returns an error if the state cannot be represented as JSON.
pub fn encode(data: &AppData) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(data)?;
    if let Value::Object(map) = &mut value {
        map.insert(SCHEMA_VERSION_KEY.to_string(), Value::from(SNAPSHOT_SCHEMA_VERSION));
    }
    serde_json::to_string_pretty(&value)
}

/// Decode a document of any known version. Missing fields take defaults.
///
/// # Errors
///
/// Returns an error for malformed JSON, a non-object root, an unknown future
/// version, or values that fail validation after migration.
pub fn decode(raw: &str) -> Result<AppData, SnapshotError> {
    let mut value: Value = serde_json::from_str(raw)?;
    let Value::Object(map) = &mut value else {
        return Err(SnapshotError::NotAnObject);
    };
    let version = map
        .remove(SCHEMA_VERSION_KEY)
        .and_then(|version| version.as_u64())
        .unwrap_or(0);
    if version > SNAPSHOT_SCHEMA_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: version,
            supported: SNAPSHOT_SCHEMA_VERSION,
        });
    }
    migrate(map, version);
    let mut data: AppData = serde_json::from_value(value)?;
    data.normalize();
    Ok(data)
}

/// Apply every migration from `from_version` up to the current schema.
pub fn migrate(map: &mut Map<String, Value>, from_version: u64) {
    for (version, step) in MIGRATIONS {
        if version >= from_version {
            log::info!("migrating snapshot from schema {version} to {}", version + 1);
            step(map);
        }
    }
}

/// Read the stored snapshot, falling back to fresh state when nothing is
/// stored or the stored document cannot be used. Never fails.
pub fn load_or_default<S: SnapshotStorage>(
    storage: &S,
    clock: &impl Clock,
    config: &TrackerConfig,
) -> AppData {
    let raw = match storage.read_snapshot() {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            log::debug!("no snapshot stored; starting fresh");
            return fresh_state(clock, config);
        }
        Err(err) => {
            log::warn!("failed to read snapshot, starting fresh: {err}");
            return fresh_state(clock, config);
        }
    };
    match decode(&raw) {
        Ok(data) => data,
        Err(err) => {
            log::warn!("unusable snapshot, starting fresh: {err}");
            fresh_state(clock, config)
        }
    }
}

/// Default state with the configured season length and visibility modes.
#[must_use]
pub fn fresh_state(clock: &impl Clock, config: &TrackerConfig) -> AppData {
    let mut data = AppData::fresh(clock, config.season_length_days);
    data.set_auto_collapse(config.auto_collapse);
    data.set_auto_hide(config.auto_hide);
    data
}

/// 0 → 1: the single "Constructed" format became "Constructed BO1".
fn migrate_legacy_format_labels(map: &mut Map<String, Value>) {
    for value in map.values_mut() {
        rewrite_format_labels(value);
    }
    rewrite_format_fields(map);
}

fn rewrite_format_labels(value: &mut Value) {
    match value {
        Value::Object(map) => {
            rewrite_format_fields(map);
            for nested in map.values_mut() {
                rewrite_format_labels(nested);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite_format_labels),
        _ => {}
    }
}

fn rewrite_format_fields(map: &mut Map<String, Value>) {
    for key in FORMAT_KEYS {
        if let Some(label) = map.get_mut(key)
            && label.as_str() == Some(LEGACY_CONSTRUCTED_LABEL)
        {
            *label = Value::from(CONSTRUCTED_BO1_LABEL);
        }
    }
}

/// 1 → 2: the flat session goal fields fold into `session_goal`, and the
/// season high moves from `stats` to the top level.
fn migrate_goal_and_season_high(map: &mut Map<String, Value>) {
    let Some(Value::Object(stats)) = map.get_mut("stats") else {
        return;
    };
    let goal_tier = stats.remove("session_goal_tier");
    let goal_division = stats.remove("session_goal_division");
    if let Some(tier @ Value::String(_)) = goal_tier {
        let mut goal = Map::new();
        goal.insert("tier".to_string(), tier);
        goal.insert(
            "division".to_string(),
            goal_division.unwrap_or(Value::Null),
        );
        stats.insert("session_goal".to_string(), Value::Object(goal));
    }
    let season_high = stats.remove("season_highest_rank");
    if let Some(season_high) = season_high
        && !map.contains_key("season_highest_rank")
    {
        map.insert("season_highest_rank".to_string(), season_high);
    }
}
