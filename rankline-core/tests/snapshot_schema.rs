use chrono::{DateTime, TimeZone, Utc};
use rankline_core::numbers::percentage;
use rankline_core::snapshot::{decode, encode, load_or_default};
use rankline_core::{
    AppData, Clock, Format, ManualClock, MemoryStorage, RankState, SessionGoal, Tier, Tracker,
    TrackerConfig,
};
use serde_json::Value;

const LEGACY_SNAPSHOT: &str = r#"{
  "constructed_rank": {
    "tier": "Platinum",
    "division": 2,
    "pips": 3,
    "mythic_percentage": null,
    "mythic_rank": null,
    "format_type": "Constructed"
  },
  "limited_rank": {
    "tier": "Gold",
    "division": 4,
    "pips": 1,
    "mythic_percentage": null,
    "mythic_rank": null,
    "format_type": "Limited"
  },
  "current_format": "Constructed",
  "stats": {
    "session_wins": 3,
    "session_losses": 1,
    "session_start_time": "2024-11-02T18:04:11.532000",
    "session_start_rank": null,
    "last_result_time": "2024-11-02T19:10:00",
    "session_goal_tier": "Platinum",
    "session_goal_division": 1,
    "season_wins": 40,
    "season_losses": 31,
    "season_start_rank": null,
    "season_highest_rank": {
      "tier": "Platinum",
      "division": 1,
      "pips": 2,
      "mythic_percentage": null,
      "mythic_rank": null,
      "format_type": "Constructed"
    },
    "season_end_date": "2024-12-01T00:00:00",
    "current_win_streak": 2,
    "current_loss_streak": 0,
    "best_win_streak": 6,
    "worst_loss_streak": 4,
    "session_history": [
      {
        "date": "2024-11-01",
        "wins": 5,
        "losses": 5,
        "start_time": "2024-11-01T20:00:00",
        "end_time": "2024-11-01T22:15:00",
        "start_rank": null,
        "end_rank": null,
        "format_type": "Constructed",
        "bar_progress": -2
      }
    ],
    "game_notes": [],
    "session_game_results": ["W", "L", "W", "W"],
    "session_paused": false,
    "total_paused_time": 120.5,
    "pause_start_time": null,
    "game_start_time": null,
    "game_paused_time": 0.0,
    "game_durations": [610.0, 545.5],
    "last_session_win_rate": 0.0,
    "last_season_win_rate": 56.3,
    "paused_time_since_last_result": 0.0
  },
  "show_mythic_progress": false,
  "collapsed_tiers": ["Bronze", "Silver"],
  "hidden_tiers": [],
  "auto_collapse_mode": true,
  "auto_hide_mode": false
}"#;

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 11, 2, 19, 30, 0).unwrap())
}

#[test]
fn legacy_snapshot_migrates_to_current_schema() {
    let data = decode(LEGACY_SNAPSHOT).unwrap();
    assert_eq!(data.current_format, Format::ConstructedBo1);
    assert_eq!(
        data.constructed_rank,
        RankState::new(Tier::Platinum, Some(2), 3, Format::ConstructedBo1).unwrap()
    );
    assert_eq!(data.limited_rank.format(), Format::Limited);
    assert_eq!(
        data.stats.session_goal,
        Some(SessionGoal {
            tier: Tier::Platinum,
            division: Some(1)
        })
    );
    assert_eq!(
        data.season_highest_rank.map(|rank| (rank.tier(), rank.division())),
        Some((Tier::Platinum, Some(1)))
    );
    assert_eq!(data.stats.session_history.len(), 1);
    assert_eq!(data.stats.session_history[0].format_type, Format::ConstructedBo1);
    assert_eq!(data.stats.session_history[0].bar_progress, -2);
    assert_eq!(data.stats.clock.game_durations().len(), 2);
    assert!((data.stats.clock.total_paused_secs() - 120.5).abs() < f64::EPSILON);
    assert_eq!(
        data.stats.clock.session_start_time().map(|at| at.date_naive()),
        chrono::NaiveDate::from_ymd_opt(2024, 11, 2)
    );
    assert!(!data.show_mythic_progress);
    assert!(data.auto_collapse_mode);
    assert_eq!(
        data.collapsed_tiers.iter().copied().collect::<Vec<_>>(),
        vec![Tier::Bronze, Tier::Silver, Tier::Gold]
    );
}

#[test]
fn round_trip_preserves_state() {
    let clock = clock();
    let mut data = decode(LEGACY_SNAPSHOT).unwrap();
    data.stats.add_game_note("opponent conceded turn 4", &clock);
    data.stats.clock.pause_session(&clock);
    data.set_current_rank(RankState::mythic(Format::ConstructedBo1, Some(97.5), Some(412)));

    let encoded = encode(&data).unwrap();
    let restored = decode(&encoded).unwrap();
    assert_eq!(restored, data);

    let value: Value = serde_json::from_str(&encoded).unwrap();
    assert_eq!(value["schema_version"], 2);
    assert_eq!(value["current_format"], "Constructed BO1");
    assert_eq!(value["stats"]["session_game_results"][1], "L");
    assert!(value["stats"].get("session_goal_tier").is_none());
}

#[test]
fn win_rate_watermarks_round_trip_exactly() {
    let clock = clock();
    let mut data = AppData::fresh(&clock, 30);
    for games in 1..60 {
        for wins in 0..=games {
            let rate = percentage(wins, games);
            data.stats.last_session_win_rate = rate;
            data.stats.last_season_win_rate = 100.0 - rate;
            let restored = decode(&encode(&data).unwrap()).unwrap();
            assert_eq!(restored.stats.last_session_win_rate.to_bits(), rate.to_bits());
            assert_eq!(restored, data, "{wins}/{games}");
        }
    }
}

#[test]
fn damaged_nested_records_keep_the_rest_of_the_snapshot() {
    let raw = r#"{
      "stats": {
        "season_wins": 40,
        "session_goal": { "division": 2 },
        "session_history": [
          { "date": "2024-11-01", "wins": 5, "start_time": "2024-11-01T20:00:00" }
        ],
        "game_notes": [ { "note": "mulligan to five" } ]
      }
    }"#;
    let data = decode(raw).unwrap();
    assert_eq!(data.stats.season_wins, 40);
    assert_eq!(data.stats.session_goal, None);
    let entry = &data.stats.session_history[0];
    assert_eq!((entry.wins, entry.losses), (5, 0));
    assert_eq!(entry.end_time, DateTime::<Utc>::default());
    assert_eq!(data.stats.game_notes[0].note, "mulligan to five");
    assert_eq!(data.stats.game_notes[0].timestamp, DateTime::<Utc>::default());
}

#[test]
fn fresh_state_round_trips() {
    let clock = clock();
    let data = AppData::fresh(&clock, 30);
    assert_eq!(decode(&encode(&data).unwrap()).unwrap(), data);
}

#[test]
fn corrupt_snapshot_falls_back_to_defaults() {
    let clock = clock();
    let config = TrackerConfig::default();
    for raw in ["", "{{{", "42", r#"{"constructed_rank": {"tier": "Mythic", "division": 3}}"#] {
        let storage = MemoryStorage::with_contents(raw);
        let data = load_or_default(&storage, &clock, &config);
        assert_eq!(data.constructed_rank, RankState::starting(Format::ConstructedBo1));
        assert_eq!(data.limited_rank, RankState::starting(Format::Limited));
        assert_eq!(data.stats.clock.session_start_time(), Some(clock.now()));
    }
}

#[test]
fn tracker_resumes_from_legacy_file() {
    let clock = clock();
    let storage = MemoryStorage::with_contents(LEGACY_SNAPSHOT);
    let mut tracker = Tracker::open(TrackerConfig::default(), clock.clone(), storage.clone());
    assert_eq!(tracker.data().stats.season_wins, 40);
    tracker.record_win();
    assert_eq!(tracker.data().constructed_rank.pips(), 4);

    let saved: Value = serde_json::from_str(&storage.contents().unwrap()).unwrap();
    assert_eq!(saved["schema_version"], 2);
    assert_eq!(saved["constructed_rank"]["format_type"], "Constructed BO1");
    assert_eq!(saved["stats"]["season_wins"], 41);
}

#[test]
fn fresh_state_honours_config_modes() {
    let clock = clock();
    let config = TrackerConfig {
        auto_hide: true,
        season_length_days: 14,
        ..TrackerConfig::default()
    };
    let data = load_or_default(&MemoryStorage::default(), &clock, &config);
    assert!(data.auto_hide_mode);
    assert_eq!(data.stats.days_left_in_season(&clock), Some(14));
}
