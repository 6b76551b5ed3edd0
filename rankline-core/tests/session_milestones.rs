use chrono::{TimeZone, Utc};
use rankline_core::{
    ManualClock, MemoryStorage, Milestone, SystemClock, Tier, Tracker, TrackerConfig,
};

type TestTracker = Tracker<ManualClock, MemoryStorage>;

fn open() -> (TestTracker, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 14, 20, 0, 0).unwrap());
    let tracker = Tracker::open(TrackerConfig::default(), clock.clone(), MemoryStorage::default());
    (tracker, clock)
}

fn play(tracker: &mut TestTracker, pattern: &str) -> Vec<Vec<Milestone>> {
    pattern
        .chars()
        .map(|c| {
            if c == 'W' {
                tracker.record_win()
            } else {
                tracker.record_loss()
            }
        })
        .collect()
}

fn session_rates(found: &[Milestone]) -> Vec<u8> {
    found
        .iter()
        .filter_map(|milestone| match milestone {
            Milestone::SessionWinRate { threshold } => Some(*threshold),
            _ => None,
        })
        .collect()
}

#[test]
fn session_win_rate_fires_once_per_threshold() {
    let (mut tracker, _clock) = open();
    let per_game = play(&mut tracker, "LLLLWWWWWW");
    for early in &per_game[..9] {
        assert!(session_rates(early).is_empty());
    }
    assert_eq!(session_rates(&per_game[9]), vec![60]);

    let next = tracker.record_win();
    assert!(session_rates(&next).is_empty(), "7/11 must not re-fire 60%");
    let next = tracker.record_win();
    assert_eq!(session_rates(&next), vec![65]);
}

#[test]
fn dropping_below_and_recovering_fires_again() {
    let (mut tracker, _clock) = open();
    play(&mut tracker, "LLLLWWWWWW");
    let dips = play(&mut tracker, "LL");
    assert!(dips.iter().all(|found| session_rates(found).is_empty()));
    // 6/12 = 50%, then 7/13 = 53.8%, 8/14 = 57.1%
    play(&mut tracker, "W");
    let recovered = tracker.record_win();
    assert_eq!(session_rates(&recovered), vec![55]);
}

#[test]
fn loss_on_the_first_eligible_game_fires_no_rate() {
    let (mut tracker, _clock) = open();
    play(&mut tracker, "WWWWWWWWL");
    let tenth = tracker.record_loss();
    assert!(session_rates(&tenth).is_empty(), "8-2 after a loss: {tenth:?}");
    let next = tracker.record_win();
    assert!(session_rates(&next).is_empty(), "9-2 stays under the 80% watermark");
    let next = tracker.record_win();
    assert!(session_rates(&next).is_empty(), "10-2 is 83.3%, still no new threshold");
}

#[test]
fn perfect_streak_needs_a_fresh_run() {
    let (mut tracker, _clock) = open();
    let first = play(&mut tracker, "WWWWWWWWWW");
    let tenth = &first[9];
    assert!(tenth.contains(&Milestone::PerfectStreak));
    assert!(tenth.contains(&Milestone::SessionWins { wins: 10 }));
    assert!(tenth.contains(&Milestone::SeasonWins { wins: 10 }));
    assert_eq!(session_rates(tenth), vec![80]);
    assert!(first[..9].iter().all(|found| !found.contains(&Milestone::PerfectStreak)));

    let eleventh = tracker.record_win();
    assert!(!eleventh.contains(&Milestone::PerfectStreak));

    tracker.record_loss();
    let rerun = play(&mut tracker, "WWWWWWWWWW");
    assert!(rerun[..9].iter().all(|found| !found.contains(&Milestone::PerfectStreak)));
    assert!(rerun[9].contains(&Milestone::PerfectStreak));
}

#[test]
fn losses_never_fire_win_count_milestones() {
    let (mut tracker, _clock) = open();
    play(&mut tracker, "WWWWWWWWW");
    let found = tracker.record_loss();
    assert!(!found.iter().any(|milestone| matches!(
        milestone,
        Milestone::SessionWins { .. } | Milestone::SeasonWins { .. }
    )));
    let found = tracker.record_win();
    assert!(found.contains(&Milestone::SessionWins { wins: 10 }));
}

#[test]
fn promotion_reports_both_tiers() {
    let (mut tracker, _clock) = open();
    tracker.set_position(Tier::Gold, Some(1), 5);
    let found = tracker.record_win();
    assert!(found.contains(&Milestone::TierPromotion {
        from: Tier::Gold,
        to: Tier::Platinum
    }));
    assert_eq!(tracker.data().current_rank().tier(), Tier::Platinum);
    assert!(tracker.record_loss().is_empty());
}

#[test]
fn pauses_are_excluded_from_active_time() {
    let (mut tracker, clock) = open();
    clock.advance_secs(600);
    assert!(tracker.pause());
    assert!(!tracker.pause());
    clock.advance_secs(300);
    assert_eq!(tracker.status().active_session_secs, 600);
    assert!(tracker.resume());
    assert!(!tracker.resume());
    clock.advance_secs(60);
    let status = tracker.status();
    assert!(!status.paused);
    assert_eq!(status.active_session_secs, 660);
}

#[test]
fn goal_tracks_the_active_rank() {
    let (mut tracker, _clock) = open();
    tracker.set_goal(Tier::Silver, Some(4));
    assert!(!tracker.status().goal_reached);
    tracker.set_position(Tier::Silver, Some(4), 0);
    assert!(tracker.status().goal_reached);
    tracker.clear_goal();
    assert_eq!(tracker.status().goal, None);
}

#[test]
fn system_clock_tracker_opens() {
    let tracker = Tracker::open(TrackerConfig::default(), SystemClock, MemoryStorage::default());
    assert_eq!(tracker.status().session_wins, 0);
    assert!(tracker.status().active_session_secs >= 0);
}
