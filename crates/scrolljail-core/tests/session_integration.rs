//! End-to-end tests for a feed session backed by the SQLite store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use scrolljail_core::clock::{Clock, ManualClock};
use scrolljail_core::events::Event;
use scrolljail_core::random::ScriptedRandom;
use scrolljail_core::storage::{Config, Database, WatchStore};
use scrolljail_core::streak::Streak;
use scrolljail_core::FeedSession;

fn session_with_db(clock: &ManualClock, db: Database, threshold_secs: i64) -> FeedSession {
    let mut config = Config::default();
    config.threshold.daily_threshold_secs = threshold_secs;
    FeedSession::from_config(
        &config,
        Arc::new(clock.clone()),
        Box::new(db),
        Box::new(ScriptedRandom::new(vec![0.2])),
    )
    .unwrap()
}

#[test]
fn test_background_cancels_and_persists() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 10, 25, 19, 0, 0).unwrap());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scrolljail.db");

    let mut session = session_with_db(&clock, Database::open_at(&path).unwrap(), 120);
    session.open();
    clock.advance_secs(100);
    assert!(session.content_switched().is_some());
    assert!(session.is_suppressed());

    clock.advance_secs(1);
    let events = session.enter_background();
    assert_eq!(events.len(), 2);
    assert!(!session.is_suppressed());
    assert_eq!(session.policy().session_count(), 0);

    let db = Database::open_at(&path).unwrap();
    assert_eq!(
        db.daily_record(clock.today()).unwrap(),
        Some(Duration::from_secs(101))
    );
}

#[test]
fn test_rollover_mid_session() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 10, 25, 23, 58, 0).unwrap());
    let mut session = session_with_db(&clock, Database::open_memory().unwrap(), 1800);
    session.open();

    let mut rolled = None;
    for _ in 0..180 {
        clock.advance_secs(1);
        for event in session.poll() {
            if let Event::DayRolledOver { previous_day_ms, .. } = event {
                rolled = Some(previous_day_ms);
            }
        }
    }
    assert_eq!(rolled, Some(120_000));
    assert_eq!(session.elapsed_today(), Duration::from_secs(60));

    session.close();
    let history = session.tracker().history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].watch_ms, 120_000);
    assert_eq!(history[1].watch_ms, 60_000);
}

#[test]
fn test_streak_feeds_limit_message() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 10, 25, 19, 0, 0).unwrap());
    let db = Database::open_memory().unwrap();

    let mut streak = Streak::new();
    for day in 20..25 {
        streak.increment(chrono::NaiveDate::from_ymd_opt(2025, 10, day).unwrap());
    }
    db.save_streak(&streak).unwrap();
    let days = db.load_streak().unwrap().current_count;

    let mut config = Config::default();
    config.threshold.daily_threshold_secs = 60;
    config.mascot.enabled = false;
    let mut session = FeedSession::from_config(
        &config,
        Arc::new(clock.clone()),
        Box::new(db),
        Box::new(ScriptedRandom::new(vec![0.2])),
    )
    .unwrap();
    session.set_streak_days(days);
    session.open();
    clock.advance_secs(61);

    match session.content_switched() {
        Some(Event::InterventionStarted { message, .. }) => {
            assert_eq!(message, "Your scrolling time is up! Don't break your 5-day streak!");
        }
        other => panic!("expected InterventionStarted, got {other:?}"),
    }
}

#[test]
fn test_reset_all_clears_history() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 10, 25, 19, 0, 0).unwrap());
    let mut session = session_with_db(&clock, Database::open_memory().unwrap(), 1800);
    session.open();
    clock.advance_secs(45);
    session.enter_background();
    assert_eq!(session.elapsed_today(), Duration::from_secs(45));

    let events = session.reset_all();
    assert!(matches!(events.last(), Some(Event::DataReset { .. })));
    assert_eq!(session.elapsed_today(), Duration::ZERO);
    assert_eq!(session.tracker().history().len(), 1);
}

#[test]
fn test_day_finished_while_closed_settles_on_next_start() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 10, 24, 21, 0, 0).unwrap());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scrolljail.db");

    let mut session = session_with_db(&clock, Database::open_at(&path).unwrap(), 1800);
    session.open();
    clock.advance_secs(600);
    session.close();
    drop(session);

    clock.advance_secs(20 * 3600);
    let mut session = session_with_db(&clock, Database::open_at(&path).unwrap(), 1800);
    let events = session.open();
    assert!(events
        .iter()
        .all(|e| !matches!(e, Event::DayRolledOver { .. })));

    let db = Database::open_at(&path).unwrap();
    let mut streak = db.load_streak().unwrap();
    assert_eq!(streak.current_count, 0);
    let settled = streak.settle_history(&db.history().unwrap(), clock.today(), session.threshold());
    assert_eq!(settled, 1);
    assert!(!streak.reconcile(clock.today()));
    assert_eq!(streak.current_count, 1);
    assert_eq!(
        streak.last_updated,
        chrono::NaiveDate::from_ymd_opt(2025, 10, 24)
    );
}
