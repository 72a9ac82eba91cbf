//! Feed session: the host-side wiring of tracker and policy.
//!
//! One `FeedSession` corresponds to one feed surface. It translates surface
//! lifecycle (appear, background, foreground, content switch, disappear)
//! into tracker transitions and policy evaluations, and collects the
//! resulting events for the host to render.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::clock::Clock;
use crate::error::ConfigError;
use crate::events::{millis, Event};
use crate::policy::InterventionPolicy;
use crate::random::RandomSource;
use crate::storage::{Config, WatchStore};
use crate::tracker::WatchTimeTracker;

pub struct FeedSession {
    clock: Arc<dyn Clock>,
    tracker: WatchTimeTracker,
    policy: InterventionPolicy,
    threshold: Duration,
}

impl FeedSession {
    pub fn new(
        clock: Arc<dyn Clock>,
        tracker: WatchTimeTracker,
        policy: InterventionPolicy,
        threshold: Duration,
    ) -> Self {
        Self {
            clock,
            tracker,
            policy,
            threshold,
        }
    }

    /// Build a session from configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if the intervention settings are
    /// inconsistent.
    pub fn from_config(
        config: &Config,
        clock: Arc<dyn Clock>,
        store: Box<dyn WatchStore>,
        random: Box<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        let policy_config = config.policy_config();
        policy_config.validate()?;
        let tracker = WatchTimeTracker::new(clock.clone(), store, config.tick_interval());
        let policy = InterventionPolicy::new(policy_config, clock.clone(), random);
        Ok(Self::new(clock, tracker, policy, config.threshold()))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tracker(&self) -> &WatchTimeTracker {
        &self.tracker
    }

    pub fn policy(&self) -> &InterventionPolicy {
        &self.policy
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn elapsed_today(&self) -> Duration {
        self.tracker.current_elapsed_today()
    }

    /// Whether the feed must stay paused and non-interactive.
    pub fn is_suppressed(&self) -> bool {
        self.policy.suppress_interaction()
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            tracking: self.tracker.state(),
            day: self.tracker.day(),
            elapsed_today_ms: millis(self.tracker.current_elapsed_today()),
            threshold_ms: millis(self.threshold),
            intervention_active: self.policy.is_active(),
            remaining_ms: millis(self.policy.remaining()),
            session_count: self.policy.session_count(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// The feed surface appeared: a new viewing session starts.
    pub fn open(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        events.extend(self.policy.reset_session());
        let started = self.tracker.start_tracking();
        events.extend(self.tracker.take_rollover());
        events.extend(started);
        events.extend(self.evaluate());
        events
    }

    /// The feed surface went away.
    pub fn close(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        events.extend(self.policy.cancel_active_intervention());
        events.extend(self.tracker.stop_tracking());
        events
    }

    /// App moved to the background: stop counting and drop any intervention.
    pub fn enter_background(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        events.extend(self.tracker.pause_tracking());
        events.extend(self.policy.cancel_active_intervention());
        events
    }

    /// App came back. A resume on a later day reports the rollover first.
    pub fn enter_foreground(&mut self) -> Vec<Event> {
        let resumed = self.tracker.resume_tracking();
        let mut events: Vec<Event> = self.tracker.take_rollover().into_iter().collect();
        events.extend(resumed);
        events
    }

    /// The user moved to the next item. Returns the intervention to show
    /// before the switch may proceed, if any.
    pub fn content_switched(&mut self) -> Option<Event> {
        self.evaluate()
    }

    /// Drive whichever repeating tasks are due.
    pub fn poll(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        events.extend(self.tracker.poll());
        events.extend(self.policy.poll());
        events
    }

    pub fn set_threshold(&mut self, threshold: Duration) {
        self.threshold = threshold;
    }

    pub fn set_streak_days(&mut self, days: u32) {
        self.policy.set_streak_days(days);
    }

    /// Clear all watch history and cancel anything on screen.
    pub fn reset_all(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        events.extend(self.policy.cancel_active_intervention());
        events.push(self.tracker.reset_all());
        events
    }

    /// Trigger evaluation. Only counts while the feed is actually being
    /// watched.
    fn evaluate(&mut self) -> Option<Event> {
        if !self.tracker.is_tracking() {
            debug!("evaluation skipped: not tracking");
            return None;
        }
        let elapsed = self.tracker.current_elapsed_today();
        let trigger = self.policy.evaluate(elapsed, self.threshold)?;
        Some(trigger.to_event(self.clock.now()))
    }
}

impl std::fmt::Debug for FeedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSession")
            .field("state", &self.tracker.state())
            .field("threshold", &self.threshold)
            .field("intervention_active", &self.policy.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::random::ScriptedRandom;
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn session(threshold_secs: u64) -> (ManualClock, FeedSession) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 10, 25, 20, 0, 0).unwrap());
        let mut config = Config::default();
        config.threshold.daily_threshold_secs = threshold_secs as i64;
        let session = FeedSession::from_config(
            &config,
            Arc::new(clock.clone()),
            Box::new(MemoryStore::new()),
            Box::new(ScriptedRandom::new(vec![0.1])),
        )
        .unwrap();
        (clock, session)
    }

    #[test]
    fn open_starts_tracking_without_intervention() {
        let (_, mut s) = session(100);
        let events = s.open();
        assert!(matches!(events[0], Event::TrackingStarted { .. }));
        assert_eq!(events.len(), 1);
        assert!(!s.is_suppressed());
    }

    #[test]
    fn content_switch_past_nudge_ratio_triggers() {
        let (clock, mut s) = session(100);
        s.open();
        clock.advance_secs(30);
        assert!(s.content_switched().is_none());
        clock.advance_secs(40);
        assert!(matches!(
            s.content_switched(),
            Some(Event::InterventionStarted { ordinal: 1, .. })
        ));
        assert!(s.is_suppressed());
    }

    #[test]
    fn background_pauses_and_cancels() {
        let (clock, mut s) = session(100);
        s.open();
        clock.advance_secs(80);
        s.content_switched().unwrap();

        let events = s.enter_background();
        assert!(matches!(events[0], Event::TrackingPaused { .. }));
        assert!(matches!(events[1], Event::InterventionCancelled { .. }));
        assert!(!s.is_suppressed());
        assert_eq!(s.policy().remaining(), Duration::ZERO);

        clock.advance_secs(600);
        assert_eq!(s.elapsed_today(), Duration::from_secs(80));
        assert!(s.content_switched().is_none());
        s.enter_foreground();
        assert!(s.tracker().is_tracking());
    }

    #[test]
    fn foreground_after_midnight_reports_rollover() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 10, 25, 23, 50, 0).unwrap());
        let mut s = FeedSession::from_config(
            &Config::default(),
            Arc::new(clock.clone()),
            Box::new(MemoryStore::new()),
            Box::new(ScriptedRandom::new(vec![0.1])),
        )
        .unwrap();
        s.open();
        clock.advance_secs(5 * 60);
        s.enter_background();
        clock.advance_secs(20 * 60);

        let events = s.enter_foreground();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            Event::DayRolledOver {
                previous_day_ms: 300_000,
                ..
            }
        ));
        assert!(matches!(
            events[1],
            Event::TrackingResumed {
                elapsed_today_ms: 0,
                ..
            }
        ));

        clock.advance_secs(5);
        assert!(s
            .poll()
            .iter()
            .all(|e| !matches!(e, Event::DayRolledOver { .. })));
    }

    #[test]
    fn poll_completes_intervention() {
        let (clock, mut s) = session(100);
        s.open();
        clock.advance_secs(100);
        s.content_switched().unwrap();
        clock.advance_secs(3);
        let events = s.poll();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::InterventionCompleted { session_count: 1, .. })));
        assert!(!s.is_suppressed());
    }

    #[test]
    fn zero_threshold_disables_interventions() {
        let (clock, mut s) = session(0);
        s.open();
        clock.advance_secs(10_000);
        assert!(s.content_switched().is_none());
    }

    #[test]
    fn snapshot_reports_state() {
        let (clock, mut s) = session(100);
        s.open();
        clock.advance_secs(12);
        match s.snapshot() {
            Event::StateSnapshot {
                elapsed_today_ms,
                threshold_ms,
                intervention_active,
                ..
            } => {
                assert_eq!(elapsed_today_ms, 12_000);
                assert_eq!(threshold_ms, 100_000);
                assert!(!intervention_active);
            }
            other => panic!("expected StateSnapshot, got {other:?}"),
        }
    }
}
