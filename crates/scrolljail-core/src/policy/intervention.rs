//! Intervention policy and countdown.
//!
//! The policy never touches playback. While an intervention is active it
//! reports `suppress_interaction() == true`; the host is expected to honour
//! that until the countdown completes or the intervention is cancelled.
//!
//! The countdown is wall-clock based: remaining time is derived from the
//! instant the intervention began, so it reaches exactly zero at the planned
//! duration whatever the host's polling granularity.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::decision::{decide, Band, InterventionKind, PolicyConfig};
use super::messages::MessageTable;
use super::stats::InterventionStats;
use crate::clock::{elapsed_between, Clock};
use crate::events::{millis, Event};
use crate::random::RandomSource;
use crate::scheduler::RepeatingTask;

/// The one intervention currently running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionState {
    pub kind: InterventionKind,
    pub band: Band,
    pub planned: Duration,
    pub started_at: DateTime<Utc>,
    pub message: String,
}

impl InterventionState {
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        elapsed_between(self.started_at, now).min(self.planned)
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.planned.saturating_sub(elapsed_between(self.started_at, now))
    }
}

/// Returned to the host when an evaluation triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerResult {
    pub kind: InterventionKind,
    pub band: Band,
    pub duration: Duration,
    pub message: String,
    /// 1-based position of this intervention in the viewing session.
    pub ordinal: u32,
}

impl TriggerResult {
    /// Percentage payload for milestone screens.
    pub fn percent(&self) -> Option<u32> {
        match self.kind {
            InterventionKind::PercentageMilestone { percent } => Some(percent),
            InterventionKind::Regular => None,
        }
    }

    pub fn to_event(&self, at: DateTime<Utc>) -> Event {
        Event::InterventionStarted {
            kind: self.kind,
            band: self.band,
            duration_ms: millis(self.duration),
            message: self.message.clone(),
            ordinal: self.ordinal,
            at,
        }
    }
}

pub struct InterventionPolicy {
    config: PolicyConfig,
    clock: Arc<dyn Clock>,
    random: Box<dyn RandomSource>,
    messages: MessageTable,
    active: Option<InterventionState>,
    /// Interventions completed since the viewing session began.
    session_count: u32,
    /// Current streak length, read-only context for messages.
    streak_days: u32,
    countdown: RepeatingTask,
    stats: InterventionStats,
}

impl InterventionPolicy {
    pub fn new(config: PolicyConfig, clock: Arc<dyn Clock>, random: Box<dyn RandomSource>) -> Self {
        Self {
            messages: MessageTable::new(config.mascot),
            countdown: RepeatingTask::new(config.countdown_interval),
            config,
            clock,
            random,
            active: None,
            session_count: 0,
            streak_days: 0,
            stats: InterventionStats::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Whether the host must keep playback and interaction disabled.
    pub fn suppress_interaction(&self) -> bool {
        self.is_active()
    }

    pub fn active(&self) -> Option<&InterventionState> {
        self.active.as_ref()
    }

    /// Zero when nothing is active.
    pub fn remaining(&self) -> Duration {
        self.active
            .as_ref()
            .map(|state| state.remaining(self.clock.now()))
            .unwrap_or_default()
    }

    /// Remaining time rounded up to whole seconds, as shown on screen.
    pub fn remaining_secs(&self) -> u64 {
        ceil_secs(self.remaining())
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    pub fn stats(&self) -> &InterventionStats {
        &self.stats
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Evaluate at a content switch or periodic check. Never fails: a zero
    /// threshold or an intervention already in progress yields `None`.
    pub fn evaluate(&mut self, elapsed_today: Duration, threshold: Duration) -> Option<TriggerResult> {
        if self.active.is_some() {
            debug!("evaluation skipped: intervention already active");
            return None;
        }

        let decision = decide(
            elapsed_today,
            threshold,
            self.session_count,
            &self.config,
            self.random.as_mut(),
        )?;
        let message = self.messages.compose(
            decision.kind,
            decision.band,
            self.streak_days,
            self.random.as_mut(),
        );

        let now = self.clock.now();
        self.active = Some(InterventionState {
            kind: decision.kind,
            band: decision.band,
            planned: decision.duration,
            started_at: now,
            message: message.clone(),
        });
        self.countdown.arm(now);
        self.stats.record_trigger(decision.kind, decision.duration);

        let ordinal = self.session_count + 1;
        info!(
            kind = ?decision.kind,
            band = ?decision.band,
            duration_ms = millis(decision.duration),
            ordinal,
            "intervention started"
        );
        Some(TriggerResult {
            kind: decision.kind,
            band: decision.band,
            duration: decision.duration,
            message,
            ordinal,
        })
    }

    /// Advance the countdown. Completes the intervention once the planned
    /// duration has fully elapsed.
    pub fn tick(&mut self) -> Option<Event> {
        let state = self.active.as_ref()?;
        let now = self.clock.now();
        let remaining = state.remaining(now);
        if !remaining.is_zero() {
            return Some(Event::CountdownTick {
                remaining_ms: millis(remaining),
                remaining_secs: ceil_secs(remaining),
                at: now,
            });
        }

        let state = self.active.take()?;
        self.countdown.cancel();
        self.session_count = self.session_count.saturating_add(1);
        self.stats.record_completion(state.planned);
        info!(
            kind = ?state.kind,
            session_count = self.session_count,
            "intervention completed"
        );
        Some(Event::InterventionCompleted {
            kind: state.kind,
            duration_ms: millis(state.planned),
            session_count: self.session_count,
            at: now,
        })
    }

    /// Tick when the countdown task is due, or immediately once the planned
    /// duration has passed so completion is never late.
    pub fn poll(&mut self) -> Option<Event> {
        let now = self.clock.now();
        let fired = self.countdown.fire_due(now);
        let expired = self
            .active
            .as_ref()
            .is_some_and(|state| state.remaining(now).is_zero());
        if fired == 0 && !expired {
            return None;
        }
        self.tick()
    }

    /// Force-stop the active intervention (backgrounding, surface gone).
    /// Idempotent; does not count toward the session total.
    pub fn cancel_active_intervention(&mut self) -> Option<Event> {
        self.countdown.cancel();
        let state = self.active.take()?;
        let now = self.clock.now();
        self.stats.record_cancel(state.elapsed(now));
        info!(kind = ?state.kind, "intervention cancelled");
        Some(Event::InterventionCancelled {
            kind: state.kind,
            remaining_ms: millis(state.remaining(now)),
            at: now,
        })
    }

    /// Start a new viewing session: cancel anything active and zero the
    /// counter that drives the milestone cadence.
    pub fn reset_session(&mut self) -> Option<Event> {
        let cancelled = self.cancel_active_intervention();
        self.session_count = 0;
        cancelled
    }

    /// Restore a counter persisted by the host.
    pub fn set_session_count(&mut self, count: u32) {
        self.session_count = count;
    }

    pub fn set_streak_days(&mut self, days: u32) {
        self.streak_days = days;
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::random::ScriptedRandom;
    use chrono::TimeZone;

    fn setup(samples: Vec<f64>) -> (ManualClock, InterventionPolicy) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 10, 25, 21, 0, 0).unwrap());
        let policy = InterventionPolicy::new(
            PolicyConfig::default(),
            Arc::new(clock.clone()),
            Box::new(ScriptedRandom::new(samples)),
        );
        (clock, policy)
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn below_nudge_ratio_never_triggers() {
        let (_, mut policy) = setup(vec![0.0]);
        for _ in 0..10 {
            assert!(policy.evaluate(secs(59), secs(100)).is_none());
        }
        assert!(!policy.suppress_interaction());
    }

    #[test]
    fn trigger_suppresses_until_countdown_completes() {
        let (clock, mut policy) = setup(vec![0.1]);
        let trigger = policy.evaluate(secs(70), secs(100)).unwrap();
        assert_eq!(trigger.kind, InterventionKind::Regular);
        assert_eq!(trigger.duration, secs(3));
        assert_eq!(trigger.ordinal, 1);
        assert!(policy.suppress_interaction());
        assert_eq!(policy.remaining_secs(), 3);

        clock.advance_secs(1);
        assert!(matches!(
            policy.poll(),
            Some(Event::CountdownTick { remaining_secs: 2, .. })
        ));
        clock.advance_millis(1500);
        assert_eq!(policy.remaining_secs(), 1);

        clock.advance_millis(500);
        assert!(matches!(
            policy.poll(),
            Some(Event::InterventionCompleted { session_count: 1, .. })
        ));
        assert!(!policy.is_active());
        assert_eq!(policy.remaining(), Duration::ZERO);
        assert_eq!(policy.session_count(), 1);
    }

    #[test]
    fn evaluation_while_active_is_ignored() {
        let (_, mut policy) = setup(vec![0.1]);
        assert!(policy.evaluate(secs(200), secs(100)).is_some());
        assert!(policy.evaluate(secs(200), secs(100)).is_none());
        assert_eq!(policy.stats().triggered, 1);
    }

    #[test]
    fn completion_is_exact_with_coarse_polling() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 10, 25, 21, 0, 0).unwrap());
        let config = PolicyConfig {
            countdown_interval: Duration::from_millis(700),
            ..PolicyConfig::default()
        };
        let mut policy = InterventionPolicy::new(
            config,
            Arc::new(clock.clone()),
            Box::new(ScriptedRandom::new(vec![0.1])),
        );
        policy.evaluate(secs(100), secs(100)).unwrap();
        clock.advance_secs(3);
        assert!(matches!(
            policy.poll(),
            Some(Event::InterventionCompleted { .. })
        ));
    }

    #[test]
    fn cancel_clears_state_and_is_idempotent() {
        let (clock, mut policy) = setup(vec![0.1]);
        policy.evaluate(secs(80), secs(100)).unwrap();
        clock.advance_secs(1);
        assert!(policy.cancel_active_intervention().is_some());
        assert!(!policy.is_active());
        assert!(!policy.suppress_interaction());
        assert_eq!(policy.remaining(), Duration::ZERO);
        assert!(policy.cancel_active_intervention().is_none());
        assert_eq!(policy.session_count(), 0);

        // A fresh trigger is possible right away.
        assert!(policy.evaluate(secs(80), secs(100)).is_some());
    }

    #[test]
    fn zero_threshold_never_triggers() {
        let (_, mut policy) = setup(vec![0.1]);
        for elapsed in [0, 1, 1_000, 1_000_000] {
            assert!(policy.evaluate(secs(elapsed), Duration::ZERO).is_none());
        }
    }

    #[test]
    fn percent_payload_and_streak_message() {
        let (clock, mut policy) = setup(vec![0.1]);
        policy.set_session_count(4);
        policy.set_streak_days(3);
        let trigger = policy.evaluate(secs(150), secs(100)).unwrap();
        assert_eq!(trigger.percent(), Some(150));
        assert_eq!(trigger.duration, secs(6));
        assert!(trigger.message.ends_with("Don't break your 3-day streak!"));
        clock.advance_secs(6);
        policy.poll();
        assert_eq!(policy.session_count(), 5);
        assert_eq!(policy.stats().milestones, 1);
    }

    #[test]
    fn reset_session_restarts_cadence() {
        let (_, mut policy) = setup(vec![0.1]);
        policy.set_session_count(4);
        policy.evaluate(secs(80), secs(100)).unwrap();
        assert!(policy.reset_session().is_some());
        assert_eq!(policy.session_count(), 0);
        let next = policy.evaluate(secs(80), secs(100)).unwrap();
        assert_eq!(next.kind, InterventionKind::Regular);
    }

    #[test]
    fn ceil_secs_rounds_partial_seconds_up() {
        assert_eq!(ceil_secs(Duration::from_millis(2001)), 3);
        assert_eq!(ceil_secs(Duration::from_millis(2000)), 2);
        assert_eq!(ceil_secs(Duration::ZERO), 0);
    }
}
