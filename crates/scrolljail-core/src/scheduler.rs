//! Cancellable repeating-task handle.
//!
//! Nothing here spawns threads. A component owns a [`RepeatingTask`], arms it
//! when it becomes active and cancels it on every exit path; the host asks
//! the component to `poll()` as often as it likes and the task reports how
//! many periods fell due since the last poll. Dropping the owner drops the
//! task, so no callback can outlive the component it drives.

use std::time::Duration;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct RepeatingTask {
    period: Duration,
    next_due: Option<DateTime<Utc>>,
}

impl RepeatingTask {
    /// A zero period is bumped to one millisecond.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Arm the task so its first firing is one period after `now`.
    /// Re-arming an armed task restarts its phase.
    pub fn arm(&mut self, now: DateTime<Utc>) {
        self.next_due = Some(now + self.step());
    }

    /// Idempotent.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// Number of periods that elapsed up to `now`, advancing the phase past
    /// them. Returns 0 for a cancelled task.
    pub fn fire_due(&mut self, now: DateTime<Utc>) -> u32 {
        let Some(due) = self.next_due else {
            return 0;
        };
        if now < due {
            return 0;
        }
        let period_ms = self.period.as_millis().max(1) as i64;
        let late_ms = (now - due).num_milliseconds();
        let fired = late_ms / period_ms + 1;
        self.next_due = Some(due + chrono::Duration::milliseconds(fired * period_ms));
        fired.min(u32::MAX as i64) as u32
    }

    fn step(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.period).unwrap_or(chrono::Duration::seconds(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 25, 12, 0, 0).unwrap()
    }

    #[test]
    fn unarmed_task_never_fires() {
        let mut task = RepeatingTask::new(Duration::from_secs(1));
        assert_eq!(task.fire_due(t0() + chrono::Duration::seconds(10)), 0);
    }

    #[test]
    fn fires_once_per_elapsed_period() {
        let mut task = RepeatingTask::new(Duration::from_secs(1));
        task.arm(t0());
        assert_eq!(task.fire_due(t0() + chrono::Duration::milliseconds(999)), 0);
        assert_eq!(task.fire_due(t0() + chrono::Duration::seconds(1)), 1);
        assert_eq!(task.fire_due(t0() + chrono::Duration::milliseconds(1500)), 0);
        assert_eq!(task.fire_due(t0() + chrono::Duration::milliseconds(4200)), 3);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut task = RepeatingTask::new(Duration::from_secs(1));
        task.arm(t0());
        task.cancel();
        task.cancel();
        assert!(!task.is_armed());
        assert_eq!(task.fire_due(t0() + chrono::Duration::seconds(5)), 0);
    }

    #[test]
    fn zero_period_is_clamped() {
        let task = RepeatingTask::new(Duration::ZERO);
        assert_eq!(task.period(), Duration::from_millis(1));
    }
}
