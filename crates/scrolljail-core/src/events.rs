use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::{Band, InterventionKind};
use crate::tracker::TrackerState;

/// Every state change in the core produces an Event.
/// Hosts render from events; the CLI prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TrackingStarted {
        elapsed_today_ms: u64,
        at: DateTime<Utc>,
    },
    TrackingResumed {
        elapsed_today_ms: u64,
        at: DateTime<Utc>,
    },
    TrackingPaused {
        segment_ms: u64,
        elapsed_today_ms: u64,
        at: DateTime<Utc>,
    },
    TrackingStopped {
        segment_ms: u64,
        elapsed_today_ms: u64,
        at: DateTime<Utc>,
    },
    /// Periodic read-only projection of today's watch time.
    TrackingTick {
        elapsed_today_ms: u64,
        at: DateTime<Utc>,
    },
    /// The calendar day changed; today's counter restarted from zero.
    DayRolledOver {
        previous_day: NaiveDate,
        today: NaiveDate,
        /// Watch time committed to `previous_day` by the rollover.
        previous_day_ms: u64,
        at: DateTime<Utc>,
    },
    /// All watch history was cleared on request.
    DataReset {
        at: DateTime<Utc>,
    },
    InterventionStarted {
        kind: InterventionKind,
        band: Band,
        duration_ms: u64,
        message: String,
        /// 1-based ordinal of this intervention within the viewing session.
        ordinal: u32,
        at: DateTime<Utc>,
    },
    CountdownTick {
        remaining_ms: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    InterventionCompleted {
        kind: InterventionKind,
        duration_ms: u64,
        session_count: u32,
        at: DateTime<Utc>,
    },
    InterventionCancelled {
        kind: InterventionKind,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        tracking: TrackerState,
        day: NaiveDate,
        elapsed_today_ms: u64,
        threshold_ms: u64,
        intervention_active: bool,
        remaining_ms: u64,
        session_count: u32,
        at: DateTime<Utc>,
    },
}

pub(crate) fn millis(d: std::time::Duration) -> u64 {
    d.as_millis().min(u64::MAX as u128) as u64
}
