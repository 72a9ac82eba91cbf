//! Daily watch-time tracker.
//!
//! A wall-clock state machine like the rest of the core: it holds no thread
//! of its own, and the host calls `poll()` (or `tick()`) on its own cadence.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start/resume--> Tracking --pause/stop--> Idle
//! ```
//!
//! Duplicate transitions are no-ops. Pause and stop commit the segment to the
//! store before returning; ticks only project and never write.
//!
//! ## Day rollover
//!
//! At construction, at the start of every tick and on every start/resume the
//! current date is checked against the persisted reset marker. A new day
//! restarts the counter at zero; an in-progress segment is committed to the
//! previous day first. A rollover found by start/resume is held until the
//! host collects it with `take_rollover()` or the next `tick()`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{elapsed_between, Clock};
use crate::events::{millis, Event};
use crate::scheduler::RepeatingTask;
use crate::storage::{DailyWatchRecord, WatchStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerState {
    Idle,
    Tracking,
}

/// The contiguous run currently being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSession {
    pub started_at: DateTime<Utc>,
    /// Day total committed before this run began.
    pub base: Duration,
}

impl WatchSession {
    fn total_at(&self, now: DateTime<Utc>) -> Duration {
        self.base + elapsed_between(self.started_at, now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub state: TrackerState,
    pub day: NaiveDate,
    pub elapsed_today_ms: u64,
    pub session_started_at: Option<DateTime<Utc>>,
}

pub struct WatchTimeTracker {
    clock: Arc<dyn Clock>,
    store: Box<dyn WatchStore>,
    day: NaiveDate,
    /// Total committed to `day`, excluding any in-progress segment.
    committed: Duration,
    reset_marker: Option<NaiveDate>,
    session: Option<WatchSession>,
    pending_rollover: Option<Event>,
    ticker: RepeatingTask,
}

impl WatchTimeTracker {
    /// Create a tracker and reconcile today's record with the store.
    pub fn new(clock: Arc<dyn Clock>, store: Box<dyn WatchStore>, tick_interval: Duration) -> Self {
        let today = clock.today();
        let reset_marker = store.last_reset_date().unwrap_or_else(|e| {
            warn!("failed to read reset marker, treating as missing: {e}");
            None
        });

        let mut tracker = Self {
            clock,
            store,
            day: today,
            committed: Duration::ZERO,
            reset_marker,
            session: None,
            pending_rollover: None,
            ticker: RepeatingTask::new(tick_interval),
        };

        if tracker.reset_marker == Some(today) {
            tracker.committed = tracker.read_day(today);
        } else {
            tracker.begin_day(today);
        }
        tracker
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TrackerState {
        if self.session.is_some() {
            TrackerState::Tracking
        } else {
            TrackerState::Idle
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    /// Day the counter currently belongs to.
    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// Today's watch time including the in-progress segment.
    pub fn current_elapsed_today(&self) -> Duration {
        match self.session {
            Some(session) => session.total_at(self.clock.now()),
            None => self.committed,
        }
    }

    pub fn session(&self) -> Option<&WatchSession> {
        self.session.as_ref()
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            state: self.state(),
            day: self.day,
            elapsed_today_ms: millis(self.current_elapsed_today()),
            session_started_at: self.session.map(|s| s.started_at),
        }
    }

    /// Persisted daily records, oldest first. Read failures yield an empty list.
    pub fn history(&self) -> Vec<DailyWatchRecord> {
        self.store.history().unwrap_or_else(|e| {
            warn!("failed to read watch history: {e}");
            Vec::new()
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start_tracking(&mut self) -> Option<Event> {
        let elapsed = self.begin_segment("start")?;
        Some(Event::TrackingStarted {
            elapsed_today_ms: millis(elapsed),
            at: self.clock.now(),
        })
    }

    pub fn resume_tracking(&mut self) -> Option<Event> {
        let elapsed = self.begin_segment("resume")?;
        Some(Event::TrackingResumed {
            elapsed_today_ms: millis(elapsed),
            at: self.clock.now(),
        })
    }

    pub fn pause_tracking(&mut self) -> Option<Event> {
        let (segment, total) = self.end_segment("pause")?;
        Some(Event::TrackingPaused {
            segment_ms: millis(segment),
            elapsed_today_ms: millis(total),
            at: self.clock.now(),
        })
    }

    pub fn stop_tracking(&mut self) -> Option<Event> {
        let (segment, total) = self.end_segment("stop")?;
        Some(Event::TrackingStopped {
            segment_ms: millis(segment),
            elapsed_today_ms: millis(total),
            at: self.clock.now(),
        })
    }

    /// One tracking tick. Returns the rollover event when the day changed,
    /// otherwise a projection event while tracking.
    pub fn tick(&mut self) -> Option<Event> {
        if let Some(rolled) = self.pending_rollover.take() {
            return Some(rolled);
        }
        if let Some(rolled) = self.roll_day_if_needed() {
            return Some(rolled);
        }
        let session = self.session?;
        let now = self.clock.now();
        Some(Event::TrackingTick {
            elapsed_today_ms: millis(session.total_at(now)),
            at: now,
        })
    }

    /// Tick only if the tracker's repeating task is due. Catch-up firings
    /// collapse into a single tick since the projection is idempotent.
    pub fn poll(&mut self) -> Option<Event> {
        if self.ticker.fire_due(self.clock.now()) == 0 {
            return None;
        }
        self.tick()
    }

    /// Rollover detected by the last start/resume, if not yet delivered.
    pub fn take_rollover(&mut self) -> Option<Event> {
        self.pending_rollover.take()
    }

    /// Explicit data reset: drop every daily record and restart today at zero.
    pub fn reset_all(&mut self) -> Event {
        if let Err(e) = self.store.clear() {
            warn!("failed to clear watch history: {e}");
        }
        let now = self.clock.now();
        self.reset_marker = None;
        self.pending_rollover = None;
        self.begin_day(self.clock.today());
        if let Some(session) = self.session.as_mut() {
            session.started_at = now;
            session.base = Duration::ZERO;
        }
        info!("watch history reset");
        Event::DataReset { at: now }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_segment(&mut self, verb: &str) -> Option<Duration> {
        if self.session.is_some() {
            debug!("{verb} ignored: already tracking");
            return None;
        }
        if let Some(rolled) = self.roll_day_if_needed() {
            self.pending_rollover = Some(rolled);
        }
        let now = self.clock.now();
        self.session = Some(WatchSession {
            started_at: now,
            base: self.committed,
        });
        self.ticker.arm(now);
        debug!(day = %self.day, base_ms = millis(self.committed), "{verb} tracking");
        Some(self.committed)
    }

    fn end_segment(&mut self, verb: &str) -> Option<(Duration, Duration)> {
        let Some(session) = self.session.take() else {
            debug!("{verb} ignored: not tracking");
            return None;
        };
        self.ticker.cancel();
        let now = self.clock.now();
        let segment = elapsed_between(session.started_at, now);
        self.committed = session.base + segment;
        self.write_day(self.day, self.committed);
        debug!(
            day = %self.day,
            segment_ms = millis(segment),
            total_ms = millis(self.committed),
            "{verb} tracking"
        );
        Some((segment, self.committed))
    }

    fn roll_day_if_needed(&mut self) -> Option<Event> {
        let today = self.clock.today();
        if self.reset_marker == Some(today) {
            return None;
        }

        let previous_day = self.day;
        let now = self.clock.now();
        let previous_total = match self.session.as_mut() {
            Some(session) => {
                let total = session.total_at(now);
                session.started_at = now;
                session.base = Duration::ZERO;
                self.write_day(previous_day, total);
                total
            }
            None => self.committed,
        };

        self.begin_day(today);
        info!(
            %previous_day,
            %today,
            previous_day_ms = millis(previous_total),
            "day rolled over, watch time reset"
        );
        Some(Event::DayRolledOver {
            previous_day,
            today,
            previous_day_ms: millis(previous_total),
            at: now,
        })
    }

    /// Start `today` from zero and stamp the reset marker.
    fn begin_day(&mut self, today: NaiveDate) {
        self.day = today;
        self.committed = Duration::ZERO;
        self.write_day(today, Duration::ZERO);
        match self.store.set_last_reset_date(today) {
            Ok(()) => {}
            Err(e) => warn!("failed to persist reset marker: {e}"),
        }
        self.reset_marker = Some(today);
    }

    fn read_day(&self, date: NaiveDate) -> Duration {
        match self.store.daily_record(date) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!(%date, "failed to read daily record, assuming zero: {e}");
                Duration::ZERO
            }
        }
    }

    fn write_day(&mut self, date: NaiveDate, total: Duration) {
        if let Err(e) = self.store.set_daily_record(date, total) {
            warn!(%date, "failed to persist daily record: {e}");
        }
    }
}
