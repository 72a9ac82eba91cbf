//! Deterministic simulation harness for a viewing session.
//!
//! Drives a [`FeedSession`] with a [`ManualClock`] and a seeded random source
//! so a scenario always produces the same event stream. Useful for tuning the
//! intervention settings and for regression tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::ManualClock;
use crate::error::{CoreError, ValidationError};
use crate::events::{millis, Event};
use crate::policy::InterventionStats;
use crate::random::SeededRandom;
use crate::session::FeedSession;
use crate::storage::{Config, MemoryStore};

/// A span during which the app sits in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundWindow {
    /// Offset from the start of the scenario.
    pub at_secs: u64,
    pub for_secs: u64,
}

impl BackgroundWindow {
    fn contains(&self, offset: Duration) -> bool {
        let start = Duration::from_secs(self.at_secs);
        offset >= start && offset < start + Duration::from_secs(self.for_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationScenario {
    pub name: String,
    pub seed: u64,
    pub start: DateTime<Utc>,
    /// Overrides the configured threshold for this run.
    pub threshold_secs: i64,
    /// Wall-clock length of the run.
    pub duration_secs: u64,
    /// The user swipes to the next item this often.
    pub swipe_every_secs: u64,
    /// Simulation resolution.
    pub step_ms: u64,
    #[serde(default)]
    pub background: Vec<BackgroundWindow>,
}

impl SimulationScenario {
    pub fn new(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            seed,
            start: Utc
                .with_ymd_and_hms(2025, 1, 1, 12, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
            threshold_secs: 1800,
            duration_secs: 3600,
            swipe_every_secs: 15,
            step_ms: 250,
            background: Vec::new(),
        }
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    pub fn with_threshold_secs(mut self, secs: i64) -> Self {
        self.threshold_secs = secs;
        self
    }

    pub fn with_duration_secs(mut self, secs: u64) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn with_swipe_every_secs(mut self, secs: u64) -> Self {
        self.swipe_every_secs = secs;
        self
    }

    pub fn with_background(mut self, window: BackgroundWindow) -> Self {
        self.background.push(window);
        self
    }

    /// # Errors
    /// Returns [`ValidationError::InvalidValue`] for zero durations or steps.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |field: &str| ValidationError::InvalidValue {
            field: field.to_string(),
            message: "must be positive".to_string(),
        };
        if self.duration_secs == 0 {
            return Err(invalid("duration_secs"));
        }
        if self.swipe_every_secs == 0 {
            return Err(invalid("swipe_every_secs"));
        }
        if self.step_ms == 0 {
            return Err(invalid("step_ms"));
        }
        Ok(())
    }

    /// Read a scenario from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Write a scenario as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn in_background(&self, offset: Duration) -> bool {
        self.background.iter().any(|w| w.contains(offset))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    pub watch_ms: u64,
    pub swipes: u32,
    /// Swipes that landed while an intervention held the feed.
    pub blocked_swipes: u32,
    pub interventions: InterventionStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub scenario: SimulationScenario,
    pub events: Vec<Event>,
    pub metrics: SimulationMetrics,
}

/// Run `scenario` against `config`.
///
/// # Errors
/// Returns an error if the scenario or the intervention settings are invalid.
pub fn run_scenario(scenario: &SimulationScenario, config: &Config) -> Result<SimulationResult, CoreError> {
    scenario.validate()?;

    let mut config = config.clone();
    config.threshold.daily_threshold_secs = scenario.threshold_secs;

    let clock = ManualClock::new(scenario.start);
    let mut session = FeedSession::from_config(
        &config,
        Arc::new(clock.clone()),
        Box::new(MemoryStore::new()),
        Box::new(SeededRandom::new(Some(scenario.seed))),
    )?;

    let step = Duration::from_millis(scenario.step_ms);
    let end = Duration::from_secs(scenario.duration_secs);
    let swipe_every = Duration::from_secs(scenario.swipe_every_secs);

    let mut events = session.open();
    let mut metrics = SimulationMetrics::default();
    let mut offset = Duration::ZERO;
    let mut next_swipe = swipe_every;
    let mut backgrounded = false;

    while offset < end {
        clock.advance(step);
        offset += step;

        let should_background = scenario.in_background(offset);
        if should_background != backgrounded {
            backgrounded = should_background;
            if backgrounded {
                events.extend(session.enter_background());
            } else {
                events.extend(session.enter_foreground());
            }
        }

        events.extend(session.poll());

        if offset < next_swipe {
            continue;
        }
        next_swipe += swipe_every;
        if backgrounded {
            continue;
        }
        if session.is_suppressed() {
            metrics.blocked_swipes += 1;
            continue;
        }
        metrics.swipes += 1;
        events.extend(session.content_switched());
    }

    events.extend(session.close());
    metrics.watch_ms = millis(session.elapsed_today());
    metrics.interventions = session.policy().stats().clone();
    debug!(
        name = %scenario.name,
        events = events.len(),
        triggered = metrics.interventions.triggered,
        "simulation finished"
    );

    Ok(SimulationResult {
        scenario: scenario.clone(),
        events,
        metrics,
    })
}
