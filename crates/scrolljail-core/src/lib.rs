//! # Scroll Jail Core Library
//!
//! This library provides the core logic for Scroll Jail, a short-form video
//! feed that tracks daily watch time and interrupts scrolling with short,
//! non-interactive pauses once the user approaches their daily threshold.
//! The CLI binary is a thin host over the same library.
//!
//! ## Architecture
//!
//! - **Tracker**: A wall-clock-based state machine that accumulates watch time
//!   per calendar day; the caller invokes `poll()`/`tick()` for projections
//! - **Policy**: Decides when to intervene and for how long, and runs the
//!   countdown of the single active intervention
//! - **Storage**: SQLite-based daily records and TOML-based configuration
//! - **Streak**: Consecutive-day streak model, read by the policy for messages
//!
//! ## Key Components
//!
//! - [`WatchTimeTracker`]: Daily watch-time state machine
//! - [`InterventionPolicy`]: Intervention decision and countdown
//! - [`FeedSession`]: Surface-lifecycle wiring of tracker and policy
//! - [`Database`]: Watch history persistence
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod policy;
pub mod random;
pub mod scheduler;
pub mod session;
pub mod simulation;
pub mod storage;
pub mod streak;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, Result, StorageError, ValidationError};
pub use events::Event;
pub use policy::{
    Band, InterventionKind, InterventionPolicy, InterventionState, InterventionStats, Mascot,
    PolicyConfig, TriggerResult,
};
pub use random::{RandomSource, ScriptedRandom, SeededRandom, ThreadRandom};
pub use scheduler::RepeatingTask;
pub use session::FeedSession;
pub use simulation::{run_scenario, SimulationResult, SimulationScenario};
pub use storage::{Config, DailyWatchRecord, Database, MemoryStore, WatchStore};
pub use streak::{Streak, StreakAchievement, StreakMilestone};
pub use tracker::{TrackerState, WatchTimeTracker};
