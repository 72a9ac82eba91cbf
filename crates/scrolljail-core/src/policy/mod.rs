//! Intervention policy.
//!
//! `decision` is the pure part (bands, cadence, sampling); `intervention`
//! owns the single active intervention and its countdown.

mod decision;
mod intervention;
mod messages;
mod stats;

pub use decision::{decide, Band, Decision, DurationWeight, InterventionKind, PolicyConfig};
pub use intervention::{InterventionPolicy, InterventionState, TriggerResult};
pub use messages::{Mascot, MessageTable};
pub use stats::InterventionStats;
