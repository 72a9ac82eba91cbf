//! Running intervention statistics.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::decision::InterventionKind;
use crate::events::millis;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterventionStats {
    pub triggered: u32,
    pub completed: u32,
    pub cancelled: u32,
    pub milestones: u32,
    /// Forced-pause time actually sat through, completed or cut short.
    pub total_pause_ms: u64,
    /// Regular interventions by planned duration in seconds.
    pub regular_by_secs: BTreeMap<u64, u32>,
}

impl InterventionStats {
    pub(crate) fn record_trigger(&mut self, kind: InterventionKind, planned: Duration) {
        self.triggered += 1;
        match kind {
            InterventionKind::PercentageMilestone { .. } => self.milestones += 1,
            InterventionKind::Regular => {
                *self.regular_by_secs.entry(planned.as_secs()).or_insert(0) += 1;
            }
        }
    }

    pub(crate) fn record_completion(&mut self, planned: Duration) {
        self.completed += 1;
        self.total_pause_ms = self.total_pause_ms.saturating_add(millis(planned));
    }

    pub(crate) fn record_cancel(&mut self, served: Duration) {
        self.cancelled += 1;
        self.total_pause_ms = self.total_pause_ms.saturating_add(millis(served));
    }

    /// Mean time per finished intervention (completed or cancelled).
    pub fn average_pause(&self) -> Duration {
        let finished = self.completed + self.cancelled;
        if finished == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.total_pause_ms / finished as u64)
    }

    /// Share of finished interventions that were cut short.
    pub fn cancellation_rate(&self) -> f64 {
        let finished = self.completed + self.cancelled;
        if finished == 0 {
            return 0.0;
        }
        self.cancelled as f64 / finished as f64
    }
}
