//! Pure intervention decision: ratio bands, milestone cadence and weighted
//! duration sampling. No state, no clock.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::messages::Mascot;
use crate::error::ConfigError;
use crate::random::RandomSource;

/// Where today's watch time sits relative to the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    /// Threshold is zero: interventions are off.
    Disabled,
    /// Below the nudge ratio.
    Below,
    /// Between the nudge ratio and the threshold.
    EarlyNudge,
    /// At or past the threshold.
    LimitReached,
}

impl Band {
    pub fn classify(elapsed: Duration, threshold: Duration, nudge_ratio: f64) -> Self {
        if threshold.is_zero() {
            return Band::Disabled;
        }
        let ratio = elapsed.as_secs_f64() / threshold.as_secs_f64();
        if ratio >= 1.0 {
            Band::LimitReached
        } else if ratio >= nudge_ratio {
            Band::EarlyNudge
        } else {
            Band::Below
        }
    }

    pub fn is_eligible(self) -> bool {
        matches!(self, Band::EarlyNudge | Band::LimitReached)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionKind {
    /// Short forced pause with a sampled duration.
    Regular,
    /// Fixed pause showing how much of the threshold is used up.
    PercentageMilestone { percent: u32 },
}

impl InterventionKind {
    pub fn is_milestone(self) -> bool {
        matches!(self, InterventionKind::PercentageMilestone { .. })
    }
}

/// One bucket of the regular-duration distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationWeight {
    pub duration: Duration,
    pub weight: f64,
}

/// Policy tuning. The default is the production scheme: nudges from 60% of
/// the threshold, every 5th intervention a 6 s milestone, otherwise 3/5/6/7/8 s
/// weighted 50/20/10/10/10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub nudge_ratio: f64,
    pub milestone_every: u32,
    pub milestone_duration: Duration,
    pub countdown_interval: Duration,
    pub weights: Vec<DurationWeight>,
    /// `None` disables mascot lines in favour of neutral messages.
    pub mascot: Option<Mascot>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            nudge_ratio: 0.6,
            milestone_every: 5,
            milestone_duration: Duration::from_secs(6),
            countdown_interval: Duration::from_secs(1),
            weights: [(3, 0.5), (5, 0.2), (6, 0.1), (7, 0.1), (8, 0.1)]
                .into_iter()
                .map(|(secs, weight)| DurationWeight {
                    duration: Duration::from_secs(secs),
                    weight,
                })
                .collect(),
            mascot: Some(Mascot::default()),
        }
    }
}

impl PolicyConfig {
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        if !(self.nudge_ratio.is_finite() && self.nudge_ratio > 0.0 && self.nudge_ratio <= 1.0) {
            return Err(invalid("intervention.nudge_ratio", "must be in (0, 1]"));
        }
        if self.milestone_every == 0 {
            return Err(invalid("intervention.milestone_every", "must be at least 1"));
        }
        if self.milestone_duration.is_zero() {
            return Err(invalid("intervention.milestone_duration_secs", "must be positive"));
        }
        if self.countdown_interval.is_zero() {
            return Err(invalid("intervention.countdown_interval_ms", "must be positive"));
        }
        if self.weights.is_empty() {
            return Err(invalid("intervention.weights", "must not be empty"));
        }
        if self
            .weights
            .iter()
            .any(|w| !w.weight.is_finite() || w.weight < 0.0 || w.duration.is_zero())
        {
            return Err(invalid(
                "intervention.weights",
                "weights must be finite and non-negative with positive durations",
            ));
        }
        if self.total_weight() <= 0.0 {
            return Err(invalid("intervention.weights", "weights must not all be zero"));
        }
        Ok(())
    }

    fn total_weight(&self) -> f64 {
        self.weights.iter().map(|w| w.weight).sum()
    }

    /// Map a uniform sample in `[0, 1)` onto the weighted buckets by
    /// cumulative probability. Falls back to the last bucket, or 3 s for an
    /// empty table.
    pub fn sample_duration(&self, r: f64) -> Duration {
        let total = self.total_weight();
        let Some(last) = self.weights.last() else {
            return Duration::from_secs(3);
        };
        if total <= 0.0 {
            return last.duration;
        }
        let target = r * total;
        let mut cumulative = 0.0;
        for bucket in &self.weights {
            cumulative += bucket.weight;
            if target <= cumulative {
                return bucket.duration;
            }
        }
        last.duration
    }
}

/// What a triggered evaluation should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub kind: InterventionKind,
    pub band: Band,
    pub duration: Duration,
}

/// Decide whether the next evaluation triggers, and with what.
///
/// `session_count` is the number of interventions already completed in this
/// viewing session. Only regular interventions consume a random sample.
pub fn decide(
    elapsed: Duration,
    threshold: Duration,
    session_count: u32,
    config: &PolicyConfig,
    random: &mut dyn RandomSource,
) -> Option<Decision> {
    let band = Band::classify(elapsed, threshold, config.nudge_ratio);
    if !band.is_eligible() {
        return None;
    }

    let every = config.milestone_every.max(1);
    if (session_count.saturating_add(1)) % every == 0 {
        let percent = (elapsed.as_secs_f64() / threshold.as_secs_f64() * 100.0).round();
        return Some(Decision {
            kind: InterventionKind::PercentageMilestone {
                percent: percent.clamp(0.0, u32::MAX as f64) as u32,
            },
            band,
            duration: config.milestone_duration,
        });
    }

    Some(Decision {
        kind: InterventionKind::Regular,
        band,
        duration: config.sample_duration(random.uniform()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedRandom, SeededRandom};

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn band_boundaries_at_hundred_seconds() {
        let t = secs(100);
        assert_eq!(Band::classify(secs(59), t, 0.6), Band::Below);
        assert_eq!(Band::classify(secs(60), t, 0.6), Band::EarlyNudge);
        assert_eq!(Band::classify(secs(99), t, 0.6), Band::EarlyNudge);
        assert_eq!(Band::classify(secs(100), t, 0.6), Band::LimitReached);
        assert_eq!(Band::classify(secs(500), t, 0.6), Band::LimitReached);
    }

    #[test]
    fn zero_threshold_is_disabled() {
        assert_eq!(Band::classify(secs(10_000), Duration::ZERO, 0.6), Band::Disabled);
        let mut rng = ScriptedRandom::new(vec![0.1]);
        assert!(decide(secs(10_000), Duration::ZERO, 0, &PolicyConfig::default(), &mut rng).is_none());
    }

    #[test]
    fn cumulative_sampling_buckets() {
        let cfg = PolicyConfig::default();
        assert_eq!(cfg.sample_duration(0.0), secs(3));
        assert_eq!(cfg.sample_duration(0.5), secs(3));
        assert_eq!(cfg.sample_duration(0.51), secs(5));
        assert_eq!(cfg.sample_duration(0.69), secs(5));
        assert_eq!(cfg.sample_duration(0.75), secs(6));
        assert_eq!(cfg.sample_duration(0.85), secs(7));
        assert_eq!(cfg.sample_duration(0.95), secs(8));
        assert_eq!(cfg.sample_duration(0.999_999), secs(8));
    }

    #[test]
    fn every_fifth_is_a_milestone() {
        let cfg = PolicyConfig::default();
        let mut rng = ScriptedRandom::new(vec![0.3]);
        let regular = decide(secs(80), secs(100), 3, &cfg, &mut rng).unwrap();
        assert_eq!(regular.kind, InterventionKind::Regular);
        assert_eq!(regular.duration, secs(3));

        let milestone = decide(secs(80), secs(100), 4, &cfg, &mut rng).unwrap();
        assert_eq!(
            milestone.kind,
            InterventionKind::PercentageMilestone { percent: 80 }
        );
        assert_eq!(milestone.duration, secs(6));
    }

    #[test]
    fn milestone_percent_rounds() {
        let cfg = PolicyConfig::default();
        let mut rng = ScriptedRandom::new(vec![0.0]);
        let d = decide(Duration::from_millis(123_456), secs(100), 9, &cfg, &mut rng).unwrap();
        assert_eq!(d.kind, InterventionKind::PercentageMilestone { percent: 123 });
        assert_eq!(d.band, Band::LimitReached);
    }

    #[test]
    fn sampled_distribution_matches_weights() {
        let cfg = PolicyConfig::default();
        let mut rng = SeededRandom::new(Some(2025));
        let mut counts = std::collections::BTreeMap::new();
        let n = 10_000;
        for _ in 0..n {
            *counts.entry(cfg.sample_duration(rng.uniform()).as_secs()).or_insert(0u32) += 1;
        }
        for (secs, expected) in [(3, 0.5), (5, 0.2), (6, 0.1), (7, 0.1), (8, 0.1)] {
            let freq = counts.get(&secs).copied().unwrap_or(0) as f64 / n as f64;
            assert!(
                (freq - expected).abs() < 0.03,
                "{secs}s frequency {freq} too far from {expected}"
            );
        }
    }

    #[test]
    fn validate_rejects_bad_weights() {
        let mut cfg = PolicyConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.weights.iter_mut().for_each(|w| w.weight = 0.0);
        assert!(cfg.validate().is_err());
        cfg.weights.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_milestone_cadence() {
        let cfg = PolicyConfig {
            milestone_every: 0,
            ..PolicyConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
