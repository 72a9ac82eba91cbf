//! Mascot message table.

use serde::{Deserialize, Serialize};

use super::decision::{Band, InterventionKind};
use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mascot {
    #[default]
    Owl,
    Sloth,
    Fox,
    Bear,
    Rabbit,
}

impl Mascot {
    pub const ALL: [Mascot; 5] = [
        Mascot::Owl,
        Mascot::Sloth,
        Mascot::Fox,
        Mascot::Bear,
        Mascot::Rabbit,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Mascot::Owl => "Wise Owl",
            Mascot::Sloth => "Sleepy Sloth",
            Mascot::Fox => "Clever Fox",
            Mascot::Bear => "Strong Bear",
            Mascot::Rabbit => "Energetic Rabbit",
        }
    }

    /// Flavor lines, first one is the mascot's signature.
    pub fn lines(self) -> &'static [&'static str] {
        match self {
            Mascot::Owl => &[
                "Time to focus, wise one!",
                "Your future self will thank you!",
                "Knowledge over endless scrolling!",
                "Be present in the moment!",
                "Your mind is your greatest asset!",
            ],
            Mascot::Sloth => &[
                "Slow down... and take a break!",
                "Everything in moderation!",
                "Rest is productive too!",
                "One step at a time!",
                "Chill out and close the app!",
            ],
            Mascot::Fox => &[
                "You're too clever to waste time!",
                "Outsmart the algorithm!",
                "Be sly with your time!",
                "Don't get tricked into scrolling!",
                "Use your wits wisely!",
            ],
            Mascot::Bear => &[
                "Be strong and close the app!",
                "You've got the willpower!",
                "Stand strong against distraction!",
                "Your focus is your strength!",
                "Be the master of your time!",
            ],
            Mascot::Rabbit => &[
                "Hop to something productive!",
                "Energy for what matters!",
                "Quick! Close before you get stuck!",
                "Be nimble with your choices!",
                "Jump into real life!",
            ],
        }
    }
}

impl std::str::FromStr for Mascot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "owl" => Ok(Mascot::Owl),
            "sloth" => Ok(Mascot::Sloth),
            "fox" => Ok(Mascot::Fox),
            "bear" => Ok(Mascot::Bear),
            "rabbit" => Ok(Mascot::Rabbit),
            other => Err(format!("unknown mascot: {other}")),
        }
    }
}

/// Builds the text shown during an intervention.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageTable {
    mascot: Option<Mascot>,
}

impl MessageTable {
    pub fn new(mascot: Option<Mascot>) -> Self {
        Self { mascot }
    }

    pub fn mascot(&self) -> Option<Mascot> {
        self.mascot
    }

    /// Message for a triggered intervention. `streak_days` is read-only
    /// context; a positive streak adds a reminder once the limit is reached.
    pub fn compose(
        &self,
        kind: InterventionKind,
        band: Band,
        streak_days: u32,
        random: &mut dyn RandomSource,
    ) -> String {
        let mut message = match kind {
            InterventionKind::PercentageMilestone { percent } => {
                format!("You've used {percent}% of today's scrolling budget.")
            }
            InterventionKind::Regular => match self.mascot {
                Some(mascot) => {
                    let lines = mascot.lines();
                    lines[random.pick(lines.len())].to_string()
                }
                None => match band {
                    Band::LimitReached => "Your scrolling time is up!".to_string(),
                    _ => "Time for a quick break?".to_string(),
                },
            },
        };

        if band == Band::LimitReached && streak_days > 0 {
            message.push_str(&format!(" Don't break your {streak_days}-day streak!"));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    #[test]
    fn every_mascot_has_five_lines() {
        for mascot in Mascot::ALL {
            assert_eq!(mascot.lines().len(), 5, "{}", mascot.display_name());
        }
    }

    #[test]
    fn selection_follows_random_source() {
        let table = MessageTable::new(Some(Mascot::Fox));
        let mut rng = ScriptedRandom::new(vec![0.0, 0.45, 0.99]);
        let msgs: Vec<String> = (0..3)
            .map(|_| table.compose(InterventionKind::Regular, Band::EarlyNudge, 0, &mut rng))
            .collect();
        assert_eq!(msgs[0], "You're too clever to waste time!");
        assert_eq!(msgs[1], "Be sly with your time!");
        assert_eq!(msgs[2], "Use your wits wisely!");
    }

    #[test]
    fn milestone_message_shows_percent() {
        let table = MessageTable::new(Some(Mascot::Owl));
        let mut rng = ScriptedRandom::new(vec![0.0]);
        let msg = table.compose(
            InterventionKind::PercentageMilestone { percent: 72 },
            Band::EarlyNudge,
            4,
            &mut rng,
        );
        assert_eq!(msg, "You've used 72% of today's scrolling budget.");
    }

    #[test]
    fn streak_reminder_only_past_limit() {
        let table = MessageTable::new(None);
        let mut rng = ScriptedRandom::new(vec![0.0]);
        let early = table.compose(InterventionKind::Regular, Band::EarlyNudge, 6, &mut rng);
        assert_eq!(early, "Time for a quick break?");
        let late = table.compose(InterventionKind::Regular, Band::LimitReached, 6, &mut rng);
        assert_eq!(late, "Your scrolling time is up! Don't break your 6-day streak!");
    }

    #[test]
    fn mascot_parses_case_insensitively() {
        assert_eq!("Rabbit".parse::<Mascot>().unwrap(), Mascot::Rabbit);
        assert!("dragon".parse::<Mascot>().is_err());
    }
}
