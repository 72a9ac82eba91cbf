//! Daily streak model.
//!
//! A streak counts consecutive days on which the user stayed within their
//! threshold. The intervention policy only reads `current_count`; the host
//! decides when a day qualifies and calls `increment` or `break_streak`.
//!
//! Freeze credits start at one and are capped at [`MAX_FREEZES`]. Breaking a
//! streak grants a freeze so a single bad day is recoverable next time.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::storage::DailyWatchRecord;

pub const MAX_FREEZES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakMilestone {
    FiveDays,
    TenDays,
    ThreeWeeks,
    OneMonth,
    TwoMonths,
    OneHundredDays,
    HalfYear,
    OneYear,
}

impl StreakMilestone {
    pub const ALL: [StreakMilestone; 8] = [
        StreakMilestone::FiveDays,
        StreakMilestone::TenDays,
        StreakMilestone::ThreeWeeks,
        StreakMilestone::OneMonth,
        StreakMilestone::TwoMonths,
        StreakMilestone::OneHundredDays,
        StreakMilestone::HalfYear,
        StreakMilestone::OneYear,
    ];

    pub fn days(self) -> u32 {
        match self {
            StreakMilestone::FiveDays => 5,
            StreakMilestone::TenDays => 10,
            StreakMilestone::ThreeWeeks => 21,
            StreakMilestone::OneMonth => 30,
            StreakMilestone::TwoMonths => 60,
            StreakMilestone::OneHundredDays => 100,
            StreakMilestone::HalfYear => 182,
            StreakMilestone::OneYear => 365,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            StreakMilestone::FiveDays => "5-Day Streak",
            StreakMilestone::TenDays => "10-Day Streak",
            StreakMilestone::ThreeWeeks => "3-Week Streak",
            StreakMilestone::OneMonth => "1-Month Streak",
            StreakMilestone::TwoMonths => "2-Month Streak",
            StreakMilestone::OneHundredDays => "100 Days!",
            StreakMilestone::HalfYear => "Half Year!",
            StreakMilestone::OneYear => "1 Year Legend!",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StreakMilestone::FiveDays => "You're building a habit!",
            StreakMilestone::TenDays => "Double digits! Amazing!",
            StreakMilestone::ThreeWeeks => "Three weeks strong!",
            StreakMilestone::OneMonth => "A full month of focus!",
            StreakMilestone::TwoMonths => "Incredible dedication!",
            StreakMilestone::OneHundredDays => "Century streak achieved!",
            StreakMilestone::HalfYear => "Half a year of mindfulness!",
            StreakMilestone::OneYear => "You're a focus legend!",
        }
    }

    /// Highest milestone reached by `count`, or the first one if none yet.
    pub fn for_count(count: u32) -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|m| m.days() <= count)
            .unwrap_or(StreakMilestone::FiveDays)
    }

    /// First milestone strictly above `count`; `None` past a year.
    pub fn next_after(count: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.days() > count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakAchievement {
    OneWeek,
    OneMonth,
    OneHundredDays,
    OneYear,
    FreezeMaster,
}

impl StreakAchievement {
    pub fn title(self) -> &'static str {
        match self {
            StreakAchievement::OneWeek => "First Week",
            StreakAchievement::OneMonth => "Month Master",
            StreakAchievement::OneHundredDays => "Centurion",
            StreakAchievement::OneYear => "Year Legend",
            StreakAchievement::FreezeMaster => "Freeze Master",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StreakAchievement::OneWeek => "Maintain a 7-day streak",
            StreakAchievement::OneMonth => "Reach 30 days of focus",
            StreakAchievement::OneHundredDays => "Achieve 100 days straight",
            StreakAchievement::OneYear => "Complete a full year",
            StreakAchievement::FreezeMaster => "Collect 3 streak freezes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub current_count: u32,
    pub longest: u32,
    pub total_days_tracked: u32,
    /// Qualifying days, oldest first.
    pub history: Vec<NaiveDate>,
    pub freezes: u32,
    pub last_updated: Option<NaiveDate>,
    pub last_freeze_used: Option<NaiveDate>,
}

impl Default for Streak {
    fn default() -> Self {
        Self {
            current_count: 0,
            longest: 0,
            total_days_tracked: 0,
            history: Vec::new(),
            freezes: 1,
            last_updated: None,
            last_freeze_used: None,
        }
    }
}

impl Streak {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `today` has already been counted.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.last_updated.is_some_and(|d| d >= today)
    }

    /// Count `today` as a qualifying day. A second call on the same day is a
    /// no-op. Returns true if the count changed.
    pub fn increment(&mut self, today: NaiveDate) -> bool {
        if self.is_active_on(today) {
            debug!(%today, "streak already counted today");
            return false;
        }
        self.current_count += 1;
        self.total_days_tracked += 1;
        self.last_updated = Some(today);
        self.history.push(today);
        self.longest = self.longest.max(self.current_count);
        info!(%today, current = self.current_count, "streak extended");
        true
    }

    /// Reset the count to zero and grant a freeze, up to the cap.
    pub fn break_streak(&mut self, today: NaiveDate) {
        info!(%today, lost = self.current_count, "streak broken");
        self.current_count = 0;
        self.last_updated = Some(today);
        self.add_freeze();
    }

    /// Spend one freeze credit. Returns false when none are left.
    pub fn use_freeze(&mut self, today: NaiveDate) -> bool {
        if self.freezes == 0 {
            return false;
        }
        self.freezes -= 1;
        self.last_freeze_used = Some(today);
        true
    }

    pub fn add_freeze(&mut self) {
        self.freezes = (self.freezes + 1).min(MAX_FREEZES);
    }

    /// Apply a missed-day check at startup. Every day between the last
    /// counted day and `today` costs one freeze. If the credits cannot cover
    /// the whole gap none are spent and the streak breaks. Returns true if
    /// the streak was broken.
    pub fn reconcile(&mut self, today: NaiveDate) -> bool {
        let Some(last) = self.last_updated else {
            return false;
        };
        let missed = (today - last).num_days() - 1;
        if missed <= 0 || self.current_count == 0 {
            return false;
        }
        if i64::from(self.freezes) >= missed {
            self.freezes -= missed as u32;
            self.last_freeze_used = Some(today);
            self.last_updated = today.pred_opt();
            info!(%today, missed, left = self.freezes, "streak freezes spent on missed days");
            return false;
        }
        self.break_streak(today);
        true
    }

    /// Settle a finished day: within the threshold extends the streak,
    /// over it breaks the streak. A zero threshold settles nothing.
    pub fn settle_day(&mut self, day: NaiveDate, watched: Duration, threshold: Duration) {
        if threshold.is_zero() {
            return;
        }
        if watched <= threshold {
            self.increment(day);
        } else {
            self.break_streak(day);
        }
    }

    /// Settle every recorded day after the last settled one and before
    /// `today`, oldest first. Covers days that ended while nothing was
    /// running to observe the rollover.
    pub fn settle_history(
        &mut self,
        records: &[DailyWatchRecord],
        today: NaiveDate,
        threshold: Duration,
    ) -> usize {
        let mut settled = 0;
        for record in records {
            if record.date >= today || self.last_updated.is_some_and(|d| record.date <= d) {
                continue;
            }
            self.settle_day(record.date, record.watch_time(), threshold);
            settled += 1;
        }
        if settled > 0 {
            debug!(settled, current = self.current_count, "settled recorded days");
        }
        settled
    }

    pub fn current_milestone(&self) -> StreakMilestone {
        StreakMilestone::for_count(self.current_count)
    }

    pub fn next_milestone(&self) -> Option<StreakMilestone> {
        StreakMilestone::next_after(self.current_count)
    }

    /// Days left until the next multiple of five.
    pub fn days_until_next_milestone(&self) -> u32 {
        (self.current_count / 5 + 1) * 5 - self.current_count
    }

    pub fn achievements(&self) -> Vec<StreakAchievement> {
        let mut out = Vec::new();
        if self.current_count >= 7 {
            out.push(StreakAchievement::OneWeek);
        }
        if self.current_count >= 30 {
            out.push(StreakAchievement::OneMonth);
        }
        if self.current_count >= 100 {
            out.push(StreakAchievement::OneHundredDays);
        }
        if self.longest >= 365 {
            out.push(StreakAchievement::OneYear);
        }
        if self.freezes >= MAX_FREEZES {
            out.push(StreakAchievement::FreezeMaster);
        }
        out
    }

    /// Share of tracked days that belong to the current streak.
    pub fn success_rate(&self) -> f64 {
        if self.total_days_tracked == 0 {
            return 0.0;
        }
        self.current_count as f64 / self.total_days_tracked as f64
    }

    /// Mean length of the consecutive runs in `history`.
    pub fn average_run_length(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let runs = 1 + self
            .history
            .windows(2)
            .filter(|pair| (pair[1] - pair[0]).num_days() > 1)
            .count();
        self.history.len() as f64 / runs as f64
    }
}
