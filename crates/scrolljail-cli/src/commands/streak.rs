use clap::Subcommand;
use scrolljail_core::storage::Database;
use scrolljail_core::{Clock, Config, StorageError, Streak, SystemClock, WatchStore};
use serde_json::json;
use tracing::warn;

#[derive(Subcommand)]
pub enum StreakAction {
    /// Print the current streak, milestones and achievements
    Show,
    /// Spend a freeze credit to cover a missed day
    Freeze,
}

/// Load the streak and bring it up to date: settle every recorded day that
/// ended since it was last saved, then apply the missed-day check.
pub(crate) fn load_settled(
    db: &Database,
    config: &Config,
    clock: &dyn Clock,
) -> Result<Streak, StorageError> {
    let mut streak = db.load_streak()?;
    let today = clock.today();
    let records = db.history().unwrap_or_else(|e| {
        warn!("failed to read watch history, skipping settlement: {e}");
        Vec::new()
    });
    let settled = streak.settle_history(&records, today, config.threshold());
    let broken = streak.reconcile(today);
    if settled > 0 || broken {
        db.save_streak(&streak)?;
    }
    Ok(streak)
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let mut streak = load_settled(&db, &config, &SystemClock)?;
    let today = SystemClock.today();

    match action {
        StreakAction::Show => {
            let achievements: Vec<_> = streak
                .achievements()
                .into_iter()
                .map(|a| json!({ "title": a.title(), "description": a.description() }))
                .collect();
            let out = json!({
                "current": streak.current_count,
                "longest": streak.longest,
                "freezes": streak.freezes,
                "milestone": streak.current_milestone().title(),
                "next_milestone": streak.next_milestone().map(|m| m.title()),
                "days_until_next_milestone": streak.days_until_next_milestone(),
                "success_rate": streak.success_rate(),
                "achievements": achievements,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        StreakAction::Freeze => {
            if !streak.use_freeze(today) {
                return Err("no streak freezes left".into());
            }
            db.save_streak(&streak)?;
            println!("freeze used, {} left", streak.freezes);
        }
    }
    Ok(())
}
