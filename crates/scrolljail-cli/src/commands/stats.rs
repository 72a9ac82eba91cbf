use clap::Subcommand;
use scrolljail_core::storage::{Database, WatchStore};
use scrolljail_core::{Clock, Config, SystemClock};
use serde_json::json;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's watch time against the threshold
    Today,
    /// Daily watch-time history
    History {
        /// Only show the most recent N days
        #[arg(long)]
        days: Option<usize>,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Today => {
            let config = Config::load_or_default();
            let today = SystemClock.today();
            let watched = db.daily_record(today)?.unwrap_or_default();
            let threshold = config.threshold();
            let percent = if threshold.is_zero() {
                None
            } else {
                Some((watched.as_secs_f64() / threshold.as_secs_f64() * 100.0).round() as u64)
            };
            let out = json!({
                "date": today,
                "watch_ms": watched.as_millis() as u64,
                "threshold_ms": threshold.as_millis() as u64,
                "percent": percent,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        StatsAction::History { days } => {
            let mut history = db.history()?;
            if let Some(days) = days {
                let skip = history.len().saturating_sub(days);
                history.drain(..skip);
            }
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
    }
    Ok(())
}
