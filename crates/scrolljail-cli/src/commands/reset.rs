use std::sync::Arc;

use scrolljail_core::storage::Database;
use scrolljail_core::{Config, SystemClock, WatchTimeTracker};

use super::emit;

pub fn run(yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !yes {
        return Err("this deletes all watch history; pass --yes to confirm".into());
    }
    let config = Config::load_or_default();
    let db = Database::open()?;
    let mut tracker = WatchTimeTracker::new(Arc::new(SystemClock), Box::new(db), config.tick_interval());
    emit(&tracker.reset_all())?;
    Ok(())
}
