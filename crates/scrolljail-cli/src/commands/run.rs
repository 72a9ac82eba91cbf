//! Live session loop.
//!
//! Drives a [`FeedSession`] from a tokio interval against the system clock
//! and the on-disk database. Content switches are simulated on a fixed
//! cadence. Finished days settle the streak.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use scrolljail_core::storage::Database;
use scrolljail_core::{Clock, Config, Event, FeedSession, Streak, SystemClock, ThreadRandom};
use tokio::time::{interval, interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{info, warn};

use super::streak::load_settled;
use super::{emit, emit_all};

#[derive(Args)]
pub struct RunArgs {
    /// Seconds between simulated content switches (0 disables them)
    #[arg(long, default_value = "15")]
    swipe_every: u64,
    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    for_secs: Option<u64>,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;
    runtime.block_on(run_loop(args))
}

async fn run_loop(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let streak_db = Database::open()?;
    let mut streak = load_settled(&streak_db, &config, clock.as_ref()).unwrap_or_else(|e| {
        warn!("failed to load streak, starting fresh: {e}");
        Streak::default()
    });

    let mut session = FeedSession::from_config(
        &config,
        clock.clone(),
        Box::new(Database::open()?),
        Box::new(ThreadRandom),
    )?;
    session.set_streak_days(streak.current_count);
    for event in session.open() {
        settle_rollover(&event, &mut streak, &streak_db, &mut session);
        emit(&event)?;
    }

    let poll_every = config
        .tick_interval()
        .min(session.policy().config().countdown_interval)
        .max(Duration::from_millis(50));
    let mut ticker = interval(poll_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let swipe_period = Duration::from_secs(args.swipe_every.max(1));
    let mut swipes = interval_at(Instant::now() + swipe_period, swipe_period);

    let deadline = sleep(Duration::from_secs(args.for_secs.unwrap_or(0)));
    tokio::pin!(deadline);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(threshold_secs = session.threshold().as_secs(), "live session started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for event in session.poll() {
                    settle_rollover(&event, &mut streak, &streak_db, &mut session);
                    emit(&event)?;
                }
            }
            _ = swipes.tick(), if args.swipe_every > 0 => {
                if session.is_suppressed() {
                    continue;
                }
                if let Some(event) = session.content_switched() {
                    emit(&event)?;
                }
            }
            _ = &mut deadline, if args.for_secs.is_some() => break,
            _ = &mut shutdown => break,
        }
    }

    emit_all(&session.close())?;
    emit(&session.snapshot())?;
    info!("live session stopped");
    Ok(())
}

/// Count the finished day toward the streak when the session rolls over.
fn settle_rollover(event: &Event, streak: &mut Streak, db: &Database, session: &mut FeedSession) {
    let Event::DayRolledOver {
        previous_day,
        previous_day_ms,
        today,
        ..
    } = event
    else {
        return;
    };
    streak.settle_day(
        *previous_day,
        Duration::from_millis(*previous_day_ms),
        session.threshold(),
    );
    streak.reconcile(*today);
    if let Err(e) = db.save_streak(streak) {
        warn!("failed to persist streak: {e}");
    }
    session.set_streak_days(streak.current_count);
}
