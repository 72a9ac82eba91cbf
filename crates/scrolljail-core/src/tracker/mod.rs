mod watch_time;

pub use watch_time::{TrackerSnapshot, TrackerState, WatchSession, WatchTimeTracker};
