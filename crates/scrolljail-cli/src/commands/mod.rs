pub mod config;
pub mod reset;
pub mod run;
pub mod simulate;
pub mod stats;
pub mod streak;

use scrolljail_core::Event;

/// Print one event as a JSON line on stdout.
pub fn emit(event: &Event) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

pub fn emit_all(events: &[Event]) -> Result<(), serde_json::Error> {
    events.iter().try_for_each(emit)
}
