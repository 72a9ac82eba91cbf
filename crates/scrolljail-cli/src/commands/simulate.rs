use std::path::PathBuf;

use clap::Args;
use scrolljail_core::simulation::{run_scenario, BackgroundWindow, SimulationScenario};
use scrolljail_core::Config;

use super::emit_all;

#[derive(Args)]
pub struct SimulateArgs {
    /// Load the scenario from a JSON file (other scenario flags are ignored)
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Random seed for duration sampling and message selection
    #[arg(long, default_value = "42")]
    seed: u64,
    /// Daily threshold in seconds (defaults to the configured threshold)
    #[arg(long)]
    threshold_secs: Option<i64>,
    /// Length of the simulated session in seconds
    #[arg(long, default_value = "3600")]
    duration_secs: u64,
    /// Seconds between content switches
    #[arg(long, default_value = "15")]
    swipe_every: u64,
    /// Simulation step in milliseconds
    #[arg(long, default_value = "250")]
    step_ms: u64,
    /// Background span as AT:FOR seconds (repeatable)
    #[arg(long, value_parser = parse_background)]
    background: Vec<BackgroundWindow>,
    /// Write the scenario to this file before running it
    #[arg(long)]
    save: Option<PathBuf>,
    /// Print only the summary metrics
    #[arg(long)]
    summary: bool,
}

fn parse_background(s: &str) -> Result<BackgroundWindow, String> {
    let (at, len) = s
        .split_once(':')
        .ok_or_else(|| format!("expected AT:FOR, got '{s}'"))?;
    let at_secs = at.trim().parse::<u64>().map_err(|e| format!("bad AT '{at}': {e}"))?;
    let for_secs = len.trim().parse::<u64>().map_err(|e| format!("bad FOR '{len}': {e}"))?;
    Ok(BackgroundWindow { at_secs, for_secs })
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    let scenario = match &args.scenario {
        Some(path) => SimulationScenario::load(path)?,
        None => {
            let mut scenario = SimulationScenario::new("cli", args.seed)
                .with_threshold_secs(
                    args.threshold_secs
                        .unwrap_or(config.threshold.daily_threshold_secs),
                )
                .with_duration_secs(args.duration_secs)
                .with_swipe_every_secs(args.swipe_every);
            scenario.step_ms = args.step_ms;
            for window in args.background {
                scenario = scenario.with_background(window);
            }
            scenario
        }
    };

    if let Some(path) = &args.save {
        scenario.save(path)?;
    }

    let result = run_scenario(&scenario, &config)?;
    if args.summary {
        println!("{}", serde_json::to_string_pretty(&result.metrics)?);
    } else {
        emit_all(&result.events)?;
    }
    Ok(())
}
