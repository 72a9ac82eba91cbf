use clap::Subcommand;
use scrolljail_core::storage::THRESHOLD_PRESETS_SECS;
use scrolljail_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "threshold.daily_threshold_secs", "mascot.kind")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Pick one of the threshold presets, in minutes (30, 60, 90, 120, 150)
    Threshold {
        minutes: i64,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

/// Threshold in seconds for a preset given in minutes.
fn preset_secs(minutes: i64) -> Option<i64> {
    minutes
        .checked_mul(60)
        .filter(|secs| THRESHOLD_PRESETS_SECS.contains(secs))
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load_or_default();
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("ok");
        }
        ConfigAction::Threshold { minutes } => {
            let secs = preset_secs(minutes).ok_or_else(|| {
                format!(
                    "{minutes} is not a preset; use `config set threshold.daily_threshold_secs` for custom values"
                )
            })?;
            let mut config = Config::load()?;
            config.set("threshold.daily_threshold_secs", &secs.to_string())?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load_or_default();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
