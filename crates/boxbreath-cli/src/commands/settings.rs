use boxbreath_core::{open_settings, BreathingSettings, KvStore};
use clap::Subcommand;
use serde::Serialize;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print stored settings as JSON
    Show,
    /// Set seconds per phase (clamped to 1-60)
    Duration {
        #[arg(allow_negative_numbers = true)]
        seconds: i64,
    },
    /// Set number of cycles (clamped to 1-20)
    Cycles {
        #[arg(allow_negative_numbers = true)]
        count: i64,
    },
    /// Restore duration 4 and cycles 4
    Reset,
}

#[derive(Serialize)]
struct SettingsView {
    duration: u32,
    cycles: u32,
    total_secs: u64,
}

fn print<S: KvStore>(settings: &BreathingSettings<S>) -> Result<(), serde_json::Error> {
    let config = settings.config();
    let view = SettingsView {
        duration: config.duration(),
        cycles: config.cycles(),
        total_secs: config.total_secs(),
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = open_settings()?;

    match action {
        SettingsAction::Show => {}
        SettingsAction::Duration { seconds } => {
            settings.update_duration(seconds);
        }
        SettingsAction::Cycles { count } => {
            settings.update_cycles(count);
        }
        SettingsAction::Reset => settings.reset(),
    }
    print(&settings)?;
    Ok(())
}
