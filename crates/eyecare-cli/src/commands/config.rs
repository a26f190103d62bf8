use clap::Subcommand;
use eyecare_core::{ConfigError, Settings};

use crate::context::AppContext;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a setting value
    Get {
        /// Setting key (e.g. "workDurationSeconds", "soundEnabled")
        key: String,
    },
    /// Set a setting value (only while idle)
    Set {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },
    /// List all settings
    List,
    /// Reset settings to defaults (only while idle)
    Reset,
}

pub fn run(ctx: &AppContext, action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => match ctx.observer().settings().get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(ConfigError::UnknownKey(key).into()),
        },
        ConfigAction::Set { key, value } => {
            let _owner = ctx.claim()?;
            let mut controller = ctx.controller();
            // A running session in the store blocks the change.
            controller.restore();
            let updated = controller.settings().with_value(&key, &value)?;
            controller.apply_settings(updated)?;
            println!("ok");
        }
        ConfigAction::List => {
            let json = serde_json::to_string_pretty(ctx.observer().settings())?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let _owner = ctx.claim()?;
            let mut controller = ctx.controller();
            controller.restore();
            controller.apply_settings(Settings::default())?;
            println!("settings reset to defaults");
        }
    }
    Ok(())
}
