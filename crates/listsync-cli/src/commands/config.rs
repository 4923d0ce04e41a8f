use std::path::Path;

use clap::Subcommand;
use listsync_core::{ConfigError, Settings};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "lists.registered", "paths.cache")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Print the config file location
    Path,
    /// Reset config to defaults
    Reset,
}

/// `path` and `reset` never parse the existing file, so they work on a broken one.
pub fn run(config_path: &Path, action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let settings = Settings::load_from(config_path)?;
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    return Err(ConfigError::InvalidValue {
                        key,
                        message: "unknown key".to_string(),
                    }
                    .into())
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut settings = Settings::load_from(config_path)?;
            settings.set(&key, &value)?;
            settings.save_to(config_path)?;
            println!("ok");
        }
        ConfigAction::List => {
            let settings = Settings::load_from(config_path)?;
            print!("{}", toml::to_string_pretty(&settings)?);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
        ConfigAction::Reset => {
            Settings::default().save_to(config_path)?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
