//! Subcommand implementations.

pub mod batch;
pub mod config;
pub mod process;

use std::path::PathBuf;

use cardbill_core::AppConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cardbill")
        .join("config.json")
}

/// Load the configuration from `path`, else the default file, else built-in defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let path = match path {
        Some(p) => PathBuf::from(p),
        None => {
            let default = default_config_path();
            if !default.exists() {
                return Ok(AppConfig::default());
            }
            default
        }
    };

    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }
    Ok(AppConfig::from_file(&path)?)
}
