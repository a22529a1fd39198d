use std::fs;
use std::path::Path;

use relay_core::EngineConfig;
use relay_logging::{relay_info, relay_warn};
use serde::Deserialize;

/// Contents of the optional `--config` RON file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    /// Accept every command proposal as soon as it becomes active.
    pub auto_accept: bool,
}

/// Unreadable or malformed files fall back to defaults with a warning.
pub fn load_config(path: Option<&Path>) -> AppConfig {
    let Some(path) = path else {
        return AppConfig::default();
    };
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            relay_warn!("Failed to read config from {:?}: {}", path, err);
            return AppConfig::default();
        }
    };
    match ron::from_str(&content) {
        Ok(config) => {
            relay_info!("Loaded config from {:?}", path);
            config
        }
        Err(err) => {
            relay_warn!("Failed to parse config from {:?}: {}", path, err);
            AppConfig::default()
        }
    }
}
