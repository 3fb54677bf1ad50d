use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Environment override for the API base URL; an empty value means unset.
pub const API_BASE_ENV: &str = "NEWSCHECK_API_BASE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the live API. Absent means the app runs permanently on the
    /// bundled snapshot and local persistence.
    pub api_base: Option<String>,
    pub request_timeout_seconds: u64,
    pub page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            request_timeout_seconds: 10,
            page_size: 6,
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> PathBuf {
        let mut dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.push("newscheck");
        dir
    }

    /// Loads the configuration file, falling back to (and saving) defaults, then
    /// applies the environment override.
    pub fn load() -> Self {
        let path = Self::config_dir().join("config.json");
        let mut config = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<AppConfig>(&raw) {
                Ok(config) => config,
                Err(err) => {
                    warn!(error = %err, path = %path.display(), "invalid config, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                let default_config = Self::default();
                if let Err(err) = default_config.save() {
                    debug!(error = %err, "could not save default config");
                }
                default_config
            }
        };

        if let Ok(base) = std::env::var(API_BASE_ENV) {
            config.api_base = Some(base);
        }
        config.api_base = config.api_base.and_then(|base| {
            let trimmed = base.trim().trim_end_matches('/').to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        });
        config
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let dir = Self::config_dir();
        std::fs::create_dir_all(&dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join("config.json"), json)?;
        Ok(())
    }
}
