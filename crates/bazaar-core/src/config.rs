use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for the bazaar engine.
///
/// Loaded from a TOML file. Each section corresponds to one subsystem;
/// every field has a default so a partial (or absent) file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BazaarConfig {
    pub general: GeneralConfig,
    pub chat: ChatConfig,
    pub search: SearchConfig,
    pub storage: StorageConfig,
}

impl BazaarConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BazaarConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite store.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.bazaar/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Conversation engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum utterance length in characters.
    pub max_message_length: usize,
    /// How many trailing history entries the escalation check inspects.
    pub escalation_window: usize,
    /// Assistant-turn count within the window that triggers escalation.
    pub escalation_threshold: usize,
    /// Typing-delay floor in milliseconds.
    pub typing_delay_floor_ms: u64,
    /// Typing-delay cap in milliseconds.
    pub typing_delay_cap_ms: u64,
    /// Typing-delay growth per reply character, in milliseconds.
    pub typing_delay_per_char_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
            escalation_window: 5,
            escalation_threshold: 3,
            typing_delay_floor_ms: 800,
            typing_delay_cap_ms: 3000,
            typing_delay_per_char_ms: 20,
        }
    }
}

/// Search and ranking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result limit for product-search and availability replies.
    pub default_limit: usize,
    /// Result limit for hedged general-intent matches.
    pub general_limit: usize,
    /// Result limit for comparison replies.
    pub comparison_limit: usize,
    /// How many top results a price-inquiry reply lists.
    pub price_top_n: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 6,
            general_limit: 3,
            comparison_limit: 3,
            price_top_n: 3,
        }
    }
}

/// Durable store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path for the default store backend.
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "~/.bazaar/data/store.db".to_string(),
        }
    }
}
