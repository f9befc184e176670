use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for the Sage application.
///
/// Loaded from `~/.sage/config.toml` by default. Each section corresponds to
/// one component of the dialog engine or a cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SageConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub dialog: DialogConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl SageConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SageConfig = toml::from_str(&content)?;
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
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Dialog engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Minimum interval between accepted requests per user, in milliseconds.
    pub min_request_interval_ms: u64,
    /// User id that receives moderation notifications. None disables them.
    pub admin_user_id: Option<i64>,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            min_request_interval_ms: 1_000,
            admin_user_id: None,
        }
    }
}

/// Subject matcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum combined score for a calendar event to qualify as a candidate.
    ///
    /// Tunable: raising it trades missed abbreviations ("DS Midterm" for
    /// "Data Science") for fewer spurious matches.
    pub min_score: f64,
    /// Maximum number of candidates offered for disambiguation.
    pub max_choices: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_score: 0.2,
            max_choices: 6,
        }
    }
}

/// Outbound delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Maximum size of one outbound text segment, in bytes.
    pub max_segment_bytes: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_segment_bytes: 3_500,
        }
    }
}
