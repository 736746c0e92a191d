//! Configuration management for persona-voice.
//!
//! Loads config from YAML files in standard locations. Every section
//! falls back to defaults, so a partial file is fine.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub id: String,
    pub cooldown_ms: u64,
    pub history_capacity: usize,
    pub greeting_delay_secs: u64,
    pub monologue_separator: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            id: "companion".into(),
            cooldown_ms: 30_000,
            history_capacity: 20,
            greeting_delay_secs: 3,
            monologue_separator: " ... ".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub chance: f64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 300,
            chance: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteLogConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for RemoteLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:3000".into(),
            timeout_secs: 10,
        }
    }
}

/// Which voice sink receives spoken text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Tts,
    Notify,
    None,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub sink: SinkKind,
    pub tts_url: String,
    pub event_type: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::Tts,
            tts_url: "http://127.0.0.1:8767".into(),
            event_type: "persona".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8768,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub persona: PersonaConfig,
    pub idle: IdleConfig,
    pub remote_log: RemoteLogConfig,
    pub voice: VoiceConfig,
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./persona.yaml
    /// 2. ~/.config/persona-voice/persona.yaml
    /// 3. /etc/persona-voice/persona.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("persona.yaml")),
                dirs::home_dir().map(|h| h.join(".config/persona-voice/persona.yaml")),
                Some(PathBuf::from("/etc/persona-voice/persona.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }
}
