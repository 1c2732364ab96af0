use std::path::{Path, PathBuf};

use serde_derive::Deserialize;

use crate::errors::ConfigError;

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    pub map: MapSettings,
    pub storage: StorageSettings,
    pub enrichment: EnrichmentSettings,
    pub logging: LoggingSettings,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MapSettings {
    pub zoom_level: u8,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    pub directory: PathBuf,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EnrichmentSettings {
    pub enabled: bool,
    pub user_agent: String,
    pub geocode_url: String,
    pub weather_url: String,
    pub weather_api_key: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<PathBuf>,
    /// Component codes that log at debug level regardless of `level`.
    pub verbose: Vec<String>,
    /// Component codes that never log.
    pub quiet: Vec<String>,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self { zoom_level: 13 }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(".mapty"),
        }
    }
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            user_agent: "mapty-app".to_string(),
            geocode_url: "https://nominatim.openstreetmap.org/reverse".to_string(),
            weather_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            weather_api_key: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            verbose: Vec::new(),
            quiet: Vec::new(),
        }
    }
}

impl Settings {
    pub const DEFAULT_FILE: &'static str = "mapty.toml";
    pub const WEATHER_KEY_ENV: &'static str = "MAPTY_WEATHER_API_KEY";

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut settings = if path.exists() {
            Settings::parse(&std::fs::read_to_string(path)?)?
        } else {
            Settings::default()
        };

        if let Ok(key) = std::env::var(Settings::WEATHER_KEY_ENV) {
            if !key.is_empty() {
                settings.enrichment.weather_api_key = Some(key);
            }
        }

        Ok(settings)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
