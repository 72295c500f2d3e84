use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Configuration shared by the capture daemon and the analysis CLI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Capture endpoint configuration
    pub capture: CaptureConfig,
    /// Offline analysis configuration
    pub analysis: AnalysisConfig,
}

/// Capture endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Address the login page listens on
    pub bind_address: String,
    /// Append-only attack log
    pub log_path: PathBuf,
    /// Take the client IP from X-Forwarded-For (one trusted proxy hop)
    pub trust_proxy_headers: bool,
    /// Lower bound of the artificial response delay, in milliseconds
    pub delay_min_ms: u64,
    /// Upper bound of the artificial response delay, in milliseconds
    pub delay_max_ms: u64,
    /// Pending appends the log writer will buffer
    pub queue_capacity: usize,
}

/// Offline analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Attack log to analyze
    pub log_path: PathBuf,
    /// Default CSV export destination
    pub csv_path: PathBuf,
    /// Length of each frequency ranking
    pub top_n: usize,
}

impl CaptureConfig {
    /// Inclusive delay range in milliseconds, bounds swapped if reversed
    pub fn delay_range(&self) -> RangeInclusive<u64> {
        if self.delay_min_ms <= self.delay_max_ms {
            self.delay_min_ms..=self.delay_max_ms
        } else {
            self.delay_max_ms..=self.delay_min_ms
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            bind_address: "0.0.0.0:5000".to_string(),
            log_path: PathBuf::from("logs/attacks.log"),
            trust_proxy_headers: false,
            delay_min_ms: 1200,
            delay_max_ms: 2500,
            queue_capacity: 256,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            log_path: PathBuf::from("logs/attacks.log"),
            csv_path: PathBuf::from("attacksAnalysis.csv"),
            top_n: 10,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            log::warn!("Config file {:?} not found, using defaults", path);
            Ok(Config::default())
        }
    }
}
