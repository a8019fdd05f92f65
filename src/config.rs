//! Configuration for the cadence engine and its command-line host.

use crate::core::spectral::band_bin_range;
use crate::{bpm_to_hz, core::spectral::CadenceBand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Parameters fixed at engine construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Samples per analysis window
    pub window_size: usize,
    /// Samples between analyses; must evenly divide `window_size`
    pub update_frequency: usize,
    /// Number of windows of storage kept before compaction
    pub history_count: usize,
    /// Lower edge of the cadence band (events per minute)
    pub min_cadence_bpm: f32,
    /// Upper edge of the cadence band (events per minute)
    pub max_cadence_bpm: f32,
    /// Expected sensor delivery rate, used only to validate the band up front
    pub nominal_sample_rate_hz: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            update_frequency: 32,
            history_count: 32,
            min_cadence_bpm: 40.0,
            max_cadence_bpm: 200.0,
            nominal_sample_rate_hz: 50.0,
        }
    }
}

impl EngineConfig {
    /// Total number of sample slots the ring store holds.
    pub fn capacity(&self) -> usize {
        self.window_size * self.history_count
    }

    /// The cadence band expressed in Hz.
    pub fn band(&self) -> CadenceBand {
        CadenceBand::new(
            bpm_to_hz(self.min_cadence_bpm),
            bpm_to_hz(self.max_cadence_bpm),
        )
    }

    /// Check every construction-time precondition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size < 2 {
            return Err(ConfigError::Invalid(format!(
                "window_size must be at least 2, got {}",
                self.window_size
            )));
        }
        if self.update_frequency == 0 {
            return Err(ConfigError::Invalid(
                "update_frequency must be non-zero".to_string(),
            ));
        }
        if self.window_size % self.update_frequency != 0 {
            return Err(ConfigError::Invalid(format!(
                "update_frequency {} does not evenly divide window_size {}",
                self.update_frequency, self.window_size
            )));
        }
        // The seed window occupies the first slot block, so a single window
        // leaves no room for incoming samples.
        if self.history_count < 2 {
            return Err(ConfigError::Invalid(format!(
                "history_count must be at least 2, got {}",
                self.history_count
            )));
        }
        if !(self.min_cadence_bpm > 0.0 && self.min_cadence_bpm < self.max_cadence_bpm) {
            return Err(ConfigError::Invalid(format!(
                "cadence band {}..{} bpm is empty or non-positive",
                self.min_cadence_bpm, self.max_cadence_bpm
            )));
        }
        if !(self.nominal_sample_rate_hz > 0.0 && self.nominal_sample_rate_hz.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "nominal_sample_rate_hz must be positive, got {}",
                self.nominal_sample_rate_hz
            )));
        }

        let interval_secs = 1.0 / self.nominal_sample_rate_hz;
        if band_bin_range(self.window_size, interval_secs, self.band()).is_none() {
            return Err(ConfigError::Invalid(format!(
                "cadence band {}..{} bpm has no representable bins for window_size {} at {} Hz",
                self.min_cadence_bpm,
                self.max_cadence_bpm,
                self.window_size,
                self.nominal_sample_rate_hz
            )));
        }

        Ok(())
    }
}

/// Configuration for the `cadence` command-line host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine parameters
    pub engine: EngineConfig,

    /// Keep only every Nth incoming sensor event
    pub input_stride: usize,

    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            input_stride: 1,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cadence-engine")
            .join("config.json")
    }

    /// Validate the engine section and the host settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_stride == 0 {
            return Err(ConfigError::Invalid(
                "input_stride must be at least 1".to_string(),
            ));
        }
        self.engine.validate()
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
