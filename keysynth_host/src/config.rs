//! Host configuration, read from a TOML file.
//!
//! ```toml
//! queue_depth = 32
//!
//! [engine]
//! base_freq = 110.0
//! instrument = "Piano"
//! decay_interval = 100
//!
//! [engine.decay]
//! fast = 0.85
//!
//! [midi]
//! channel = 1
//! lowest_note = 45
//! ```

use std::path::Path;

use keysynth::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::midi::MidiConfig;

/// Everything the host needs to set up an engine and its front-end
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Engine tuning, timing and decay
    pub engine: EngineConfig,
    /// MIDI channel and key mapping
    pub midi: MidiConfig,
    /// Depth of the command queue between the main thread and the timer
    /// thread
    pub queue_depth: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            midi: MidiConfig::default(),
            queue_depth: 32,
        }
    }
}

/// Failure to load a [HostConfig]
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read
    Io(std::io::Error),
    /// The file is not valid TOML, or does not describe a configuration
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Unable to read configuration: {}", e),
            Self::Parse(e) => write!(f, "Invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl HostConfig {
    /// Parse a configuration from TOML text.  Missing keys take their
    /// default values.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
    /// Read and parse the configuration file at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
