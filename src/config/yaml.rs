use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ConfigError;

/// YAML configuration structure
///
/// Every field is optional. Values present here override environment
/// variables, which in turn override built-in defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct YamlConfig {
    pub api: Option<ApiYaml>,
    pub models: Option<ModelsYaml>,
    pub voice: Option<String>,
    pub solver: Option<SolverYaml>,
    pub audio: Option<AudioYaml>,
}

/// Gemini endpoint and credentials
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiYaml {
    pub key: Option<String>,
    pub base_url: Option<String>,
    pub live_url: Option<String>,
}

/// Model identifier overrides
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelsYaml {
    pub solver_text: Option<String>,
    pub solver_image: Option<String>,
    pub chat_high_quality: Option<String>,
    pub chat_fast: Option<String>,
    pub chat_search: Option<String>,
    pub tts: Option<String>,
    pub live: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverYaml {
    pub temperature: Option<f32>,
}

/// Capture and playback formats
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioYaml {
    /// Microphone sample rate (Hz)
    pub input_sample_rate: Option<u32>,
    /// Samples per captured block
    pub input_block_size: Option<usize>,
    /// Sample rate of inbound model audio (Hz)
    pub output_sample_rate: Option<u32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Io(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML config: {e}")))
    }
}
