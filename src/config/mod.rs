//! Configuration module for StudenFlow
//!
//! This module handles configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use studenflow::config::AppConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = AppConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("studenflow.yaml");
//! let config = AppConfig::from_file(&config_path)?;
//!
//! println!("Solving with {}", config.models.solver_text);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::core::audio::CaptureConfig;
use crate::core::chat::ChatModels;
use crate::core::gemini::{
    GEMINI_API_BASE_URL, GEMINI_LIVE_URL, GeminiClientConfig, GeminiVoice, MODEL_BALANCED,
    MODEL_HIGH_QUALITY, MODEL_LITE, MODEL_LIVE, MODEL_TTS,
};
use crate::core::prompts::LIVE_INSTRUCTION;
use crate::core::realtime::LiveSessionConfig;
use crate::core::realtime::gemini::{GEMINI_LIVE_INPUT_SAMPLE_RATE, GEMINI_LIVE_OUTPUT_SAMPLE_RATE};
use crate::core::solver::SolverSettings;

mod env;
mod merge;
mod validation;
mod yaml;

pub use env::EnvConfig;
pub use yaml::YamlConfig;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Gemini API key is not configured (set GEMINI_API_KEY or api.key)")]
    MissingApiKey,
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Parse(String),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Model identifiers per feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub solver_text: String,
    pub solver_image: String,
    pub chat_high_quality: String,
    pub chat_fast: String,
    pub chat_search: String,
    pub tts: String,
    pub live: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            solver_text: MODEL_BALANCED.to_string(),
            solver_image: MODEL_HIGH_QUALITY.to_string(),
            chat_high_quality: MODEL_HIGH_QUALITY.to_string(),
            chat_fast: MODEL_LITE.to_string(),
            chat_search: MODEL_BALANCED.to_string(),
            tts: MODEL_TTS.to_string(),
            live: MODEL_LIVE.to_string(),
        }
    }
}

/// Capture and playback formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSettings {
    pub input_sample_rate: u32,
    pub input_block_size: usize,
    pub output_sample_rate: u32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            input_sample_rate: GEMINI_LIVE_INPUT_SAMPLE_RATE,
            input_block_size: 4096,
            output_sample_rate: GEMINI_LIVE_OUTPUT_SAMPLE_RATE,
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub live_url: String,
    pub models: ModelConfig,
    pub voice: GeminiVoice,
    pub solver_temperature: f32,
    pub audio: AudioSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: GEMINI_API_BASE_URL.to_string(),
            live_url: GEMINI_LIVE_URL.to_string(),
            models: ModelConfig::default(),
            voice: GeminiVoice::default(),
            solver_temperature: 0.7,
            audio: AudioSettings::default(),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("live_url", &self.live_url)
            .field("models", &self.models)
            .field("voice", &self.voice)
            .field("solver_temperature", &self.solver_temperature)
            .field("audio", &self.audio)
            .finish()
    }
}

impl Drop for AppConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        self.api_key.zeroize();
    }
}

impl AppConfig {
    /// Load configuration from environment variables only
    ///
    /// The .env file is loaded in main.rs at application startup, so its
    /// values are already part of the process environment here.
    ///
    /// # Errors
    /// Returns an error if a variable has an invalid format or validation fails.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = merge::merge_config(None, EnvConfig::from_process()?);
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_sources(Some(YamlConfig::from_file(path)?), EnvConfig::from_process()?)
    }

    /// Merge and validate already loaded sources.
    pub fn from_sources(yaml: Option<YamlConfig>, env: EnvConfig) -> Result<Self, ConfigError> {
        let config = merge::merge_config(yaml, env);
        validation::validate(&config)?;
        Ok(config)
    }

    pub fn gemini_client_config(&self) -> GeminiClientConfig {
        GeminiClientConfig::new(self.api_key.clone()).with_base_url(self.api_base_url.clone())
    }

    pub fn chat_models(&self) -> ChatModels {
        ChatModels {
            high_quality: self.models.chat_high_quality.clone(),
            fast: self.models.chat_fast.clone(),
            search: self.models.chat_search.clone(),
        }
    }

    pub fn solver_settings(&self) -> SolverSettings {
        SolverSettings {
            image_model: self.models.solver_image.clone(),
            text_model: self.models.solver_text.clone(),
            temperature: self.solver_temperature,
        }
    }

    pub fn live_session_config(&self) -> LiveSessionConfig {
        LiveSessionConfig {
            model: self.models.live.clone(),
            voice: self.voice,
            system_instruction: Some(LIVE_INSTRUCTION.to_string()),
            output_sample_rate: self.audio.output_sample_rate,
        }
    }

    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            sample_rate: self.audio.input_sample_rate,
            channels: 1,
            block_size: self.audio.input_block_size,
        }
    }
}
