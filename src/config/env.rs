//! Environment variable loading.
//!
//! Reading goes through a lookup function so callers (and tests) can supply
//! variables without touching the process environment.

use super::ConfigError;

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_API_KEY_FALLBACK: &str = "API_KEY";
pub const ENV_API_BASE_URL: &str = "GEMINI_API_BASE_URL";
pub const ENV_LIVE_URL: &str = "GEMINI_LIVE_URL";
pub const ENV_VOICE: &str = "STUDENFLOW_VOICE";
pub const ENV_SOLVER_TEMPERATURE: &str = "STUDENFLOW_SOLVER_TEMPERATURE";
pub const ENV_MODEL_SOLVER_TEXT: &str = "STUDENFLOW_MODEL_SOLVER_TEXT";
pub const ENV_MODEL_SOLVER_IMAGE: &str = "STUDENFLOW_MODEL_SOLVER_IMAGE";
pub const ENV_MODEL_CHAT_HIGH_QUALITY: &str = "STUDENFLOW_MODEL_CHAT_HIGH_QUALITY";
pub const ENV_MODEL_CHAT_FAST: &str = "STUDENFLOW_MODEL_CHAT_FAST";
pub const ENV_MODEL_CHAT_SEARCH: &str = "STUDENFLOW_MODEL_CHAT_SEARCH";
pub const ENV_MODEL_TTS: &str = "STUDENFLOW_MODEL_TTS";
pub const ENV_MODEL_LIVE: &str = "STUDENFLOW_MODEL_LIVE";

/// Values found in the environment. `None` means unset or blank.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub live_url: Option<String>,
    pub voice: Option<String>,
    pub solver_temperature: Option<f32>,
    pub solver_text_model: Option<String>,
    pub solver_image_model: Option<String>,
    pub chat_high_quality_model: Option<String>,
    pub chat_fast_model: Option<String>,
    pub chat_search_model: Option<String>,
    pub tts_model: Option<String>,
    pub live_model: Option<String>,
}

impl EnvConfig {
    /// Read from the process environment.
    pub fn from_process() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through `lookup`.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] when a numeric variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let solver_temperature = match get(ENV_SOLVER_TEMPERATURE) {
            Some(raw) => Some(raw.parse::<f32>().map_err(|e| {
                ConfigError::InvalidValue(format!("{ENV_SOLVER_TEMPERATURE}={raw}: {e}"))
            })?),
            None => None,
        };

        Ok(Self {
            api_key: get(ENV_API_KEY).or_else(|| get(ENV_API_KEY_FALLBACK)),
            api_base_url: get(ENV_API_BASE_URL),
            live_url: get(ENV_LIVE_URL),
            voice: get(ENV_VOICE),
            solver_temperature,
            solver_text_model: get(ENV_MODEL_SOLVER_TEXT),
            solver_image_model: get(ENV_MODEL_SOLVER_IMAGE),
            chat_high_quality_model: get(ENV_MODEL_CHAT_HIGH_QUALITY),
            chat_fast_model: get(ENV_MODEL_CHAT_FAST),
            chat_search_model: get(ENV_MODEL_CHAT_SEARCH),
            tts_model: get(ENV_MODEL_TTS),
            live_model: get(ENV_MODEL_LIVE),
        })
    }
}
