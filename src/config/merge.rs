//! Merging YAML and environment configurations.

use crate::core::gemini::GeminiVoice;

use super::AppConfig;
use super::env::EnvConfig;
use super::yaml::YamlConfig;

/// Apply `env` over defaults, then `yaml` over that.
pub fn merge_config(yaml: Option<YamlConfig>, env: EnvConfig) -> AppConfig {
    let mut config = AppConfig::default();
    let yaml = yaml.unwrap_or_default();
    let api = yaml.api.unwrap_or_default();
    let models = yaml.models.unwrap_or_default();
    let audio = yaml.audio.unwrap_or_default();

    if let Some(key) = api.key.or(env.api_key) {
        config.api_key = key;
    }
    if let Some(url) = api.base_url.or(env.api_base_url) {
        config.api_base_url = url;
    }
    if let Some(url) = api.live_url.or(env.live_url) {
        config.live_url = url;
    }

    if let Some(voice) = yaml.voice.or(env.voice) {
        config.voice = GeminiVoice::from_str_or_default(&voice);
    }
    if let Some(t) = yaml.solver.and_then(|s| s.temperature).or(env.solver_temperature) {
        config.solver_temperature = t;
    }

    let m = &mut config.models;
    override_with(&mut m.solver_text, models.solver_text, env.solver_text_model);
    override_with(&mut m.solver_image, models.solver_image, env.solver_image_model);
    override_with(
        &mut m.chat_high_quality,
        models.chat_high_quality,
        env.chat_high_quality_model,
    );
    override_with(&mut m.chat_fast, models.chat_fast, env.chat_fast_model);
    override_with(&mut m.chat_search, models.chat_search, env.chat_search_model);
    override_with(&mut m.tts, models.tts, env.tts_model);
    override_with(&mut m.live, models.live, env.live_model);

    if let Some(rate) = audio.input_sample_rate {
        config.audio.input_sample_rate = rate;
    }
    if let Some(size) = audio.input_block_size {
        config.audio.input_block_size = size;
    }
    if let Some(rate) = audio.output_sample_rate {
        config.audio.output_sample_rate = rate;
    }

    config
}

fn override_with(slot: &mut String, yaml: Option<String>, env: Option<String>) {
    if let Some(value) = yaml.or(env) {
        *slot = value;
    }
}
