use url::Url;

use super::{AppConfig, ConfigError};

/// Check a merged configuration.
pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if config.api_key.trim().is_empty() {
        return Err(ConfigError::MissingApiKey);
    }

    validate_url("api base url", &config.api_base_url, &["http", "https"])?;
    validate_url("live url", &config.live_url, &["ws", "wss"])?;

    let audio = &config.audio;
    if audio.input_sample_rate == 0 {
        return Err(ConfigError::InvalidValue(
            "input sample rate must be positive".to_string(),
        ));
    }
    if audio.output_sample_rate == 0 {
        return Err(ConfigError::InvalidValue(
            "output sample rate must be positive".to_string(),
        ));
    }
    if audio.input_block_size == 0 {
        return Err(ConfigError::InvalidValue(
            "input block size must be positive".to_string(),
        ));
    }

    let t = config.solver_temperature;
    if !(0.0..=2.0).contains(&t) {
        return Err(ConfigError::InvalidValue(format!(
            "solver temperature {t} outside [0, 2]"
        )));
    }

    Ok(())
}

fn validate_url(name: &str, raw: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue(format!("{name} {raw}: {e}")))?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::InvalidValue(format!(
            "{name} {raw}: scheme must be one of {}",
            schemes.join(", ")
        )));
    }
    Ok(())
}
