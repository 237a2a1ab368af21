//! Gemini Live configuration.

use url::Url;

use crate::core::realtime::base::{RealtimeError, RealtimeResult};

/// Sample rate Gemini Live expects for microphone audio.
pub const GEMINI_LIVE_INPUT_SAMPLE_RATE: u32 = 16000;

/// Sample rate of audio produced by Gemini Live.
pub const GEMINI_LIVE_OUTPUT_SAMPLE_RATE: u32 = 24000;

/// Build the socket URL with the API key as the `key` query parameter.
pub fn build_live_url(base: &str, api_key: &str) -> RealtimeResult<Url> {
    if api_key.trim().is_empty() {
        return Err(RealtimeError::InvalidConfiguration(
            "API key is required".to_string(),
        ));
    }

    let mut url = Url::parse(base)
        .map_err(|e| RealtimeError::InvalidConfiguration(format!("invalid live URL: {e}")))?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(RealtimeError::InvalidConfiguration(format!(
                "live URL must use ws or wss, got '{other}'"
            )));
        }
    }

    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}

/// Qualify a bare model id with the `models/` prefix.
pub fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}
