//! Mock providers for integration tests
//!
//! Stands in for everything outside the process:
//! - Audio hardware (capture stream and output context with a manual clock)
//! - Live transport (scripted events, recorded outbound audio)
//! - Generative backend (canned responses, recorded requests)
//! - Gemini Live WebSocket server (local tokio-tungstenite listener)

// Allow dead code in test infrastructure - not every test binary uses every mock
#![allow(dead_code)]

pub mod audio_mock;
pub mod backend_mock;
pub mod transport_mock;
pub mod websocket_mock;

pub use audio_mock::{MockAudioDevice, MockPlayback};
pub use backend_mock::{MockBackend, audio_response, text_response};
pub use transport_mock::MockTransport;
pub use websocket_mock::{
    MockLiveServer, ServerScript, audio_chunk, interrupted, setup_complete, turn_complete,
};

use std::time::Duration;

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
