//! Gemini Live transport.
//!
//! Implements [`LiveTransport`] over the `BidiGenerateContent` WebSocket.
//!
//! # API Reference
//!
//! - Endpoint: `wss://generativelanguage.googleapis.com/ws/...BidiGenerateContent?key=<key>`
//! - Protocol: WebSocket with JSON messages (text or binary frames)
//! - Audio in: PCM 16-bit, 16kHz, mono, little-endian, base64
//! - Audio out: PCM 16-bit, 24kHz, mono, little-endian, base64
//!
//! A single spawned task owns the socket. Outbound messages reach it over an
//! unbounded channel; inbound messages are turned into [`LiveEvent`]s. Closing
//! the transport drops the outbound sender, which makes the task send a close
//! frame and exit. There is no reconnection: a lost connection ends the call.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};

use super::config::{build_live_url, qualified_model};
use super::messages::{ClientMessage, ServerMessage, Setup};
use crate::core::gemini::{Content, GEMINI_LIVE_URL, GenerationConfig};
use crate::core::realtime::base::{
    LiveEvent, LiveSessionConfig, LiveTransport, OutboundAudio, RealtimeError, RealtimeResult,
};

/// Channel capacity for events delivered to the session.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How long `close` waits for the socket task to say goodbye.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

// =============================================================================
// Gemini Live Client
// =============================================================================

pub struct GeminiLive {
    api_key: String,
    base_url: String,
    /// Outbound channel into the socket task, present while connected
    ws_sender: Arc<Mutex<Option<mpsc::UnboundedSender<ClientMessage>>>>,
    /// Shared with the socket task
    connected: Arc<AtomicBool>,
    connection_handle: Mutex<Option<JoinHandle<()>>>,
}

impl GeminiLive {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_url(api_key, GEMINI_LIVE_URL)
    }

    /// Use a custom endpoint, e.g. a local server in tests.
    pub fn with_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            ws_sender: Arc::new(Mutex::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
            connection_handle: Mutex::new(None),
        }
    }

    fn build_setup(config: &LiveSessionConfig) -> ClientMessage {
        ClientMessage::Setup(Setup {
            model: qualified_model(&config.model),
            generation_config: GenerationConfig::audio(config.voice),
            system_instruction: config.system_instruction.as_deref().map(Content::system),
        })
    }

    fn map_connect_error(err: tungstenite::Error) -> RealtimeError {
        match err {
            tungstenite::Error::Http(response) => {
                let status = response.status();
                if status.as_u16() == 401 || status.as_u16() == 403 {
                    RealtimeError::AuthenticationFailed(format!("handshake rejected: {status}"))
                } else {
                    RealtimeError::ConnectionFailed(format!("handshake rejected: {status}"))
                }
            }
            other => RealtimeError::ConnectionFailed(other.to_string()),
        }
    }

    /// Parse one server payload and forward its events.
    ///
    /// Returns false once the session side has gone away.
    async fn forward_payload(payload: &[u8], events_tx: &mpsc::Sender<LiveEvent>) -> bool {
        let message = match serde_json::from_slice::<ServerMessage>(payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Failed to parse Gemini Live message: {}", e);
                return true;
            }
        };

        if let Some(go_away) = &message.go_away {
            tracing::warn!(
                "Gemini Live will close the connection (time left: {})",
                go_away.time_left.as_deref().unwrap_or("unknown")
            );
        }

        for event in message.into_events() {
            if events_tx.send(event).await.is_err() {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl LiveTransport for GeminiLive {
    async fn connect(&self, config: &LiveSessionConfig) -> RealtimeResult<mpsc::Receiver<LiveEvent>> {
        if self.connected.load(Ordering::SeqCst) {
            return Err(RealtimeError::ConnectionFailed(
                "transport already connected".to_string(),
            ));
        }

        let url = build_live_url(&self.base_url, &self.api_key)?;
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(Self::map_connect_error)?;

        tracing::info!("Connected to Gemini Live ({})", config.model);

        let (mut ws_sink, mut ws_stream) = ws_stream.split();

        // Setup must be the first message on the socket.
        let setup = serde_json::to_string(&Self::build_setup(config))
            .map_err(|e| RealtimeError::SerializationError(e.to_string()))?;
        ws_sink
            .send(Message::Text(setup.into()))
            .await
            .map_err(|e| RealtimeError::WebSocketError(e.to_string()))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (events_tx, events_rx) = mpsc::channel::<LiveEvent>(EVENT_CHANNEL_CAPACITY);

        *self.ws_sender.lock() = Some(tx);
        self.connected.store(true, Ordering::SeqCst);

        let connected = self.connected.clone();
        let ws_sender = self.ws_sender.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Handle outgoing messages
                    outgoing = rx.recv() => {
                        let Some(message) = outgoing else {
                            // Sender dropped by close(): end the session on the server too.
                            if let Err(e) = ws_sink.send(Message::Close(None)).await {
                                tracing::debug!("Failed to send close frame: {}", e);
                            }
                            tracing::info!("Gemini Live connection closed locally");
                            break;
                        };

                        let json = match serde_json::to_string(&message) {
                            Ok(j) => j,
                            Err(e) => {
                                tracing::error!("Failed to serialize message: {}", e);
                                continue;
                            }
                        };

                        if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                            tracing::error!("Failed to send WebSocket message: {}", e);
                            let _ = events_tx.send(LiveEvent::Error(e.to_string())).await;
                            break;
                        }
                    }

                    // Handle incoming messages
                    incoming = ws_stream.next() => {
                        match incoming {
                            Some(Ok(Message::Text(text))) => {
                                if !Self::forward_payload(text.as_bytes(), &events_tx).await {
                                    break;
                                }
                            }
                            Some(Ok(Message::Binary(data))) => {
                                if !Self::forward_payload(&data, &events_tx).await {
                                    break;
                                }
                            }
                            Some(Ok(Message::Ping(data))) => {
                                if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                                    tracing::error!("Failed to send pong: {}", e);
                                }
                            }
                            Some(Ok(Message::Close(frame))) => {
                                let reason = frame
                                    .map(|f| f.reason.to_string())
                                    .filter(|r| !r.is_empty());
                                tracing::info!("Gemini Live closed by server: {:?}", reason);
                                let _ = events_tx.send(LiveEvent::Closed { reason }).await;
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                tracing::error!("WebSocket error: {}", e);
                                let _ = events_tx.send(LiveEvent::Error(e.to_string())).await;
                                break;
                            }
                            None => {
                                tracing::info!("Gemini Live stream ended");
                                let _ = events_tx.send(LiveEvent::Closed { reason: None }).await;
                                break;
                            }
                        }
                    }
                }
            }

            connected.store(false, Ordering::SeqCst);
            ws_sender.lock().take();
        });

        *self.connection_handle.lock() = Some(handle);
        Ok(events_rx)
    }

    fn send_audio(&self, audio: OutboundAudio) -> RealtimeResult<()> {
        let guard = self.ws_sender.lock();
        let sender = guard.as_ref().ok_or(RealtimeError::NotConnected)?;
        sender
            .send(ClientMessage::audio(audio))
            .map_err(|_| RealtimeError::NotConnected)
    }

    async fn close(&self) -> RealtimeResult<()> {
        // Dropping the sender asks the socket task to close.
        self.ws_sender.lock().take();

        let handle = self.connection_handle.lock().take();
        if let Some(handle) = handle {
            let abort = handle.abort_handle();
            if tokio::time::timeout(CLOSE_TIMEOUT, handle).await.is_err() {
                tracing::warn!("Gemini Live task did not stop in time, aborting");
                abort.abort();
            }
        }

        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Drop for GeminiLive {
    fn drop(&mut self) {
        if let Some(handle) = self.connection_handle.get_mut().take() {
            handle.abort();
        }
    }
}
