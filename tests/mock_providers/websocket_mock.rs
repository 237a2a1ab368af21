//! WebSocket Mock Server for Gemini Live
//!
//! Accepts a single connection, answers the setup message, plays a scripted
//! list of frames and records everything the client sends.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

/// What the server does after the client connects.
#[derive(Debug, Clone)]
pub struct ServerScript {
    /// Reply `setupComplete` to the first message
    pub acknowledge_setup: bool,
    /// Frames sent after the acknowledgement
    pub frames: Vec<Message>,
    /// Close with this reason once the frames are sent
    pub close_with: Option<String>,
}

impl Default for ServerScript {
    fn default() -> Self {
        Self {
            acknowledge_setup: true,
            frames: Vec::new(),
            close_with: None,
        }
    }
}

impl ServerScript {
    pub fn with_frames(frames: Vec<Message>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }
}

/// Recorded client traffic.
#[derive(Default)]
pub struct ServerRecord {
    pub messages: Mutex<Vec<Value>>,
    pub request_query: Mutex<Option<String>>,
    pub close_received: AtomicBool,
}

pub struct MockLiveServer {
    pub url: String,
    pub record: Arc<ServerRecord>,
    handle: JoinHandle<()>,
}

impl MockLiveServer {
    pub async fn start(script: ServerScript) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let record = Arc::new(ServerRecord::default());

        let server_record = record.clone();
        let handle = tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                if let Err(e) = handle_live_connection(stream, script, server_record).await {
                    eprintln!("Mock Live server error: {}", e);
                }
            }
        });

        Self {
            url: format!("ws://{addr}/ws/live"),
            record,
            handle,
        }
    }

    pub fn messages(&self) -> Vec<Value> {
        self.record.messages.lock().clone()
    }

    pub fn close_received(&self) -> bool {
        self.record.close_received.load(Ordering::SeqCst)
    }

    pub fn request_query(&self) -> Option<String> {
        self.record.request_query.lock().clone()
    }
}

impl Drop for MockLiveServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// `{"setupComplete": {}}`
pub fn setup_complete() -> Message {
    Message::Text(json!({ "setupComplete": {} }).to_string().into())
}

/// One model turn carrying a single audio chunk.
pub fn audio_chunk(data: &str) -> Message {
    Message::Text(
        json!({
            "serverContent": {
                "modelTurn": {
                    "parts": [{ "inlineData": { "mimeType": "audio/pcm;rate=24000", "data": data } }]
                }
            }
        })
        .to_string()
        .into(),
    )
}

pub fn interrupted() -> Message {
    Message::Text(json!({ "serverContent": { "interrupted": true } }).to_string().into())
}

pub fn turn_complete() -> Message {
    Message::Text(json!({ "serverContent": { "turnComplete": true } }).to_string().into())
}

/// Handle a single Live connection
async fn handle_live_connection(
    stream: TcpStream,
    script: ServerScript,
    record: Arc<ServerRecord>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let query_record = record.clone();
    let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        *query_record.request_query.lock() = req.uri().query().map(str::to_string);
        Ok(resp)
    };
    let ws_stream = accept_hdr_async(stream, callback).await?;
    let (mut write, mut read) = ws_stream.split();

    // Setup must arrive first
    if let Some(Ok(first)) = read.next().await {
        if let Some(value) = parse_frame(&first) {
            record.messages.lock().push(value);
        }
        if script.acknowledge_setup {
            write.send(setup_complete()).await?;
        }
    }

    for frame in script.frames {
        write.send(frame).await?;
    }

    if let Some(reason) = script.close_with {
        write
            .send(Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: reason.into(),
            })))
            .await?;
    }

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Close(_)) => {
                record.close_received.store(true, Ordering::SeqCst);
                break;
            }
            Ok(Message::Ping(data)) => {
                write.send(Message::Pong(data)).await?;
            }
            Ok(other) => {
                if let Some(value) = parse_frame(&other) {
                    record.messages.lock().push(value);
                }
            }
            Err(_) => break,
        }
    }

    Ok(())
}

fn parse_frame(message: &Message) -> Option<Value> {
    match message {
        Message::Text(text) => serde_json::from_str(text.as_str()).ok(),
        Message::Binary(data) => serde_json::from_slice(data).ok(),
        _ => None,
    }
}
