//! Realtime voice session.
//!
//! [`RealtimeAudioSession`] drives one call at a time: it acquires the
//! microphone and an output context, connects a [`LiveTransport`], streams
//! captured blocks out once the backend is ready and schedules returned audio
//! for gapless playback.
//!
//! Every resource a call holds lives in one [`SessionResources`] value behind
//! an async mutex. Teardown goes through `SessionResources::release_all`,
//! which releases only what is held and can run any number of times, from
//! `stop()`, from the event task on close or error, or from a failed `start()`.
//!
//! `start()` and `stop()` are serialized by a separate attempt lock. A stop
//! issued while connecting cancels the attempt and returns only after that
//! attempt has released whatever it opened, so a following `start()` never
//! shares the transport with a stale attempt.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::base::{
    LiveEvent, LiveSessionConfig, LiveTransport, OutboundAudio, RealtimeError, RealtimeResult,
    SessionState, status,
};
use crate::core::audio::{
    AudioDevice, AudioFrame, CaptureConfig, CaptureStream, PlaybackSchedule, PlaybackSink,
    decode_inbound, encode_outbound, pcm16_mime_type, rms,
};

// =============================================================================
// Shared State
// =============================================================================

/// State observed by callers and updated by session tasks.
struct SessionShared {
    state: RwLock<SessionState>,
    status: RwLock<String>,
    /// RMS of the latest captured block, stored as `f32` bits
    input_level: AtomicU32,
    schedule: Mutex<PlaybackSchedule>,
    session_id: RwLock<Option<Uuid>>,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            state: RwLock::new(SessionState::Idle),
            status: RwLock::new(status::READY.to_string()),
            input_level: AtomicU32::new(0f32.to_bits()),
            schedule: Mutex::new(PlaybackSchedule::new()),
            session_id: RwLock::new(None),
        }
    }

    fn set_state(&self, state: SessionState) {
        let previous = std::mem::replace(&mut *self.state.write(), state);
        if previous != state {
            debug!("Realtime session state: {} -> {}", previous, state);
        }
    }

    fn set_status(&self, text: &str) {
        *self.status.write() = text.to_string();
    }

    fn set_input_level(&self, level: f32) {
        self.input_level.store(level.to_bits(), Ordering::Relaxed);
    }
}

// =============================================================================
// Resources
// =============================================================================

/// Everything a call holds. Absent fields are simply skipped on release.
#[derive(Default)]
pub(crate) struct SessionResources {
    capture: Option<Box<dyn CaptureStream>>,
    output: Option<Arc<dyn PlaybackSink>>,
    transport_open: bool,
    capture_task: Option<JoinHandle<()>>,
    event_task: Option<JoinHandle<()>>,
}

impl SessionResources {
    fn is_empty(&self) -> bool {
        self.capture.is_none()
            && self.output.is_none()
            && !self.transport_open
            && self.capture_task.is_none()
            && self.event_task.is_none()
    }

    /// Release every held resource and reset the playback cursor.
    async fn release_all(&mut self, transport: &dyn LiveTransport, schedule: &Mutex<PlaybackSchedule>) {
        if let Some(task) = self.capture_task.take() {
            task.abort();
        }
        if let Some(mut capture) = self.capture.take() {
            capture.stop();
        }
        if let Some(task) = self.event_task.take() {
            task.abort();
        }
        if let Some(output) = self.output.take() {
            output.stop_all();
            output.close();
        }
        if self.transport_open {
            self.transport_open = false;
            if let Err(e) = transport.close().await {
                warn!("Failed to close live transport: {}", e);
            }
        }
        schedule.lock().reset();
    }
}

// =============================================================================
// Session
// =============================================================================

/// One realtime voice call at a time over an injected device and transport.
pub struct RealtimeAudioSession {
    device: Arc<dyn AudioDevice>,
    transport: Arc<dyn LiveTransport>,
    config: LiveSessionConfig,
    capture_config: CaptureConfig,
    shared: Arc<SessionShared>,
    resources: Arc<AsyncMutex<SessionResources>>,
    /// Held for the whole of `start()` and `stop()`
    attempt: AsyncMutex<()>,
    cancel: Mutex<CancellationToken>,
}

impl RealtimeAudioSession {
    pub fn new(
        device: Arc<dyn AudioDevice>,
        transport: Arc<dyn LiveTransport>,
        config: LiveSessionConfig,
        capture_config: CaptureConfig,
    ) -> Self {
        Self {
            device,
            transport,
            config,
            capture_config,
            shared: Arc::new(SessionShared::new()),
            resources: Arc::new(AsyncMutex::new(SessionResources::default())),
            attempt: AsyncMutex::new(()),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.read()
    }

    /// Status line for display.
    pub fn status(&self) -> String {
        self.shared.status.read().clone()
    }

    /// RMS amplitude of the most recent microphone block.
    pub fn input_level(&self) -> f32 {
        f32::from_bits(self.shared.input_level.load(Ordering::Relaxed))
    }

    /// Identifier of the current or last call.
    pub fn session_id(&self) -> Option<Uuid> {
        *self.shared.session_id.read()
    }

    /// Start time reserved for the next inbound chunk.
    pub fn next_start_time(&self) -> f64 {
        self.shared.schedule.lock().next_start_time()
    }

    /// Whether no capture stream, output context, transport or task is held.
    pub async fn resources_released(&self) -> bool {
        self.resources.lock().await.is_empty()
    }

    /// Start a call.
    ///
    /// Returns once the transport is connected; the call becomes `Open` when
    /// the backend acknowledges setup. A `stop()` issued while connecting makes
    /// this return `Ok(())` with nothing left held.
    pub async fn start(&self) -> RealtimeResult<()> {
        let _attempt = self.attempt.lock().await;
        let token = {
            let mut state = self.shared.state.write();
            if *state != SessionState::Idle {
                return Err(RealtimeError::SessionBusy(format!(
                    "session is {}",
                    *state
                )));
            }
            *state = SessionState::Connecting;
            let token = CancellationToken::new();
            *self.cancel.lock() = token.clone();
            token
        };

        let session_id = Uuid::new_v4();
        *self.shared.session_id.write() = Some(session_id);
        self.shared.set_status(status::CONNECTING);
        self.shared.set_input_level(0.0);
        info!("Starting realtime session {}", session_id);

        // Acquire microphone and speaker.
        {
            let mut resources = self.resources.lock().await;
            if token.is_cancelled() {
                return Ok(());
            }

            match self.device.open_capture(&self.capture_config).await {
                Ok(capture) => resources.capture = Some(capture),
                Err(e) => {
                    drop(resources);
                    return self.fail_start(RealtimeError::ResourceUnavailable(e.to_string())).await;
                }
            }

            match self
                .device
                .open_playback(self.config.output_sample_rate, 1)
                .await
            {
                Ok(output) => resources.output = Some(output),
                Err(e) => {
                    drop(resources);
                    return self.fail_start(RealtimeError::ResourceUnavailable(e.to_string())).await;
                }
            }
        }

        // Connect, unless stop() wins the race. An abandoned connect never opened.
        let events = tokio::select! {
            _ = token.cancelled() => {
                debug!("Realtime session {} stopped while connecting", session_id);
                return Ok(());
            }
            result = self.transport.connect(&self.config) => result,
        };

        let events = match events {
            Ok(events) => events,
            Err(e) => return self.fail_start(e).await,
        };

        let mut resources = self.resources.lock().await;
        if token.is_cancelled() {
            // The connection is this attempt's own; stop() is waiting on the attempt lock.
            if let Err(e) = self.transport.close().await {
                warn!("Failed to close live transport: {}", e);
            }
            return Ok(());
        }
        resources.transport_open = true;

        let Some(output) = resources.output.clone() else {
            drop(resources);
            return self
                .fail_start(RealtimeError::ResourceUnavailable("output context released".to_string()))
                .await;
        };

        let event_loop = EventLoop {
            shared: self.shared.clone(),
            resources: self.resources.clone(),
            transport: self.transport.clone(),
            output,
            cancel: token,
            input_mime_type: pcm16_mime_type(self.capture_config.sample_rate),
            output_sample_rate: self.config.output_sample_rate,
        };
        resources.event_task = Some(tokio::spawn(event_loop.run(events)));

        info!("Realtime session {} connected, waiting for setup", session_id);
        Ok(())
    }

    /// End the call and release everything. Safe to call at any time, any number of times.
    pub async fn stop(&self) {
        // Make an in-flight start() give up the attempt lock.
        self.cancel.lock().cancel();
        let _attempt = self.attempt.lock().await;

        let was_active = {
            let mut state = self.shared.state.write();
            self.cancel.lock().cancel();
            let was_active = *state != SessionState::Idle;
            if was_active {
                *state = SessionState::Closing;
            }
            was_active
        };

        self.resources
            .lock()
            .await
            .release_all(self.transport.as_ref(), &self.shared.schedule)
            .await;

        self.shared.set_state(SessionState::Idle);
        if was_active {
            self.shared.set_status(status::CALL_ENDED);
            self.shared.set_input_level(0.0);
            info!("Realtime session stopped");
        }
    }

    async fn fail_start(&self, err: RealtimeError) -> RealtimeResult<()> {
        error!("Failed to start realtime session: {}", err);
        self.cancel.lock().cancel();
        self.shared.set_state(SessionState::Error);
        self.resources
            .lock()
            .await
            .release_all(self.transport.as_ref(), &self.shared.schedule)
            .await;
        self.shared.set_state(SessionState::Idle);
        self.shared.set_status(status::START_FAILED);
        Err(err)
    }
}

impl Drop for RealtimeAudioSession {
    fn drop(&mut self) {
        self.cancel.get_mut().cancel();
    }
}

// =============================================================================
// Event Loop
// =============================================================================

/// Consumes transport events for one call, in arrival order.
struct EventLoop {
    shared: Arc<SessionShared>,
    resources: Arc<AsyncMutex<SessionResources>>,
    transport: Arc<dyn LiveTransport>,
    output: Arc<dyn PlaybackSink>,
    cancel: CancellationToken,
    input_mime_type: String,
    output_sample_rate: u32,
}

impl EventLoop {
    async fn run(self, mut events: mpsc::Receiver<LiveEvent>) {
        loop {
            let event = tokio::select! {
                _ = self.cancel.cancelled() => return,
                event = events.recv() => event,
            };

            match event {
                Some(LiveEvent::Ready) => self.on_ready().await,
                Some(LiveEvent::Audio { data, .. }) => self.on_audio(&data),
                Some(LiveEvent::Interrupted) => {
                    debug!("Backend interrupted its reply, flushing playback");
                    self.output.stop_all();
                    self.shared.schedule.lock().reset();
                }
                Some(LiveEvent::TurnComplete) => debug!("Backend turn complete"),
                Some(LiveEvent::Closed { reason }) => {
                    info!("Live connection closed: {:?}", reason);
                    self.teardown(SessionState::Closing, status::CONNECTION_CLOSED)
                        .await;
                    return;
                }
                Some(LiveEvent::Error(message)) => {
                    error!("Live connection error: {}", message);
                    self.teardown(SessionState::Error, status::CONNECTION_ERROR)
                        .await;
                    return;
                }
                None => {
                    info!("Live event stream ended");
                    self.teardown(SessionState::Closing, status::CONNECTION_CLOSED)
                        .await;
                    return;
                }
            }
        }
    }

    async fn on_ready(&self) {
        let mut resources = self.resources.lock().await;
        if self.cancel.is_cancelled() {
            return;
        }

        let blocks = resources.capture.as_mut().and_then(|c| c.take_blocks());
        match blocks {
            Some(blocks) => {
                let pump = CapturePump {
                    shared: self.shared.clone(),
                    transport: self.transport.clone(),
                    cancel: self.cancel.clone(),
                    mime_type: self.input_mime_type.clone(),
                };
                resources.capture_task = Some(tokio::spawn(pump.run(blocks)));
            }
            None => warn!("Capture stream has no block receiver, microphone audio will not be sent"),
        }

        // Still under the resources lock, so a concurrent stop() finishes after this.
        self.shared.set_state(SessionState::Open);
        self.shared.set_status(status::CONNECTED);
        info!("Realtime session open");
    }

    fn on_audio(&self, data: &str) {
        if *self.shared.state.read() != SessionState::Open {
            debug!("Dropping audio received outside an open session");
            return;
        }

        let frame = match decode_inbound(data, self.output_sample_rate, 1) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping undecodable audio chunk: {}", e);
                return;
            }
        };

        self.schedule_frame(frame);
    }

    fn schedule_frame(&self, frame: AudioFrame) {
        let duration = frame.duration_secs();
        let start = self
            .shared
            .schedule
            .lock()
            .schedule(self.output.current_time(), duration);

        if let Err(e) = self.output.schedule(frame, start) {
            warn!("Failed to schedule audio chunk: {}", e);
        }
    }

    /// Release everything from inside the event task.
    async fn teardown(&self, intermediate: SessionState, status_text: &str) {
        self.shared.set_state(intermediate);
        self.cancel.cancel();

        {
            let mut resources = self.resources.lock().await;
            // Detach our own handle so release_all does not abort this task mid-cleanup.
            resources.event_task.take();
            resources
                .release_all(self.transport.as_ref(), &self.shared.schedule)
                .await;
        }

        self.shared.set_state(SessionState::Idle);
        self.shared.set_status(status_text);
        self.shared.set_input_level(0.0);
    }
}

// =============================================================================
// Capture Pump
// =============================================================================

/// Forwards captured blocks to the transport.
struct CapturePump {
    shared: Arc<SessionShared>,
    transport: Arc<dyn LiveTransport>,
    cancel: CancellationToken,
    mime_type: String,
}

impl CapturePump {
    async fn run(self, mut blocks: mpsc::Receiver<AudioFrame>) {
        loop {
            let block = tokio::select! {
                _ = self.cancel.cancelled() => break,
                block = blocks.recv() => match block {
                    Some(block) => block,
                    None => break,
                },
            };

            self.shared.set_input_level(rms(&block.samples));

            let audio = OutboundAudio {
                mime_type: self.mime_type.clone(),
                data: encode_outbound(&block.samples),
            };
            if let Err(e) = self.transport.send_audio(audio) {
                debug!("Dropping captured block: {}", e);
            }
        }
        debug!("Capture pump stopped");
    }
}
