//! Scripted live transport

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use studenflow::core::realtime::{
    LiveEvent, LiveSessionConfig, LiveTransport, OutboundAudio, RealtimeError, RealtimeResult,
};

/// Transport whose events come from the test through [`MockTransport::emit`].
#[derive(Default)]
pub struct MockTransport {
    events_tx: Mutex<Option<mpsc::Sender<LiveEvent>>>,
    connect_delay: Option<Duration>,
    fail_connect: bool,
    open: AtomicBool,
    pub sent: Mutex<Vec<OutboundAudio>>,
    pub connect_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
    pub last_config: Mutex<Option<LiveSessionConfig>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect only completes after `delay`.
    pub fn with_connect_delay(delay: Duration) -> Self {
        Self {
            connect_delay: Some(delay),
            ..Self::default()
        }
    }

    /// Every connect attempt fails.
    pub fn failing() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    /// Deliver an event to the connected session.
    pub async fn emit(&self, event: LiveEvent) -> bool {
        let tx = self.events_tx.lock().clone();
        match tx {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn closes(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LiveTransport for MockTransport {
    async fn connect(&self, config: &LiveSessionConfig) -> RealtimeResult<mpsc::Receiver<LiveEvent>> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_connect {
            return Err(RealtimeError::ConnectionFailed("mock refused".to_string()));
        }

        let (tx, rx) = mpsc::channel(64);
        *self.events_tx.lock() = Some(tx);
        *self.last_config.lock() = Some(config.clone());
        self.open.store(true, Ordering::SeqCst);
        Ok(rx)
    }

    fn send_audio(&self, audio: OutboundAudio) -> RealtimeResult<()> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(RealtimeError::NotConnected);
        }
        self.sent.lock().push(audio);
        Ok(())
    }

    async fn close(&self) -> RealtimeResult<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
        self.events_tx.lock().take();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}
