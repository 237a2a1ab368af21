//! Gapless playback scheduling on a shared output clock.

/// Cursor marking where the next inbound chunk starts on the output clock.
///
/// Chunks are laid back to back: a chunk starts at the cursor, or at the
/// current clock time if the cursor has fallen behind (the queue drained).
/// The cursor lives for one realtime session and is reset when it ends.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackSchedule {
    next_start_time: f64,
}

impl PlaybackSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds on the output clock where the next chunk will start.
    pub fn next_start_time(&self) -> f64 {
        self.next_start_time
    }

    /// Reserve `duration` seconds of playback and return the start time.
    pub fn schedule(&mut self, now: f64, duration: f64) -> f64 {
        let start = self.next_start_time.max(now);
        self.next_start_time = start + duration.max(0.0);
        start
    }

    pub fn reset(&mut self) {
        self.next_start_time = 0.0;
    }
}
