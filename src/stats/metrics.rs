//! Statistics for streaming sessions

use std::time::{Duration, Instant};

/// Delivery statistics for one streaming session
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Frames written to the viewer
    pub frames_sent: u64,
    /// Total bytes written, part heads included
    pub bytes_sent: u64,
    /// When the session started streaming
    pub started_at: Instant,
}

impl SessionStats {
    /// Create a new stats tracker
    pub fn new() -> Self {
        Self {
            frames_sent: 0,
            bytes_sent: 0,
            started_at: Instant::now(),
        }
    }

    /// Record one delivered frame of `bytes` total wire size
    pub fn on_frame(&mut self, bytes: usize) {
        self.frames_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    /// Time since the session started
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Delivery bitrate estimate in bits per second
    pub fn bitrate(&self) -> u64 {
        let secs = self.duration().as_secs();
        if secs > 0 {
            (self.bytes_sent * 8) / secs
        } else {
            0
        }
    }

    /// Delivered frame rate estimate in frames per second
    pub fn frame_rate(&self) -> f64 {
        let secs = self.duration().as_secs_f64();
        if secs > 0.0 {
            self.frames_sent as f64 / secs
        } else {
            0.0
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
