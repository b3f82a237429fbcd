//! Per-client streaming session
//!
//! One [`StreamSession`] owns one open streaming response. It loops:
//! wait for the next published frame, serialize it as one multipart part,
//! flush, repeat — until the viewer disconnects, a write fails, or the
//! broadcaster shuts down. No failure here is ever visible to other
//! sessions or to the producer.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::broadcast::FrameReceiver;
use crate::error::{Error, Result};
use crate::session::multipart::{encode_part_head, STREAM_RESPONSE_HEAD};
use crate::stats::SessionStats;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Response head not yet sent
    Idle,
    /// Streaming parts to the viewer
    Streaming,
    /// Terminated; the connection is no longer written to
    Closed,
}

/// How a session ended, for the outcomes that are not failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Viewer closed the connection
    Disconnected,
    /// Producer shut the broadcaster down
    BroadcastClosed,
}

/// Control loop for one streaming viewer
///
/// Generic over the connection so sessions run unchanged against a
/// `TcpStream`, one half of an in-memory duplex, or a mock transport.
pub struct StreamSession<W> {
    /// Session ID, for log correlation
    session_id: u64,

    /// Client connection (write half)
    connection: W,

    /// This session's attachment to the broadcaster
    receiver: FrameReceiver,

    /// Current lifecycle state
    state: SessionState,

    /// Recorded outcome once closed
    outcome: Option<SessionOutcome>,

    /// Generation of the last frame written to this viewer
    last_generation: u64,

    /// Per-session delivery statistics
    stats: SessionStats,
}

impl<W: AsyncWrite + Unpin> StreamSession<W> {
    /// Create a session for one viewer connection
    pub fn new(session_id: u64, receiver: FrameReceiver, connection: W) -> Self {
        Self {
            session_id,
            connection,
            receiver,
            state: SessionState::Idle,
            outcome: None,
            last_generation: 0,
            stats: SessionStats::new(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Delivery statistics so far
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Run the session to completion.
    ///
    /// Sends the multipart response head once, then streams parts until
    /// the session ends. Viewer disconnects and broadcaster shutdown are
    /// normal terminations and return `Ok`; any other transport failure is
    /// returned as an error after logging. Calling `run` again on a closed
    /// session is a no-op returning the recorded outcome.
    pub async fn run(&mut self) -> Result<SessionOutcome> {
        if self.state == SessionState::Closed {
            return Ok(self.outcome.unwrap_or(SessionOutcome::Disconnected));
        }

        let result = self.stream().await;
        self.state = SessionState::Closed;

        match result {
            Ok(outcome) => {
                self.outcome = Some(outcome);
                tracing::info!(
                    session_id = self.session_id,
                    outcome = ?outcome,
                    parts = self.stats.frames_sent,
                    bytes = self.stats.bytes_sent,
                    "Streaming session ended"
                );
                Ok(outcome)
            }
            Err(e) if e.is_disconnect() => {
                self.outcome = Some(SessionOutcome::Disconnected);
                tracing::info!(
                    session_id = self.session_id,
                    reason = %e,
                    parts = self.stats.frames_sent,
                    bytes = self.stats.bytes_sent,
                    "Streaming client disconnected"
                );
                Ok(SessionOutcome::Disconnected)
            }
            Err(e) => {
                tracing::warn!(
                    session_id = self.session_id,
                    error = %e,
                    "Streaming session failed"
                );
                Err(e)
            }
        }
    }

    async fn stream(&mut self) -> Result<SessionOutcome> {
        self.connection
            .write_all(STREAM_RESPONSE_HEAD.as_bytes())
            .await?;
        self.state = SessionState::Streaming;

        loop {
            let frame = match self.receiver.next_frame(self.last_generation).await {
                Ok(frame) => frame,
                Err(Error::BroadcastClosed) => return Ok(SessionOutcome::BroadcastClosed),
                Err(e) => return Err(e),
            };
            self.last_generation = frame.generation;

            let head = encode_part_head(frame.len());
            self.connection.write_all(&head).await?;
            self.connection.write_all(&frame.data).await?;
            self.connection.flush().await?;

            self.stats.on_frame(head.len() + frame.len());
            tracing::trace!(
                session_id = self.session_id,
                generation = frame.generation,
                bytes = frame.len(),
                "Part sent"
            );
        }
    }
}
