//! Frame broadcaster implementation
//!
//! Single-writer, multi-reader fan-out of the latest complete JPEG frame.
//! The producer feeds raw encoder chunks into [`FrameBroadcaster::ingest`];
//! each time a start-of-image marker opens a chunk, the bytes accumulated
//! since the previous marker are published as one [`Frame`] and every
//! waiting consumer wakes.

use bytes::BytesMut;

use tokio::sync::watch;

use super::frame::{starts_new_frame, Frame};
use crate::error::{Error, Result};

/// Initial capacity of the accumulation buffer.
///
/// Sized for a typical 640x480 JPEG so steady-state ingest does not
/// reallocate.
const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Latest publication, held in the watch slot shared with all consumers
#[derive(Debug, Clone, Default)]
struct Publication {
    /// Most recently published frame, if any
    frame: Option<Frame>,
    /// Set once the producer shuts down
    closed: bool,
}

/// Single-producer broadcaster of the latest complete frame
///
/// `ingest` takes `&mut self`, so the compiler enforces the contract that
/// the producer path never runs concurrently with itself. Consumers attach
/// through [`FrameBroadcaster::handle`] and block in
/// [`FrameReceiver::next_frame`]; a publication wakes all of them, and a
/// consumer that sleeps through several publications observes only the
/// newest frame. There is no queue and no backpressure: if the producer
/// outruns a consumer, intermediate frames are overwritten.
pub struct FrameBroadcaster {
    /// Latest-frame slot; replaced wholesale on each publication
    tx: watch::Sender<Publication>,

    /// Producer-private scratch collecting bytes between frame boundaries
    buffer: BytesMut,

    /// Generation of the most recent publication
    generation: u64,
}

impl FrameBroadcaster {
    /// Create a broadcaster with the default accumulation capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a broadcaster with a custom accumulation buffer capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = watch::channel(Publication::default());
        Self {
            tx,
            buffer: BytesMut::with_capacity(capacity),
            generation: 0,
        }
    }

    /// Feed one chunk of raw encoder output.
    ///
    /// A chunk opening with the JPEG start-of-image marker means the
    /// previous frame is complete: everything accumulated so far is
    /// published, then the chunk is appended as the start of the next
    /// frame. A frame is therefore published one boundary *behind* its own
    /// data, which is the only point at which it is known to be complete.
    ///
    /// The very first marker arrives with an empty buffer and publishes
    /// nothing, so consumers never observe an empty frame.
    ///
    /// Never fails: malformed encoder output yields a malformed frame,
    /// passed through unchanged.
    pub fn ingest(&mut self, chunk: &[u8]) {
        if starts_new_frame(chunk) && !self.buffer.is_empty() {
            // Copy-then-publish: freeze the accumulated bytes before the
            // slot is touched, so no reader can see a partial frame.
            let data = self.buffer.split().freeze();
            self.generation += 1;
            let frame = Frame::new(data, self.generation);

            tracing::trace!(
                generation = frame.generation,
                bytes = frame.len(),
                subscribers = self.tx.receiver_count(),
                "Frame published"
            );

            self.tx.send_modify(|p| p.frame = Some(frame));
        }

        self.buffer.extend_from_slice(chunk);
    }

    /// Generation of the most recently published frame (0 = none yet)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bytes accumulated since the last frame boundary
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Number of attached receivers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get a cloneable handle for attaching consumers
    pub fn handle(&self) -> BroadcastHandle {
        BroadcastHandle {
            rx: self.tx.subscribe(),
        }
    }

    /// Shut the broadcaster down.
    ///
    /// All blocked and future waiters unblock with
    /// [`Error::BroadcastClosed`]. Dropping the broadcaster has the same
    /// effect.
    pub fn close(&self) {
        tracing::info!(
            generation = self.generation,
            "Frame broadcaster closed"
        );
        self.tx.send_modify(|p| p.closed = true);
    }
}

impl Default for FrameBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle to a [`FrameBroadcaster`]
///
/// Held by the server; each streaming connection calls [`subscribe`] to get
/// its own [`FrameReceiver`]. The handle does not keep the broadcaster
/// alive: once the producer drops it, all receivers see the closed signal.
///
/// [`subscribe`]: BroadcastHandle::subscribe
#[derive(Clone)]
pub struct BroadcastHandle {
    rx: watch::Receiver<Publication>,
}

impl BroadcastHandle {
    /// Attach a new consumer
    pub fn subscribe(&self) -> FrameReceiver {
        FrameReceiver {
            rx: self.rx.clone(),
        }
    }
}

/// Per-consumer receiving end of the broadcast
pub struct FrameReceiver {
    rx: watch::Receiver<Publication>,
}

impl FrameReceiver {
    /// Block until a frame newer than `last_seen` is published.
    ///
    /// Returns immediately if the current frame is already newer. The
    /// returned frame's generation is strictly greater than `last_seen`
    /// and at least as new as whatever was current at call time; a
    /// consumer that slept through several publications gets only the
    /// latest.
    ///
    /// Fails with [`Error::BroadcastClosed`] once the producer has called
    /// [`FrameBroadcaster::close`] or dropped the broadcaster.
    pub async fn next_frame(&mut self, last_seen: u64) -> Result<Frame> {
        let publication = self
            .rx
            .wait_for(|p| {
                p.closed || p.frame.as_ref().is_some_and(|f| f.generation > last_seen)
            })
            .await
            .map_err(|_| Error::BroadcastClosed)?;

        match publication.frame.as_ref() {
            Some(frame) if !publication.closed && frame.generation > last_seen => {
                Ok(frame.clone())
            }
            _ => Err(Error::BroadcastClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;

    fn marker_chunk(tail: &[u8]) -> Vec<u8> {
        let mut chunk = vec![0xFF, 0xD8];
        chunk.extend_from_slice(tail);
        chunk
    }

    #[tokio::test]
    async fn test_k_markers_publish_k_minus_one_frames() {
        let mut broadcaster = FrameBroadcaster::new();
        let mut rx = broadcaster.handle().subscribe();

        let payloads: [&[u8]; 4] = [b"aaa", b"bb", b"cccc", b"d"];
        let mut last_seen = 0;

        broadcaster.ingest(&marker_chunk(payloads[0]));
        for window in payloads.windows(2) {
            // The next marker publishes the previous accumulation
            broadcaster.ingest(&marker_chunk(window[1]));
            let frame = rx.next_frame(last_seen).await.unwrap();
            assert_eq!(frame.data, Bytes::from(marker_chunk(window[0])));
            last_seen = frame.generation;
        }

        // 4 markers, 3 published frames
        assert_eq!(broadcaster.generation(), 3);

        // The final accumulation is still unpublished
        assert_eq!(broadcaster.pending_bytes(), 2 + payloads[3].len());
    }

    #[tokio::test]
    async fn test_boundary_scenario() {
        // End-to-end boundary walk: [FF D8 'A'], [FF D8 'B'], [FF D8 'C']
        let mut broadcaster = FrameBroadcaster::new();
        let handle = broadcaster.handle();
        let mut rx = handle.subscribe();

        // First marker: empty buffer, publish skipped
        broadcaster.ingest(&[0xFF, 0xD8, b'A']);
        assert_eq!(broadcaster.generation(), 0);

        broadcaster.ingest(&[0xFF, 0xD8, b'B']);
        let frame = rx.next_frame(0).await.unwrap();
        assert_eq!(frame.generation, 1);
        assert_eq!(frame.data, Bytes::from_static(&[0xFF, 0xD8, b'A']));

        broadcaster.ingest(&[0xFF, 0xD8, b'C']);
        let frame = rx.next_frame(1).await.unwrap();
        assert_eq!(frame.generation, 2);
        assert_eq!(frame.data, Bytes::from_static(&[0xFF, 0xD8, b'B']));

        // Final buffer holds FF D8 'C', unpublished
        assert_eq!(broadcaster.pending_bytes(), 3);
        assert_eq!(broadcaster.generation(), 2);
    }

    #[tokio::test]
    async fn test_split_chunks_accumulate() {
        // A frame delivered across several non-marker chunks comes out whole
        let mut broadcaster = FrameBroadcaster::new();
        let mut rx = broadcaster.handle().subscribe();

        broadcaster.ingest(&[0xFF, 0xD8, 0x01]);
        broadcaster.ingest(&[0x02, 0x03]);
        broadcaster.ingest(&[0x04]);
        broadcaster.ingest(&[0xFF, 0xD8, 0x05]);

        let frame = rx.next_frame(0).await.unwrap();
        assert_eq!(
            frame.data,
            Bytes::from_static(&[0xFF, 0xD8, 0x01, 0x02, 0x03, 0x04])
        );
    }

    #[tokio::test]
    async fn test_monotonic_generations() {
        let mut broadcaster = FrameBroadcaster::new();
        let mut rx = broadcaster.handle().subscribe();

        for payload in [b"x", b"y", b"z"] {
            broadcaster.ingest(&marker_chunk(payload));
        }
        broadcaster.ingest(&marker_chunk(b"w"));

        let first = rx.next_frame(0).await.unwrap();
        // Already at the newest generation, strictly greater than last_seen
        assert!(first.generation > 0);
        assert_eq!(first.generation, broadcaster.generation());

        broadcaster.ingest(&marker_chunk(b"v"));
        let second = rx.next_frame(first.generation).await.unwrap();
        assert!(second.generation > first.generation);
    }

    #[tokio::test]
    async fn test_fanout_identical_bytes() {
        let mut broadcaster = FrameBroadcaster::new();
        let handle = broadcaster.handle();

        let mut waiters = Vec::new();
        for _ in 0..8 {
            let mut rx = handle.subscribe();
            waiters.push(tokio::spawn(
                async move { rx.next_frame(0).await.unwrap() },
            ));
        }

        // Let every waiter block before publishing
        tokio::time::sleep(Duration::from_millis(10)).await;
        broadcaster.ingest(&marker_chunk(b"frame-one"));
        broadcaster.ingest(&marker_chunk(b"next"));

        let mut frames = Vec::new();
        for waiter in waiters {
            frames.push(waiter.await.unwrap());
        }
        for frame in &frames {
            assert_eq!(frame.generation, frames[0].generation);
            assert_eq!(frame.data, frames[0].data);
        }
    }

    #[tokio::test]
    async fn test_coalescing_skips_to_latest() {
        let mut broadcaster = FrameBroadcaster::new();
        let mut rx = broadcaster.handle().subscribe();

        // Five publications while the consumer is not waiting
        for payload in [b"1", b"2", b"3", b"4", b"5"] {
            broadcaster.ingest(&marker_chunk(payload));
        }
        broadcaster.ingest(&marker_chunk(b"6"));

        let frame = rx.next_frame(0).await.unwrap();
        assert_eq!(frame.generation, 5);
        assert_eq!(frame.data, Bytes::from(marker_chunk(b"5")));
    }

    #[tokio::test]
    async fn test_close_unblocks_waiters() {
        let broadcaster = FrameBroadcaster::new();
        let mut rx = broadcaster.handle().subscribe();

        let waiter = tokio::spawn(async move { rx.next_frame(0).await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        broadcaster.close();
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(Error::BroadcastClosed)));

        // Future waiters see the closed signal too
        let mut rx = broadcaster.handle().subscribe();
        assert!(matches!(
            rx.next_frame(0).await,
            Err(Error::BroadcastClosed)
        ));
    }

    #[tokio::test]
    async fn test_drop_closes_receivers() {
        let broadcaster = FrameBroadcaster::new();
        let mut rx = broadcaster.handle().subscribe();
        drop(broadcaster);

        assert!(matches!(
            rx.next_frame(0).await,
            Err(Error::BroadcastClosed)
        ));
    }

    #[tokio::test]
    async fn test_dropping_receivers_leaves_state_intact() {
        let mut broadcaster = FrameBroadcaster::new();
        let handle = broadcaster.handle();

        let rx_a = handle.subscribe();
        let rx_b = handle.subscribe();
        drop(rx_a);
        drop(rx_b);

        // Publishing with no receivers is fine, and new receivers attach
        broadcaster.ingest(&marker_chunk(b"a"));
        broadcaster.ingest(&marker_chunk(b"b"));
        assert_eq!(broadcaster.generation(), 1);

        let mut rx = handle.subscribe();
        let frame = rx.next_frame(0).await.unwrap();
        assert_eq!(frame.data, Bytes::from(marker_chunk(b"a")));
    }
}
