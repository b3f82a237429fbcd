//! Latest-frame broadcast from one producer to many viewers
//!
//! The camera encoder is a single producer feeding raw MJPEG output into
//! [`FrameBroadcaster::ingest`]; every connected viewer blocks in
//! [`FrameReceiver::next_frame`] until a new frame is published.
//!
//! # Architecture
//!
//! ```text
//!      encoder chunks
//!            │
//!            ▼
//!   FrameBroadcaster::ingest ── boundary? ──► publish latest Frame
//!     (private buffer)                    (watch slot + generation)
//!                                              │
//!                      ┌───────────────────────┼───────────────────┐
//!                      ▼                       ▼                   ▼
//!                [StreamSession]         [StreamSession]     [StreamSession]
//!                next_frame(gen)         next_frame(gen)     next_frame(gen)
//! ```
//!
//! # Zero-Copy Design
//!
//! A published [`Frame`] wraps `bytes::Bytes`, so handing it to N sessions
//! reference-counts one allocation instead of copying it N times. Only the
//! newest frame is retained; a slow session simply skips the frames it
//! slept through.

pub mod broadcaster;
pub mod frame;

pub use broadcaster::{BroadcastHandle, FrameBroadcaster, FrameReceiver};
pub use frame::{starts_new_frame, Frame, JPEG_SOI};
