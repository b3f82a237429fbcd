//! Published frame type
//!
//! A [`Frame`] is one complete JPEG image extracted from the encoder byte
//! stream, tagged with the generation at which it was published.

use bytes::Bytes;

/// JPEG start-of-image marker, delimiting frames in the raw encoder stream
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Whether a chunk begins a new JPEG frame.
///
/// Only offset 0 is checked: the encoder emits each image starting on its
/// own chunk, so a marker elsewhere in a chunk belongs to entropy-coded data.
pub fn starts_new_frame(chunk: &[u8]) -> bool {
    chunk.starts_with(&JPEG_SOI)
}

/// One complete JPEG-encoded image published by the broadcaster
///
/// Cheap to clone: the payload is reference-counted `Bytes`, so every
/// session streaming this frame shares a single allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// JPEG data, verbatim encoder output
    pub data: Bytes,
    /// Publication generation, strictly increasing per broadcaster
    pub generation: u64,
}

impl Frame {
    /// Create a frame at the given generation
    pub fn new(data: Bytes, generation: u64) -> Self {
        Self { data, generation }
    }

    /// Byte length of the JPEG payload
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
