//! Per-viewer streaming sessions
//!
//! Each open `GET /stream.mjpg` response is driven by one
//! [`StreamSession`]: a loop that waits for the next published frame and
//! writes it as one multipart part. Sessions are independent; one viewer
//! disconnecting never affects another viewer or the producer.

pub mod multipart;
pub mod stream;

pub use multipart::{encode_part_head, BOUNDARY, STREAM_CONTENT_TYPE, STREAM_RESPONSE_HEAD};
pub use stream::{SessionOutcome, SessionState, StreamSession};
