//! # mjpeg-cast
//!
//! Live MJPEG streaming over HTTP: one camera/encoder producer, any number
//! of concurrent viewers, each receiving a `multipart/x-mixed-replace`
//! stream of the freshest frame.
//!
//! The heart of the crate is [`broadcast::FrameBroadcaster`]: it splits the
//! raw encoder byte stream on JPEG start-of-image markers and publishes the
//! latest complete frame to every waiting viewer. There is no frame queue
//! and no backpressure — a slow viewer skips straight to the newest frame.
//! [`session::StreamSession`] drives one open streaming response per
//! viewer, and [`server::MjpegServer`] provides the HTTP front end.
//!
//! # Example
//!
//! ```no_run
//! use mjpeg_cast::{FrameBroadcaster, MjpegServer, ServerConfig};
//! use tokio::io::AsyncReadExt;
//!
//! #[tokio::main]
//! async fn main() -> mjpeg_cast::Result<()> {
//!     let mut broadcaster = FrameBroadcaster::new();
//!     let server = MjpegServer::new(ServerConfig::default(), broadcaster.handle());
//!
//!     // Producer: feed raw MJPEG output (here: stdin) into the broadcaster
//!     tokio::spawn(async move {
//!         let mut encoder = tokio::io::stdin();
//!         let mut chunk = vec![0u8; 16 * 1024];
//!         loop {
//!             match encoder.read(&mut chunk).await {
//!                 Ok(0) | Err(_) => break,
//!                 Ok(n) => broadcaster.ingest(&chunk[..n]),
//!             }
//!         }
//!         broadcaster.close();
//!     });
//!
//!     // Viewers: open http://localhost:8000/index.html
//!     server.run().await
//! }
//! ```

pub mod broadcast;
pub mod error;
pub mod server;
pub mod session;
pub mod stats;

pub use broadcast::{BroadcastHandle, Frame, FrameBroadcaster, FrameReceiver};
pub use error::{Error, Result};
pub use server::{MjpegServer, ServerConfig};
pub use session::{SessionOutcome, SessionState, StreamSession};
pub use stats::SessionStats;
