//! HTTP serving layer
//!
//! Thin glue around the broadcast core: a TCP accept loop, a minimal
//! HTTP/1.1 request reader, and the routing between the landing page and
//! the live stream.

pub mod config;
pub mod http;
pub mod listener;

pub use config::ServerConfig;
pub use listener::{serve_connection, MjpegServer};
