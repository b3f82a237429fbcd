//! Crate error types
//!
//! One error enum covers the whole crate. Transport errors carry the
//! underlying `std::io::Error`; `is_disconnect` separates the expected
//! peer-went-away cases from genuine failures.

use std::io;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for server and session operations
#[derive(Debug)]
pub enum Error {
    /// Underlying transport error
    Io(io::Error),
    /// The frame broadcaster was shut down (producer closed)
    BroadcastClosed,
    /// Client sent a request head we could not parse
    InvalidRequest(String),
    /// Client request head exceeded the configured size limit
    RequestTooLarge(usize),
}

impl Error {
    /// Whether this error means the peer closed the connection.
    ///
    /// Expected under normal operation (a viewer closing their browser tab),
    /// so callers log it at informational severity rather than treating it
    /// as a failure.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Error::Io(e) => is_disconnect(e),
            _ => false,
        }
    }
}

/// Classify an IO error as a peer disconnect
pub fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof
    )
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::BroadcastClosed => write!(f, "Frame broadcaster closed"),
            Error::InvalidRequest(line) => write!(f, "Invalid HTTP request: {}", line),
            Error::RequestTooLarge(limit) => {
                write!(f, "Request head exceeded {} bytes", limit)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnect_classification() {
        assert!(is_disconnect(&io::Error::from(io::ErrorKind::BrokenPipe)));
        assert!(is_disconnect(&io::Error::from(io::ErrorKind::ConnectionReset)));
        assert!(!is_disconnect(&io::Error::from(io::ErrorKind::OutOfMemory)));

        let err = Error::from(io::Error::from(io::ErrorKind::ConnectionAborted));
        assert!(err.is_disconnect());
        assert!(!Error::BroadcastClosed.is_disconnect());
    }

    #[test]
    fn test_display() {
        let err = Error::InvalidRequest("FOO bar".into());
        assert!(err.to_string().contains("FOO bar"));

        let err = Error::RequestTooLarge(8192);
        assert!(err.to_string().contains("8192"));
    }
}
