//! Multipart wire format for the MJPEG stream
//!
//! The stream body is an unbounded sequence of parts, one per frame:
//!
//! ```text
//! --FRAME\r\n
//! Content-Type: image/jpeg\r\n
//! Content-Length: <N>\r\n
//! \r\n
//! <N bytes of JPEG>
//! ```

use bytes::Bytes;

/// Part boundary marker, as it appears on the wire
pub const BOUNDARY: &str = "--FRAME";

/// Value of the streaming response's Content-Type header
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=--FRAME";

/// Response head sent once per streaming connection, before the first part
pub const STREAM_RESPONSE_HEAD: &str = "HTTP/1.1 200 OK\r\n\
    Cache-Control: no-store\r\n\
    Content-Type: multipart/x-mixed-replace; boundary=--FRAME\r\n\
    Connection: close\r\n\
    \r\n";

/// Encode the head of one part for a payload of `len` bytes.
///
/// The frame payload follows verbatim; it is written separately so the
/// reference-counted frame bytes are never copied into the part.
pub fn encode_part_head(len: usize) -> Bytes {
    Bytes::from(format!(
        "{BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: {len}\r\n\r\n"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_head_format() {
        let head = encode_part_head(1234);
        assert_eq!(
            head,
            Bytes::from_static(
                b"--FRAME\r\nContent-Type: image/jpeg\r\nContent-Length: 1234\r\n\r\n"
            )
        );
    }

    #[test]
    fn test_response_head_format() {
        assert!(STREAM_RESPONSE_HEAD.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(STREAM_RESPONSE_HEAD.contains("Cache-Control: no-store\r\n"));
        assert!(STREAM_RESPONSE_HEAD.contains(STREAM_CONTENT_TYPE));
        assert!(STREAM_RESPONSE_HEAD.ends_with("\r\n\r\n"));
    }
}
