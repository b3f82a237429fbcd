//! Minimal HTTP/1.1 front end
//!
//! Just enough HTTP for this server: read and parse a request head, and
//! build the small set of responses the router needs. The streaming
//! response itself is owned by [`crate::session::StreamSession`].

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result};

/// Landing page, served at `/` and `/index.html`
pub const INDEX_PAGE: &str = "\
<html>
<head>
<title>MJPEG streaming demo</title>
</head>
<body>
<h1>MJPEG Streaming Demo</h1>
<img src=\"stream.mjpg\" width=\"640\" height=\"480\" />
</body>
</html>
";

/// Parsed request head; only the request line matters to this server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method, e.g. `GET`
    pub method: String,
    /// Request target, e.g. `/stream.mjpg`
    pub target: String,
}

/// Read a request head (through the terminating blank line) and parse it.
///
/// `max_head` caps how many bytes we are willing to buffer; a client that
/// sends more without completing the head gets [`Error::RequestTooLarge`].
pub async fn read_request<R>(reader: &mut R, max_head: usize) -> Result<Request>
where
    R: AsyncRead + Unpin,
{
    let mut head = BytesMut::with_capacity(1024);

    loop {
        if find_head_end(&head).is_some() {
            break;
        }
        if head.len() >= max_head {
            return Err(Error::RequestTooLarge(max_head));
        }

        let n = reader.read_buf(&mut head).await?;
        if n == 0 {
            return Err(Error::InvalidRequest(
                "connection closed before request head completed".into(),
            ));
        }
    }

    let line_end = head
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(head.len());
    let line = std::str::from_utf8(&head[..line_end])
        .map_err(|_| Error::InvalidRequest("request line is not UTF-8".into()))?;

    parse_request_line(line)
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Parse `METHOD SP target SP HTTP/x.y`
pub fn parse_request_line(line: &str) -> Result<Request> {
    let mut parts = line.split_whitespace();
    let (method, target, version) = match (parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(t), Some(v)) => (m, t, v),
        _ => return Err(Error::InvalidRequest(line.into())),
    };

    if !version.starts_with("HTTP/") || parts.next().is_some() {
        return Err(Error::InvalidRequest(line.into()));
    }

    Ok(Request {
        method: method.to_string(),
        target: target.to_string(),
    })
}

/// Build a complete response with a body and correct Content-Length
fn simple_response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    )
}

/// 200 response carrying the landing page
pub fn index_response() -> String {
    simple_response("200 OK", "text/html", INDEX_PAGE)
}

/// 404 for unknown targets
pub fn not_found_response() -> String {
    simple_response("404 Not Found", "text/plain", "not found\n")
}

/// 405 for anything that is not a GET
pub fn method_not_allowed_response() -> String {
    simple_response("405 Method Not Allowed", "text/plain", "only GET is supported\n")
}

/// 400 for request heads we refuse to parse
pub fn bad_request_response() -> String {
    simple_response("400 Bad Request", "text/plain", "bad request\n")
}
