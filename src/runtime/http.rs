//! Minimal HTTP/1.1 request parsing and response writing
//!
//! Enough for the local runtime: one request per connection, bodies sized by
//! Content-Length, responses always sent with `Connection: close`.

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest accepted request head (request line plus headers)
pub const MAX_HEAD_SIZE: usize = 16 * 1024;

/// Largest accepted request body
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Malformed request: {0}")]
    Malformed(String),

    #[error("Invalid Content-Length")]
    InvalidContentLength,

    #[error("Request body too large: {0} bytes")]
    BodyTooLarge(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    /// Request target without the query string
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// Header value, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Read one request. Returns `Ok(None)` if the peer closed before sending one.
pub async fn read_request<R>(reader: &mut R) -> Result<Option<Request>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut head_size = 0;

    let Some(line) = read_head_line(reader, &mut head_size).await? else {
        return Ok(None);
    };

    let mut parts = line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| HttpError::Malformed("empty request line".to_string()))?
        .to_string();
    let target = parts
        .next()
        .ok_or_else(|| HttpError::Malformed("missing request target".to_string()))?;
    let path = target.split('?').next().unwrap_or(target).to_string();

    let mut headers = Vec::new();
    loop {
        let header_line = read_head_line(reader, &mut head_size)
            .await?
            .ok_or_else(|| HttpError::Malformed("unexpected end of headers".to_string()))?;

        let header_line = header_line.trim_end_matches(['\r', '\n']);
        if header_line.is_empty() {
            break;
        }
        let (name, value) = header_line
            .split_once(':')
            .ok_or_else(|| HttpError::Malformed(format!("bad header line '{}'", header_line)))?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    let mut request = Request {
        method,
        path,
        headers,
        body: Vec::new(),
    };

    let length = match request.header("Content-Length") {
        Some(raw) => raw.parse::<usize>().map_err(|_| HttpError::InvalidContentLength)?,
        None => 0,
    };
    if length > MAX_BODY_SIZE {
        return Err(HttpError::BodyTooLarge(length));
    }

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    request.body = body;

    Ok(Some(request))
}

/// Read one head line without letting the whole head exceed `MAX_HEAD_SIZE`
///
/// Returns `Ok(None)` at end of stream.
async fn read_head_line<R>(reader: &mut R, head_size: &mut usize) -> Result<Option<String>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let budget = MAX_HEAD_SIZE - *head_size;
    if budget == 0 {
        return Err(HttpError::Malformed("request head too large".to_string()));
    }

    let mut raw = Vec::new();
    let n = (&mut *reader).take(budget as u64).read_until(b'\n', &mut raw).await?;
    *head_size += n;
    if n == 0 {
        return Ok(None);
    }
    if n == budget && !raw.ends_with(b"\n") {
        return Err(HttpError::Malformed("request head too large".to_string()));
    }

    String::from_utf8(raw)
        .map(Some)
        .map_err(|_| HttpError::Malformed("request head is not valid UTF-8".to_string()))
}

/// A response ready to be written
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    pub fn json<T: Serialize>(status: u16, payload: &T) -> Self {
        let body = serde_json::to_vec(payload).unwrap_or_else(|_| b"{}".to_vec());
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.as_bytes().to_vec(),
        }
    }

    /// JSON `{"error": message}` with the given status
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, &serde_json::json!({ "error": message.into() }))
    }

    /// Parse the body back as JSON (used in tests and logging)
    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Write `response` and flush
pub async fn write_response<W>(writer: &mut W, response: &Response) -> Result<(), HttpError>
where
    W: AsyncWrite + Unpin,
{
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason_phrase(response.status),
        response.content_type,
        response.body.len()
    );
    writer.write_all(head.as_bytes()).await?;
    writer.write_all(&response.body).await?;
    writer.flush().await?;
    Ok(())
}
