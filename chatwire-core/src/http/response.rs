//! Response head parsing and the full-body reader

use super::chunked::ChunkDecoder;
use super::find_subslice;
use crate::error::{ChatError, ChatResult};
use crate::transport::Transport;
use tracing::{debug, trace};

/// Largest status line plus header block accepted
pub const MAX_HEAD_LEN: usize = 64 * 1024;

const STATUS_PREFIX: &[u8] = b"HTTP/";
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Parsed status line and headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    /// Protocol version, e.g. `HTTP/1.1`
    pub version: String,
    pub status: u16,
    /// Reason phrase; may be empty
    pub reason: String,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Parse a head block, without its terminating blank line
    pub fn parse(block: &[u8]) -> ChatResult<Self> {
        let text = String::from_utf8_lossy(block);
        let mut lines = text.split("\r\n");

        let status_line = lines.next().unwrap_or_default();
        let mut parts = status_line.splitn(3, ' ');

        let version = parts.next().unwrap_or_default();
        if !version.starts_with("HTTP/1.") {
            return Err(ChatError::http(format!(
                "unexpected status line '{}'",
                status_line
            )));
        }

        let status = parts
            .next()
            .and_then(|code| code.parse::<u16>().ok())
            .filter(|code| (100..1000).contains(code))
            .ok_or_else(|| ChatError::http(format!("invalid status code in '{}'", status_line)))?;
        let reason = parts.next().unwrap_or_default().trim().to_string();

        let mut headers = Vec::new();
        for line in lines.filter(|line| !line.is_empty()) {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ChatError::http(format!("malformed header line '{}'", line)))?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        Ok(Self {
            version: version.to_string(),
            status,
            reason,
            headers,
        })
    }

    /// Look up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Declared body length, if any
    pub fn content_length(&self) -> ChatResult<Option<usize>> {
        self.header("Content-Length")
            .map(|value| {
                value
                    .parse::<usize>()
                    .map_err(|_| ChatError::http(format!("invalid Content-Length '{}'", value)))
            })
            .transpose()
    }

    /// Whether the body uses chunked transfer coding
    pub fn is_chunked(&self) -> bool {
        self.header("Transfer-Encoding")
            .and_then(|value| value.rsplit(',').next())
            .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether this status never carries a body
    pub(crate) fn is_bodyless(&self) -> bool {
        self.status < 200 || self.status == 204 || self.status == 304
    }
}

/// A response read to the end of its body
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub head: ResponseHead,
    pub body: Vec<u8>,
}

/// Read one complete response from `transport`
///
/// Bytes before the first `HTTP/` are skipped. The body is delimited by
/// chunked coding, then `Content-Length`, then connection close.
pub async fn read_response<T>(transport: &mut T, read_size: usize) -> ChatResult<HttpResponse>
where
    T: Transport + ?Sized,
{
    let mut buf = vec![0u8; read_size.max(1)];
    let mut pending: Vec<u8> = Vec::new();

    let head_end = loop {
        match find_subslice(&pending, STATUS_PREFIX) {
            Some(0) => {}
            Some(start) => {
                trace!("Skipping {} bytes before status line", start);
                pending.drain(..start);
            }
            None => {
                // Keep a tail that may be the start of a split status prefix
                let keep = pending.len().min(STATUS_PREFIX.len() - 1);
                pending.drain(..pending.len() - keep);
            }
        }

        if pending.starts_with(STATUS_PREFIX) {
            if let Some(end) = find_subslice(&pending, HEAD_TERMINATOR) {
                break end;
            }
            if pending.len() > MAX_HEAD_LEN {
                return Err(ChatError::http("response head too large"));
            }
        }

        let n = transport.read(&mut buf).await?;
        if n == 0 {
            return Err(ChatError::http("connection closed before response head"));
        }
        pending.extend_from_slice(&buf[..n]);
    };

    let head = ResponseHead::parse(&pending[..head_end])?;
    let mut body = pending.split_off(head_end + HEAD_TERMINATOR.len());
    debug!("Response status {} {}", head.status, head.reason);

    if head.is_bodyless() {
        body.clear();
    } else if head.is_chunked() {
        let mut decoder = ChunkDecoder::new();
        let mut decoded = Vec::new();
        let mut finished = decoder.feed(&body, &mut decoded)?;
        while !finished {
            let n = transport.read(&mut buf).await?;
            if n == 0 {
                return Err(ChatError::http("connection closed inside chunked body"));
            }
            finished = decoder.feed(&buf[..n], &mut decoded)?;
        }
        body = decoded;
    } else if let Some(length) = head.content_length()? {
        while body.len() < length {
            let n = transport.read(&mut buf).await?;
            if n == 0 {
                return Err(ChatError::http(format!(
                    "connection closed after {} of {} body bytes",
                    body.len(),
                    length
                )));
            }
            body.extend_from_slice(&buf[..n]);
        }
        body.truncate(length);
    } else {
        loop {
            let n = transport.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&buf[..n]);
        }
    }

    trace!("Read {} body bytes", body.len());
    Ok(HttpResponse { head, body })
}
