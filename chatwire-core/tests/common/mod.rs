//! Shared helpers for integration tests

#![allow(dead_code)]

use serde_json::json;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// In-memory stream that replays reads with fixed boundaries
///
/// Each scripted piece is returned by its own read call (or several, when
/// the caller's buffer is smaller). Once the script is exhausted every read
/// reports a clean close. Everything written is captured.
pub struct ScriptedStream {
    reads: VecDeque<Vec<u8>>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl ScriptedStream {
    pub fn new<I, B>(reads: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Self {
            reads: reads
                .into_iter()
                .map(|piece| piece.as_ref().to_vec())
                .filter(|piece| !piece.is_empty())
                .collect(),
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the bytes written so far
    pub fn written(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.written)
    }
}

impl AsyncRead for ScriptedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Some(front) = this.reads.front_mut() {
            let n = front.len().min(buf.remaining());
            buf.put_slice(&front[..n]);
            front.drain(..n);
            if front.is_empty() {
                this.reads.pop_front();
            }
        }
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for ScriptedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.written
            .lock()
            .expect("written buffer poisoned")
            .extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// One streamed event carrying `text` as its delta content
pub fn delta_event(text: &str) -> String {
    let payload = json!({
        "id": "chatcmpl-1",
        "object": "chat.completion.chunk",
        "choices": [{"index": 0, "delta": {"content": text}, "finish_reason": null}]
    });
    format!("data: {}\n\n", payload)
}

/// Closing event with a finish reason and no content
pub fn finish_event() -> String {
    let payload = json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]});
    format!("data: {}\n\n", payload)
}

pub const DONE_EVENT: &str = "data: [DONE]\n\n";

/// Event-stream body for `texts`, optionally ending in the sentinel
pub fn sse_body(texts: &[&str], with_done: bool) -> String {
    let mut body: String = texts.iter().map(|text| delta_event(text)).collect();
    if with_done {
        body.push_str(DONE_EVENT);
    }
    body
}

/// Response head for an event stream
pub fn stream_head(chunked: bool) -> String {
    let mut head = String::from("HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\n");
    if chunked {
        head.push_str("Transfer-Encoding: chunked\r\n");
    }
    head.push_str("\r\n");
    head
}

/// Wrap `body` in chunked coding, one chunk per event
pub fn chunk_events(body: &str) -> String {
    let mut out = String::new();
    for event in body.split_inclusive("\n\n") {
        out.push_str(&format!("{:x}\r\n{}\r\n", event.len(), event));
    }
    out.push_str("0\r\n\r\n");
    out
}

/// Like [`chunk_events`], with a terminator chunk after the first `after` events
///
/// Servers that keep the connection alive may send one mid-stream.
pub fn chunk_events_with_terminator(body: &str, after: usize) -> String {
    let mut out = String::new();
    for (i, event) in body.split_inclusive("\n\n").enumerate() {
        if i == after {
            out.push_str("0\r\n\r\n");
        }
        out.push_str(&format!("{:x}\r\n{}\r\n", event.len(), event));
    }
    out.push_str("0\r\n\r\n");
    out
}

/// Complete non-streaming JSON response
pub fn json_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        status,
        body.len(),
        body
    )
}

/// Cut `bytes` into pieces of the given sizes, cycling through them
pub fn split_by(bytes: &[u8], sizes: &[usize]) -> Vec<Vec<u8>> {
    let mut pieces = Vec::new();
    let mut rest = bytes;
    let mut i = 0;
    while !rest.is_empty() {
        let size = sizes.get(i % sizes.len().max(1)).copied().unwrap_or(rest.len()).max(1);
        let n = size.min(rest.len());
        pieces.push(rest[..n].to_vec());
        rest = &rest[n..];
        i += 1;
    }
    pieces
}
