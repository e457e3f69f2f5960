//! Fragment decoder state machine for event-stream responses

use crate::error::{ChatError, ChatResult};
use crate::http::error::{extract_error_message, map_status_error};
use crate::http::response::MAX_HEAD_LEN;
use crate::http::{find_subslice, ChunkDecoder, ResponseHead};
use crate::protocol::CompletionFragment;
use serde_json::Value;
use tracing::{debug, trace};
use uuid::Uuid;

/// Prefix of every event payload line
pub const EVENT_MARKER: &[u8] = b"data: ";

/// Payload that ends the stream
pub const DONE_SENTINEL: &[u8] = b"[DONE]";

const STATUS_PREFIX: &[u8] = b"HTTP/";
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Most error body bytes collected before failing the call
const MAX_ERROR_BODY: usize = 64 * 1024;

/// Where a streaming call is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Reading the response head, or the error body of a non-2xx response
    AwaitingHeaders,
    /// Scanning the body for events; the only state that emits
    StreamingEvents,
    /// The `[DONE]` sentinel was observed
    Done,
    /// The peer closed the connection before the sentinel
    ClosedByPeer,
    /// A parse, status or transport error ended the call
    Failed,
}

impl DecoderState {
    /// Whether no further input will be accepted
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::ClosedByPeer | Self::Failed)
    }
}

/// Turns arbitrarily split response bytes into ordered completion fragments
///
/// Bytes are fed as they arrive from the transport. The decoder keeps any
/// unconsumed tail between calls, so an event split across reads is emitted
/// once its terminating newline arrives and never before.
///
/// The response head is located by its `HTTP/` prefix and skipped. When it
/// announces chunked coding, chunk framing is stripped before scanning;
/// zero-size terminator chunks are consumed without ending the stream.
/// A non-2xx head makes the decoder collect the error body instead, and the
/// call fails with [`ChatError::Status`] once that body is complete.
#[derive(Debug)]
pub struct FragmentDecoder {
    state: DecoderState,
    buffer: Vec<u8>,
    chunks: Option<ChunkDecoder>,
    error_body: Option<ErrorBody>,
    request_id: Uuid,
    emitted: usize,
}

impl Default for FragmentDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentDecoder {
    pub fn new() -> Self {
        Self::with_request_id(Uuid::nil())
    }

    /// A decoder whose status errors name `request_id`
    pub fn with_request_id(request_id: Uuid) -> Self {
        Self {
            state: DecoderState::AwaitingHeaders,
            buffer: Vec::new(),
            chunks: None,
            error_body: None,
            request_id,
            emitted: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Number of fragments handed to the callback so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Bytes held back waiting for more input
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one read's worth of bytes
    ///
    /// Every complete event in the buffer is parsed and passed to
    /// `on_fragment` in wire order before this returns. An error from the
    /// callback aborts decoding. Once terminal, input is ignored.
    pub fn feed<F>(&mut self, bytes: &[u8], on_fragment: &mut F) -> ChatResult<DecoderState>
    where
        F: FnMut(CompletionFragment) -> ChatResult<()>,
    {
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        match self.step(bytes, on_fragment) {
            Ok(()) => Ok(self.state),
            Err(err) => {
                self.fail();
                Err(err)
            }
        }
    }

    /// Record a clean close by the peer
    ///
    /// An incomplete trailing event is dropped, not emitted. A close while an
    /// error body is still being read fails with whatever body arrived.
    pub fn close(&mut self) -> ChatResult<DecoderState> {
        if let Some(error_body) = self.error_body.take() {
            self.fail();
            return Err(error_body.into_error(self.request_id));
        }

        if !self.state.is_terminal() {
            if !self.buffer.is_empty() {
                debug!("Peer closed with {} undelimited bytes", self.buffer.len());
            }
            self.buffer.clear();
            self.state = DecoderState::ClosedByPeer;
        }
        Ok(self.state)
    }

    /// Record a failure outside the decoder, e.g. a transport error
    pub fn fail(&mut self) {
        self.buffer.clear();
        self.error_body = None;
        self.state = DecoderState::Failed;
    }

    fn step<F>(&mut self, bytes: &[u8], on_fragment: &mut F) -> ChatResult<()>
    where
        F: FnMut(CompletionFragment) -> ChatResult<()>,
    {
        if let Some(mut error_body) = self.error_body.take() {
            if error_body.push(bytes)? {
                return Err(error_body.into_error(self.request_id));
            }
            self.error_body = Some(error_body);
            return Ok(());
        }

        if self.state == DecoderState::AwaitingHeaders {
            self.buffer.extend_from_slice(bytes);
            let Some(body) = self.take_head()? else {
                return Ok(());
            };
            self.state = DecoderState::StreamingEvents;
            debug!("Response head consumed, streaming events");
            return self.push_body(&body, on_fragment);
        }

        self.push_body(bytes, on_fragment)
    }

    /// Split the response head off the buffer once it is complete
    ///
    /// Returns the bytes that follow it. A buffer that reaches an event
    /// marker before any status line is treated as a headerless body.
    fn take_head(&mut self) -> ChatResult<Option<Vec<u8>>> {
        let status_at = find_subslice(&self.buffer, STATUS_PREFIX);
        let event_at = find_subslice(&self.buffer, EVENT_MARKER);

        let headerless = match (status_at, event_at) {
            (Some(start), Some(event)) => event < start,
            (None, Some(_)) => true,
            (_, None) => false,
        };
        if headerless {
            return Ok(Some(std::mem::take(&mut self.buffer)));
        }

        let Some(start) = status_at else {
            if self.buffer.len() > MAX_HEAD_LEN {
                return Err(ChatError::http("no response head within 64 KiB"));
            }
            return Ok(None);
        };

        let Some(len) = find_subslice(&self.buffer[start..], HEAD_TERMINATOR) else {
            if self.buffer.len() - start > MAX_HEAD_LEN {
                return Err(ChatError::http("response head too large"));
            }
            return Ok(None);
        };

        let head = ResponseHead::parse(&self.buffer[start..start + len])?;
        let body = self.buffer.split_off(start + len + HEAD_TERMINATOR.len());
        self.buffer.clear();

        if !head.is_success() {
            debug!("Status {} {}, reading error body", head.status, head.reason);
            let mut error_body = ErrorBody::new(head)?;
            if error_body.push(&body)? {
                return Err(error_body.into_error(self.request_id));
            }
            self.error_body = Some(error_body);
            return Ok(None);
        }

        if head.is_chunked() {
            self.chunks = Some(ChunkDecoder::rearming());
        }
        Ok(Some(body))
    }

    fn push_body<F>(&mut self, bytes: &[u8], on_fragment: &mut F) -> ChatResult<()>
    where
        F: FnMut(CompletionFragment) -> ChatResult<()>,
    {
        match &mut self.chunks {
            Some(chunks) => {
                chunks.feed(bytes, &mut self.buffer)?;
            }
            None => self.buffer.extend_from_slice(bytes),
        }

        self.scan(on_fragment)
    }

    fn scan<F>(&mut self, on_fragment: &mut F) -> ChatResult<()>
    where
        F: FnMut(CompletionFragment) -> ChatResult<()>,
    {
        loop {
            let Some(start) = find_subslice(&self.buffer, EVENT_MARKER) else {
                let keep = partial_marker_len(&self.buffer);
                let discard = self.buffer.len() - keep;
                self.buffer.drain(..discard);
                return Ok(());
            };

            let payload_start = start + EVENT_MARKER.len();
            let Some(newline) = self.buffer[payload_start..].iter().position(|&b| b == b'\n')
            else {
                self.buffer.drain(..start);
                return Ok(());
            };

            let payload = trim_cr(&self.buffer[payload_start..payload_start + newline]);
            if payload.trim_ascii() == DONE_SENTINEL {
                debug!("Stream sentinel after {} fragments", self.emitted);
                self.buffer.clear();
                self.state = DecoderState::Done;
                return Ok(());
            }

            let value: Value = serde_json::from_slice(payload).map_err(|e| {
                ChatError::framing(format!(
                    "{} in payload '{}'",
                    e,
                    String::from_utf8_lossy(payload)
                ))
            })?;
            self.buffer.drain(..payload_start + newline + 1);

            if let Some(message) = stream_error(&value) {
                return Err(ChatError::Server { message });
            }

            self.emitted += 1;
            trace!("Emitting fragment {}", self.emitted);
            on_fragment(CompletionFragment::Delta(value))?;
        }
    }
}

/// Body of a non-2xx response, read until its framing says it is complete
#[derive(Debug)]
struct ErrorBody {
    head: ResponseHead,
    body: Vec<u8>,
    chunks: Option<ChunkDecoder>,
    length: Option<usize>,
}

impl ErrorBody {
    fn new(head: ResponseHead) -> ChatResult<Self> {
        let (chunks, length) = if head.is_bodyless() {
            (None, Some(0))
        } else if head.is_chunked() {
            (Some(ChunkDecoder::new()), None)
        } else {
            (None, head.content_length()?)
        };

        Ok(Self {
            head,
            body: Vec::new(),
            chunks,
            length,
        })
    }

    /// Append body bytes; returns whether the body is complete
    fn push(&mut self, bytes: &[u8]) -> ChatResult<bool> {
        let complete = match &mut self.chunks {
            Some(chunks) => chunks.feed(bytes, &mut self.body)?,
            None => {
                self.body.extend_from_slice(bytes);
                self.length.is_some_and(|length| self.body.len() >= length)
            }
        };
        Ok(complete || self.body.len() > MAX_ERROR_BODY)
    }

    fn into_error(mut self, request_id: Uuid) -> ChatError {
        if let Some(length) = self.length {
            self.body.truncate(length);
        }
        map_status_error(self.head.status, &self.head.reason, &self.body, request_id)
    }
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Length of the longest buffer suffix that could begin an event marker
fn partial_marker_len(buffer: &[u8]) -> usize {
    let max = buffer.len().min(EVENT_MARKER.len() - 1);
    (1..=max)
        .rev()
        .find(|&len| EVENT_MARKER.starts_with(&buffer[buffer.len() - len..]))
        .unwrap_or(0)
}

/// Message of an in-stream `{"error": ..}` object
fn stream_error(value: &Value) -> Option<String> {
    let error = value.get("error").filter(|error| !error.is_null())?;
    Some(extract_error_message(value).unwrap_or_else(|| error.to_string()))
}
