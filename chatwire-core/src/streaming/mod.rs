//! Streaming response decoding
//!
//! A streamed chat answer arrives as an HTTP response whose body carries
//! `data: <json>` event lines, optionally inside chunked transfer coding,
//! and ends with `data: [DONE]` or a close by the peer. [`FragmentDecoder`]
//! turns those bytes into [`CompletionFragment`](crate::protocol::CompletionFragment)s
//! regardless of where the reads split them.

pub mod decoder;

pub use decoder::{DecoderState, FragmentDecoder, DONE_SENTINEL, EVENT_MARKER};

/// How a completed stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The server sent the `[DONE]` sentinel
    Sentinel,
    /// The connection closed first
    PeerClosed,
}

/// Outcome of a streaming call that ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub end: StreamEnd,
    /// Fragments delivered to the callback
    pub fragments: usize,
}
