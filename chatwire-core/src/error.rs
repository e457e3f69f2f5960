//! Error taxonomy for chat-completion calls
//!
//! Every failure surfaces to the caller of the client facade as a
//! [`ChatError`]. A clean end of stream (the `[DONE]` sentinel or a peer
//! close) is not an error and never appears here.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors raised while building, sending or decoding a chat call
#[derive(Debug, Error)]
pub enum ChatError {
    /// Connect, read or write failure on the underlying socket
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// TLS context setup or handshake failure
    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    /// An SSE payload could not be delimited or parsed while streaming
    #[error("malformed stream payload: {message}")]
    Framing { message: String },

    /// A well-formed JSON document lacks the expected field path
    #[error("missing field `{path}` in response")]
    Schema { path: String },

    /// The HTTP status line, header block or chunk framing is malformed
    #[error("malformed HTTP response: {message}")]
    Http { message: String },

    /// The server answered with a non-success status
    #[error("server returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The server reported an error object inside an open event stream
    #[error("server error in stream: {message}")]
    Server { message: String },

    /// The request body could not be serialized
    #[error("failed to encode request: {0}")]
    Encoding(#[source] serde_json::Error),

    /// A non-streaming response body is not valid JSON
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The client configuration is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ChatError {
    /// Create a framing error
    pub fn framing(message: impl Into<String>) -> Self {
        Self::Framing {
            message: message.into(),
        }
    }

    /// Create a schema error for a missing field path
    pub fn schema(path: impl Into<String>) -> Self {
        Self::Schema { path: path.into() }
    }

    /// Create an HTTP framing error
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }

    /// Whether the error came from the socket or TLS layer
    ///
    /// After a transport failure the connection is in an unknown state and
    /// the owning client should be discarded.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Tls(_))
    }
}

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;
