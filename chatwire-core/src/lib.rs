//! Chatwire Core Library
//!
//! A client for chat-completion services spoken over a single TLS
//! connection. Requests are plain HTTP/1.1 written by hand; answers are
//! returned whole or decoded incrementally from an event stream.
//!
//! ```no_run
//! use chatwire_core::{ChatClient, ClientConfig, Conversation};
//!
//! # async fn run() -> chatwire_core::ChatResult<()> {
//! let config = ClientConfig::new("xai-...");
//! let model = config.model.clone();
//! let mut client = ChatClient::connect(config).await?;
//!
//! let mut log = Conversation::new();
//! log.push_user("hello");
//! client
//!     .chat_streaming(&mut log, &model, |text| print!("{}", text))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod protocol;
pub mod streaming;
pub mod transport;

pub use client::ChatClient;
pub use config::{ClientConfig, ConfigError, SecretString};
pub use error::{ChatError, ChatResult};
pub use protocol::{CompletionFragment, Conversation, ConversationEntry, Role};
pub use streaming::{DecoderState, FragmentDecoder, StreamEnd, StreamSummary};
pub use transport::{TlsTransport, Transport};

/// Returns the version of the Chatwire Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
