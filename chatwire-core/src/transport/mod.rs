//! Byte transport seam between the client and the network
//!
//! The client only needs two operations from a connection: write a request
//! in full and read whatever bytes are available. Any tokio stream offers
//! both, so tests can substitute in-memory streams for the TLS socket.

pub mod tls;

pub use tls::TlsTransport;

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A connected, handshake-complete byte stream
///
/// `read` returns `Ok(0)` on a clean close by the peer. There is no timeout
/// at this layer; callers wanting a deadline wrap the whole call.
#[async_trait]
pub trait Transport: Send {
    /// Write all of `bytes` and flush
    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read available bytes into `buf`, returning the count
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

#[async_trait]
impl<S> Transport for S
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        AsyncWriteExt::write_all(self, bytes).await?;
        AsyncWriteExt::flush(self).await
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        AsyncReadExt::read(self, buf).await
    }
}
