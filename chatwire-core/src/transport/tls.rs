//! TLS transport over a TCP socket

use super::Transport;
use crate::config::{ClientConfig, ConfigError};
use crate::error::ChatResult;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_native_tls::TlsStream;
use tracing::debug;

const PEM_BEGIN: &[u8] = b"-----BEGIN CERTIFICATE-----";
const PEM_END: &[u8] = b"-----END CERTIFICATE-----";

/// Encrypted connection to the service
///
/// Peer verification uses the platform trust store plus any certificates
/// from `ClientConfig::ca_file`. SNI is the configured host.
pub struct TlsTransport {
    stream: TlsStream<TcpStream>,
    peer: String,
}

impl TlsTransport {
    /// Connect and complete the TLS handshake
    pub async fn connect(config: &ClientConfig) -> ChatResult<Self> {
        let endpoint = config.endpoint()?;

        let mut builder = native_tls::TlsConnector::builder();
        if let Some(path) = &config.ca_file {
            for pem in load_ca_bundle(path).await? {
                builder.add_root_certificate(native_tls::Certificate::from_pem(&pem)?);
            }
        }
        let connector = tokio_native_tls::TlsConnector::from(builder.build()?);

        debug!("Connecting to {}:{}", endpoint.host, endpoint.port);
        let tcp = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;
        tcp.set_nodelay(true)?;

        let stream = connector.connect(&endpoint.host, tcp).await?;
        debug!("TLS handshake complete with {}", endpoint.host);

        Ok(Self {
            stream,
            peer: format!("{}:{}", endpoint.host, endpoint.port),
        })
    }

    /// `host:port` this transport is connected to
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

impl std::fmt::Debug for TlsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsTransport")
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for TlsTransport {
    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        AsyncWriteExt::write_all(&mut self.stream, bytes).await?;
        AsyncWriteExt::flush(&mut self.stream).await
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        AsyncReadExt::read(&mut self.stream, buf).await
    }
}

async fn load_ca_bundle(path: &Path) -> Result<Vec<Vec<u8>>, ConfigError> {
    let bundle = tokio::fs::read(path)
        .await
        .map_err(|e| ConfigError::IoError {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

    let certs: Vec<Vec<u8>> = split_pem(&bundle).into_iter().map(<[u8]>::to_vec).collect();
    if certs.is_empty() {
        return Err(ConfigError::Invalid {
            message: format!("no PEM certificates found in '{}'", path.display()),
        });
    }
    Ok(certs)
}

/// Split a PEM bundle into individual certificate blocks
fn split_pem(bundle: &[u8]) -> Vec<&[u8]> {
    let mut certs = Vec::new();
    let mut rest = bundle;

    while let Some(start) = crate::http::find_subslice(rest, PEM_BEGIN) {
        let Some(end) = crate::http::find_subslice(&rest[start..], PEM_END) else {
            break;
        };
        let end = start + end + PEM_END.len();
        certs.push(&rest[start..end]);
        rest = &rest[end..];
    }

    certs
}
