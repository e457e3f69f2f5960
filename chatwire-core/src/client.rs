//! Client facade for chat completions over one connection
//!
//! A [`ChatClient`] owns its transport exclusively. Calls take `&mut self`,
//! so only one request can be in flight at a time and the decoder state of
//! a streaming call is never shared.

use crate::config::{ClientConfig, ConfigError, ConfigValidator};
use crate::error::{ChatError, ChatResult};
use crate::http::error::map_status_error;
use crate::http::{read_response, CallKind, HttpRequest, HttpResponse, RequestBuilder};
use crate::protocol::{CompletionFragment, Conversation, LanguageModelList, ModelList};
use crate::streaming::{DecoderState, FragmentDecoder, StreamEnd, StreamSummary};
use crate::transport::{TlsTransport, Transport};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Chat-completion client bound to a single connection
pub struct ChatClient<T = TlsTransport> {
    config: ClientConfig,
    requests: RequestBuilder,
    transport: T,
}

impl ChatClient<TlsTransport> {
    /// Validate `config`, then open a TLS connection to its endpoint
    pub async fn connect(config: ClientConfig) -> ChatResult<Self> {
        ConfigValidator::new()
            .validate(&config)
            .map_err(ConfigError::from)?;

        let transport = TlsTransport::connect(&config).await?;
        info!("Connected to {}", transport.peer());
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> ChatClient<T> {
    /// Create a client over an already connected transport
    pub fn with_transport(config: ClientConfig, transport: T) -> ChatResult<Self> {
        ConfigValidator::new()
            .validate(&config)
            .map_err(ConfigError::from)?;

        let requests = RequestBuilder::new(&config)?;
        Ok(Self {
            config,
            requests,
            transport,
        })
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Release the underlying transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send the log as a non-streaming request and return the answer
    pub async fn complete_once(
        &mut self,
        log: &Conversation,
        model: &str,
    ) -> ChatResult<CompletionFragment> {
        let request_id = Uuid::new_v4();
        info!(
            "Starting completion with {} messages, model {} [request_id: {}]",
            log.len(),
            model,
            request_id
        );

        let request = self.requests.chat(log.entries(), model, false)?;
        let response = self.execute(&request, request_id).await?;
        let payload: Value = serde_json::from_slice(&response.body).map_err(ChatError::Decode)?;

        info!("Completion finished [request_id: {}]", request_id);
        Ok(CompletionFragment::Message(payload))
    }

    /// Send the log as a streaming request, handing each fragment to
    /// `on_fragment` as soon as it is decoded
    ///
    /// Returns once the stream ends with the sentinel or a close by the
    /// peer. An error from `on_fragment` aborts the call.
    pub async fn complete_streaming<F>(
        &mut self,
        log: &Conversation,
        model: &str,
        mut on_fragment: F,
    ) -> ChatResult<StreamSummary>
    where
        F: FnMut(CompletionFragment) -> ChatResult<()>,
    {
        let request_id = Uuid::new_v4();
        info!(
            "Starting streaming completion with {} messages, model {} [request_id: {}]",
            log.len(),
            model,
            request_id
        );

        let request = self.requests.chat(log.entries(), model, true)?;
        self.transport.write_all(&request.to_bytes()).await?;

        let mut decoder = FragmentDecoder::with_request_id(request_id);
        let mut buf = vec![0u8; self.config.read_buffer_size];

        loop {
            let n = match self.transport.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    decoder.fail();
                    warn!("Stream read failed: {} [request_id: {}]", e, request_id);
                    return Err(e.into());
                }
            };

            let result = if n == 0 {
                decoder.close()
            } else {
                decoder.feed(&buf[..n], &mut on_fragment)
            };
            let state = result
                .inspect_err(|e| warn!("Stream aborted: {} [request_id: {}]", e, request_id))?;

            let end = match state {
                DecoderState::Done => StreamEnd::Sentinel,
                DecoderState::ClosedByPeer => StreamEnd::PeerClosed,
                _ => continue,
            };

            info!(
                "Stream ended by {:?} after {} fragments [request_id: {}]",
                end,
                decoder.emitted(),
                request_id
            );
            return Ok(StreamSummary {
                end,
                fragments: decoder.emitted(),
            });
        }
    }

    /// Non-streaming exchange that records the answer in the log
    pub async fn chat(&mut self, log: &mut Conversation, model: &str) -> ChatResult<String> {
        let fragment = self.complete_once(log, model).await?;
        let text = fragment.text()?.to_string();
        log.push_assistant(text.clone());
        Ok(text)
    }

    /// Streaming exchange that forwards each piece of text to `on_text` and
    /// records the concatenated answer in the log
    ///
    /// A closing fragment that carries a `finish_reason` but no content is
    /// accepted as empty.
    pub async fn chat_streaming<F>(
        &mut self,
        log: &mut Conversation,
        model: &str,
        mut on_text: F,
    ) -> ChatResult<String>
    where
        F: FnMut(&str),
    {
        let mut answer = String::new();
        self.complete_streaming(log, model, |fragment| match fragment.text() {
            Ok(text) => {
                on_text(text);
                answer.push_str(text);
                Ok(())
            }
            Err(_) if fragment.finish_reason().is_some() => Ok(()),
            Err(e) => Err(e),
        })
        .await?;

        log.push_assistant(answer.clone());
        Ok(answer)
    }

    /// Ids of all models available to the key
    pub async fn list_models(&mut self) -> ChatResult<Vec<String>> {
        let list: ModelList = self.get_json(CallKind::Models).await?;
        Ok(list.ids().map(str::to_string).collect())
    }

    /// Ids of the language models available to the key
    pub async fn list_language_models(&mut self) -> ChatResult<Vec<String>> {
        let list: LanguageModelList = self.get_json(CallKind::LanguageModels).await?;
        Ok(list.ids().map(str::to_string).collect())
    }

    async fn get_json<D: DeserializeOwned>(&mut self, kind: CallKind) -> ChatResult<D> {
        let request_id = Uuid::new_v4();
        info!("Fetching {} [request_id: {}]", kind.endpoint(), request_id);

        let request = self.requests.get(kind);
        let response = self.execute(&request, request_id).await?;
        serde_json::from_slice(&response.body).map_err(ChatError::Decode)
    }

    /// Write a request and read its complete response
    async fn execute(&mut self, request: &HttpRequest, request_id: Uuid) -> ChatResult<HttpResponse> {
        debug!(
            "{} {} [request_id: {}]",
            request.method.as_str(),
            request.path,
            request_id
        );
        self.transport.write_all(&request.to_bytes()).await?;

        let response = read_response(&mut self.transport, self.config.read_buffer_size).await?;
        if !response.head.is_success() {
            warn!(
                "Request failed with status {} [request_id: {}]",
                response.head.status, request_id
            );
            return Err(map_status_error(
                response.head.status,
                &response.head.reason,
                &response.body,
                request_id,
            ));
        }

        debug!(
            "Received {} body bytes [request_id: {}]",
            response.body.len(),
            request_id
        );
        Ok(response)
    }
}

impl<T> std::fmt::Debug for ChatClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
