//! Request assembly from a conversation and the client configuration

use super::{CallKind, HttpRequest};
use crate::config::{ClientConfig, SecretString};
use crate::error::{ChatError, ChatResult};
use crate::protocol::{ChatRequest, ConversationEntry};

/// Builds request envelopes for one configured endpoint
///
/// Header values that never change for a client (host, authorization, user
/// agent) are resolved once at construction.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    host: String,
    authorization: SecretString,
    user_agent: String,
    temperature: f32,
}

impl RequestBuilder {
    /// Create a builder from a configuration
    pub fn new(config: &ClientConfig) -> ChatResult<Self> {
        let endpoint = config.endpoint()?;
        Ok(Self {
            host: endpoint.host_header(),
            authorization: SecretString::new(format!(
                "Bearer {}",
                config.api_key.expose_secret()
            )),
            user_agent: config.user_agent.clone(),
            temperature: config.temperature,
        })
    }

    /// Build a chat completion request
    ///
    /// Streaming requests additionally ask for `text/event-stream` and keep
    /// the connection open.
    pub fn chat(
        &self,
        messages: &[ConversationEntry],
        model: &str,
        stream: bool,
    ) -> ChatResult<HttpRequest> {
        let body = ChatRequest::new(model, messages, stream).with_temperature(self.temperature);
        let body = serde_json::to_vec(&body).map_err(ChatError::Encoding)?;

        let mut headers = self.base_headers();
        if stream {
            headers.push(("Accept".to_string(), "text/event-stream".to_string()));
            headers.push(("Connection".to_string(), "keep-alive".to_string()));
        }

        Ok(HttpRequest {
            method: CallKind::Chat.method(),
            path: CallKind::Chat.endpoint().to_string(),
            headers,
            body,
        })
    }

    /// Build a body-less request for a listing endpoint
    pub fn get(&self, kind: CallKind) -> HttpRequest {
        HttpRequest {
            method: kind.method(),
            path: kind.endpoint().to_string(),
            headers: self.base_headers(),
            body: Vec::new(),
        }
    }

    fn base_headers(&self) -> Vec<(String, String)> {
        vec![
            ("Host".to_string(), self.host.clone()),
            ("Content-Type".to_string(), "application/json".to_string()),
            (
                "Authorization".to_string(),
                self.authorization.expose_secret().to_string(),
            ),
            ("User-Agent".to_string(), self.user_agent.clone()),
        ]
    }
}
