//! HTTP/1.1 layer spoken directly over the transport
//!
//! This module implements just enough HTTP for the client:
//! - Request envelopes and their wire serialization
//! - Response head parsing and body delimitation
//! - Incremental chunked-transfer decoding
//! - Status code to error mapping

pub mod chunked;
pub mod error;
pub mod request;
pub mod response;

pub use chunked::ChunkDecoder;
pub use request::RequestBuilder;
pub use response::{read_response, HttpResponse, ResponseHead};

use std::fmt;

/// Request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Method token as written on the request line
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Type of API call being made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Chat completion, streaming or not
    Chat,
    /// Model listing
    Models,
    /// Language model listing
    LanguageModels,
}

impl CallKind {
    /// Get the endpoint path for this call kind
    pub fn endpoint(&self) -> &'static str {
        match self {
            CallKind::Chat => "/v1/chat/completions",
            CallKind::Models => "/v1/models",
            CallKind::LanguageModels => "/v1/language-models",
        }
    }

    /// Get the method used for this call kind
    pub fn method(&self) -> Method {
        match self {
            CallKind::Chat => Method::Post,
            CallKind::Models | CallKind::LanguageModels => Method::Get,
        }
    }
}

/// A fully assembled request, ready to be written to the transport
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Serialize to HTTP/1.1 wire bytes
    ///
    /// `Content-Length` is always derived from the body for POST requests.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(256 + self.body.len());
        out.extend_from_slice(self.method.as_str().as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.path.as_bytes());
        out.extend_from_slice(b" HTTP/1.1\r\n");

        for (key, value) in &self.headers {
            out.extend_from_slice(key.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }

        if self.method == Method::Post || !self.body.is_empty() {
            out.extend_from_slice(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        }

        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(key, value)| {
                if key.eq_ignore_ascii_case("authorization") {
                    (key.as_str(), "[REDACTED]")
                } else {
                    (key.as_str(), value.as_str())
                }
            })
            .collect();

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Position of the first occurrence of `needle` in `haystack`
pub(crate) fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_subslice() {
        assert_eq!(find_subslice(b"abc\r\n\r\ndef", b"\r\n\r\n"), Some(3));
        assert_eq!(find_subslice(b"abc", b"abcd"), None);
        assert_eq!(find_subslice(b"abc", b""), None);
    }

    #[test]
    fn test_get_has_no_content_length() {
        let request = HttpRequest {
            method: Method::Get,
            path: "/v1/models".to_string(),
            headers: vec![("Host".to_string(), "api.x.ai".to_string())],
            body: Vec::new(),
        };
        assert_eq!(
            request.to_bytes(),
            b"GET /v1/models HTTP/1.1\r\nHost: api.x.ai\r\n\r\n".to_vec()
        );
    }

    #[test]
    fn test_debug_redacts_authorization() {
        let request = HttpRequest {
            method: Method::Post,
            path: "/v1/chat/completions".to_string(),
            headers: vec![("Authorization".to_string(), "Bearer secret".to_string())],
            body: b"{}".to_vec(),
        };
        let debug = format!("{:?}", request);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_call_kinds() {
        assert_eq!(CallKind::Chat.method(), Method::Post);
        assert_eq!(CallKind::Models.endpoint(), "/v1/models");
        assert_eq!(CallKind::LanguageModels.endpoint(), "/v1/language-models");
    }
}
