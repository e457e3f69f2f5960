//! Decoded completion fragments
//!
//! A complete (non-streaming) answer carries its text at
//! `choices[0].message.content`; a streamed chunk carries a piece of it at
//! `choices[0].delta.content`. Which shape applies is fixed by the request
//! mode, so the two are separate variants rather than one type probing the
//! payload at runtime.

use crate::error::{ChatError, ChatResult};
use serde_json::Value;

/// One decoded unit of completion text
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionFragment {
    /// Full answer from a non-streaming call
    Message(Value),
    /// Incremental piece from a streaming call
    Delta(Value),
}

impl CompletionFragment {
    /// The fragment's text content
    ///
    /// Fails with [`ChatError::Schema`] when the field path is absent or not a
    /// string; a missing field is a malformed response, not an empty one.
    pub fn text(&self) -> ChatResult<&str> {
        let field = self.field();
        self.first_choice()
            .and_then(|choice| choice.get(field))
            .and_then(|inner| inner.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| ChatError::schema(format!("choices[0].{}.content", field)))
    }

    /// `finish_reason` of the first choice, when the server set one
    pub fn finish_reason(&self) -> Option<&str> {
        self.first_choice()
            .and_then(|choice| choice.get("finish_reason"))
            .and_then(Value::as_str)
    }

    /// The raw decoded JSON document
    pub fn payload(&self) -> &Value {
        match self {
            Self::Message(value) | Self::Delta(value) => value,
        }
    }

    /// Consume the fragment, returning the raw document
    pub fn into_payload(self) -> Value {
        match self {
            Self::Message(value) | Self::Delta(value) => value,
        }
    }

    /// Whether this fragment came from a streaming call
    pub fn is_delta(&self) -> bool {
        matches!(self, Self::Delta(_))
    }

    fn field(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Delta(_) => "delta",
        }
    }

    fn first_choice(&self) -> Option<&Value> {
        self.payload().get("choices")?.as_array()?.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_text() {
        let fragment = CompletionFragment::Message(
            json!({"choices":[{"message":{"role":"assistant","content":"foo content"}}]}),
        );
        assert_eq!(fragment.text().unwrap(), "foo content");
        assert!(!fragment.is_delta());
    }

    #[test]
    fn test_delta_text() {
        let fragment = CompletionFragment::Delta(
            json!({"choices":[{"index":0,"delta":{"content":"Hel"},"finish_reason":null}]}),
        );
        assert_eq!(fragment.text().unwrap(), "Hel");
        assert_eq!(fragment.finish_reason(), None);
    }

    #[test]
    fn test_shapes_do_not_cross() {
        let payload = json!({"choices":[{"message":{"content":"x"}}]});
        let err = CompletionFragment::Delta(payload).text().unwrap_err();
        assert!(
            matches!(err, ChatError::Schema { ref path } if path == "choices[0].delta.content")
        );
    }

    #[test]
    fn test_missing_and_null_content() {
        let empty_delta =
            CompletionFragment::Delta(json!({"choices":[{"delta":{},"finish_reason":"stop"}]}));
        assert!(matches!(empty_delta.text(), Err(ChatError::Schema { .. })));
        assert_eq!(empty_delta.finish_reason(), Some("stop"));

        let null_content =
            CompletionFragment::Message(json!({"choices":[{"message":{"content":null}}]}));
        assert!(matches!(null_content.text(), Err(ChatError::Schema { .. })));

        let no_choices = CompletionFragment::Message(json!({"choices":[]}));
        assert!(matches!(no_choices.text(), Err(ChatError::Schema { .. })));
    }

    #[test]
    fn test_empty_string_is_text() {
        let fragment =
            CompletionFragment::Delta(json!({"choices":[{"delta":{"role":"assistant","content":""}}]}));
        assert_eq!(fragment.text().unwrap(), "");
    }
}
