//! Status code and error body mapping

use crate::error::ChatError;
use serde_json::Value;
use uuid::Uuid;

/// Longest raw body echoed into an error message
const MAX_ECHOED_BODY: usize = 512;

/// Map a non-success status and its body to [`ChatError::Status`]
///
/// The message prefers a structured error document in the body, then the raw
/// body text, then the reason phrase from the status line.
pub fn map_status_error(status: u16, reason: &str, body: &[u8], request_id: Uuid) -> ChatError {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();

    let message = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| extract_error_message(&v))
        .or_else(|| (!text.is_empty()).then(|| truncate(text, MAX_ECHOED_BODY)))
        .or_else(|| (!reason.is_empty()).then(|| reason.to_string()))
        .unwrap_or_else(|| format!("HTTP error {}", status));

    ChatError::Status {
        status,
        message: format!("{} [request_id: {}]", message, request_id),
    }
}

/// Extract a message from a JSON error document
///
/// Recognizes `{"error": {"message": ..}}`, `{"error": ".."}` and
/// `{"message": ..}`.
pub fn extract_error_message(json: &Value) -> Option<String> {
    if let Some(error) = json.get("error") {
        if let Some(message) = error.get("message").and_then(Value::as_str) {
            return Some(message.to_string());
        }
        if let Some(message) = error.as_str() {
            return Some(message.to_string());
        }
    }

    json.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
