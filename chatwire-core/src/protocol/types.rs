//! Wire types for chat-completion calls
//!
//! The request body mirrors what the service expects field for field, in
//! field order: `{model, stream, temperature, messages}`.

use serde::{Deserialize, Serialize, Serializer};

/// Role of an entry in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that guide the model's behavior
    System,
    /// User input
    User,
    /// Model output
    Assistant,
}

/// One exchanged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: Role,
    pub content: String,
}

impl ConversationEntry {
    /// Create an entry
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Chat completion request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest<'a> {
    /// Model identifier
    pub model: &'a str,

    /// Whether the answer is delivered as SSE deltas
    pub stream: bool,

    /// Sampling temperature
    #[serde(serialize_with = "serialize_temperature")]
    pub temperature: f32,

    /// Dialogue history in log order
    pub messages: &'a [ConversationEntry],
}

impl<'a> ChatRequest<'a> {
    /// Create a request body over a borrowed history
    pub fn new(model: &'a str, messages: &'a [ConversationEntry], stream: bool) -> Self {
        Self {
            model,
            stream,
            temperature: 0.0,
            messages,
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Whole-number temperatures go out as integers (`0`, not `0.0`)
fn serialize_temperature<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.is_finite() && *value >= 0.0 && *value <= u32::MAX as f32 {
        serializer.serialize_u32(*value as u32)
    } else {
        serializer.serialize_f32(*value)
    }
}

/// A model entry returned by the listing endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier
    pub id: String,

    /// Owning organization, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<String>,
}

/// Body of `GET /v1/models`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelList {
    pub data: Vec<ModelInfo>,
}

/// Body of `GET /v1/language-models`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageModelList {
    pub models: Vec<ModelInfo>,
}

impl ModelList {
    /// Model ids in server order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|m| m.id.as_str())
    }
}

impl LanguageModelList {
    /// Model ids in server order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.id.as_str())
    }
}
