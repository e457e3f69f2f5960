//! Protocol module for chat-completion requests and responses
//!
//! This module defines the conversation log, the JSON request body, the two
//! completion fragment shapes and the model listing documents.

pub mod conversation;
pub mod fragment;
pub mod types;

pub use conversation::Conversation;
pub use fragment::CompletionFragment;
pub use types::{
    ChatRequest, ConversationEntry, LanguageModelList, ModelInfo, ModelList, Role,
};
