//! Append-only conversation log

use super::types::{ConversationEntry, Role};
use serde::{Deserialize, Serialize};

/// Ordered, role-tagged record of the dialogue sent to the server
///
/// Entries are only ever appended; insertion order is the order in which
/// they are serialized into each request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    entries: Vec<ConversationEntry>,
}

impl Conversation {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log that opens with a system instruction
    pub fn with_system(content: impl Into<String>) -> Self {
        let mut log = Self::new();
        log.push_system(content);
        log
    }

    /// Append a system entry
    pub fn push_system(&mut self, content: impl Into<String>) {
        self.push(Role::System, content);
    }

    /// Append a user entry
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Role::User, content);
    }

    /// Append an assistant entry
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content);
    }

    fn push(&mut self, role: Role, content: impl Into<String>) {
        self.entries.push(ConversationEntry::new(role, content));
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// The most recently appended entry
    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, ConversationEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a ConversationEntry;
    type IntoIter = std::slice::Iter<'a, ConversationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
