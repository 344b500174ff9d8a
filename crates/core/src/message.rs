//! Message and Conversation domain types.
//!
//! These are the value objects that flow through the loop:
//! caller asks a question → loop appends it → backend replies → the reply
//! (and any observation) is appended after it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The caller, and observations fed back to the model
    User,
    /// The model
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Identity used by [`merge_messages`]; plain appends never need one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// The user turn that feeds an action result back to the model.
    pub fn observation(observation: impl std::fmt::Display) -> Self {
        Self::user(format!("Observation: {observation}"))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// The conversation log: an append-only, ordered sequence of messages.
///
/// If a system prompt is configured it is the first entry and is never
/// added again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Thread identifier
    pub id: ConversationId,

    messages: Vec<Message>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        Self {
            id: ConversationId::new(),
            messages: Vec::new(),
        }
    }

    /// Create a conversation seeded with a system prompt. An empty prompt
    /// yields an empty log.
    pub fn with_system(prompt: &str) -> Self {
        let mut conv = Self::new();
        if !prompt.is_empty() {
            conv.messages.push(Message::system(prompt));
        }
        conv
    }

    /// Rebuild a log from stored messages (e.g. a checkpoint).
    pub fn from_messages(id: ConversationId, messages: Vec<Message>) -> Self {
        Self { id, messages }
    }

    /// Add a message to the end of the log.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The full ordered sequence, as sent to the completion backend.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Fold `incoming` into the log with [`merge_messages`] semantics.
    pub fn merge(&mut self, incoming: Vec<Message>) {
        let existing = std::mem::take(&mut self.messages);
        self.messages = merge_messages(existing, incoming);
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge two message lists by identity.
///
/// Every incoming message without an id gets a fresh UUID. An incoming
/// message whose id matches an entry already in the result replaces that
/// entry in place; otherwise it is appended. Incoming messages are applied
/// in order, so of two incoming messages sharing an id the later one wins.
pub fn merge_messages(existing: Vec<Message>, incoming: Vec<Message>) -> Vec<Message> {
    let mut merged = existing;
    for mut message in incoming {
        let id = message
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        match merged
            .iter_mut()
            .find(|m| m.id.as_deref() == Some(id.as_str()))
        {
            Some(slot) => *slot = message,
            None => merged.push(message),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
        assert!(msg.id.is_none());
    }

    #[test]
    fn observation_message_format() {
        let msg = Message::observation("9.333333333333334");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Observation: 9.333333333333334");
    }

    #[test]
    fn system_prompt_is_first_and_only_once() {
        let mut conv = Conversation::with_system("You run in a loop.");
        conv.append(Message::user("q"));
        conv.append(Message::assistant("a"));
        assert_eq!(conv.messages()[0].role, Role::System);
        assert_eq!(
            conv.messages()
                .iter()
                .filter(|m| m.role == Role::System)
                .count(),
            1
        );
    }

    #[test]
    fn empty_system_prompt_adds_nothing() {
        assert!(Conversation::with_system("").is_empty());
    }

    #[test]
    fn append_then_snapshot() {
        let mut conv = Conversation::new();
        conv.append(Message::user("first"));
        let before = conv.snapshot().len();

        let msg = Message::assistant("second");
        conv.append(msg.clone());
        let snap = conv.snapshot();

        assert_eq!(snap.len(), before + 1);
        assert_eq!(snap.last(), Some(&msg));
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::user("Test message");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""role":"user""#));
        assert!(!json.contains("id"));
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, msg);
    }

    #[test]
    fn merge_assigns_ids_and_appends() {
        let merged = merge_messages(vec![], vec![Message::user("a"), Message::user("b")]);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|m| m.id.is_some()));
        assert_ne!(merged[0].id, merged[1].id);
    }

    #[test]
    fn merge_replaces_matching_id_in_place() {
        let existing = vec![
            Message::user("question").with_id("1"),
            Message::assistant("Action: calculate: 1/0").with_id("2"),
            Message::user("Observation: x").with_id("3"),
        ];
        let merged = merge_messages(
            existing,
            vec![Message::assistant("Action: calculate: 1/2").with_id("2")],
        );
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[1].content, "Action: calculate: 1/2");
        assert_eq!(merged[2].id.as_deref(), Some("3"));
    }

    #[test]
    fn merge_later_incoming_wins_on_duplicate_id() {
        let merged = merge_messages(
            vec![],
            vec![
                Message::user("first").with_id("x"),
                Message::user("second").with_id("x"),
            ],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].content, "second");
    }

    #[test]
    fn conversation_merge_keeps_order() {
        let mut conv = Conversation::new();
        conv.merge(vec![Message::user("one").with_id("a")]);
        conv.merge(vec![
            Message::user("two"),
            Message::user("one, edited").with_id("a"),
        ]);
        let contents: Vec<_> = conv.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one, edited", "two"]);
    }
}
