//! Chat message and transcript types.
//!
//! A [`Transcript`] is the append-only log of one chat session. Messages are
//! immutable once created; the only mutation besides append is a full clear.

use serde::{Deserialize, Serialize};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the person at the keyboard.
    User,
    /// Reply (or error notice) produced on behalf of the model.
    Bot,
}

/// A single message in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    text: String,
}

impl Message {
    /// Create a new user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create a new bot message.
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
        }
    }

    /// Role of the message author.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Message text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether this message was authored by the user.
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Ordered, append-only sequence of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the end.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Remove every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Serialize to the JSON array stored in the session store.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse the JSON array written by [`Transcript::to_json`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let user = Message::user("Hello");
        assert_eq!(user.role(), Role::User);
        assert_eq!(user.text(), "Hello");
        assert!(user.is_user());

        let bot = Message::bot("Hi there!");
        assert_eq!(bot.role(), Role::Bot);
        assert!(!bot.is_user());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::bot("ok")).unwrap();
        assert_eq!(json, r#"{"role":"bot","text":"ok"}"#);
    }

    #[test]
    fn test_transcript_append_keeps_order() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("one"));
        transcript.push(Message::bot("two"));
        transcript.push(Message::user("three"));

        let texts: Vec<&str> = transcript.messages().iter().map(Message::text).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(transcript.last(), Some(&Message::user("three")));
    }

    #[test]
    fn test_transcript_json_roundtrip() {
        let transcript = Transcript::from(vec![
            Message::user("What is Rust?"),
            Message::bot("A systems language.\nWith \"quotes\"."),
        ]);

        let json = transcript.to_json().unwrap();
        assert!(json.starts_with('['));

        let restored = Transcript::from_json(&json).unwrap();
        assert_eq!(restored, transcript);
    }

    #[test]
    fn test_transcript_clear() {
        let mut transcript = Transcript::from(vec![Message::user("a"), Message::bot("b")]);
        transcript.clear();
        assert!(transcript.is_empty());
        assert_eq!(transcript.len(), 0);
    }

    #[test]
    fn test_transcript_rejects_unknown_role() {
        let result = Transcript::from_json(r#"[{"role":"system","text":"x"}]"#);
        assert!(result.is_err());
    }
}
