//! Conversation state — the append-only message log shared by all nodes of
//! one run.
//!
//! Every turn sees the full ordered history of all prior turns; new turns
//! are concatenated, never replacing history. One run owns its state
//! exclusively, so no locking is needed inside a run.

use serde::{Deserialize, Serialize};

/// Sender tag for the initial user message.
pub const USER_SENDER: &str = "user";
/// Sender tag for supervisor decision messages.
pub const SUPERVISOR_SENDER: &str = "supervisor";

/// One tagged message in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// A role name, `"user"`, or `"supervisor"`.
    pub sender: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            sender: USER_SENDER.to_string(),
            content: content.into(),
        }
    }

    pub fn supervisor(content: impl Into<String>) -> Self {
        Self {
            sender: SUPERVISOR_SENDER.to_string(),
            content: content.into(),
        }
    }

    pub fn specialist(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: role.into(),
            content: content.into(),
        }
    }
}

/// The ordered, append-only message log of one conversation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    /// Seed a new conversation with its initial user message.
    pub fn new(initial: Message) -> Self {
        Self {
            messages: vec![initial],
        }
    }

    /// Append a message. History is never rewritten.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Render the full history as plain text, one `sender: content` line per
    /// message. This is the context handed to the text-generation capability;
    /// specialists are not shown a filtered view.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for msg in &self.messages {
            out.push_str(&msg.sender);
            out.push_str(": ");
            out.push_str(&msg.content);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_append_only() {
        let mut state = ConversationState::new(Message::user("hello"));
        let before: Vec<Message> = state.messages().to_vec();

        state.push(Message::supervisor("Greeter"));
        state.push(Message::specialist("Greeter", "hi there"));

        // The earlier snapshot is a strict prefix of the later one.
        assert_eq!(&state.messages()[..before.len()], before.as_slice());
        assert_eq!(state.len(), 3);
        assert_eq!(state.last().unwrap().content, "hi there");
    }

    #[test]
    fn test_transcript_rendering() {
        let mut state = ConversationState::new(Message::user("book a table"));
        state.push(Message::specialist("Host", "for how many?"));

        let transcript = state.transcript();
        assert_eq!(transcript, "user: book a table\nHost: for how many?\n");
    }
}
