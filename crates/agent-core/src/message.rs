//! Conversation Messages
//!
//! Chat turns exchanged between the user, the advisor, and the language model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant reply (advisor report or LLM output)
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    pub content: String,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Model that generated this (assistant messages produced by an LLM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            model: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Estimate token count (~4 characters per token, +4 for role overhead)
    pub fn estimate_tokens(&self) -> u32 {
        u32::try_from(self.content.len() / 4).unwrap_or(u32::MAX).saturating_add(4)
    }
}

/// Conversation history
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,

    /// Maximum context length (in estimated tokens)
    #[serde(default = "default_max_context")]
    max_context_tokens: u32,
}

const fn default_max_context() -> u32 {
    8192
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            max_context_tokens: default_max_context(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Copy of the history with the final message replaced, when it is a user turn.
    ///
    /// Used to wrap the latest user text in an instruction envelope without
    /// touching what is stored in the session.
    pub fn with_last_user_rewritten(&self, rewrite: impl FnOnce(&str) -> String) -> Vec<Message> {
        let mut messages = self.messages.clone();
        if let Some(last) = messages.last_mut() {
            if last.role == Role::User {
                last.content = rewrite(&last.content);
            }
        }
        messages
    }

    pub fn estimate_tokens(&self) -> u32 {
        self.messages.iter().map(Message::estimate_tokens).sum()
    }

    pub const fn max_context_tokens(&self) -> u32 {
        self.max_context_tokens
    }

    /// Drop the oldest non-system turns until the history fits the token budget.
    /// The newest message is always kept.
    pub fn truncate_to_fit(&mut self) {
        while self.estimate_tokens() > self.max_context_tokens && self.messages.len() > 1 {
            match self.messages.iter().position(|m| m.role != Role::System) {
                Some(pos) if pos < self.messages.len() - 1 => {
                    self.messages.remove(pos);
                }
                _ => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_only_touches_trailing_user_turn() {
        let mut conv = Conversation::new();
        conv.push(Message::user("hi"));
        let rewritten = conv.with_last_user_rewritten(|text| format!("[{text}]"));
        assert_eq!(rewritten[0].content, "[hi]");
        // stored history is untouched
        assert_eq!(conv.messages()[0].content, "hi");

        conv.push(Message::assistant("hello"));
        let rewritten = conv.with_last_user_rewritten(|text| format!("[{text}]"));
        assert_eq!(rewritten[0].content, "hi");
    }

    #[test]
    fn test_truncate_keeps_system_and_newest() {
        let mut conv = Conversation {
            messages: Vec::new(),
            max_context_tokens: 20,
        };
        conv.push(Message::system("rules"));
        for i in 0..10 {
            conv.push(Message::user(format!("message number {i} with some padding")));
        }
        conv.truncate_to_fit();

        assert_eq!(conv.messages()[0].role, Role::System);
        assert!(conv.last().unwrap().content.contains("number 9"));
        assert!(conv.len() < 11);
    }
}
