//! The message a streamed response is written into.

use serde::{Deserialize, Serialize};

/// Author of a message in a comment thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking.
    User,
    /// The model's answer.
    Assistant,
    /// A failed answer; `content` or `error` holds the failure text.
    Error,
}

/// A mutable message accumulating one response.
///
/// Owned by the caller and lent (`&mut`) to exactly one assembler for the
/// lifetime of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMessage {
    /// Accumulated text.
    pub content: String,
    /// Who the message is attributed to.
    pub role: Role,
    /// Failure text, set when an errored message keeps its partial content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TargetMessage {
    /// Create a message with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role,
            error: None,
        }
    }

    /// An empty assistant message waiting for its first delta.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::new(Role::Assistant, "")
    }

    /// A message carrying a failure.
    pub fn failure(text: impl Into<String>) -> Self {
        Self::new(Role::Error, text)
    }

    /// Whether no content has arrived yet for this assistant message.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.role == Role::Assistant && self.content.is_empty() && self.error.is_none()
    }

    /// Whether the message was flagged as failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.role == Role::Error
    }

    /// Append a text fragment in place.
    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Text an editor should render for this message.
    ///
    /// Partial content is shown first, followed by the failure text when the
    /// message was flagged without replacing its content.
    #[must_use]
    pub fn display_text(&self) -> String {
        match &self.error {
            Some(err) if self.content.is_empty() => err.clone(),
            Some(err) => format!("{}\n\n{err}", self.content),
            None => self.content.clone(),
        }
    }
}
