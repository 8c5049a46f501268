//! Decoded stream events and terminal outcomes.

use serde::{Deserialize, Serialize};

/// One decoded line of a response stream.
///
/// Events are produced in stream order and must be consumed in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum ProtocolEvent {
    /// Incremental content. May be empty once text has started flowing.
    Delta(String),
    /// Explicit end of stream.
    Done,
    /// A structured error surfaced by the API.
    Error(String),
    /// Keep-alive or other non-data line.
    Comment,
    /// Blank line.
    Empty,
}

impl ProtocolEvent {
    /// Whether this event ends the stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }

    /// The text carried by a delta, if any.
    #[must_use]
    pub fn delta_text(&self) -> Option<&str> {
        match self {
            Self::Delta(text) => Some(text),
            _ => None,
        }
    }
}

/// How a response stream ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StreamOutcome {
    /// The stream finished normally.
    Completed {
        /// Final accumulated content of the target message.
        content: String,
    },
    /// The stream failed; the message was flagged or replaced.
    Failed {
        /// Human-readable failure text.
        message: String,
    },
    /// The caller cancelled before a terminal event.
    Cancelled,
}

impl StreamOutcome {
    /// Whether the stream completed successfully.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Whether the stream failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
