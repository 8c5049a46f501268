//! Applies decoded events to a target message.

use marginalia_types::{ProtocolEvent, Role, StreamOutcome, TargetMessage};

/// What to do with partial content when a stream fails mid-way.
///
/// A message that is still a placeholder is always replaced by the error
/// text; the policy only matters once some content has streamed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Keep the streamed content, flag the message, store the error text in
    /// [`TargetMessage::error`].
    #[default]
    PreservePartial,
    /// Discard the streamed content and show only the error text.
    Replace,
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// No change to the message.
    Pending,
    /// Text was appended to the message.
    Appended,
    /// The stream reached a terminal state.
    Finished(StreamOutcome),
    /// The event arrived after the terminal state and was dropped.
    Ignored,
}

/// Interprets one stream's events against a [`TargetMessage`].
///
/// Holds the exclusive borrow of the message for the lifetime of the stream.
#[derive(Debug)]
pub struct ResponseAssembler<'m> {
    message: &'m mut TargetMessage,
    policy: ErrorPolicy,
    finished: bool,
    appended: usize,
}

impl<'m> ResponseAssembler<'m> {
    /// Start assembling into `message` with the default error policy.
    pub fn new(message: &'m mut TargetMessage) -> Self {
        Self {
            message,
            policy: ErrorPolicy::default(),
            finished: false,
            appended: 0,
        }
    }

    /// Override the error policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The message being assembled.
    #[must_use]
    pub fn message(&self) -> &TargetMessage {
        &*self.message
    }

    /// Whether a terminal event has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of non-empty deltas appended so far.
    #[must_use]
    pub fn appended(&self) -> usize {
        self.appended
    }

    /// Apply one event in stream order.
    pub fn apply(&mut self, event: ProtocolEvent) -> Progress {
        if self.finished {
            tracing::warn!(?event, "event after terminal state ignored");
            return Progress::Ignored;
        }

        match event {
            ProtocolEvent::Delta(text) if text.is_empty() => Progress::Pending,
            ProtocolEvent::Delta(text) => {
                self.message.append(&text);
                self.appended += 1;
                Progress::Appended
            }
            ProtocolEvent::Done => {
                self.finished = true;
                Progress::Finished(StreamOutcome::Completed {
                    content: self.message.content.clone(),
                })
            }
            ProtocolEvent::Error(text) => {
                self.finished = true;
                self.mark_failed(&text);
                Progress::Finished(StreamOutcome::Failed { message: text })
            }
            ProtocolEvent::Comment | ProtocolEvent::Empty => Progress::Pending,
        }
    }

    fn mark_failed(&mut self, text: &str) {
        if self.message.is_placeholder() || self.policy == ErrorPolicy::Replace {
            self.message.content = text.to_string();
            self.message.error = None;
        } else {
            self.message.error = Some(text.to_string());
        }
        self.message.role = Role::Error;
    }
}
