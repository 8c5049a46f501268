#![deny(missing_docs)]
//! Shared types for marginalia.
//!
//! The [`TargetMessage`] is the record a streamed answer is assembled into,
//! [`ProtocolEvent`] is one decoded line of the wire stream, and
//! [`StreamOutcome`] is the terminal signal handed back to the caller.
//! [`CancelHandle`] lets a caller abort an in-flight request.

pub mod cancel;
pub mod error;
pub mod event;
pub mod message;

// Re-exports
pub use cancel::CancelHandle;
pub use error::{ConfigError, ProviderError};
pub use event::{ProtocolEvent, StreamOutcome};
pub use message::{Role, TargetMessage};
