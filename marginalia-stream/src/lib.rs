#![deny(missing_docs)]
//! Incremental response assembly for streamed text generation.
//!
//! Bytes arrive from a read channel, the [`LineDecoder`] turns complete lines
//! into [`ProtocolEvent`]s, and the [`ResponseAssembler`] applies those events
//! to a caller-owned [`TargetMessage`]. [`ResponseStream`] drives both in one
//! async loop and can be aborted through its [`CancelHandle`].
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//! data: {"choices":[{"delta":{"content":"lo"}}]}
//! data: [DONE]
//! ```

pub mod assembler;
pub mod decoder;
pub mod extract;
pub mod pacing;
pub mod reader;

// Re-exports
pub use assembler::{ErrorPolicy, Progress, ResponseAssembler};
pub use decoder::{DONE_TOKEN, Decoded, LineDecoder};
pub use extract::{error_message, extract_text, status_error_text};
pub use pacing::{FixedPacing, NoPacing, PacingStrategy};
pub use reader::{ResponseStream, decode_events};

pub use marginalia_types::{CancelHandle, ProtocolEvent, Role, StreamOutcome, TargetMessage};
