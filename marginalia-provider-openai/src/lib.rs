#![deny(missing_docs)]
//! OpenAI-compatible streaming client for marginalia.
//!
//! Opens a streaming Chat Completions request for one prompt and hands the
//! response body to [`marginalia_stream::ResponseStream`]. The client is an
//! ordinary value built by the caller; there is no shared global instance.
//!
//! # Usage
//!
//! ```no_run
//! use marginalia_provider_openai::OpenAi;
//! use marginalia_types::TargetMessage;
//!
//! # async fn run() -> Result<(), marginalia_types::ProviderError> {
//! let client = OpenAi::new("sk-...").model("gpt-3.5-turbo");
//! let stream = client.stream_prompt("Explain this function").await?;
//! let cancel = stream.cancel_handle();
//! let mut answer = TargetMessage::placeholder();
//! let outcome = stream.read_into(&mut answer).await;
//! # drop((cancel, outcome));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub(crate) mod error;
pub mod mapping;

pub use client::{ByteStream, OpenAi};
pub use config::OpenAiConfig;

// Re-export marginalia-types for convenience
pub use marginalia_types::{CancelHandle, ConfigError, ProviderError, StreamOutcome, TargetMessage};
