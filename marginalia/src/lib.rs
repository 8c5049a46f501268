#![deny(missing_docs)]
//! # marginalia: umbrella crate
//!
//! Single import surface for streaming answer assembly: the shared types,
//! the stream decoder and assembler, and the OpenAI-compatible client, each
//! behind a feature flag. The [`prelude`] covers the usual path of opening a
//! stream and reading it into a message.

pub use marginalia_types as types;

#[cfg(feature = "stream")]
pub use marginalia_stream as stream;

#[cfg(feature = "provider-openai")]
pub use marginalia_provider_openai as openai;

/// Happy-path imports for streaming an answer into a message.
pub mod prelude {
    pub use marginalia_types::{
        CancelHandle, ConfigError, ProtocolEvent, ProviderError, Role, StreamOutcome,
        TargetMessage,
    };

    #[cfg(feature = "stream")]
    pub use marginalia_stream::{
        ErrorPolicy, FixedPacing, LineDecoder, NoPacing, PacingStrategy, ResponseAssembler,
        ResponseStream,
    };

    #[cfg(feature = "provider-openai")]
    pub use marginalia_provider_openai::{OpenAi, OpenAiConfig};
}
