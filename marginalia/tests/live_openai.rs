//! Live API test.
//!
//! Run with an API key set:
//! ```bash
//! OPENAI_API_KEY=... cargo test -p marginalia --test live_openai -- --ignored
//! ```

#![cfg(feature = "provider-openai")]

use marginalia::prelude::*;

#[tokio::test]
#[ignore = "requires OPENAI_API_KEY"]
async fn live_stream_completes() {
    let config = OpenAiConfig::from_env().expect("OPENAI_API_KEY must be set");
    let client = OpenAi::from_config(&config);

    let mut msg = TargetMessage::placeholder();
    let outcome = client
        .ask("Reply with the single word: pong", &mut msg, &CancelHandle::new())
        .await
        .expect("request should be sent");

    assert!(outcome.is_completed(), "unexpected outcome: {outcome:?}");
    assert!(!msg.content.trim().is_empty());
}
