//! End-to-end tests through the umbrella crate.
//!
//! These drive the public surface the way an editor integration would: open
//! a stream against a mock server, read it into a placeholder message, and
//! check the terminal outcome.

#![cfg(feature = "provider-openai")]

use std::convert::Infallible;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use marginalia::prelude::*;
use marginalia::stream::decode_events;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HELLO_STREAM: &str = concat!(
    "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
    "data: [DONE]\n",
);

async fn mock_completions(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

fn chunks(parts: &[&str]) -> impl futures::Stream<Item = Result<Bytes, Infallible>> + Send + use<> {
    let owned: Vec<Result<Bytes, Infallible>> = parts
        .iter()
        .map(|p| Ok(Bytes::from(p.to_string())))
        .collect();
    futures::stream::iter(owned)
}

#[tokio::test]
async fn hello_stream_completes_with_joined_content() {
    let server =
        mock_completions(ResponseTemplate::new(200).set_body_raw(HELLO_STREAM, "text/event-stream"))
            .await;

    let client = OpenAi::new("k").base_url(server.uri());
    let mut msg = TargetMessage::placeholder();
    let mut finished = 0;
    let outcome = client
        .stream_prompt("greet")
        .await
        .unwrap()
        .read_with(&mut msg, |m| {
            if m.content == "Hello" {
                finished += 1;
            }
        })
        .await;

    assert_eq!(
        outcome,
        StreamOutcome::Completed {
            content: "Hello".into()
        }
    );
    assert_eq!(msg.content, "Hello");
    assert_eq!(msg.role, Role::Assistant);
    // One update for the second delta, one for completion.
    assert_eq!(finished, 2);
}

#[tokio::test]
async fn rate_limited_status_yields_single_error() {
    let server = mock_completions(
        ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": {"message": "rate limited"}})),
    )
    .await;

    let client = OpenAi::new("k").base_url(server.uri());
    let mut msg = TargetMessage::placeholder();
    let outcome = client
        .ask("greet", &mut msg, &CancelHandle::new())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        StreamOutcome::Failed {
            message: "rate limited".into()
        }
    );
    assert_eq!(msg.role, Role::Error);
    assert_eq!(msg.display_text(), "rate limited");
}

#[tokio::test]
async fn rate_limited_events_have_no_deltas() {
    let body = r#"{"error":{"message":"rate limited"}}"#;
    let events: Vec<ProtocolEvent> = decode_events(500, chunks(&[body])).collect().await;
    assert_eq!(events, vec![ProtocolEvent::Error("rate limited".into())]);
}

#[tokio::test]
async fn line_split_across_chunks_decodes_identically() {
    let whole: Vec<ProtocolEvent> = decode_events(200, chunks(&[HELLO_STREAM])).collect().await;
    let split: Vec<ProtocolEvent> = decode_events(
        200,
        chunks(&[
            "data: {\"choices\":[{\"del",
            "ta\":{\"content\":\"Hel\"}}]}\ndata: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}",
            "\ndata: [DO",
            "NE]\n",
        ]),
    )
    .collect()
    .await;

    assert_eq!(whole, split);
    assert_eq!(
        whole,
        vec![
            ProtocolEvent::Delta("Hel".into()),
            ProtocolEvent::Delta("lo".into()),
            ProtocolEvent::Done,
        ]
    );
}

#[tokio::test]
async fn manual_decoder_and_assembler_compose() {
    let mut decoder = LineDecoder::new();
    let mut msg = TargetMessage::placeholder();
    let mut assembler = ResponseAssembler::new(&mut msg);

    let mut outcome = None;
    for part in ["data: {\"choices\":[{\"text\":\"Hel\"}]}\n: keep-alive\n", HELLO_STREAM] {
        for event in decoder.decode(part.as_bytes(), 200).events {
            if let marginalia::stream::Progress::Finished(done) = assembler.apply(event) {
                outcome = Some(done);
            }
        }
    }

    assert!(assembler.is_finished());
    assert_eq!(
        outcome,
        Some(StreamOutcome::Completed {
            content: "HelHello".into()
        })
    );
}

#[tokio::test]
async fn cancel_mid_stream_keeps_applied_deltas() {
    let (tx, rx) = futures::channel::mpsc::unbounded::<Result<Bytes, Infallible>>();
    tx.unbounded_send(Ok(Bytes::from_static(
        b"data: {\"choices\":[{\"delta\":{\"content\":\"first\"}}]}\n",
    )))
    .unwrap();

    let stream = ResponseStream::new(200, rx);
    let cancel = stream.cancel_handle();
    let mut msg = TargetMessage::placeholder();

    let remote = cancel.clone();
    let (outcome, ()) = tokio::join!(stream.read_into(&mut msg), async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(remote.cancel());
    });

    assert_eq!(outcome, StreamOutcome::Cancelled);
    assert_eq!(msg.content, "first");
    assert!(msg.error.is_none());
    // A second cancel after the stream ended has no effect.
    assert!(!cancel.cancel());
    assert!(tx.unbounded_send(Ok(Bytes::from_static(b"late\n"))).is_err());
}

#[tokio::test]
async fn replace_policy_discards_partial_content() {
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"half an ans\"}}]}\n",
        "data: {\"error\":{\"message\":\"context length exceeded\"}}\n",
    );
    let mut msg = TargetMessage::placeholder();
    let outcome = ResponseStream::new(200, chunks(&[body]))
        .with_error_policy(ErrorPolicy::Replace)
        .read_into(&mut msg)
        .await;

    assert!(outcome.is_failed());
    assert_eq!(msg.content, "context length exceeded");
    assert_eq!(msg.role, Role::Error);
}
