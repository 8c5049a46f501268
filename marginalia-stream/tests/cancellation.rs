//! Cancellation contract of the response reader.

use std::convert::Infallible;

use bytes::Bytes;
use futures::channel::mpsc;
use marginalia_stream::{ResponseStream, Role, StreamOutcome, TargetMessage};

fn delta_line(text: &str) -> String {
    format!("data: {{\"choices\":[{{\"delta\":{{\"content\":\"{text}\"}}}}]}}\n")
}

fn chunk(text: &str) -> Result<Bytes, Infallible> {
    Ok(Bytes::from(text.to_string()))
}

#[tokio::test]
async fn cancel_between_events_of_one_chunk() {
    let (tx, rx) = mpsc::unbounded();
    let all = format!("{}{}{}", delta_line("a"), delta_line("b"), delta_line("c"));
    tx.unbounded_send(chunk(&all)).unwrap();

    let stream = ResponseStream::new(200, rx);
    let handle = stream.cancel_handle();

    let mut msg = TargetMessage::placeholder();
    let outcome = stream
        .read_with(&mut msg, |m| {
            if m.content == "a" {
                handle.cancel();
            }
        })
        .await;

    assert_eq!(outcome, StreamOutcome::Cancelled);
    assert_eq!(msg.content, "a");
    assert_eq!(msg.role, Role::Assistant);
    assert!(msg.error.is_none());
}

#[tokio::test]
async fn cancel_while_waiting_for_next_chunk_releases_channel() {
    let (tx, rx) = mpsc::unbounded();
    tx.unbounded_send(chunk(&delta_line("partial"))).unwrap();

    let stream = ResponseStream::new(200, rx);
    let handle = stream.cancel_handle();
    let mut msg = TargetMessage::placeholder();

    let (outcome, ()) = tokio::join!(stream.read_into(&mut msg), async {
        tokio::task::yield_now().await;
        assert!(handle.cancel());
    });

    assert_eq!(outcome, StreamOutcome::Cancelled);
    assert_eq!(msg.content, "partial");
    // The reader dropped its end of the channel.
    assert!(tx.is_closed());
    assert!(
        tx.unbounded_send(chunk(&delta_line("more"))).is_err(),
        "receiver should be gone"
    );
}

#[tokio::test]
async fn cancel_is_idempotent_across_clones() {
    let (_tx, rx) = mpsc::unbounded::<Result<Bytes, Infallible>>();
    let stream = ResponseStream::new(200, rx);
    let first = stream.cancel_handle();
    let second = stream.cancel_handle();

    assert!(first.cancel());
    assert!(!second.cancel());
    assert!(!first.cancel());

    let mut msg = TargetMessage::placeholder();
    assert_eq!(stream.read_into(&mut msg).await, StreamOutcome::Cancelled);
    assert!(msg.is_placeholder());
}

#[tokio::test]
async fn no_events_processed_after_cancel() {
    let (tx, rx) = mpsc::unbounded();
    tx.unbounded_send(chunk(&delta_line("one"))).unwrap();
    tx.unbounded_send(chunk(&delta_line("two"))).unwrap();
    tx.unbounded_send(chunk("data: [DONE]\n")).unwrap();

    let stream = ResponseStream::new(200, rx);
    let handle = stream.cancel_handle();
    let mut updates = Vec::new();
    let mut msg = TargetMessage::placeholder();

    let outcome = stream
        .read_with(&mut msg, |m| {
            updates.push(m.content.clone());
            handle.cancel();
        })
        .await;

    assert_eq!(outcome, StreamOutcome::Cancelled);
    assert_eq!(updates, vec!["one"]);
    assert_eq!(msg.content, "one");
}
