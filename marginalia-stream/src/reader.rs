//! The async consumption loop for one response stream.

use std::fmt::Display;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use marginalia_types::{CancelHandle, ProtocolEvent, StreamOutcome, TargetMessage};

use crate::assembler::{ErrorPolicy, Progress, ResponseAssembler};
use crate::decoder::{Decoded, LineDecoder};
use crate::pacing::{NoPacing, PacingStrategy};

/// Status code of a successful streaming response.
const STATUS_OK: u16 = 200;

/// One in-flight response: an HTTP status plus the body's byte stream.
///
/// Obtain the [`CancelHandle`] with [`cancel_handle`](Self::cancel_handle)
/// before awaiting [`read_into`](Self::read_into). Cancelling stops the read
/// loop, drops the body (releasing the connection), and leaves the target
/// message as it was after the last applied delta.
pub struct ResponseStream<S> {
    status: u16,
    body: S,
    cancel: CancelHandle,
    pacing: Box<dyn PacingStrategy>,
    policy: ErrorPolicy,
}

impl<S> std::fmt::Debug for ResponseStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseStream")
            .field("status", &self.status)
            .field("cancel", &self.cancel)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Outcome of waiting on the body or the cancellation token.
enum Next<T> {
    Item(Option<T>),
    Cancelled,
}

impl<S, E> ResponseStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    /// Wrap a response body received with `status`.
    pub fn new(status: u16, body: S) -> Self {
        Self {
            status,
            body,
            cancel: CancelHandle::new(),
            pacing: Box::new(NoPacing),
            policy: ErrorPolicy::default(),
        }
    }

    /// Delay between consecutive deltas of one chunk.
    #[must_use]
    pub fn with_pacing(mut self, pacing: impl PacingStrategy + 'static) -> Self {
        self.pacing = Box::new(pacing);
        self
    }

    /// How partial content is treated when the stream fails.
    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use an existing handle, e.g. one already wired to an editor command.
    #[must_use]
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// HTTP status the body was received with.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// A handle that aborts this stream.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Consume the stream into `message`.
    pub async fn read_into(self, message: &mut TargetMessage) -> StreamOutcome {
        self.read_with(message, |_| {}).await
    }

    /// Consume the stream into `message`, calling `on_update` after every
    /// appended delta and once more when the stream finishes.
    pub async fn read_with<F>(self, message: &mut TargetMessage, mut on_update: F) -> StreamOutcome
    where
        F: FnMut(&TargetMessage),
    {
        let Self {
            status,
            body,
            cancel,
            pacing,
            policy,
        } = self;

        let mut body = std::pin::pin!(body);
        let mut decoder = LineDecoder::new();
        let mut assembler = ResponseAssembler::new(message).with_policy(policy);

        let outcome = 'read: loop {
            let next = tokio::select! {
                biased;
                () = cancel.token().cancelled() => Next::Cancelled,
                item = body.next() => Next::Item(item),
            };

            let decoded = match next {
                Next::Cancelled => break 'read StreamOutcome::Cancelled,
                Next::Item(Some(Ok(chunk))) => decoder.decode(&chunk, status),
                Next::Item(Some(Err(e))) => Decoded::failure(format!("stream read error: {e}")),
                Next::Item(None) => end_of_input(&mut decoder, status),
            };

            let mut delta_applied = false;
            for event in decoded.events {
                if cancel.is_cancelled() {
                    break 'read StreamOutcome::Cancelled;
                }

                let pause = match &event {
                    ProtocolEvent::Delta(text) if delta_applied && !text.is_empty() => {
                        pacing.delay()
                    }
                    _ => None,
                };
                if let Some(pause) = pause {
                    let slept = tokio::select! {
                        biased;
                        () = cancel.token().cancelled() => false,
                        () = tokio::time::sleep(pause) => true,
                    };
                    if !slept {
                        break 'read StreamOutcome::Cancelled;
                    }
                }

                match assembler.apply(event) {
                    Progress::Appended => {
                        delta_applied = true;
                        on_update(assembler.message());
                    }
                    Progress::Finished(outcome) => {
                        // Settled before the observer runs, so a cancel issued
                        // from the final update is a no-op.
                        cancel.settle();
                        on_update(assembler.message());
                        break 'read outcome;
                    }
                    Progress::Pending | Progress::Ignored => {}
                }
            }
        };

        cancel.settle();
        match &outcome {
            StreamOutcome::Completed { content } => {
                tracing::debug!(status, len = content.len(), "response stream completed");
            }
            StreamOutcome::Failed { message } => {
                tracing::debug!(status, error = %message, "response stream failed");
            }
            StreamOutcome::Cancelled => {
                tracing::debug!(status, appended = assembler.appended(), "response stream cancelled");
            }
        }
        outcome
    }
}

/// Terminal events for a read channel that ended on its own.
///
/// The buffered tail is flushed first. Without an explicit terminal event a
/// 200 stream counts as done; any other status reports itself.
fn end_of_input(decoder: &mut LineDecoder, status: u16) -> Decoded {
    let mut tail = decoder.finish();
    if !tail.terminal {
        let event = if status == STATUS_OK {
            ProtocolEvent::Done
        } else {
            ProtocolEvent::Error(format!("HTTP {status}"))
        };
        tail.events.push(event);
        tail.terminal = true;
    }
    tail
}

/// Decode a response body into its protocol events, without assembling.
///
/// The stream always ends with exactly one terminal event, just like
/// [`ResponseStream::read_with`]: a body that runs out without one counts as
/// done for status 200 and as an error otherwise. A read error is reported as
/// a single trailing [`ProtocolEvent::Error`].
pub fn decode_events<S, E>(status: u16, body: S) -> impl Stream<Item = ProtocolEvent> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Display + Send,
{
    async_stream::stream! {
        let mut decoder = LineDecoder::new();
        let mut body = std::pin::pin!(body);

        while let Some(chunk_result) = body.next().await {
            let decoded = match chunk_result {
                Ok(chunk) => decoder.decode(&chunk, status),
                Err(e) => Decoded::failure(format!("stream read error: {e}")),
            };
            for event in decoded.events {
                yield event;
            }
            if decoded.terminal {
                return;
            }
        }

        for event in end_of_input(&mut decoder, status).events {
            yield event;
        }
    }
}
