//! Line decoder for chunked text-generation streams.
//!
//! The wire format is newline-delimited text, usually Server-Sent Events:
//!
//! ```text
//! : keep-alive
//!
//! data: {"id":"chatcmpl-abc","object":"chat.completion.chunk","choices":[{"delta":{"content":"Hi"}}]}
//!
//! data: [DONE]
//! ```
//!
//! Newline-delimited JSON objects without the `data:` prefix are accepted
//! as well, and an unprefixed object carrying an error ends the stream.

use bytes::BytesMut;
use marginalia_types::ProtocolEvent;
use serde_json::Value;

use crate::extract::{error_message, extract_text, status_error_text};

/// Literal payload marking the end of a stream.
pub const DONE_TOKEN: &str = "[DONE]";

/// Prefix of SSE data lines. A single following space is optional.
const DATA_PREFIX: &str = "data:";

/// SSE fields that carry no content for us.
const IGNORED_FIELDS: [&str; 3] = ["event:", "id:", "retry:"];

/// `object` kind of a single-shot response that is never followed by `[DONE]`.
const SINGLE_SHOT_OBJECT: &str = "edit";

/// Status code of a successful streaming response.
const STATUS_OK: u16 = 200;

/// Events decoded from one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    /// Events in stream order.
    pub events: Vec<ProtocolEvent>,
    /// Whether the stream reached a terminal state in this chunk.
    pub terminal: bool,
}

impl Decoded {
    /// A terminal result carrying a single error event.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            events: vec![ProtocolEvent::Error(message.into())],
            terminal: true,
        }
    }
}

/// Incremental decoder for one response stream.
///
/// Holds the partial line left over from the previous chunk. Bytes are
/// buffered before UTF-8 decoding so characters split across chunks survive.
#[derive(Debug, Default)]
pub struct LineDecoder {
    /// Incomplete tail since the last line terminator.
    partial: BytesMut,
    /// Whether a non-empty delta has been emitted for this response.
    seen_text: bool,
    /// Whether a terminal event has been emitted.
    terminal: bool,
    /// Status of a failed response whose body is being collected.
    error_status: Option<u16>,
}

impl LineDecoder {
    /// Create a decoder with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes carried over to the next chunk.
    #[must_use]
    pub fn partial(&self) -> &[u8] {
        &self.partial
    }

    /// Whether a terminal event has already been produced.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Decode one chunk received with the given HTTP status.
    ///
    /// With a non-200 status the chunk is appended to the error body and
    /// nothing is emitted until [`finish`](Self::finish), which reports the
    /// whole body as one error. Otherwise every complete line is decoded in
    /// order and the trailing fragment is kept for the next call. Decoding
    /// stops at the first terminal event.
    pub fn decode(&mut self, chunk: &[u8], status: u16) -> Decoded {
        if self.terminal {
            return Decoded {
                events: Vec::new(),
                terminal: true,
            };
        }

        if status != STATUS_OK || self.error_status.is_some() {
            if self.error_status.is_none() {
                self.error_status = Some(status);
                self.partial.clear();
            }
            self.partial.extend_from_slice(chunk);
            return Decoded::default();
        }

        self.partial.extend_from_slice(chunk);

        let mut out = Decoded::default();
        while let Some(newline) = self.partial.iter().position(|&b| b == b'\n') {
            let line = self.partial.split_to(newline + 1);
            self.decode_line(trim_line_end(&line), &mut out);
            if out.terminal {
                break;
            }
        }
        out
    }

    /// Flush the buffered tail once the read channel is exhausted.
    ///
    /// A final line without a terminator is decoded as if it had one. For a
    /// failed response the collected body becomes a single error event.
    pub fn finish(&mut self) -> Decoded {
        let mut out = Decoded::default();
        if self.terminal {
            out.terminal = true;
            return out;
        }

        let tail = self.partial.split();
        if let Some(status) = self.error_status {
            let body = String::from_utf8_lossy(&tail);
            self.terminate(ProtocolEvent::Error(status_error_text(&body, status)), &mut out);
            return out;
        }

        let line = trim_line_end(&tail);
        if !line.is_empty() {
            self.decode_line(line, &mut out);
        }
        out
    }

    fn decode_line(&mut self, raw: &[u8], out: &mut Decoded) {
        let Ok(line) = std::str::from_utf8(raw) else {
            tracing::debug!(len = raw.len(), "skipping line with invalid UTF-8");
            return;
        };

        if line.is_empty() {
            out.events.push(ProtocolEvent::Empty);
            return;
        }

        if line.starts_with(':') {
            out.events.push(ProtocolEvent::Comment);
            return;
        }

        if let Some(rest) = line.strip_prefix(DATA_PREFIX) {
            let payload = rest.strip_prefix(' ').unwrap_or(rest);
            self.decode_data(payload, out);
            return;
        }

        if line.trim_start().starts_with('{') {
            self.decode_raw_object(line, out);
            return;
        }

        if IGNORED_FIELDS.iter().any(|field| line.starts_with(field)) {
            out.events.push(ProtocolEvent::Comment);
            return;
        }

        tracing::debug!(line, "skipping unrecognised stream line");
    }

    /// Decode the payload of a `data:` line.
    fn decode_data(&mut self, payload: &str, out: &mut Decoded) {
        if payload.trim() == DONE_TOKEN {
            self.terminate(ProtocolEvent::Done, out);
            return;
        }

        let json: Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed data payload");
                return;
            }
        };

        if let Some(message) = error_message(&json) {
            self.terminate(ProtocolEvent::Error(message), out);
            return;
        }

        self.decode_payload(&json, out);
    }

    /// Decode a JSON object line that is not prefixed as SSE data.
    fn decode_raw_object(&mut self, line: &str, out: &mut Decoded) {
        let json: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed JSON line");
                return;
            }
        };

        if let Some(message) = error_message(&json) {
            self.terminate(ProtocolEvent::Error(message), out);
        } else if json.get("choices").is_some() {
            self.decode_payload(&json, out);
        } else {
            tracing::debug!("skipping JSON line without choices");
        }
    }

    fn decode_payload(&mut self, json: &Value, out: &mut Decoded) {
        let text = extract_text(json);
        if !text.is_empty() {
            self.seen_text = true;
        }
        // Leading empty deltas (role announcements) are dropped; once text
        // has started, every payload yields an event.
        if self.seen_text {
            out.events.push(ProtocolEvent::Delta(text.to_string()));
        }

        if json["object"].as_str() == Some(SINGLE_SHOT_OBJECT) {
            self.terminate(ProtocolEvent::Done, out);
        }
    }

    fn terminate(&mut self, event: ProtocolEvent, out: &mut Decoded) {
        self.terminal = true;
        out.events.push(event);
        out.terminal = true;
    }
}

/// Strip a trailing `\n` and the `\r` of a `\r\n` pair.
fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
