//! Request mapping from a prompt to the OpenAI Chat Completions API format.
//!
//! Reference: <https://platform.openai.com/docs/api-reference/chat/create>

use serde::Serialize;

/// Chat Completions request body for one streamed prompt.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    /// Model identifier (e.g. "gpt-3.5-turbo").
    pub model: &'a str,
    /// Conversation messages; a single user turn holding the prompt.
    pub messages: [ChatMessage<'a>; 1],
    /// Completion token budget left after the prompt.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Always `true`; the response is consumed incrementally.
    pub stream: bool,
}

/// A message in the Chat Completions API format.
#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    /// Role: always "user" for prompts sent from the editor.
    pub role: &'static str,
    /// The opaque prompt text assembled by the caller.
    pub content: &'a str,
}

/// Build the streaming request body for `prompt`.
#[must_use]
pub fn to_api_request<'a>(
    prompt: &'a str,
    model: &'a str,
    temperature: f64,
    context_window: u32,
) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: [ChatMessage {
            role: "user",
            content: prompt,
        }],
        max_tokens: completion_budget(prompt, context_window),
        temperature,
        stream: true,
    }
}

/// Rough token weight of a prompt.
///
/// CJK Unified Ideographs (U+4E00..=U+9FA5) count double, everything else
/// counts once.
#[must_use]
pub fn prompt_weight(prompt: &str) -> usize {
    prompt
        .chars()
        .map(|c| if ('\u{4e00}'..='\u{9fa5}').contains(&c) { 2 } else { 1 })
        .sum()
}

/// Tokens left for the completion once the prompt is accounted for.
///
/// Never below 1, so an oversized prompt still yields a valid request and the
/// API reports the overflow itself.
#[must_use]
pub fn completion_budget(prompt: &str, context_window: u32) -> u32 {
    let weight = u32::try_from(prompt_weight(prompt)).unwrap_or(u32::MAX);
    context_window.saturating_sub(weight).max(1)
}
