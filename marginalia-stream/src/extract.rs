//! Pure field extraction from decoded JSON payloads.
//!
//! Reference: <https://platform.openai.com/docs/api-reference/chat/streaming>

use serde_json::Value;

/// Fallback used when an `error` object carries no message.
const UNKNOWN_ERROR: &str = "unknown streaming error";

/// Extract the incremental text of one payload.
///
/// Checked in order: `choices[0].text` (legacy completions),
/// `choices[0].delta.content` (chat streaming), `choices[0].message.content`
/// (single-shot responses). The first non-empty match wins; `""` otherwise.
#[must_use]
pub fn extract_text(payload: &Value) -> &str {
    let choice = &payload["choices"][0];
    [
        &choice["text"],
        &choice["delta"]["content"],
        &choice["message"]["content"],
    ]
    .into_iter()
    .filter_map(Value::as_str)
    .find(|text| !text.is_empty())
    .unwrap_or("")
}

/// Extract the error carried by a structured payload, if it carries one.
///
/// Two shapes are recognised:
///
/// ```text
/// {"error":{"message":"Rate limit exceeded","type":"rate_limit_error"}}
/// {"code":40001,"msg":"invalid token"}
/// ```
#[must_use]
pub fn error_message(payload: &Value) -> Option<String> {
    let error = &payload["error"];
    match error {
        Value::Null => {}
        Value::String(text) => return Some(text.clone()),
        Value::Object(_) => {
            let text = error["message"].as_str().unwrap_or(UNKNOWN_ERROR);
            return Some(text.to_string());
        }
        _ => {}
    }

    if is_truthy(&payload["code"]) {
        let text = ["msg", "message"]
            .into_iter()
            .find_map(|key| payload[key].as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("error code {}", payload["code"]));
        return Some(text);
    }

    None
}

/// Best-effort human-readable text for a non-200 response body.
///
/// Looks for `error.message`, then `message`, then `msg`; falls back to the
/// raw body, and to `HTTP <status>` when the body is blank.
#[must_use]
pub fn status_error_text(body: &str, status: u16) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let found = [
            &json["error"]["message"],
            &json["message"],
            &json["msg"],
        ]
        .into_iter()
        .filter_map(Value::as_str)
        .find(|text| !text.is_empty());
        if let Some(text) = found {
            return text.to_string();
        }
    }

    let raw = body.trim();
    if raw.is_empty() {
        format!("HTTP {status}")
    } else {
        raw.to_string()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
