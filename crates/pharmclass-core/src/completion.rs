//! Chat-completion payload extraction
//!
//! Providers answer with the OpenAI chat-completions envelope:
//! ```text
//! {"id":"chatcmpl-xxx","object":"chat.completion","choices":[{"index":0,"message":{"role":"assistant","content":"{...}"},"finish_reason":"stop"}]}
//! ```
//! The classification payload is the JSON object carried as a string in
//! `choices[0].message.content`, sometimes wrapped in a Markdown code fence.

use serde::Deserialize;

use crate::{Error, RawResponse, Result};

/// Extract the classification payload from a provider response body.
///
/// Bodies without a `choices` array are treated as the payload itself.
pub fn extract_json_payload(body: &str) -> Result<RawResponse> {
    let value: serde_json::Value = serde_json::from_str(body)?;

    if value.get("choices").is_none() {
        return match value {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(Error::response(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        };
    }

    let completion: ChatCompletion = serde_json::from_value(value)?;
    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::response("completion has no message content"))?;

    parse_content(&content)
}

fn parse_content(content: &str) -> Result<RawResponse> {
    let payload = strip_code_fence(content);
    if payload.is_empty() {
        return Err(Error::response("message content is empty"));
    }

    match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::response(format!(
            "message content is a JSON {}, not an object",
            json_kind(&other)
        ))),
        Err(e) => Err(Error::response(format!(
            "message content is not valid JSON: {}",
            e
        ))),
    }
}

/// Remove a surrounding ```json ... ``` fence if present
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };

    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// =============================================================================
// Chat Completion Structures
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
