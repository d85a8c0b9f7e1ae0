//! Reply normalization.
//!
//! Extracts a display string from a [`GenerateResult`] of unknown shape. The
//! probes run in a fixed priority order and the first one that yields text
//! wins:
//!
//! 1. absent result: `"(no response)"`
//! 2. the result is a string
//! 3. a direct `outputText` field
//! 4. a nested `response`: a string, then a `text` accessor (awaited when
//!    deferred), then its `outputText`. A present response ends the search:
//!    when it has no text the reply is empty and later probes never run.
//! 5. the content of the first candidate
//! 6. the whole result serialized as JSON, truncated to [`FALLBACK_MAX_CHARS`]

use serde_json::Value;

use crate::client::GenerateError;
use crate::response::{DeferredText, GenerateResult, ResponseShape, ResultObject, TextField};

/// Reply used when the call returned nothing at all.
pub const NO_RESPONSE: &str = "(no response)";

/// Maximum length of the serialized fallback, in characters.
pub const FALLBACK_MAX_CHARS: usize = 1000;

/// Outcome of probing a result: text ready now, or a producer to await.
#[derive(Debug)]
pub enum Resolution {
    Ready(String),
    Deferred(DeferredText),
}

impl Resolution {
    /// Turn the resolution into text, awaiting a deferred producer.
    pub async fn into_text(self) -> Result<String, GenerateError> {
        match self {
            Resolution::Ready(text) => Ok(text),
            Resolution::Deferred(producer) => producer.resolve().await,
        }
    }
}

type Probe = fn(&mut ResultObject) -> Option<Resolution>;

/// Object probes in priority order.
const PROBES: [Probe; 3] = [direct_text, nested_response, first_candidate];

/// Normalize a result into display text.
///
/// Fails only when a deferred text producer fails.
pub async fn normalize(result: Option<GenerateResult>) -> Result<String, GenerateError> {
    resolve(result).into_text().await
}

/// Pick the resolution for a result without awaiting anything.
pub fn resolve(result: Option<GenerateResult>) -> Resolution {
    let mut object = match result {
        None => return Resolution::Ready(NO_RESPONSE.to_string()),
        Some(GenerateResult::Text(text)) => return Resolution::Ready(text),
        Some(GenerateResult::Raw(value)) => return Resolution::Ready(serialized_fallback(&value)),
        Some(GenerateResult::Object(object)) => object,
    };

    for probe in PROBES {
        if let Some(resolution) = probe(&mut object) {
            return resolution;
        }
    }

    Resolution::Ready(serialized_fallback(&object))
}

fn direct_text(object: &mut ResultObject) -> Option<Resolution> {
    non_empty(object.output_text.clone()).map(Resolution::Ready)
}

fn nested_response(object: &mut ResultObject) -> Option<Resolution> {
    let response = match object.response.as_mut()? {
        // An empty string is falsy and does not claim the result.
        ResponseShape::Text(text) if text.is_empty() => return None,
        ResponseShape::Text(text) => return Some(Resolution::Ready(std::mem::take(text))),
        ResponseShape::Other(_) => return Some(Resolution::Ready(String::new())),
        ResponseShape::Object(response) => response,
    };

    match response.text.take() {
        Some(TextField::Deferred(producer)) => return Some(Resolution::Deferred(producer)),
        Some(TextField::Value(text)) if !text.is_empty() => return Some(Resolution::Ready(text)),
        Some(TextField::Value(_)) | None => {}
    }

    Some(Resolution::Ready(
        response.output_text.clone().unwrap_or_default(),
    ))
}

fn first_candidate(object: &mut ResultObject) -> Option<Resolution> {
    let content = object.candidates.as_ref()?.first()?.get("content")?;
    content_text(content).map(Resolution::Ready)
}

/// Text carried by a candidate's `content`.
///
/// Accepts a plain string or the `{"parts": [{"text": ..}]}` shape the
/// generation API uses; any other non-null content is rendered as JSON.
fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::Null => None,
        Value::String(text) => non_empty(Some(text.clone())),
        Value::Object(map) => {
            let parts = map.get("parts").and_then(Value::as_array);
            let joined: String = parts
                .into_iter()
                .flatten()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            if joined.is_empty() {
                Some(content.to_string())
            } else {
                Some(joined)
            }
        }
        other => Some(other.to_string()),
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

fn serialized_fallback<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json.chars().take(FALLBACK_MAX_CHARS).collect(),
        Err(e) => {
            tracing::warn!("could not serialize model result: {e}");
            String::new()
        }
    }
}
