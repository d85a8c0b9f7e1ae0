//! Possible shapes of a remote generation result.
//!
//! The generation API does not commit to a single result shape, so results are
//! modeled as a tagged union. [`crate::normalize`] turns any of these into a
//! display string.

use std::fmt;
use std::future::Future;

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::GenerateError;

/// A result returned by a [`crate::client::TextGenerator`].
///
/// An absent result is represented as `Option::<GenerateResult>::None`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GenerateResult {
    /// The result is itself the reply text.
    Text(String),
    /// A structured result object.
    Object(ResultObject),
    /// Any other JSON value (number, array, bool).
    Raw(Value),
}

/// Structured result object.
#[derive(Debug, Default, Serialize)]
pub struct ResultObject {
    /// Text placed directly on the result.
    #[serde(rename = "outputText", skip_serializing_if = "Option::is_none")]
    pub output_text: Option<String>,

    /// Nested response object or string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseShape>,

    /// Candidate outputs, first one preferred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<Value>>,

    /// Fields with no special meaning, kept for the serialized fallback.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The nested `response` member of a result object.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResponseShape {
    Text(String),
    Object(ResponseObject),
    /// Any other truthy value (number, array, `true`). Carries no text.
    Other(Value),
}

/// Nested response object.
#[derive(Debug, Default, Serialize)]
pub struct ResponseObject {
    /// Primary text accessor, possibly deferred.
    #[serde(skip_serializing_if = "TextField::is_not_serializable")]
    pub text: Option<TextField>,

    /// Alternate text field.
    #[serde(rename = "outputText", skip_serializing_if = "Option::is_none")]
    pub output_text: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A text accessor that is either a plain value or a deferred producer.
#[derive(Debug)]
pub enum TextField {
    Value(String),
    Deferred(DeferredText),
}

impl TextField {
    #[allow(clippy::ref_option)]
    fn is_not_serializable(field: &Option<TextField>) -> bool {
        !matches!(field, Some(TextField::Value(_)))
    }
}

impl Serialize for TextField {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TextField::Value(text) => serializer.serialize_str(text),
            TextField::Deferred(_) => serializer.serialize_none(),
        }
    }
}

/// A producer that yields the reply text when invoked and awaited.
pub struct DeferredText(Box<dyn FnOnce() -> BoxFuture<'static, Result<String, GenerateError>> + Send>);

impl DeferredText {
    /// Wrap a closure returning a future of text.
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<String, GenerateError>> + Send + 'static,
    {
        Self(Box::new(move || producer().boxed()))
    }

    /// A producer that immediately yields `text`.
    pub fn ready(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move || async move { Ok(text) })
    }

    /// Invoke the producer and await its text.
    pub async fn resolve(self) -> Result<String, GenerateError> {
        (self.0)().await
    }
}

impl fmt::Debug for DeferredText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeferredText(..)")
    }
}

impl GenerateResult {
    /// Build a result from a decoded JSON body. `null` maps to `None`.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(text) => Some(Self::Text(text)),
            Value::Object(map) => Some(Self::Object(ResultObject::from_map(map))),
            other => Some(Self::Raw(other)),
        }
    }
}

impl ResultObject {
    fn from_map(mut map: Map<String, Value>) -> Self {
        let output_text = take_string(&mut map, "outputText");

        let response = match map.remove("response") {
            Some(Value::String(text)) if !text.is_empty() => Some(ResponseShape::Text(text)),
            Some(Value::Object(inner)) => Some(ResponseShape::Object(ResponseObject::from_map(inner))),
            Some(other) if is_truthy(&other) => Some(ResponseShape::Other(other)),
            // A falsy response counts as absent.
            Some(other) => {
                map.insert("response".into(), other);
                None
            }
            None => None,
        };

        let candidates = match map.remove("candidates") {
            Some(Value::Array(items)) => Some(items),
            Some(other) => {
                map.insert("candidates".into(), other);
                None
            }
            None => None,
        };

        Self {
            output_text,
            response,
            candidates,
            extra: map,
        }
    }
}

impl ResponseObject {
    fn from_map(mut map: Map<String, Value>) -> Self {
        let text = take_string(&mut map, "text").map(TextField::Value);
        let output_text = take_string(&mut map, "outputText");
        Self {
            text,
            output_text,
            extra: map,
        }
    }
}

/// JavaScript truthiness of a JSON value.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Remove `key` from the map if it holds a string; other values stay put.
fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !map.get(key).is_some_and(Value::is_string) {
        return None;
    }
    match map.remove(key) {
        Some(Value::String(text)) => Some(text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_null_is_absent() {
        assert!(GenerateResult::from_json(Value::Null).is_none());
    }

    #[test]
    fn test_from_json_string() {
        let result = GenerateResult::from_json(json!("hi")).unwrap();
        assert!(matches!(result, GenerateResult::Text(ref t) if t == "hi"));
    }

    #[test]
    fn test_from_json_splits_known_fields() {
        let result = GenerateResult::from_json(json!({
            "response": {"text": "hi", "usage": 3},
            "candidates": [{"content": "c"}],
            "modelVersion": "gemini-2.5-flash"
        }))
        .unwrap();

        let GenerateResult::Object(object) = result else {
            panic!("expected object");
        };
        assert!(object.output_text.is_none());
        assert_eq!(object.candidates.as_ref().map(Vec::len), Some(1));
        assert_eq!(object.extra.get("modelVersion"), Some(&json!("gemini-2.5-flash")));

        let Some(ResponseShape::Object(response)) = object.response else {
            panic!("expected nested response object");
        };
        assert!(matches!(response.text, Some(TextField::Value(ref t)) if t == "hi"));
        assert_eq!(response.extra.get("usage"), Some(&json!(3)));
    }

    #[test]
    fn test_non_string_fields_stay_in_extra() {
        let result = GenerateResult::from_json(json!({"outputText": 42, "response": 7})).unwrap();
        let GenerateResult::Object(object) = result else {
            panic!("expected object");
        };
        assert!(object.output_text.is_none());
        assert!(matches!(object.response, Some(ResponseShape::Other(ref v)) if v == &json!(7)));
        assert_eq!(serde_json::to_value(&object).unwrap(), json!({"outputText": 42, "response": 7}));
    }

    #[test]
    fn test_falsy_response_is_absent() {
        for falsy in [json!(null), json!(false), json!(0), json!("")] {
            let result = GenerateResult::from_json(json!({ "response": falsy.clone() })).unwrap();
            let GenerateResult::Object(object) = result else {
                panic!("expected object");
            };
            assert!(object.response.is_none(), "{falsy} kept as response");
            assert_eq!(object.extra.get("response"), Some(&falsy));
        }
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!(-1.5)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
    }

    #[test]
    fn test_deferred_text_is_not_serialized() {
        let object = ResponseObject {
            text: Some(TextField::Deferred(DeferredText::ready("later"))),
            output_text: None,
            extra: Map::new(),
        };
        assert_eq!(serde_json::to_value(&object).unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_deferred_text_resolves() {
        let deferred = DeferredText::new(|| async { Ok("produced".to_string()) });
        assert_eq!(deferred.resolve().await.unwrap(), "produced");
    }
}
