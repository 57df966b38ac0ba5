//! Bounded rendering of captured values.
//!
//! Every field that ends up in a transcript passes through here, so one
//! pathological payload (a 10 MB response body, a huge logged object) can
//! never blow up the output. Rendering never fails: values without a
//! serialized form fall back to their description.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Default maximum rendered length, in characters.
pub const DEFAULT_MAX_LEN: usize = 512;

/// Marker appended to truncated output.
pub const ELLIPSIS: &str = "...";

/// A value captured from the page, before rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum CapturedValue {
    /// Already textual; rendered verbatim.
    Text(String),
    /// A JSON-serializable structure; rendered as compact JSON.
    Json(serde_json::Value),
    /// Something with no serialized form (functions, DOM nodes, cyclic
    /// objects). Carries whatever description was available.
    Opaque(String),
}

impl CapturedValue {
    fn render(&self) -> String {
        match self {
            CapturedValue::Text(s) | CapturedValue::Opaque(s) => s.clone(),
            CapturedValue::Json(serde_json::Value::String(s)) => s.clone(),
            CapturedValue::Json(value) => value.to_string(),
        }
    }
}

impl From<&str> for CapturedValue {
    fn from(s: &str) -> Self {
        CapturedValue::Text(s.to_string())
    }
}

impl From<String> for CapturedValue {
    fn from(s: String) -> Self {
        CapturedValue::Text(s)
    }
}

impl From<serde_json::Value> for CapturedValue {
    fn from(value: serde_json::Value) -> Self {
        CapturedValue::Json(value)
    }
}

/// Renders a captured value, bounded to `max_len` characters plus [`ELLIPSIS`].
///
/// # Examples
///
/// ```
/// use pagescope_core::format::{format_value, CapturedValue};
///
/// let value = CapturedValue::Json(serde_json::json!({"a": 1}));
/// assert_eq!(format_value(&value, 512), r#"{"a":1}"#);
/// ```
#[must_use]
pub fn format_value(value: &CapturedValue, max_len: usize) -> String {
    truncate(value.render(), max_len)
}

/// Renders any serializable value as compact JSON, falling back to its
/// `Debug` form when serialization fails (non-string map keys, custom
/// serializers that refuse).
#[must_use]
pub fn format_serializable<T>(value: &T, max_len: usize) -> String
where
    T: Serialize + Debug + ?Sized,
{
    let rendered = serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"));
    truncate(rendered, max_len)
}

/// Formats each header value independently, preserving header order.
#[must_use]
pub fn format_headers(
    headers: &IndexMap<String, String>,
    max_len: usize,
) -> IndexMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| (name.clone(), truncate(value.clone(), max_len)))
        .collect()
}

/// Formats a request or response body as a whole.
#[must_use]
pub fn format_body(body: &str, max_len: usize) -> String {
    truncate(body.to_string(), max_len)
}

fn truncate(text: String, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => {
            let mut out = text[..cut].to_string();
            out.push_str(ELLIPSIS);
            out
        }
        None => text,
    }
}
