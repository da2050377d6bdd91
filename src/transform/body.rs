//! JSON request body rewriting.
//!
//! Removes a configured set of top-level keys from JSON object bodies.
//! Only bodies declared exactly as `application/json` are considered; any
//! body that fails to parse is reported as an error so the caller can fall
//! back to the original bytes.

use axum::body::Bytes;
use axum::http::{header, HeaderMap};
use serde_json::Value;

/// The only content type whose bodies are rewritten (exact, case-sensitive).
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Failure to rewrite a body. The body must then be forwarded untouched.
#[derive(Debug, thiserror::Error)]
pub enum BodyTransformError {
    #[error("body is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to re-encode JSON body: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A rewritten body and the keys that were taken out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct StrippedBody {
    pub bytes: Bytes,
    pub removed: Vec<String>,
}

/// Returns true when the `Content-Type` header is exactly `application/json`.
///
/// Parameters such as `; charset=utf-8` disable the rewrite.
pub fn is_json_body(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes() == JSON_CONTENT_TYPE.as_bytes())
}

/// Remove `fields` from the top level of a JSON object in place.
///
/// Non-object values are left alone. Key order of the remaining entries is kept.
pub fn strip_value(value: &mut Value, fields: &[String]) -> Vec<String> {
    let Value::Object(map) = value else {
        return Vec::new();
    };

    fields
        .iter()
        .filter(|field| map.shift_remove(field.as_str()).is_some())
        .cloned()
        .collect()
}

/// Parse `body`, strip `fields`, and re-encode compactly.
///
/// The body is re-encoded even if nothing was removed.
pub fn strip_fields(body: &[u8], fields: &[String]) -> Result<StrippedBody, BodyTransformError> {
    let mut value: Value = serde_json::from_slice(body).map_err(BodyTransformError::Parse)?;
    let removed = strip_value(&mut value, fields);
    let bytes = serde_json::to_vec(&value).map_err(BodyTransformError::Encode)?;

    Ok(StrippedBody {
        bytes: Bytes::from(bytes),
        removed,
    })
}
