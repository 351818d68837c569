use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderMap},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Request bodies larger than this are refused.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Parse a query string into a JSON object. Repeated keys collect into an
/// array (`?h=a&h=b` becomes `{"h": ["a", "b"]}`).
pub fn parse_query(query: Option<&str>) -> Value {
    let mut map = Map::new();
    let Some(query) = query else {
        return Value::Object(map);
    };

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }

    Value::Object(map)
}

/// Decode a request body by content type. JSON and urlencoded forms are
/// understood; an empty body or any other content type reads as `{}`.
pub fn parse_body(content_type: Option<&str>, bytes: &[u8]) -> Result<Value, ApiError> {
    if bytes.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if mime == "application/x-www-form-urlencoded" {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| ApiError::bad_request("Form body is not valid UTF-8"))?;
        return Ok(parse_query(Some(text)));
    }

    if mime == "application/json" || mime.ends_with("+json") {
        return serde_json::from_slice(bytes)
            .map_err(|e| ApiError::bad_request(format!("Malformed JSON body: {}", e)));
    }

    Ok(Value::Object(Map::new()))
}

pub fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

/// JSON-or-form body extractor whose rejections go through [`ApiError`].
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = content_type(req.headers()).map(str::to_owned);
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        let value = parse_body(content_type.as_deref(), &bytes)?;
        serde_json::from_value(value)
            .map(Payload)
            .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
    }
}
