//! Response decoding and rewriting
//!
//! Decodes upstream bodies into `serde_json` values and writes filtered
//! payloads back into outgoing responses with consistent `Content-Type` and
//! `Content-Length` headers.

use crate::error::{FilterError, FilterResult};
use crate::upstream::UpstreamResponse;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::Response;
use serde_json::{Map, Value, json};

/// Message of the access denied response
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied to resource";

/// Headers recomputed whenever a body is rewritten
const BODY_HEADERS: [header::HeaderName; 4] = [
    header::CONTENT_LENGTH,
    header::CONTENT_TYPE,
    header::CONTENT_ENCODING,
    header::TRANSFER_ENCODING,
];

/// Decode an upstream body that must be a JSON array
pub fn response_as_json_array(body: &[u8]) -> FilterResult<Vec<Value>> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Array(items) => Ok(items),
        other => Err(FilterError::InvalidResponse(format!(
            "expected a JSON array, got {}",
            kind(&other)
        ))),
    }
}

/// Decode an upstream body that must be a JSON object
pub fn response_as_json_object(body: &[u8]) -> FilterResult<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(object) => Ok(object),
        other => Err(FilterError::InvalidResponse(format!(
            "expected a JSON object, got {}",
            kind(&other)
        ))),
    }
}

/// Replace the body of an upstream response with `payload`.
///
/// Upstream headers survive, except the ones describing the old body.
pub fn rewrite_response(
    upstream_headers: &HeaderMap,
    payload: &Value,
    status: StatusCode,
) -> Response {
    let mut headers = upstream_headers.clone();
    for name in BODY_HEADERS {
        headers.remove(&name);
    }
    json_response(headers, payload, status)
}

/// The canonical access denied response. Carries no upstream content.
pub fn rewrite_access_denied_response() -> Response {
    json_response(
        HeaderMap::new(),
        &json!({ "message": ACCESS_DENIED_MESSAGE }),
        StatusCode::FORBIDDEN,
    )
}

/// Return an upstream response untouched
pub fn passthrough(upstream: UpstreamResponse) -> Response {
    let mut headers = upstream.headers;
    // the body is re-framed by the server
    headers.remove(header::TRANSFER_ENCODING);
    headers.remove(header::CONNECTION);

    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = headers;
    response
}

fn json_response(mut headers: HeaderMap, payload: &Value, status: StatusCode) -> Response {
    let body = payload.to_string().into_bytes();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
