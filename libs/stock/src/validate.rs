use serde_json::Value;
use tracing::warn;

use crate::{FetchError, RawResponse};

/// Parses a 200 response and returns the value found at `path`.
///
/// Never retries. A body that is not JSON, or a field that is absent, `null`
/// or empty, is a [`FetchError::MalformedResponse`].
pub fn validate(response: &RawResponse, path: &[&str]) -> Result<Value, FetchError> {
    let body = parse_body(response)?;
    require(&body, path, response)
}

pub(crate) fn parse_body(response: &RawResponse) -> Result<Value, FetchError> {
    serde_json::from_str(&response.body).map_err(|e| {
        warn!(url = %response.url, error = %e, "response body is not JSON");
        FetchError::MalformedResponse {
            field: String::from("body"),
            context: response.url.to_string(),
        }
    })
}

pub(crate) fn require(body: &Value, path: &[&str], response: &RawResponse) -> Result<Value, FetchError> {
    let mut current = body;

    for (depth, segment) in path.iter().enumerate() {
        current = match current.get(*segment) {
            Some(value) if !is_empty(value) => value,
            _ => {
                return Err(FetchError::MalformedResponse {
                    field: path[..=depth].join("."),
                    context: response.url.to_string(),
                });
            }
        };
    }

    Ok(current.clone())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
