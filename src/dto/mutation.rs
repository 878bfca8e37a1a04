//! Response shapes of the record mutation endpoint.

use serde_json::Value;

use crate::domain::record::Record;
use crate::dto::record::normalize_record;
use crate::endpoints::errors::{EndpointError, EndpointResult};

/// Extracts the updated record echoed by the server, if any.
///
/// `{"data": {...}}` and a bare record object are recognized. Any other
/// successful body is a partial success and yields `None`.
pub fn normalize_mutation_response(body: &Value) -> EndpointResult<Option<Record>> {
    let Value::Object(envelope) = body else {
        return Ok(None);
    };

    if let Some(Value::Bool(false)) = envelope.get("success") {
        let message = envelope
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("the server rejected the update");
        return Err(EndpointError::Rejected(message.to_string()));
    }

    match envelope.get("data") {
        Some(data @ Value::Object(_)) => Ok(normalize_record(data).ok()),
        _ if envelope.contains_key("id") => Ok(normalize_record(body).ok()),
        _ => Ok(None),
    }
}
