use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

/// Failures reported by the list, mutation and export collaborators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// The request never produced an HTTP response (offline, timeout, reset).
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP 401: the session is gone.
    #[error("Authentication required")]
    Unauthorized,

    /// HTTP 404: the route itself is missing, not the record behind it.
    #[error("Endpoint not found: {0}")]
    RouteNotFound(String),

    /// HTTP 422 with per-field messages.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    /// The server answered with `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Any other non-2xx status.
    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// The body did not match any accepted shape.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// The export file could not be written.
    #[error("Export file error: {0}")]
    Sink(String),
}

pub type EndpointResult<T> = Result<T, EndpointError>;

/// Body of a 422 response: `{"message": ..., "errors": {"field": ["..."]}}`.
#[derive(Debug, Default, Deserialize)]
struct ValidationBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

impl EndpointError {
    /// Classifies a non-success HTTP status together with its body.
    pub fn from_status(status: u16, route: &str, body: &str) -> Self {
        match status {
            401 => EndpointError::Unauthorized,
            404 => EndpointError::RouteNotFound(route.to_string()),
            422 => {
                let parsed: ValidationBody = serde_json::from_str(body).unwrap_or_default();
                EndpointError::Validation {
                    message: parsed
                        .message
                        .unwrap_or_else(|| "The given data was invalid.".to_string()),
                    fields: parsed.errors,
                }
            }
            _ => {
                let parsed: MessageBody = serde_json::from_str(body).unwrap_or_default();
                EndpointError::Status {
                    status,
                    message: parsed.message.unwrap_or_else(|| format!("HTTP {status}")),
                }
            }
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            EndpointError::Transport(_) => true,
            EndpointError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Field-level messages flattened as `field: message` lines.
    pub fn field_messages(&self) -> Vec<String> {
        match self {
            EndpointError::Validation { fields, .. } => fields
                .iter()
                .flat_map(|(field, messages)| {
                    messages.iter().map(move |message| format!("{field}: {message}"))
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}
