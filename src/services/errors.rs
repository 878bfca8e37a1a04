use thiserror::Error;

use crate::domain::notification::{Notification, NotificationAction};
use crate::domain::types::RecordId;
use crate::endpoints::errors::EndpointError;
use crate::forms::FormError;

/// Errors returned by the list services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error("record {0} not found")]
    RecordNotFound(RecordId),

    #[error("no records selected")]
    EmptySelection,

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("type constraint violated: {0}")]
    TypeConstraint(String),

    #[error(transparent)]
    Form(#[from] FormError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Maps an endpoint failure of `action` to what the user is told.
pub fn endpoint_notification(action: &str, error: &EndpointError) -> Notification {
    match error {
        EndpointError::Unauthorized => {
            Notification::error("Your session has expired. Please sign in again.")
                .with_action(NotificationAction::SignIn)
        }
        EndpointError::RouteNotFound(route) => Notification::error(format!(
            "{action} failed: {route} does not exist. Check the endpoint configuration."
        )),
        EndpointError::Validation { message, .. } => {
            let fields = error.field_messages();
            if fields.is_empty() {
                Notification::error(message.clone())
            } else {
                Notification::error(fields.join("\n"))
            }
        }
        EndpointError::Rejected(message) => Notification::error(message.clone()),
        err if err.is_transient() => Notification::warning(format!(
            "{action} failed. Check your connection and try again."
        ))
        .with_action(NotificationAction::Retry),
        _ => Notification::error(format!("{action} failed.")),
    }
}

impl ServiceError {
    pub fn notification(&self, action: &str) -> Notification {
        match self {
            ServiceError::Endpoint(err) => endpoint_notification(action, err),
            ServiceError::RecordNotFound(_) => Notification::warning("No record selected."),
            ServiceError::EmptySelection => Notification::info("No records selected."),
            other => Notification::error(other.to_string()),
        }
    }
}
