//! Error conversion glue between layers.
//!
//! The domain layer must not depend on service or endpoint error types, so
//! the conversions live here.

use crate::domain::types::TypeConstraintError;
use crate::endpoints::errors::EndpointError;
use crate::forms::FormError;
use crate::services::errors::ServiceError;

impl From<TypeConstraintError> for ServiceError {
    fn from(val: TypeConstraintError) -> Self {
        ServiceError::TypeConstraint(val.to_string())
    }
}

impl From<TypeConstraintError> for EndpointError {
    fn from(val: TypeConstraintError) -> Self {
        EndpointError::Decode(val.to_string())
    }
}

impl From<TypeConstraintError> for FormError {
    fn from(val: TypeConstraintError) -> Self {
        match val {
            TypeConstraintError::NonPositiveId => FormError::InvalidRecordId,
            _ => FormError::InvalidStatus,
        }
    }
}
