//! Form definitions backing inline record edits.

use thiserror::Error;
use validator::ValidationErrors;

pub mod record;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid record id")]
    InvalidRecordId,

    #[error("invalid status")]
    InvalidStatus,
}
