use serde::Deserialize;
use validator::Validate;

use crate::domain::record::{RecordPatch, RecordStatus};
use crate::domain::types::RecordId;
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
/// Status dropdown of a list row or the detail view.
pub struct StatusForm {
    /// Record identifier.
    pub id: i64,
    /// New status as sent by the dropdown.
    #[validate(length(min = 1, max = 32))]
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
/// Admin notes textarea.
pub struct NotesForm {
    /// Record identifier.
    pub id: i64,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub notes: String,
}

impl StatusForm {
    /// Validates the form and returns the target record with its patch.
    pub fn into_patch(self) -> Result<(RecordId, RecordPatch), FormError> {
        self.validate()?;
        let id = RecordId::new(self.id)?;
        match RecordStatus::parse(&self.status) {
            RecordStatus::Other(value) if value.is_empty() => Err(FormError::InvalidStatus),
            status => Ok((id, RecordPatch::status(status))),
        }
    }
}

impl NotesForm {
    pub fn into_patch(self) -> Result<(RecordId, RecordPatch), FormError> {
        self.validate()?;
        let id = RecordId::new(self.id)?;
        Ok((id, RecordPatch::notes(&self.notes)))
    }
}
