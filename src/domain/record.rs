use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::types::RecordId;

/// Workflow status of a lead or application.
///
/// Known statuses are matched case-insensitively and sent back capitalized,
/// the way the admin API lists them. Anything else is kept verbatim so that
/// tables with their own workflow still round-trip.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordStatus {
    #[default]
    New,
    Contacted,
    Closed,
    Other(String),
}

impl RecordStatus {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_lowercase().as_str() {
            "new" => RecordStatus::New,
            "contacted" => RecordStatus::Contacted,
            "closed" => RecordStatus::Closed,
            _ => RecordStatus::Other(trimmed.to_string()),
        }
    }

    /// Value sent to and received from the endpoints.
    pub fn as_wire(&self) -> &str {
        match self {
            RecordStatus::New => "New",
            RecordStatus::Contacted => "Contacted",
            RecordStatus::Closed => "Closed",
            RecordStatus::Other(value) => value,
        }
    }
}

impl Display for RecordStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl From<String> for RecordStatus {
    fn from(value: String) -> Self {
        RecordStatus::parse(&value)
    }
}

impl From<RecordStatus> for String {
    fn from(value: RecordStatus) -> Self {
        value.as_wire().to_string()
    }
}

/// A normalized entity displayed in a list view.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub status: RecordStatus,
    pub notes: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    /// Remaining display fields as sent by the server.
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: RecordId, status: RecordStatus) -> Self {
        Self {
            id,
            status,
            notes: None,
            created_at: None,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns the display value of a column, whether it is a well-known
    /// attribute or one of the free-form fields.
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.to_string()),
            "status" => Some(self.status.to_string()),
            "notes" | "admin_notes" => self.notes.clone(),
            "created_at" => self
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string()),
            other => match self.fields.get(other)? {
                Value::Null => None,
                Value::String(value) => Some(value.clone()),
                value => Some(value.to_string()),
            },
        }
    }

    /// Applies a partial update in place.
    pub fn apply(&mut self, patch: &RecordPatch) {
        if let Some(status) = &patch.status {
            self.status = status.clone();
        }
        if let Some(notes) = &patch.notes {
            self.notes = Some(notes.clone()).filter(|n| !n.is_empty());
        }
    }
}

/// Partial update sent to the mutation endpoint.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct RecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    #[serde(rename = "admin_notes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RecordPatch {
    pub fn status(status: RecordStatus) -> Self {
        Self {
            status: Some(status),
            notes: None,
        }
    }

    /// Notes are sanitized and trimmed before they reach the store.
    pub fn notes(notes: impl AsRef<str>) -> Self {
        Self {
            status: None,
            notes: Some(ammonia::clean(notes.as_ref()).trim().to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64) -> Record {
        Record::new(RecordId::new(id).expect("valid id"), RecordStatus::New)
    }

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!(RecordStatus::parse("Closed"), RecordStatus::Closed);
        assert_eq!(RecordStatus::parse(" CONTACTED "), RecordStatus::Contacted);
        assert_eq!(
            RecordStatus::parse("approved"),
            RecordStatus::Other("approved".to_string())
        );
        assert_eq!(RecordStatus::Closed.as_wire(), "Closed");
        assert_eq!(RecordStatus::Closed.to_string(), "Closed");
    }

    #[test]
    fn status_is_sent_back_as_listed() {
        let status: RecordStatus =
            serde_json::from_value(serde_json::json!("Closed")).expect("valid status");
        let body = serde_json::to_value(RecordPatch::status(status)).expect("serializable patch");
        assert_eq!(body, serde_json::json!({"status": "Closed"}));

        let status: RecordStatus =
            serde_json::from_value(serde_json::json!("approved")).expect("valid status");
        assert_eq!(
            serde_json::to_value(&status).expect("serializable status"),
            serde_json::json!("approved")
        );
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let body = serde_json::to_value(RecordPatch::status(RecordStatus::Closed))
            .expect("serializable patch");
        assert_eq!(body, serde_json::json!({"status": "Closed"}));

        let body = serde_json::to_value(RecordPatch::notes("call back on monday"))
            .expect("serializable patch");
        assert_eq!(body, serde_json::json!({"admin_notes": "call back on monday"}));
    }

    #[test]
    fn notes_are_sanitized() {
        let patch = RecordPatch::notes("  <script>alert(1)</script>hello ");
        assert_eq!(patch.notes.as_deref(), Some("hello"));
    }

    #[test]
    fn apply_overwrites_only_patched_fields() {
        let mut record = record(7);
        record.notes = Some("first call".to_string());

        record.apply(&RecordPatch::status(RecordStatus::Closed));
        assert_eq!(record.status, RecordStatus::Closed);
        assert_eq!(record.notes.as_deref(), Some("first call"));

        record.apply(&RecordPatch::notes(""));
        assert_eq!(record.notes, None);
    }

    #[test]
    fn field_lookup_covers_known_and_free_form_columns() {
        let record = record(3)
            .with_field("name", "Alice")
            .with_field("course_id", 12)
            .with_field("phone", Value::Null);

        assert_eq!(record.field("id").as_deref(), Some("3"));
        assert_eq!(record.field("status").as_deref(), Some("New"));
        assert_eq!(record.field("name").as_deref(), Some("Alice"));
        assert_eq!(record.field("course_id").as_deref(), Some("12"));
        assert_eq!(record.field("phone"), None);
        assert_eq!(record.field("missing"), None);
    }
}
