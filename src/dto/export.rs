//! Export request, response normalization and the flat table handed to the
//! file writer.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::query::{QuerySnapshot, SortDirection};
use crate::domain::record::Record;
use crate::dto::list::json_kind;
use crate::dto::record::normalize_records;
use crate::endpoints::errors::{EndpointError, EndpointResult};

/// Same criteria as the list request, without pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<SortDirection>,
    pub filters: BTreeMap<String, String>,
}

impl ExportRequest {
    pub fn from_query(query: &QuerySnapshot) -> Self {
        Self {
            search: query.search_term().map(str::to_string),
            sort_by: query.sort.as_ref().map(|sort| sort.key.to_string()),
            sort_dir: query.sort.as_ref().map(|sort| sort.direction),
            filters: query
                .active_filters()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(search) = &self.search {
            params.push(("search".to_string(), search.clone()));
        }
        if let Some(sort_by) = &self.sort_by {
            params.push(("sort_by".to_string(), sort_by.clone()));
            let direction = self.sort_dir.unwrap_or_default();
            params.push(("sort_dir".to_string(), direction.to_string()));
        }
        params.extend(
            self.filters
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        params
    }

    pub fn query_string(&self) -> EndpointResult<String> {
        serde_html_form::to_string(self.to_params())
            .map_err(|err| EndpointError::Decode(format!("cannot encode query: {err}")))
    }
}

/// Normalizes `{success, data, message?}`; a bare array is tolerated.
pub fn normalize_export_response(body: &Value) -> EndpointResult<Vec<Record>> {
    match body {
        Value::Array(items) => Ok(normalize_records(items)),
        Value::Object(envelope) => {
            if let Some(Value::Bool(false)) = envelope.get("success") {
                let message = envelope
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("export failed");
                return Err(EndpointError::Rejected(message.to_string()));
            }
            match envelope.get("data") {
                Some(Value::Array(items)) => Ok(normalize_records(items)),
                Some(Value::Null) | None => Ok(Vec::new()),
                Some(other) => Err(EndpointError::Decode(format!(
                    "export `data` is {}, expected an array",
                    json_kind(other)
                ))),
            }
        }
        other => Err(EndpointError::Decode(format!(
            "unrecognized export response: {}",
            json_kind(other)
        ))),
    }
}

/// One exported column: the record field it reads and its header label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportColumn {
    pub key: String,
    pub header: String,
}

impl ExportColumn {
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
        }
    }
}

/// Flat tabular form of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    /// Builds the table from `columns`, or from every field present in the
    /// records when no columns are configured.
    pub fn build(records: &[Record], columns: &[ExportColumn]) -> Self {
        let columns = if columns.is_empty() {
            default_columns(records)
        } else {
            columns.to_vec()
        };

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.field(&column.key).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self {
            headers: columns.into_iter().map(|column| column.header).collect(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn default_columns(records: &[Record]) -> Vec<ExportColumn> {
    let mut columns = vec![
        ExportColumn::new("id", "id"),
        ExportColumn::new("status", "status"),
    ];
    let mut extra: Vec<&String> = records.iter().flat_map(|r| r.fields.keys()).collect();
    extra.sort();
    extra.dedup();
    columns.extend(extra.into_iter().map(|key| ExportColumn::new(key, key)));
    columns.push(ExportColumn::new("notes", "notes"));
    columns.push(ExportColumn::new("created_at", "created_at"));
    columns
}
