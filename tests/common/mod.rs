//! In-memory admin API used by the integration tests.
//!
//! Responses are built as JSON and go through the same normalization as the
//! HTTP endpoints.
#![allow(dead_code)]

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};

use pushkind_leads::domain::record::{Record, RecordPatch};
use pushkind_leads::domain::types::RecordId;
use pushkind_leads::dto::export::{ExportRequest, normalize_export_response};
use pushkind_leads::dto::list::{ListPage, ListRequest, normalize_list_response};
use pushkind_leads::dto::mutation::normalize_mutation_response;
use pushkind_leads::endpoints::errors::{EndpointError, EndpointResult};
use pushkind_leads::endpoints::{ExportEndpoint, ListEndpoint, MutationEndpoint};

pub struct FakeAdminApi {
    rows: Mutex<Vec<Value>>,
    requests: Mutex<Vec<ListRequest>>,
}

impl FakeAdminApi {
    /// `count` leads; every third one is closed, the rest are new.
    pub fn with_leads(count: i64) -> Self {
        let rows = (1..=count)
            .map(|id| {
                json!({
                    "id": id,
                    "name": format!("Lead {id:03}"),
                    "email": format!("lead{id}@example.com"),
                    "status": if id % 3 == 0 { "Closed" } else { "New" },
                    "admin_notes": null,
                    "created_at": "2024-05-01 09:30:00"
                })
            })
            .collect();
        Self {
            rows: Mutex::new(rows),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ListRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn row(&self, id: i64) -> Option<Value> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|row| row["id"] == json!(id))
            .cloned()
    }

    fn matching(
        &self,
        search: Option<&str>,
        filters: &std::collections::BTreeMap<String, String>,
        sort: Option<(&str, bool)>,
    ) -> Vec<Value> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let mut matching: Vec<Value> = rows
            .iter()
            .filter(|row| {
                search.is_none_or(|term| {
                    row["name"]
                        .as_str()
                        .is_some_and(|name| name.to_lowercase().contains(&term.to_lowercase()))
                })
            })
            .filter(|row| {
                filters.iter().all(|(name, value)| {
                    row[name.as_str()]
                        .as_str()
                        .is_some_and(|field| field.eq_ignore_ascii_case(value))
                })
            })
            .cloned()
            .collect();

        if let Some((key, descending)) = sort {
            matching.sort_by(|a, b| a[key].to_string().cmp(&b[key].to_string()));
            if descending {
                matching.reverse();
            }
        }
        matching
    }
}

#[async_trait]
impl ListEndpoint for FakeAdminApi {
    async fn fetch_page(&self, request: ListRequest) -> EndpointResult<ListPage> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let sort = request.sort_by.as_deref().map(|key| {
            (
                key,
                request.sort_dir.map(|dir| dir.as_str()) == Some("desc"),
            )
        });
        let matching = self.matching(request.search.as_deref(), &request.filters, sort);

        let per_page = request.limit.max(1) as usize;
        let last_page = matching.len().div_ceil(per_page).max(1);
        // Laravel-style backends answer with the last page when asked past it.
        let current_page = (request.page as usize).min(last_page);
        let data: Vec<Value> = matching
            .iter()
            .skip((current_page - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect();

        let body = json!({
            "current_page": current_page,
            "data": data,
            "last_page": last_page,
            "per_page": per_page,
            "total": matching.len()
        });
        normalize_list_response(&body, &request)
    }
}

#[async_trait]
impl MutationEndpoint for FakeAdminApi {
    async fn update_record(
        &self,
        id: RecordId,
        patch: RecordPatch,
    ) -> EndpointResult<Option<Record>> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(row) = rows.iter_mut().find(|row| row["id"] == json!(id.get())) else {
            return Err(EndpointError::from_status(
                404,
                &format!("/api/leads/{id}"),
                "",
            ));
        };
        if let Some(status) = &patch.status {
            row["status"] = json!(status.as_wire());
        }
        if let Some(notes) = &patch.notes {
            row["admin_notes"] = json!(notes);
        }
        normalize_mutation_response(&json!({"success": true, "data": row.clone()}))
    }

    async fn delete_record(&self, id: RecordId) -> EndpointResult<()> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        rows.retain(|row| row["id"] != json!(id.get()));
        Ok(())
    }
}

#[async_trait]
impl ExportEndpoint for FakeAdminApi {
    async fn fetch_all(&self, request: ExportRequest) -> EndpointResult<Vec<Record>> {
        let sort = request.sort_by.as_deref().map(|key| {
            (
                key,
                request.sort_dir.map(|dir| dir.as_str()) == Some("desc"),
            )
        });
        let data = self.matching(request.search.as_deref(), &request.filters, sort);
        normalize_export_response(&json!({"success": true, "data": data}))
    }
}
