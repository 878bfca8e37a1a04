//! Request and response shapes of the paginated list endpoint.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::domain::query::{QuerySnapshot, SortDirection};
use crate::domain::record::Record;
use crate::dto::record::{as_u64, normalize_records};
use crate::endpoints::errors::{EndpointError, EndpointResult};

/// Query parameter names owned by the list endpoint itself.
pub const RESERVED_PARAMS: [&str; 5] = ["page", "limit", "search", "sort_by", "sort_dir"];

/// Parameters of one list request. Empty values are never present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<SortDirection>,
    pub filters: BTreeMap<String, String>,
}

impl ListRequest {
    pub fn from_query(query: &QuerySnapshot) -> Self {
        Self {
            page: query.page.max(1),
            limit: query.page_size.get(),
            search: query.search_term().map(str::to_string),
            sort_by: query.sort.as_ref().map(|sort| sort.key.to_string()),
            sort_dir: query.sort.as_ref().map(|sort| sort.direction),
            filters: query
                .active_filters()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }

    /// Query parameters in the order they are sent.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
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

/// Server-authoritative pagination state of the last successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub per_page: u32,
}

/// The envelope a list response arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    /// `[ {...}, ... ]`
    BareArray,
    /// `{ "data": [...], "current_page": ..., ... }`
    DataArray,
    /// `{ "items": [...], "page": ..., ... }`
    ItemsArray,
    /// `{ "success": true, "data": { "data": [...], "current_page": ... } }`
    NestedPaginator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    pub records: Vec<Record>,
    pub meta: PaginationMeta,
    pub shape: ListShape,
}

const CURRENT_PAGE_KEYS: [&str; 3] = ["current_page", "page", "currentPage"];
const TOTAL_KEYS: [&str; 3] = ["total", "totalItems", "total_items"];
const LAST_PAGE_KEYS: [&str; 4] = ["last_page", "lastPage", "total_pages", "totalPages"];
const PER_PAGE_KEYS: [&str; 3] = ["per_page", "perPage", "limit"];

/// Pagination fields may sit next to the records or in a `meta` /
/// `pagination` object.
fn pagination_sources(envelope: &Map<String, Value>) -> Vec<&Map<String, Value>> {
    let mut sources = vec![envelope];
    for key in ["meta", "pagination"] {
        if let Some(Value::Object(nested)) = envelope.get(key) {
            sources.push(nested);
        }
    }
    sources
}

fn pick(sources: &[&Map<String, Value>], keys: &[&str]) -> Option<u64> {
    sources
        .iter()
        .find_map(|source| keys.iter().find_map(|key| source.get(*key).and_then(as_u64)))
}

fn to_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn build_meta(
    sources: &[&Map<String, Value>],
    request: &ListRequest,
    record_count: usize,
) -> PaginationMeta {
    let current_page = pick(sources, &CURRENT_PAGE_KEYS).map(to_u32);
    let total = pick(sources, &TOTAL_KEYS);
    let per_page = pick(sources, &PER_PAGE_KEYS).map(to_u32).filter(|n| *n > 0);
    let last_page = pick(sources, &LAST_PAGE_KEYS).map(to_u32);

    let total_pages = match (last_page, total, per_page) {
        (Some(last_page), _, _) => last_page,
        (None, Some(total), Some(per_page)) => to_u32(total.div_ceil(u64::from(per_page))),
        _ => 1,
    };

    PaginationMeta {
        current_page: current_page.unwrap_or(request.page),
        total_items: total.unwrap_or(record_count as u64),
        total_pages,
        per_page: per_page.unwrap_or(request.limit),
    }
}

fn rejected(envelope: &Map<String, Value>) -> Option<EndpointError> {
    match envelope.get("success") {
        Some(Value::Bool(false)) => Some(EndpointError::Rejected(
            envelope
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("the server rejected the request")
                .to_string(),
        )),
        _ => None,
    }
}

fn page_from_envelope(
    envelope: &Map<String, Value>,
    items: &[Value],
    shape: ListShape,
    request: &ListRequest,
) -> ListPage {
    let records = normalize_records(items);
    let meta = build_meta(&pagination_sources(envelope), request, records.len());
    ListPage {
        records,
        meta,
        shape,
    }
}

/// Normalizes a list response body into records plus pagination metadata.
///
/// Missing pagination fields fall back to the request values, with a single
/// page assumed unless `total` and `per_page` allow computing the count.
pub fn normalize_list_response(body: &Value, request: &ListRequest) -> EndpointResult<ListPage> {
    let envelope = match body {
        Value::Array(items) => {
            let records = normalize_records(items);
            let meta = build_meta(&[], request, records.len());
            return Ok(ListPage {
                records,
                meta,
                shape: ListShape::BareArray,
            });
        }
        Value::Object(envelope) => envelope,
        other => {
            return Err(EndpointError::Decode(format!(
                "unrecognized list response: {}",
                json_kind(other)
            )));
        }
    };

    if let Some(err) = rejected(envelope) {
        return Err(err);
    }

    match (envelope.get("data"), envelope.get("items")) {
        (Some(Value::Array(items)), _) => Ok(page_from_envelope(
            envelope,
            items,
            ListShape::DataArray,
            request,
        )),
        (_, Some(Value::Array(items))) => Ok(page_from_envelope(
            envelope,
            items,
            ListShape::ItemsArray,
            request,
        )),
        (Some(Value::Object(inner)), _) => {
            let items = match (inner.get("data"), inner.get("items")) {
                (Some(Value::Array(items)), _) | (_, Some(Value::Array(items))) => items,
                _ => {
                    return Err(EndpointError::Decode(
                        "unrecognized list response: `data` holds no record array".to_string(),
                    ));
                }
            };
            Ok(page_from_envelope(
                inner,
                items,
                ListShape::NestedPaginator,
                request,
            ))
        }
        _ => Err(EndpointError::Decode(
            "unrecognized list response: no `data` or `items` array".to_string(),
        )),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::SortSpec;
    use crate::domain::types::{FieldName, PageSize};
    use serde_json::json;

    fn request(page: u32, limit: u32) -> ListRequest {
        ListRequest {
            page,
            limit,
            search: None,
            sort_by: None,
            sort_dir: None,
            filters: BTreeMap::new(),
        }
    }

    #[test]
    fn request_omits_empty_fields() {
        let mut query = QuerySnapshot::new(PageSize::new(20).expect("valid size"));
        query.page = 1;
        query
            .filters
            .insert(FieldName::new("status").expect("valid"), "closed".to_string());
        query
            .filters
            .insert(FieldName::new("course").expect("valid"), String::new());

        let request = ListRequest::from_query(&query);
        assert_eq!(
            request.query_string().expect("encodable"),
            "page=1&limit=20&status=closed"
        );
    }

    #[test]
    fn request_carries_search_and_sort() {
        let mut query = QuerySnapshot::default();
        query.search = "  ann lee ".to_string();
        query.sort = Some(SortSpec::new(
            FieldName::new("created_at").expect("valid"),
            SortDirection::Desc,
        ));

        let params = ListRequest::from_query(&query).to_params();
        assert!(params.contains(&("search".to_string(), "ann lee".to_string())));
        assert!(params.contains(&("sort_by".to_string(), "created_at".to_string())));
        assert!(params.contains(&("sort_dir".to_string(), "desc".to_string())));
    }

    #[test]
    fn accepts_laravel_paginator() {
        let body = json!({
            "current_page": 2,
            "data": [{"id": 11}, {"id": 12}],
            "last_page": 5,
            "per_page": 2,
            "total": 10
        });
        let page = normalize_list_response(&body, &request(2, 2)).expect("valid page");

        assert_eq!(page.shape, ListShape::DataArray);
        assert_eq!(page.records.len(), 2);
        assert_eq!(
            page.meta,
            PaginationMeta {
                current_page: 2,
                total_items: 10,
                total_pages: 5,
                per_page: 2
            }
        );
    }

    #[test]
    fn accepts_items_with_meta_object() {
        let body = json!({
            "items": [{"id": 1}],
            "meta": {"currentPage": "3", "lastPage": "4", "perPage": 10, "total": 31}
        });
        let page = normalize_list_response(&body, &request(3, 10)).expect("valid page");

        assert_eq!(page.shape, ListShape::ItemsArray);
        assert_eq!(page.meta.current_page, 3);
        assert_eq!(page.meta.total_pages, 4);
    }

    #[test]
    fn accepts_nested_paginator() {
        let body = json!({
            "success": true,
            "data": {"data": [{"id": 1}], "current_page": 1, "last_page": 1, "per_page": 20, "total": 1}
        });
        let page = normalize_list_response(&body, &request(1, 20)).expect("valid page");

        assert_eq!(page.shape, ListShape::NestedPaginator);
        assert_eq!(page.records[0].id.get(), 1);
    }

    #[test]
    fn bare_array_defaults_to_single_page() {
        let body = json!([{"id": 1}, {"id": 2}]);
        let page = normalize_list_response(&body, &request(1, 20)).expect("valid page");

        assert_eq!(page.shape, ListShape::BareArray);
        assert_eq!(page.meta.total_pages, 1);
        assert_eq!(page.meta.total_items, 2);
        assert_eq!(page.meta.per_page, 20);
    }

    #[test]
    fn total_pages_derived_from_total_when_last_page_missing() {
        let body = json!({"data": [], "total": 45, "per_page": 20});
        let page = normalize_list_response(&body, &request(1, 20)).expect("valid page");
        assert_eq!(page.meta.total_pages, 3);
    }

    #[test]
    fn unknown_shapes_are_typed_failures() {
        assert!(matches!(
            normalize_list_response(&json!({"rows": []}), &request(1, 20)),
            Err(EndpointError::Decode(_))
        ));
        assert!(matches!(
            normalize_list_response(&json!("nope"), &request(1, 20)),
            Err(EndpointError::Decode(_))
        ));
        assert!(matches!(
            normalize_list_response(
                &json!({"success": false, "message": "forbidden"}),
                &request(1, 20)
            ),
            Err(EndpointError::Rejected(ref m)) if m == "forbidden"
        ));
    }
}
