//! The list view controller.
//!
//! [`ListController`] owns the query, the fetch state machine, the loaded page
//! and the selection. It performs no I/O: callers take the [`PendingFetch`]
//! or [`PendingMutation`] it hands out, run it against an endpoint and feed the
//! result back. Responses may arrive in any order.

use std::time::{Duration, Instant};

use crate::domain::query::{QuerySnapshot, SortDirection, SortSpec};
use crate::domain::record::{Record, RecordPatch};
use crate::domain::types::{FieldName, PageSize, RecordId};
use crate::dto::export::ExportRequest;
use crate::dto::list::{ListPage, ListRequest, PaginationMeta, RESERVED_PARAMS};
use crate::endpoints::errors::{EndpointError, EndpointResult};
use crate::services::change::{ChangeDetector, Evaluation};
use crate::services::debounce::{DEFAULT_SEARCH_DEBOUNCE, Debouncer};
use crate::services::errors::{ServiceError, ServiceResult};
use crate::services::fetch::{Decision, FetchCoordinator, FetchKey, SkipReason, SyncPhase};
use crate::services::reconcile::{PageOutcome, reconcile};
use crate::services::store::{RecordStore, SelectionSet};

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub search_debounce: Duration,
    pub page_size: PageSize,
    pub page_sizes: Vec<PageSize>,
    pub rollback_on_failure: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            page_size: PageSize::default(),
            page_sizes: [10, 20, 50, 100]
                .into_iter()
                .filter_map(|size| PageSize::new(size).ok())
                .collect(),
            rollback_on_failure: false,
        }
    }
}

/// A list request the caller must send and report back with its `seq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub seq: u64,
    pub request: ListRequest,
}

/// Outcome of one synchronous evaluation of the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    PageReset,
    Fetch(PendingFetch),
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// A newer request was issued after this one.
    Stale,
    Applied(PageOutcome),
    Failed(EndpointError),
}

/// An optimistic edit already visible locally and waiting for the server.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
    pub id: RecordId,
    pub patch: RecordPatch,
    previous_row: Option<Record>,
    previous_detail: Option<Record>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The server echoed the record and its value replaced the local one.
    Confirmed,
    /// The server accepted the edit without echoing the record.
    Acknowledged,
    Failed {
        error: EndpointError,
        rolled_back: bool,
    },
}

#[derive(Debug, Clone)]
pub struct ListController {
    query: QuerySnapshot,
    debouncer: Debouncer,
    detector: ChangeDetector,
    coordinator: FetchCoordinator,
    store: RecordStore,
    selection: SelectionSet,
    meta: Option<PaginationMeta>,
    detail: Option<Record>,
    page_sizes: Vec<PageSize>,
    rollback_on_failure: bool,
}

impl Default for ListController {
    fn default() -> Self {
        Self::new(ControllerSettings::default())
    }
}

impl ListController {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            query: QuerySnapshot::new(settings.page_size),
            debouncer: Debouncer::new(settings.search_debounce),
            detector: ChangeDetector::new(),
            coordinator: FetchCoordinator::new(),
            store: RecordStore::new(),
            selection: SelectionSet::new(),
            meta: None,
            detail: None,
            page_sizes: settings.page_sizes,
            rollback_on_failure: settings.rollback_on_failure,
        }
    }

    /// Starts from an existing query, e.g. one restored from the address bar.
    #[must_use]
    pub fn with_query(mut self, mut query: QuerySnapshot) -> Self {
        query.page = query.page.max(1);
        self.query = query;
        self
    }

    pub fn query(&self) -> &QuerySnapshot {
        &self.query
    }

    pub fn records(&self) -> &[Record] {
        self.store.records()
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.store.get(id)
    }

    pub fn meta(&self) -> Option<&PaginationMeta> {
        self.meta.as_ref()
    }

    pub fn total_pages(&self) -> u32 {
        self.meta.map_or(1, |meta| meta.total_pages.max(1))
    }

    pub fn phase(&self) -> SyncPhase {
        self.coordinator.phase()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.coordinator.phase(), SyncPhase::Awaiting { .. })
    }

    pub fn page_sizes(&self) -> &[PageSize] {
        &self.page_sizes
    }

    // Search input.

    pub fn input_search(&mut self, text: impl Into<String>, now: Instant) {
        self.debouncer.input(text, now);
    }

    /// Moves a settled search into the query. Returns whether it changed.
    pub fn poll_search(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(value) => self.settle_search(value),
            None => false,
        }
    }

    /// Settles the pending search at once, as on Enter.
    pub fn flush_search(&mut self) -> bool {
        match self.debouncer.flush() {
            Some(value) => self.settle_search(value),
            None => false,
        }
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    fn settle_search(&mut self, value: String) -> bool {
        if self.query.search == value {
            return false;
        }
        log::debug!("Search settled on {value:?}");
        self.query.search = value;
        true
    }

    // Filters, sort and page size.

    /// Sets a field filter; an empty value removes the constraint.
    pub fn set_filter(&mut self, name: &str, value: impl Into<String>) -> ServiceResult<()> {
        let name =
            FieldName::new(name).map_err(|err| ServiceError::InvalidQuery(err.to_string()))?;
        if RESERVED_PARAMS.contains(&name.as_str()) {
            return Err(ServiceError::InvalidQuery(format!(
                "'{name}' cannot be used as a filter"
            )));
        }
        let value = value.into();
        if value.trim().is_empty() {
            self.query.filters.remove(&name);
        } else {
            self.query.filters.insert(name, value);
        }
        Ok(())
    }

    pub fn clear_filters(&mut self) {
        self.query.filters.clear();
    }

    pub fn set_sort(&mut self, key: &str, direction: SortDirection) -> ServiceResult<()> {
        let key = FieldName::new(key).map_err(|err| ServiceError::InvalidQuery(err.to_string()))?;
        self.query.sort = Some(SortSpec::new(key, direction));
        Ok(())
    }

    /// Clicking a column header: same key flips, a new key starts ascending.
    pub fn toggle_sort(&mut self, key: &str) -> ServiceResult<()> {
        let direction = match &self.query.sort {
            Some(sort) if sort.key.as_str() == key.trim() => sort.direction.flip(),
            _ => SortDirection::Asc,
        };
        self.set_sort(key, direction)
    }

    pub fn clear_sort(&mut self) {
        self.query.sort = None;
    }

    pub fn set_page_size(&mut self, size: u32) -> ServiceResult<()> {
        self.query.page_size = PageSize::from_choices(size, &self.page_sizes)?;
        Ok(())
    }

    /// Clears search, filters and sort. Selection is left alone.
    pub fn reset_query(&mut self) {
        self.debouncer.cancel();
        self.query.search.clear();
        self.query.filters.clear();
        self.query.sort = None;
    }

    // Pagination.

    /// Moves to `page`, clamped to the known page range.
    pub fn set_page(&mut self, page: u32) {
        self.query.page = match self.meta {
            Some(_) => page.clamp(1, self.total_pages()),
            None => page.max(1),
        };
    }

    pub fn next_page(&mut self) {
        self.set_page(self.query.page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.query.page.saturating_sub(1));
    }

    // Fetch cycle.

    /// Runs the change detector and the coordinator once.
    pub fn evaluate(&mut self) -> Step {
        if self.detector.evaluate(&mut self.query) == Evaluation::PageReset {
            return Step::PageReset;
        }
        match self.coordinator.decide(FetchKey::from_query(&self.query)) {
            Decision::Issue { seq, .. } => Step::Fetch(self.pending_fetch(seq)),
            Decision::Skip(reason) => Step::Skip(reason),
        }
    }

    /// Evaluates until the query settles and returns the request to send, if
    /// any.
    pub fn next_fetch(&mut self) -> Option<PendingFetch> {
        loop {
            match self.evaluate() {
                Step::PageReset => continue,
                Step::Fetch(pending) => return Some(pending),
                Step::Skip(_) => return None,
            }
        }
    }

    /// Re-issues the current query even if it was fetched already.
    pub fn reload(&mut self) -> PendingFetch {
        while self.detector.evaluate(&mut self.query) == Evaluation::PageReset {}
        let seq = self.coordinator.force(FetchKey::from_query(&self.query));
        self.pending_fetch(seq)
    }

    fn pending_fetch(&self, seq: u64) -> PendingFetch {
        PendingFetch {
            seq,
            request: ListRequest::from_query(&self.query),
        }
    }

    /// Applies the response of fetch `seq`.
    ///
    /// A failure leaves records and metadata as they were.
    pub fn apply_list_response(
        &mut self,
        seq: u64,
        result: EndpointResult<ListPage>,
    ) -> ApplyOutcome {
        if !self.coordinator.is_latest(seq) {
            log::warn!(
                "Ignoring response #{seq}, latest is #{}",
                self.coordinator.last_seq()
            );
            return ApplyOutcome::Stale;
        }

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                log::error!("Fetch #{seq} failed: {err}");
                self.coordinator.fail();
                return ApplyOutcome::Failed(err);
            }
        };

        let requested_page = self.coordinator.requested_page().unwrap_or(self.query.page);
        let reconciliation = reconcile(requested_page, page.meta);
        self.store.replace(page.records);
        self.meta = Some(reconciliation.meta);
        self.query.page = reconciliation.page;

        match reconciliation.outcome {
            PageOutcome::Corrected => self.coordinator.complete_reconciled(reconciliation.page),
            PageOutcome::Kept | PageOutcome::Clamped => self.coordinator.complete(),
        }
        log::debug!(
            "Applied fetch #{seq}: {} records, page {} of {}",
            self.store.len(),
            self.query.page,
            reconciliation.meta.total_pages
        );
        ApplyOutcome::Applied(reconciliation.outcome)
    }

    // Selection.

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn toggle_selected(&mut self, id: RecordId) -> bool {
        self.selection.toggle(id)
    }

    pub fn select_all_visible(&mut self) {
        let visible = self.store.ids();
        self.selection.select_all_visible(&visible);
    }

    /// Drops `id` from the selection; returns whether it was selected.
    pub fn deselect(&mut self, id: RecordId) -> bool {
        self.selection.remove(id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // Detail view.

    pub fn detail(&self) -> Option<&Record> {
        self.detail.as_ref()
    }

    pub fn open_detail(&mut self, record: Record) {
        self.detail = Some(record);
    }

    /// Opens the detail view on a record of the current page.
    pub fn open_detail_from_page(&mut self, id: RecordId) -> ServiceResult<&Record> {
        let record = self
            .store
            .get(id)
            .cloned()
            .ok_or(ServiceError::RecordNotFound(id))?;
        let record: &Record = self.detail.insert(record);
        Ok(record)
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    // Optimistic mutations.

    /// Applies `patch` to the row and the open detail view at once.
    pub fn begin_mutation(
        &mut self,
        id: RecordId,
        patch: RecordPatch,
    ) -> ServiceResult<PendingMutation> {
        let row = self.store.get_mut(id);
        let detail = self.detail.as_mut().filter(|record| record.id == id);
        if row.is_none() && detail.is_none() {
            return Err(ServiceError::RecordNotFound(id));
        }

        let previous_row = row.map(|record| {
            let previous = record.clone();
            record.apply(&patch);
            previous
        });
        let previous_detail = detail.map(|record| {
            let previous = record.clone();
            record.apply(&patch);
            previous
        });

        Ok(PendingMutation {
            id,
            patch,
            previous_row,
            previous_detail,
        })
    }

    /// Reconciles an optimistic edit with the server's answer.
    pub fn complete_mutation(
        &mut self,
        pending: PendingMutation,
        result: EndpointResult<Option<Record>>,
    ) -> MutationOutcome {
        match result {
            Ok(Some(record)) if record.id == pending.id => {
                if let Some(detail) = self.detail.as_mut().filter(|d| d.id == record.id) {
                    *detail = record.clone();
                }
                self.store.replace_record(record);
                MutationOutcome::Confirmed
            }
            Ok(_) => MutationOutcome::Acknowledged,
            Err(error) => {
                let rolled_back = self.rollback_on_failure;
                if rolled_back {
                    if let Some(previous) = pending.previous_row {
                        self.store.replace_record(previous);
                    }
                    if let Some(previous) = pending.previous_detail {
                        if let Some(detail) = self.detail.as_mut().filter(|d| d.id == previous.id) {
                            *detail = previous;
                        }
                    }
                }
                MutationOutcome::Failed { error, rolled_back }
            }
        }
    }

    // Export.

    pub fn export_request(&self) -> ExportRequest {
        ExportRequest::from_query(&self.query)
    }
}
