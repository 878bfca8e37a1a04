//! Fetch keys, the single-flight coordinator and the sync state machine.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::domain::query::{FilterClass, QuerySnapshot};

/// Identity of a list request. Two equal keys never both fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FetchKey {
    pub page: u32,
    #[serde(flatten)]
    pub class: FilterClass,
}

impl FetchKey {
    pub fn from_query(query: &QuerySnapshot) -> Self {
        Self {
            page: query.page,
            class: query.filter_class(),
        }
    }
}

impl Display for FetchKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(canonical) => write!(f, "{canonical}"),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

/// Where the list currently is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    /// A request is in flight; only the response tagged `seq` applies.
    Awaiting { seq: u64, requested_page: u32 },
    /// The reconciler moved the page to `page`. The next evaluation of that
    /// page is absorbed instead of fetched.
    Reconciling { page: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Same key as the last issued request.
    Duplicate,
    /// The page came from a reconciliation, not from the user.
    Reconciled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Issue { seq: u64, key: FetchKey },
    Skip(SkipReason),
}

/// Collapses duplicate requests and tags issued ones with a sequence number.
#[derive(Debug, Default, Clone)]
pub struct FetchCoordinator {
    last_issued: Option<FetchKey>,
    seq: u64,
    phase: SyncPhase,
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decide(&mut self, key: FetchKey) -> Decision {
        if let SyncPhase::Reconciling { page } = self.phase {
            self.phase = SyncPhase::Idle;
            let same_class = self
                .last_issued
                .as_ref()
                .is_some_and(|last| last.class == key.class);
            if key.page == page && same_class {
                log::debug!("Absorbing reconciled page {page}");
                self.last_issued = Some(key);
                return Decision::Skip(SkipReason::Reconciled);
            }
        }

        match &self.last_issued {
            Some(last) if last.page != key.page => self.issue(key),
            Some(last) if *last == key => {
                log::debug!("Skipping duplicate fetch {key}");
                Decision::Skip(SkipReason::Duplicate)
            }
            _ => self.issue(key),
        }
    }

    /// Issues `key` even if it equals the last issued key and returns its
    /// sequence number.
    pub fn force(&mut self, key: FetchKey) -> u64 {
        self.stamp(&key)
    }

    fn issue(&mut self, key: FetchKey) -> Decision {
        let seq = self.stamp(&key);
        Decision::Issue { seq, key }
    }

    fn stamp(&mut self, key: &FetchKey) -> u64 {
        self.seq += 1;
        self.phase = SyncPhase::Awaiting {
            seq: self.seq,
            requested_page: key.page,
        };
        log::debug!("Issuing fetch #{} {key}", self.seq);
        self.last_issued = Some(key.clone());
        self.seq
    }

    /// Whether a response tagged `seq` is the one the list is waiting for.
    pub fn is_latest(&self, seq: u64) -> bool {
        matches!(self.phase, SyncPhase::Awaiting { seq: awaited, .. } if awaited == seq)
    }

    /// Page the in-flight request asked for.
    pub fn requested_page(&self) -> Option<u32> {
        match self.phase {
            SyncPhase::Awaiting { requested_page, .. } => Some(requested_page),
            _ => None,
        }
    }

    pub fn complete(&mut self) {
        self.phase = SyncPhase::Idle;
    }

    pub fn complete_reconciled(&mut self, page: u32) {
        self.phase = SyncPhase::Reconciling { page };
    }

    /// A failed fetch keeps the last issued key; [`FetchCoordinator::force`]
    /// is the retry path.
    pub fn fail(&mut self) {
        self.phase = SyncPhase::Idle;
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn last_issued(&self) -> Option<&FetchKey> {
        self.last_issued.as_ref()
    }

    pub fn last_seq(&self) -> u64 {
        self.seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::FieldName;

    fn key(page: u32, status: &str) -> FetchKey {
        let mut query = QuerySnapshot::default();
        query.page = page;
        query.filters.insert(
            FieldName::new("status").expect("valid name"),
            status.to_string(),
        );
        FetchKey::from_query(&query)
    }

    fn issued_seq(decision: &Decision) -> u64 {
        match decision {
            Decision::Issue { seq, .. } => *seq,
            Decision::Skip(reason) => panic!("expected issue, got {reason:?}"),
        }
    }

    #[test]
    fn identical_key_is_issued_once() {
        let mut coordinator = FetchCoordinator::new();
        assert_eq!(issued_seq(&coordinator.decide(key(1, "new"))), 1);
        assert_eq!(
            coordinator.decide(key(1, "new")),
            Decision::Skip(SkipReason::Duplicate)
        );
        coordinator.complete();
        assert_eq!(
            coordinator.decide(key(1, "new")),
            Decision::Skip(SkipReason::Duplicate)
        );
    }

    #[test]
    fn page_change_always_fetches() {
        let mut coordinator = FetchCoordinator::new();
        coordinator.decide(key(1, "new"));
        assert_eq!(issued_seq(&coordinator.decide(key(2, "new"))), 2);
        assert_eq!(issued_seq(&coordinator.decide(key(1, "new"))), 3);
        assert!(coordinator.is_latest(3));
        assert!(!coordinator.is_latest(2));
    }

    #[test]
    fn key_ignores_filter_order_and_blank_values() {
        let mut first = QuerySnapshot::default();
        first
            .filters
            .insert(FieldName::new("b").expect("valid"), "2".to_string());
        first
            .filters
            .insert(FieldName::new("a").expect("valid"), "1".to_string());
        let mut second = QuerySnapshot::default();
        second
            .filters
            .insert(FieldName::new("a").expect("valid"), "1".to_string());
        second
            .filters
            .insert(FieldName::new("b").expect("valid"), "2".to_string());
        second
            .filters
            .insert(FieldName::new("c").expect("valid"), " ".to_string());

        assert_eq!(FetchKey::from_query(&first), FetchKey::from_query(&second));
        assert_eq!(
            FetchKey::from_query(&first).to_string(),
            FetchKey::from_query(&second).to_string()
        );
    }

    #[test]
    fn reconciled_page_is_absorbed_once() {
        let mut coordinator = FetchCoordinator::new();
        coordinator.decide(key(5, "new"));
        coordinator.complete_reconciled(3);

        assert_eq!(
            coordinator.decide(key(3, "new")),
            Decision::Skip(SkipReason::Reconciled)
        );
        assert_eq!(coordinator.phase(), SyncPhase::Idle);
        assert_eq!(coordinator.last_issued().map(|k| k.page), Some(3));
        assert_eq!(
            coordinator.decide(key(3, "new")),
            Decision::Skip(SkipReason::Duplicate)
        );
    }

    #[test]
    fn user_change_after_reconciliation_still_fetches() {
        let mut coordinator = FetchCoordinator::new();
        coordinator.decide(key(5, "new"));
        coordinator.complete_reconciled(3);

        assert_eq!(issued_seq(&coordinator.decide(key(1, "closed"))), 2);
    }

    #[test]
    fn page_change_fetches_right_after_duplicate_skip() {
        let mut coordinator = FetchCoordinator::new();
        assert_eq!(issued_seq(&coordinator.decide(key(1, "new"))), 1);
        assert_eq!(
            coordinator.decide(key(1, "new")),
            Decision::Skip(SkipReason::Duplicate)
        );
        assert_eq!(issued_seq(&coordinator.decide(key(2, "new"))), 2);
        assert_eq!(coordinator.requested_page(), Some(2));
    }

    #[test]
    fn force_reissues_same_key() {
        let mut coordinator = FetchCoordinator::new();
        coordinator.decide(key(1, "new"));
        coordinator.fail();
        assert_eq!(coordinator.force(key(1, "new")), 2);
        assert!(coordinator.is_latest(2));
    }
}
