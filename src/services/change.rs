//! Filter-class change detection and the reset-to-first-page rule.

use crate::domain::query::{FilterClass, QuerySnapshot};

/// Result of comparing the query with the last acted-upon filter class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Nothing but possibly the page changed.
    Unchanged,
    /// Search, filters, sort or page size changed while already on page 1.
    FilterChanged,
    /// The filter class changed and the page was forced back to 1. No fetch
    /// belongs to this evaluation; the next one issues it.
    PageReset,
}

/// Detects filter-class changes and applies the page reset rule.
#[derive(Debug, Default, Clone)]
pub struct ChangeDetector {
    last: Option<FilterClass>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first evaluation only records the baseline, so a view opened on a
    /// deep page stays there.
    pub fn evaluate(&mut self, query: &mut QuerySnapshot) -> Evaluation {
        let current = query.filter_class();
        let Some(last) = &self.last else {
            self.last = Some(current);
            return Evaluation::Unchanged;
        };
        if *last == current {
            return Evaluation::Unchanged;
        }

        log::debug!("Filter class changed on page {}", query.page);
        self.last = Some(current);
        if query.page != 1 {
            query.page = 1;
            Evaluation::PageReset
        } else {
            Evaluation::FilterChanged
        }
    }

    pub fn last(&self) -> Option<&FilterClass> {
        self.last.as_ref()
    }
}
