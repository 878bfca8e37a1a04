//! Merges server pagination metadata with the locally requested page.

use crate::dto::list::PaginationMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The requested page is within bounds and stays.
    Kept,
    /// The requested page was out of bounds and the server's current page
    /// replaces it. No new fetch follows.
    Corrected,
    /// Neither page was within bounds; the page was clamped and the next
    /// evaluation fetches it.
    Clamped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub page: u32,
    pub meta: PaginationMeta,
    pub outcome: PageOutcome,
}

pub fn reconcile(requested_page: u32, meta: PaginationMeta) -> Reconciliation {
    let total_pages = meta.total_pages.max(1);
    let meta = PaginationMeta { total_pages, ..meta };
    let bounds = 1..=total_pages;

    if bounds.contains(&requested_page) {
        return Reconciliation {
            page: requested_page,
            meta,
            outcome: PageOutcome::Kept,
        };
    }

    if bounds.contains(&meta.current_page) {
        log::debug!(
            "Page {requested_page} is out of bounds, server is on {} of {total_pages}",
            meta.current_page
        );
        return Reconciliation {
            page: meta.current_page,
            meta,
            outcome: PageOutcome::Corrected,
        };
    }

    Reconciliation {
        page: requested_page.clamp(1, total_pages),
        meta,
        outcome: PageOutcome::Clamped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(current_page: u32, total_pages: u32) -> PaginationMeta {
        PaginationMeta {
            current_page,
            total_items: u64::from(total_pages) * 20,
            total_pages,
            per_page: 20,
        }
    }

    #[test]
    fn in_bounds_request_is_trusted() {
        let result = reconcile(2, meta(1, 5));
        assert_eq!(result.page, 2);
        assert_eq!(result.outcome, PageOutcome::Kept);
    }

    #[test]
    fn out_of_bounds_request_follows_server() {
        let result = reconcile(5, meta(3, 3));
        assert_eq!(result.page, 3);
        assert_eq!(result.outcome, PageOutcome::Corrected);
    }

    #[test]
    fn total_pages_is_at_least_one() {
        let result = reconcile(1, meta(1, 0));
        assert_eq!(result.meta.total_pages, 1);
        assert_eq!(result.outcome, PageOutcome::Kept);
    }

    #[test]
    fn server_echoing_bad_page_is_clamped() {
        let result = reconcile(9, meta(9, 4));
        assert_eq!(result.page, 4);
        assert_eq!(result.outcome, PageOutcome::Clamped);
    }
}
