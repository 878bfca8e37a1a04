//! Page window for pagination controls.

use serde::Serialize;

use crate::services::controller::ListController;

/// Page numbers to render, with `None` marking a gap.
///
/// Shows `edge` pages at both ends and `around` pages on each side of
/// `current`.
pub fn page_links(total_pages: u32, current: u32, edge: u32, around: u32) -> Vec<Option<u32>> {
    if total_pages == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total_pages);

    let mut links = Vec::new();
    let mut previous = 0;
    for page in 1..=total_pages {
        let near_edge = page <= edge || page > total_pages.saturating_sub(edge);
        let near_current = page.abs_diff(current) <= around;
        if !(near_edge || near_current) {
            continue;
        }
        if page > previous + 1 {
            links.push(None);
        }
        links.push(Some(page));
        previous = page;
    }
    links
}

/// Pagination state of a controller, ready for a template or a terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub pages: Vec<Option<u32>>,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageSummary {
    pub fn from_controller(controller: &ListController) -> Self {
        let page = controller.query().page;
        let total_pages = controller.total_pages();
        let total_items = controller
            .meta()
            .map_or(controller.records().len() as u64, |meta| meta.total_items);

        Self {
            page,
            total_pages,
            total_items,
            pages: page_links(total_pages, page, 2, 2),
            has_prev: page > 1,
            has_next: page < total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_ranges_have_no_gaps() {
        assert_eq!(
            page_links(4, 2, 2, 2),
            vec![Some(1), Some(2), Some(3), Some(4)]
        );
        assert!(page_links(0, 1, 2, 2).is_empty());
    }

    #[test]
    fn long_ranges_collapse_around_current() {
        assert_eq!(
            page_links(20, 10, 2, 2),
            vec![
                Some(1),
                Some(2),
                None,
                Some(8),
                Some(9),
                Some(10),
                Some(11),
                Some(12),
                None,
                Some(19),
                Some(20)
            ]
        );
    }

    #[test]
    fn current_near_start_merges_with_edge() {
        assert_eq!(
            page_links(10, 2, 1, 1),
            vec![Some(1), Some(2), Some(3), None, Some(10)]
        );
    }

    #[test]
    fn summary_without_meta_is_single_page() {
        let summary = PageSummary::from_controller(&ListController::default());
        assert_eq!(summary.total_pages, 1);
        assert_eq!(summary.pages, vec![Some(1)]);
        assert!(!summary.has_next);
    }
}
