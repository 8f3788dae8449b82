//! Fixed-size pagination over an already-fetched result set.
//!
//! Page state travels inside the Previous/Next button values as a serialized
//! [`PageCursor`], so every navigation click is a stateless, self-describing
//! request that re-runs the whole fetch/filter/sort pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ProjectFilters;

pub const PAGE_SIZE: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub start: usize,
    pub end: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageWindow {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Window for page `page` over `total` records: `[8p, min(8p+8, total))`.
/// A Previous control exists iff `page > 0`, a Next control iff another full
/// or partial page remains.
pub fn page_window(total: usize, page: usize) -> PageWindow {
    let start = page.saturating_mul(PAGE_SIZE).min(total);
    let end = start.saturating_add(PAGE_SIZE).min(total);
    // Cursor values arrive from button payloads, so a forged page index must
    // not overflow the arithmetic.
    let has_next = page.saturating_add(1).saturating_mul(PAGE_SIZE) < total;
    PageWindow { start, end, has_prev: page > 0, has_next }
}

/// The complete state a pagination button carries: the active filter set plus
/// the target page index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    #[serde(default)]
    pub filters: ProjectFilters,
    #[serde(default)]
    pub page: usize,
}

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("pagination cursor could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl PageCursor {
    pub fn new(filters: ProjectFilters, page: usize) -> Self {
        Self { filters, page }
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn decode(raw: &str) -> Result<Self, CursorError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn next(&self) -> Self {
        Self { filters: self.filters.clone(), page: self.page.saturating_add(1) }
    }

    pub fn prev(&self) -> Self {
        Self { filters: self.filters.clone(), page: self.page.saturating_sub(1) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_law_holds_across_result_sizes() {
        for total in 0..40 {
            for page in 0..6 {
                let window = page_window(total, page);
                assert_eq!(window.start, (page * PAGE_SIZE).min(total));
                assert_eq!(window.end, (page * PAGE_SIZE + PAGE_SIZE).min(total));
                assert_eq!(window.has_prev, page > 0);
                assert_eq!(window.has_next, (page + 1) * PAGE_SIZE < total);
            }
        }
    }

    #[test]
    fn first_page_of_twenty_shows_eight_with_next_only() {
        let window = page_window(20, 0);
        assert_eq!((window.start, window.end), (0, 8));
        assert!(!window.has_prev);
        assert!(window.has_next);
    }

    #[test]
    fn last_partial_page_has_no_next() {
        let window = page_window(20, 2);
        assert_eq!((window.start, window.end), (16, 20));
        assert!(window.has_prev);
        assert!(!window.has_next);
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_page() {
        let window = page_window(16, 1);
        assert_eq!((window.start, window.end), (8, 16));
        assert!(!window.has_next);
    }

    #[test]
    fn out_of_range_page_yields_empty_window() {
        let window = page_window(5, 3);
        assert!(window.is_empty());
        assert!(window.has_prev);
        assert!(!window.has_next);
    }

    #[test]
    fn forged_maximal_page_index_does_not_overflow() {
        let window = page_window(20, usize::MAX);
        assert!(window.is_empty());
        assert!(window.has_prev);
        assert!(!window.has_next);
    }

    #[test]
    fn next_saturates_at_the_maximal_page_index() {
        let cursor = PageCursor::new(ProjectFilters::default(), usize::MAX);
        assert_eq!(cursor.next().page, usize::MAX);
    }

    #[test]
    fn cursor_round_trips_filters_and_page() {
        let cursor = PageCursor::new(
            ProjectFilters {
                search: Some("mint".to_string()),
                status: Some("In progress".to_string()),
                ..ProjectFilters::default()
            },
            3,
        );

        let decoded = PageCursor::decode(&cursor.encode()).expect("decode");
        assert_eq!(decoded, cursor);
        assert_eq!(decoded.next().page, 4);
        assert_eq!(decoded.prev().page, 2);
    }

    #[test]
    fn prev_saturates_at_page_zero() {
        let cursor = PageCursor::default();
        assert_eq!(cursor.prev().page, 0);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(PageCursor::decode("not json").is_err());
    }

    #[test]
    fn decode_tolerates_missing_fields() {
        let cursor = PageCursor::decode("{}").expect("decode");
        assert_eq!(cursor.page, 0);
        assert!(cursor.filters.is_empty());
    }
}
