//! Page position, totals and the learned pagination capability.

use resreg_core::PageRequest;
use serde::{Deserialize, Serialize};

/// Whether the backend answers list calls with `{items, total}` envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaginationSupport {
    /// No response seen yet.
    #[default]
    Unknown,
    Supported,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationController {
    current_page: usize,
    limit: usize,
    total_count: u64,
    total_pages: u64,
    has_next_page: bool,
    support: PaginationSupport,
}

impl PaginationController {
    pub fn new(limit: usize) -> Self {
        Self {
            current_page: 1,
            limit: limit.max(1),
            total_count: 0,
            total_pages: 0,
            has_next_page: false,
            support: PaginationSupport::Unknown,
        }
    }

    pub fn current_page(&self) -> usize { self.current_page }
    pub fn limit(&self) -> usize { self.limit }
    pub fn total_count(&self) -> u64 { self.total_count }
    pub fn total_pages(&self) -> u64 { self.total_pages }
    pub fn has_next_page(&self) -> bool { self.has_next_page }
    pub fn has_prev_page(&self) -> bool { self.current_page > 1 }
    pub fn support(&self) -> PaginationSupport { self.support }

    /// Advance one page. Not bounded: past the end the backend simply returns fewer rows.
    pub fn next(&mut self) { self.current_page = self.current_page.saturating_add(1); }

    /// Go back one page; returns false (and does nothing) on page 1.
    pub fn prev(&mut self) -> bool {
        if self.current_page > 1 {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) { self.current_page = 1; }

    /// Jump to a page (1-based); 0 is treated as 1.
    pub fn go_to(&mut self, page: usize) { self.current_page = page.max(1); }

    pub fn offset(&self) -> usize { (self.current_page - 1).saturating_mul(self.limit) }

    /// Paging parameters for the next list request, or `None` once the backend showed it cannot page.
    pub fn page_request(&self) -> Option<PageRequest> {
        match self.support {
            PaginationSupport::Unsupported => None,
            _ => Some(PageRequest { limit: self.limit, offset: self.offset() }),
        }
    }

    /// Record an envelope response.
    pub fn apply_envelope(&mut self, items_len: usize, total: u64) {
        self.support = PaginationSupport::Supported;
        self.total_count = total;
        self.total_pages = total.div_ceil(self.limit as u64);
        self.has_next_page = items_len == self.limit;
    }

    /// Record a flat response: everything fits on one page.
    pub fn apply_flat(&mut self, items_len: usize) {
        self.support = PaginationSupport::Unsupported;
        self.current_page = 1;
        self.total_count = items_len as u64;
        self.total_pages = 1;
        self.has_next_page = false;
    }
}

impl Default for PaginationController {
    fn default() -> Self { Self::new(resreg_core::config::DEFAULT_PAGE_LIMIT) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_tracks_page() {
        let mut p = PaginationController::new(100);
        for page in 1..=50usize {
            p.go_to(page);
            assert_eq!(p.offset(), (page - 1) * 100);
        }
    }

    #[test]
    fn prev_is_noop_on_first_page() {
        let mut p = PaginationController::new(10);
        assert!(!p.prev());
        assert_eq!(p.current_page(), 1);
        p.next();
        p.next();
        assert!(p.prev());
        assert_eq!(p.current_page(), 2);
        p.reset();
        assert_eq!(p.current_page(), 1);
    }

    #[test]
    fn next_is_unbounded() {
        let mut p = PaginationController::new(10);
        p.apply_envelope(3, 3);
        assert!(!p.has_next_page());
        p.next();
        assert_eq!(p.current_page(), 2);
        assert_eq!(p.offset(), 10);
    }

    #[test]
    fn full_page_means_next_page() {
        let mut p = PaginationController::new(5);
        p.apply_envelope(5, 12);
        assert!(p.has_next_page());
        assert_eq!(p.total_pages(), 3);
        assert_eq!(p.support(), PaginationSupport::Supported);

        p.apply_envelope(4, 12);
        assert!(!p.has_next_page());
    }

    #[test]
    fn flat_pins_single_page_and_drops_paging_params() {
        let mut p = PaginationController::new(100);
        assert_eq!(p.page_request(), Some(PageRequest { limit: 100, offset: 0 }));
        p.next();
        p.apply_flat(7);
        assert_eq!(p.support(), PaginationSupport::Unsupported);
        assert_eq!(p.total_pages(), 1);
        assert_eq!(p.total_count(), 7);
        assert_eq!(p.current_page(), 1);
        assert!(!p.has_next_page());
        assert_eq!(p.page_request(), None);
    }

    #[test]
    fn huge_page_saturates_offset() {
        let mut p = PaginationController::new(100);
        p.go_to(usize::MAX);
        assert_eq!(p.offset(), usize::MAX);
        assert_eq!(p.page_request(), Some(PageRequest { limit: 100, offset: usize::MAX }));
    }

    #[test]
    fn zero_limit_is_clamped() {
        assert_eq!(PaginationController::new(0).limit(), 1);
    }
}
