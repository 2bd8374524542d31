use serde::Serialize;

/// One page of a paginated listing. Page numbers start at 1; a listing with no
/// rows still has a single empty page.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub total: u64,
}

/// Resolved LIMIT/OFFSET window for a requested page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub num_pages: u32,
    pub limit: u32,
    pub offset: u64,
}

impl PageWindow {
    /// Out-of-range requests clamp to the first or last page.
    pub fn resolve(requested: u32, per_page: u32, total: u64) -> Self {
        let per_page = per_page.max(1);
        let num_pages = total.div_ceil(per_page as u64).max(1) as u32;
        let number = requested.clamp(1, num_pages);
        Self {
            number,
            num_pages,
            limit: per_page,
            offset: (number as u64 - 1) * per_page as u64,
        }
    }
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow, total: u64) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total,
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_pages() {
        let w = PageWindow::resolve(0, 10, 25);
        assert_eq!((w.number, w.num_pages, w.offset), (1, 3, 0));

        let w = PageWindow::resolve(9, 10, 25);
        assert_eq!((w.number, w.offset), (3, 20));

        let w = PageWindow::resolve(2, 12, 0);
        assert_eq!((w.number, w.num_pages, w.offset), (1, 1, 0));
    }

    #[test]
    fn page_navigation_flags() {
        let page: Page<()> = Page::new(vec![], PageWindow::resolve(2, 10, 25), 25);
        assert!(page.has_next());
        assert!(page.has_previous());
    }
}
