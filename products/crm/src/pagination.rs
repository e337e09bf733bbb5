//! Page windowing for list footers.

/// One slot in a pagination footer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// Build the footer for `current` out of `total_pages`.
///
/// The first and last pages are always present, `siblings` pages are shown on
/// each side of the current one, and a hidden gap becomes [`PageItem::Ellipsis`]
/// only when it spans two or more pages; a single hidden page is shown instead.
/// `current` is clamped into range and zero pages yields an empty window.
pub fn page_window(current: u32, total_pages: u32, siblings: u32) -> Vec<PageItem> {
    if total_pages == 0 {
        return Vec::new();
    }
    let total = i64::from(total_pages);
    let current = i64::from(current).clamp(1, total);
    let siblings = i64::from(siblings);
    let start = (current - siblings).max(2);
    let end = (current + siblings).min(total - 1);

    let mut items = vec![PageItem::Page(1)];
    if start > 3 {
        items.push(PageItem::Ellipsis);
    } else {
        items.extend((2..start).map(page));
    }
    items.extend((start..=end).map(page));
    if end < total - 2 {
        items.push(PageItem::Ellipsis);
    } else {
        items.extend((end + 1..total).map(page));
    }
    if total > 1 {
        items.push(PageItem::Page(total_pages));
    }
    items
}

fn page(number: i64) -> PageItem {
    PageItem::Page(number as u32)
}

/// Page/page-size/total bookkeeping with clamped navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pager {
    page: u32,
    page_size: u32,
    total: u64,
}

impl Pager {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    /// Start on `page` before the total is known; the first load clamps it.
    pub fn starting_at(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn total_pages(&self) -> u32 {
        self.total.div_ceil(u64::from(self.page_size)) as u32
    }

    pub fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Move to `page`, clamped to the known range. Returns the page landed on.
    pub fn go_to(&mut self, page: u32) -> u32 {
        let last = self.total_pages().max(1);
        self.page = page.clamp(1, last);
        self.page
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn next(&mut self) -> u32 {
        self.go_to(self.page.saturating_add(1))
    }

    pub fn prev(&mut self) -> u32 {
        self.go_to(self.page.saturating_sub(1))
    }

    /// 1-based inclusive bounds of the rows on the current page, for
    /// "showing X-Y of Z". `None` when there are no rows.
    pub fn showing(&self) -> Option<(u64, u64)> {
        if self.total == 0 {
            return None;
        }
        let first = u64::from(self.page - 1) * u64::from(self.page_size) + 1;
        if first > self.total {
            return None;
        }
        let last = (first + u64::from(self.page_size) - 1).min(self.total);
        Some((first, last))
    }

    pub fn window(&self, siblings: u32) -> Vec<PageItem> {
        page_window(self.page, self.total_pages(), siblings)
    }
}
