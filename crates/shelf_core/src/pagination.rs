//! Page windows and page slices over an ordered collection.
//!
//! Pages are 1-based. Clamping requested pages is the caller's job: the
//! functions here never fail, they just return nothing for pages that do not
//! exist.

/// Pages shown on either side of the current page.
pub const WINDOW_RADIUS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

/// Number of pages needed for `len` items. Zero items means zero pages.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Page window around `current` using [`WINDOW_RADIUS`].
pub fn compute_window(current: usize, total: usize) -> Vec<PageItem> {
    compute_window_with_radius(current, total, WINDOW_RADIUS)
}

/// Page window: first page, pages within `radius` of `current`, last page,
/// with one ellipsis bridging each gap. Empty when there is at most one page.
pub fn compute_window_with_radius(current: usize, total: usize, radius: usize) -> Vec<PageItem> {
    if total <= 1 {
        return Vec::new();
    }

    let mut items = vec![PageItem::Page(1)];
    let mut last = 1;
    let mut push_page = |items: &mut Vec<PageItem>, page: usize| {
        if page != last + 1 {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page(page));
        last = page;
    };

    let start = current.saturating_sub(radius).max(2);
    let end = current.saturating_add(radius).min(total - 1);
    for page in start..=end {
        push_page(&mut items, page);
    }
    push_page(&mut items, total);

    items
}

/// Items on `page` (1-based). Out-of-range pages yield an empty slice.
pub fn slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}
