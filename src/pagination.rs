use serde::{Deserialize, Serialize};

/// Posts shown per page, everywhere a feed is rendered.
pub const POSTS_PER_PAGE: i64 = 10;

/// One page of an ordered result set, with the metadata the paginator
/// widget needs.
#[derive(Serialize, Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_number: i64,
    pub next_number: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, number: i64, num_pages: i64, total: i64) -> Self {
        Self {
            items,
            number,
            num_pages,
            total,
            has_previous: number > 1,
            has_next: number < num_pages,
            previous_number: (number - 1).max(1),
            next_number: (number + 1).min(num_pages),
        }
    }
}

/// Number of pages for `total` items: ceil(total / per_page), never zero.
/// An empty result set still has one (empty) page.
pub fn num_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 {
        1
    } else {
        (total + per_page - 1) / per_page
    }
}

/// Clamp a requested page number to the nearest valid page.
pub fn clamp_page(requested: i64, num_pages: i64) -> i64 {
    requested.clamp(1, num_pages)
}

/// The `?page=` query parameter as the browser sends it. Anything that is
/// not a number counts as the first page.
#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn number(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(1)
    }
}

/// Paginate an already-ordered in-memory list. The database-backed stores
/// push offset/limit into the query instead; this is the same arithmetic
/// applied to a slice.
pub fn paginate_slice<T: Clone>(items: &[T], requested: i64, per_page: i64) -> Page<T> {
    let total = items.len() as i64;
    let pages = num_pages(total, per_page);
    let number = clamp_page(requested, pages);
    let start = ((number - 1) * per_page) as usize;
    let end = (start + per_page as usize).min(items.len());
    let window = items[start.min(items.len())..end].to_vec();
    Page::new(window, number, pages, total)
}
