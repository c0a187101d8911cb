//! Pagination envelope for list responses.

use serde::Serialize;

/// Page metadata returned alongside a list result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginate {
    pub current_page: u32,
    pub per_page: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub first_page: u64,
    pub last_page: u64,
    pub previous_page: Option<u64>,
    pub next_page: Option<u64>,
}

impl Paginate {
    pub fn new(current_page: u32, per_page: u32, total_count: u64) -> Self {
        let per_page = per_page.max(1);
        let current_page = current_page.max(1);
        let total_pages = total_count.div_ceil(u64::from(per_page));
        let current = u64::from(current_page);

        Self {
            current_page,
            per_page,
            total_count,
            total_pages,
            first_page: 1,
            last_page: total_pages.max(1),
            previous_page: (current > 1).then(|| current - 1),
            next_page: (current < total_pages).then(|| current + 1),
        }
    }
}

/// `{data, paginate}` list envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub paginate: Paginate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let page = Paginate::new(1, 20, 41);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.next_page, Some(2));
        assert_eq!(page.previous_page, None);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page = Paginate::new(1, 20, 0);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.last_page, 1);
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn zero_page_is_first_page() {
        let page = Paginate::new(0, 10, 35);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.previous_page, None);
        assert_eq!(page.next_page, Some(2));
    }

    #[test]
    fn page_past_the_end_has_no_next() {
        let page = Paginate::new(9, 10, 35);
        assert_eq!(page.total_pages, 4);
        assert_eq!(page.previous_page, Some(8));
        assert_eq!(page.next_page, None);
    }
}
