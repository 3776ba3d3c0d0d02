//! Page-number pagination primitives shared by storefront endpoints.
//!
//! Listing endpoints accept a 1-indexed page number plus a page size and
//! answer with a [`Page`] envelope carrying the items for that page together
//! with the total match count and derived page count. Requesting a page past
//! the last one is not an error: the envelope simply carries no items.
//!
//! # Examples
//!
//! ```
//! use pagination::{Page, PageRequest};
//!
//! let request = PageRequest::new(2, 10)?;
//! assert_eq!(request.offset(), 10);
//!
//! let page = Page::new(vec!["a", "b"], request, 12);
//! assert_eq!(page.total_pages(), 2);
//! assert!(!page.has_next());
//! # Ok::<(), pagination::PaginationError>(())
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

/// Page size applied when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameter carrying the 1-indexed page number.
pub const PAGE_PARAM: &str = "page";

/// Query parameter carrying the page size.
pub const PAGE_SIZE_PARAM: &str = "pageSize";

/// Errors raised while validating pagination input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    /// Page numbers start at one.
    #[error("page must be at least 1")]
    PageOutOfRange,
    /// Page size must be between one and [`MAX_PAGE_SIZE`].
    #[error("page size must be between 1 and {max}, got {actual}")]
    PageSizeOutOfRange {
        /// Upper bound accepted by the API.
        max: u32,
        /// Value supplied by the caller.
        actual: u32,
    },
}

/// Validated 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Validate and build a page request.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::PageOutOfRange`] when `page` is zero and
    /// [`PaginationError::PageSizeOutOfRange`] when `page_size` is zero or
    /// larger than [`MAX_PAGE_SIZE`].
    pub const fn new(page: u32, page_size: u32) -> Result<Self, PaginationError> {
        if page == 0 {
            return Err(PaginationError::PageOutOfRange);
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(PaginationError::PageSizeOutOfRange {
                max: MAX_PAGE_SIZE,
                actual: page_size,
            });
        }
        Ok(Self { page, page_size })
    }

    /// Build a request from optional query parameters, applying defaults of
    /// page 1 and [`DEFAULT_PAGE_SIZE`].
    ///
    /// # Errors
    ///
    /// Propagates the validation failures of [`PageRequest::new`].
    pub fn from_query(page: Option<u32>, page_size: Option<u32>) -> Result<Self, PaginationError> {
        Self::new(page.unwrap_or(1), page_size.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    /// The 1-indexed page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of items to skip before this page starts.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1).saturating_mul(self.page_size as u64)
    }

    /// Maximum number of items on this page.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.page_size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Number of pages needed to hold `total_items` at `page_size` per page.
///
/// ```
/// assert_eq!(pagination::total_pages(0, 10), 0);
/// assert_eq!(pagination::total_pages(21, 10), 3);
/// ```
#[must_use]
pub const fn total_pages(total_items: u64, page_size: u32) -> u64 {
    let size = if page_size == 0 { 1 } else { page_size as u64 };
    total_items.div_ceil(size)
}

/// One page of results plus the totals needed to render navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    page: u32,
    page_size: u32,
    total_items: u64,
    total_pages: u64,
}

impl<T> Page<T> {
    /// Wrap the items fetched for `request` out of `total_items` matches.
    #[must_use]
    pub const fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages: total_pages(total_items, request.page_size),
        }
    }

    /// Items on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consume the envelope and return its items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// The 1-indexed page number that was requested.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Requested page size.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of items matching the query across all pages.
    #[must_use]
    pub const fn total_items(&self) -> u64 {
        self.total_items
    }

    /// Number of pages, `ceil(total_items / page_size)`.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// Whether a later page holds items.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        (self.page as u64) < self.total_pages
    }

    /// Whether an earlier page exists within the result range.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1 && self.total_pages > 0
    }

    /// Transform every item while keeping the page metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }

    /// Navigation links relative to `base`, preserving its other query
    /// parameters.
    #[must_use]
    pub fn links(&self, base: &Url) -> PageLinks {
        let previous_page = self
            .has_previous()
            .then(|| u64::from(self.page - 1).min(self.total_pages));
        PageLinks {
            self_link: page_url(base, u64::from(self.page), self.page_size),
            next: self
                .has_next()
                .then(|| page_url(base, u64::from(self.page) + 1, self.page_size)),
            prev: previous_page.map(|page| page_url(base, page, self.page_size)),
        }
    }
}

/// Absolute navigation links for a [`Page`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    /// Link to the current page.
    #[serde(rename = "self")]
    pub self_link: String,
    /// Link to the following page, when one holds items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Link to the preceding page, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

fn page_url(base: &Url, page: u64, page_size: u32) -> String {
    let mut url = base.clone();
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM && key != PAGE_SIZE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(PAGE_PARAM, &page.to_string())
        .append_pair(PAGE_SIZE_PARAM, &page_size.to_string());
    url.into()
}

#[cfg(test)]
mod tests {
    //! Unit coverage for page arithmetic and link construction.

    use super::*;
    use rstest::rstest;

    fn request(page: u32, page_size: u32) -> PageRequest {
        match PageRequest::new(page, page_size) {
            Ok(request) => request,
            Err(err) => panic!("fixture request must be valid: {err}"),
        }
    }

    #[rstest]
    #[case(0, 10, PaginationError::PageOutOfRange)]
    #[case(1, 0, PaginationError::PageSizeOutOfRange { max: MAX_PAGE_SIZE, actual: 0 })]
    #[case(1, 101, PaginationError::PageSizeOutOfRange { max: MAX_PAGE_SIZE, actual: 101 })]
    fn rejects_out_of_range_input(
        #[case] page: u32,
        #[case] page_size: u32,
        #[case] expected: PaginationError,
    ) {
        assert_eq!(PageRequest::new(page, page_size), Err(expected));
    }

    #[rstest]
    fn query_defaults_to_first_page_of_ten() {
        let request = PageRequest::from_query(None, None);
        assert_eq!(request, Ok(PageRequest::default()));
    }

    #[rstest]
    #[case(1, 10, 0)]
    #[case(3, 10, 20)]
    #[case(2, 25, 25)]
    fn offset_skips_previous_pages(#[case] page: u32, #[case] size: u32, #[case] offset: u64) {
        assert_eq!(request(page, size).offset(), offset);
    }

    #[rstest]
    #[case(0, 10, 0)]
    #[case(1, 10, 1)]
    #[case(10, 10, 1)]
    #[case(11, 10, 2)]
    #[case(95, 20, 5)]
    fn total_pages_rounds_up(#[case] total: u64, #[case] size: u32, #[case] pages: u64) {
        assert_eq!(total_pages(total, size), pages);
    }

    #[rstest]
    fn page_beyond_range_is_empty_not_an_error() {
        let page: Page<u32> = Page::new(Vec::new(), request(7, 10), 12);
        assert!(page.items().is_empty());
        assert_eq!(page.total_pages(), 2);
        assert!(!page.has_next());
    }

    #[rstest]
    fn map_preserves_metadata() {
        let page = Page::new(vec![1, 2], request(1, 2), 5).map(|n| n * 10);
        assert_eq!(page.items(), &[10, 20]);
        assert_eq!(page.total_items(), 5);
        assert_eq!(page.total_pages(), 3);
    }

    #[rstest]
    fn serialises_in_camel_case() {
        let page = Page::new(vec!["x"], request(1, 10), 1);
        let json = serde_json::to_value(&page).unwrap_or_default();
        assert_eq!(json["pageSize"], 10);
        assert_eq!(json["totalItems"], 1);
        assert_eq!(json["totalPages"], 1);
    }

    #[rstest]
    fn links_preserve_other_query_parameters() {
        let Ok(base) = Url::parse("http://shop.test/api/v1/products?searchTerm=mug&page=2") else {
            panic!("fixture url must parse");
        };
        let page = Page::new(vec![(); 10], request(2, 10), 35);
        let links = page.links(&base);

        assert_eq!(
            links.self_link,
            "http://shop.test/api/v1/products?searchTerm=mug&page=2&pageSize=10"
        );
        assert_eq!(
            links.next.as_deref(),
            Some("http://shop.test/api/v1/products?searchTerm=mug&page=3&pageSize=10")
        );
        assert_eq!(
            links.prev.as_deref(),
            Some("http://shop.test/api/v1/products?searchTerm=mug&page=1&pageSize=10")
        );
    }

    #[rstest]
    fn first_page_has_no_previous_link() {
        let Ok(base) = Url::parse("http://shop.test/products") else {
            panic!("fixture url must parse");
        };
        let page = Page::new(vec![1], request(1, 10), 1);
        let links = page.links(&base);
        assert!(links.prev.is_none());
        assert!(links.next.is_none());
    }
}
