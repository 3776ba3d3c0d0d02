//! Catalogue search parameters.
//!
//! Sorting is restricted to an allow-list of columns so untrusted input never
//! reaches the query builder as an identifier.

use std::str::FromStr;

use pagination::PageRequest;

use super::Error;

/// Column a catalogue search may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    /// Product id.
    Id,
    /// Product name.
    #[default]
    Name,
    /// Product description.
    Description,
    /// Unit price.
    Price,
    /// Remaining stock.
    Quantity,
}

impl FromStr for SortColumn {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "name" | "productname" => Ok(Self::Name),
            "description" | "productdescription" => Ok(Self::Description),
            "price" => Ok(Self::Price),
            "quantity" => Ok(Self::Quantity),
            _ => Err(Error::invalid_request(format!("cannot sort products by '{raw}'"))
                .with_details(serde_json::json!({
                    "field": "orderBy",
                    "allowed": ["id", "name", "description", "price", "quantity"],
                }))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(Error::invalid_request(format!(
                "sort direction must be 'asc' or 'desc', got '{raw}'"
            ))),
        }
    }
}

/// A validated catalogue query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductSearch {
    /// Case-insensitive substring matched against name and description.
    pub term: Option<String>,
    /// Requested page.
    pub page: PageRequest,
    /// Ordering column.
    pub order_by: SortColumn,
    /// Ordering direction.
    pub direction: SortDirection,
    /// Include unpriced and sold-out products (admin view).
    pub include_unlisted: bool,
}

impl ProductSearch {
    /// Build a search from raw query values, applying defaults.
    ///
    /// Blank terms match everything. Invalid pagination, sort column or
    /// direction fail with an invalid-request error.
    pub fn from_parts(
        term: Option<&str>,
        page: Option<u32>,
        page_size: Option<u32>,
        order_by: Option<&str>,
        direction: Option<&str>,
    ) -> Result<Self, Error> {
        let page = PageRequest::from_query(page, page_size)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let order_by = order_by.map(str::parse).transpose()?.unwrap_or_default();
        let direction = direction.map(str::parse).transpose()?.unwrap_or_default();
        let term = term
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);
        Ok(Self {
            term,
            page,
            order_by,
            direction,
            include_unlisted: false,
        })
    }

    /// Switch to the admin view that includes delisted products.
    #[must_use]
    pub fn including_unlisted(mut self, include: bool) -> Self {
        self.include_unlisted = include;
        self
    }

    /// The lowercased search term, if any.
    pub fn normalised_term(&self) -> Option<String> {
        self.term.as_deref().map(str::to_lowercase)
    }
}
