//! Query parameters and page arithmetic shared by the listings.

use std::fmt::{self, Display};
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Number of Pokémon shown per page
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(20).unwrap();
/// Number of evolution triggers shown per page
pub const DEFAULT_TRIGGER_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(10).unwrap();

/// The window of a paginated listing to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    /// Page size
    pub limit: NonZeroU32,
    /// Zero-based index of the first item
    pub offset: u32,
}

impl PageParams {
    pub fn new(limit: NonZeroU32, offset: u32) -> Self {
        Self { limit, offset }
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, 0)
    }
}

/// Parameters of the Pokémon listing
///
/// An empty search term lists the catalog page by page,
/// any other search term is matched against names verbatim (but case-insensitively),
/// surrounding whitespace included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingParams {
    pub page: PageParams,
    pub search_term: String,
}

impl ListingParams {
    pub fn new(page: PageParams, search_term: impl Into<String>) -> Self {
        Self {
            page,
            search_term: search_term.into(),
        }
    }

    pub fn is_search(&self) -> bool {
        !self.search_term.is_empty()
    }
}

/// A 1-based page position in a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    page: NonZeroU32,
    limit: NonZeroU32,
}

impl PageCursor {
    pub fn new(page: NonZeroU32, limit: NonZeroU32) -> Self {
        Self { page, limit }
    }

    pub fn first(limit: NonZeroU32) -> Self {
        Self::new(NonZeroU32::MIN, limit)
    }

    pub fn page(&self) -> NonZeroU32 {
        self.page
    }

    pub fn limit(&self) -> NonZeroU32 {
        self.limit
    }

    /// The offset of this page, `(page - 1) * limit`
    pub fn params(&self) -> PageParams {
        let offset = (self.page.get() - 1).saturating_mul(self.limit.get());
        PageParams::new(self.limit, offset)
    }

    /// The preceding page, staying on the first page
    pub fn previous_page(self) -> Self {
        let page = NonZeroU32::new(self.page.get() - 1).unwrap_or(NonZeroU32::MIN);
        Self { page, ..self }
    }

    pub fn next_page(self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..self
        }
    }

    /// The 1-based range of items shown on this page for a listing of `total_count` items.
    pub fn item_range(&self, total_count: u64) -> ItemRange {
        let page = u64::from(self.page.get());
        let limit = u64::from(self.limit.get());
        ItemRange {
            start: (page - 1) * limit + 1,
            end: (page * limit).min(total_count),
        }
    }
}

/// Items `start..=end` of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRange {
    pub start: u64,
    pub end: u64,
}

impl ItemRange {
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

impl Display for ItemRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}", self.start, self.end)
    }
}
