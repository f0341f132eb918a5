//! Canonical query description: sort, filters, search text, pagination.
//!
//! `QueryState` is immutable per version. Every transition returns a new
//! value with a bumped version number; the version is what the result
//! coordinator fences stale responses against.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sort direction for a single key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Flip asc -> desc -> asc
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// An active sort. "Not sorting" is `Option<SortSpec>::None`, so a direction
/// can never exist without a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

/// 1-based pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
}

impl Pagination {
    /// Zero-based offset of the first record on the current page
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }
}

/// The single source of truth for what data the user wants to see.
///
/// Filters are a map from filter id to selected value; an absent entry and an
/// empty-string value both mean "not filtering on this dimension", so empty
/// values are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    pub sort: Option<SortSpec>,
    pub filters: BTreeMap<String, String>,
    pub search: String,
    pub pagination: Pagination,
    version: u64,
}

impl QueryState {
    /// Default query: no sort, no filters, no search, page 1
    pub fn new(page_size: u64) -> Self {
        Self {
            sort: None,
            filters: BTreeMap::new(),
            search: String::new(),
            pagination: Pagination {
                page: 1,
                page_size: page_size.max(1),
            },
            version: 0,
        }
    }

    /// Monotonically increasing version; bumped on every transition
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Current value for a filter id, if constrained
    pub fn filter(&self, filter_id: &str) -> Option<&str> {
        self.filters.get(filter_id).map(String::as_str)
    }

    fn bumped(mut self) -> Self {
        self.version += 1;
        self
    }

    /// Toggle sorting on `key`: same key flips direction, a new key starts
    /// ascending.
    pub fn with_sort_toggled(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.sort = match &self.sort {
            Some(spec) if spec.key == key => Some(SortSpec {
                key: spec.key.clone(),
                direction: spec.direction.toggled(),
            }),
            _ => Some(SortSpec {
                key: key.to_owned(),
                direction: SortDirection::Asc,
            }),
        };
        next.bumped()
    }

    /// Replace the value for `filter_id`. An empty value removes the
    /// constraint. A filter change invalidates the current page, so the page
    /// resets to 1.
    pub fn with_filter(&self, filter_id: &str, value: &str) -> Self {
        let mut next = self.clone();
        if value.is_empty() {
            next.filters.remove(filter_id);
        } else {
            next.filters.insert(filter_id.to_owned(), value.to_owned());
        }
        next.pagination.page = 1;
        next.bumped()
    }

    /// Store trimmed search text. Does not touch pagination; the debounce
    /// governor resets the page once a search actually commits.
    pub fn with_search(&self, text: &str) -> Self {
        let mut next = self.clone();
        next.search = text.trim().to_owned();
        next.bumped()
    }

    /// A committed search: trimmed text plus a page reset, in one version bump
    pub fn with_committed_search(&self, text: &str) -> Self {
        let mut next = self.clone();
        next.search = text.trim().to_owned();
        next.pagination.page = 1;
        next.bumped()
    }

    /// Move to `page`, clamped to >= 1
    pub fn with_page(&self, page: u64) -> Self {
        let mut next = self.clone();
        next.pagination.page = page.max(1);
        next.bumped()
    }

    /// Move to `page`, clamped to `1..=max_page`
    pub fn with_page_clamped(&self, page: u64, max_page: u64) -> Self {
        self.with_page(page.min(max_page.max(1)))
    }

    /// Start over: drop sort, filters, and search, back to page 1. Dropping
    /// the sort is deliberate; clearing means "start over", not "keep my
    /// ordering".
    pub fn cleared(&self) -> Self {
        let mut next = self.clone();
        next.sort = None;
        next.filters.clear();
        next.search.clear();
        next.pagination.page = 1;
        next.bumped()
    }

    /// Bump the version without changing the query. Used for manual refresh
    /// and dataset swaps so in-flight responses for the old state get fenced.
    pub fn refreshed(&self) -> Self {
        self.clone().bumped()
    }
}
