//! Caller-supplied boundaries: record identity, local query strategies, and
//! the remote fetch contract.
//!
//! The controller never inspects record fields directly. Everything it needs
//! to know about a record comes through these traits, keeping the controller
//! fully generic over record shape.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::QueryState;

/// Unique, stable identifier for a record
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Str(s.to_owned())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Str(s)
    }
}

/// Typed sort key value extracted from a record
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Time(DateTime<Utc>),
    Text(String),
}

impl SortValue {
    /// Ascending comparison: numeric for numbers, chronological for times,
    /// case-sensitive string ordering for text. Mixed variants fall back to a
    /// fixed cross-type rank so the ordering stays total.
    pub fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (SortValue::Time(a), SortValue::Time(b)) => a.cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortValue::Number(_) => 0,
            SortValue::Time(_) => 1,
            SortValue::Text(_) => 2,
        }
    }
}

/// Stable identity for records. Required in both local and remote mode; the
/// selection tracker keys off it.
pub trait RecordIdentity<R>: Send + Sync {
    fn id(&self, record: &R) -> RecordId;
}

/// Local-mode query strategies: per-filter predicates, the search haystack,
/// and sort key extraction.
pub trait RecordAdapter<R>: RecordIdentity<R> {
    /// Whether `record` passes the filter `filter_id` with the selected
    /// `value`. `value` is never empty; empty selections remove the filter
    /// before it gets here.
    fn filter_matches(&self, record: &R, filter_id: &str, value: &str) -> bool;

    /// Text the default free-text search runs over
    fn search_haystack(&self, record: &R) -> String;

    /// Typed value used to sort by `key`
    fn sort_value(&self, record: &R, key: &str) -> SortValue;

    /// Ascending comparison for `key`. Override for custom orderings; the
    /// coordinator inverts the result for descending sorts.
    fn compare(&self, a: &R, b: &R, key: &str) -> Ordering {
        self.sort_value(a, key).compare(&self.sort_value(b, key))
    }

    /// Free-text predicate. Default is a case-insensitive substring match
    /// over the haystack.
    fn search_matches(&self, record: &R, needle: &str) -> bool {
        self.search_haystack(record)
            .to_lowercase()
            .contains(&needle.to_lowercase())
    }
}

/// One page of records from a remote source. `total_count` is `None` when the
/// source has not reported a count.
#[derive(Debug, Clone)]
pub struct FetchPage<R> {
    pub records: Vec<R>,
    pub total_count: Option<u64>,
}

/// Injected asynchronous fetch. Must be pure with respect to the query (same
/// query, equivalent shape of output); timing and transport are its own
/// business.
#[async_trait]
pub trait RecordFetcher<R>: Send + Sync {
    async fn fetch(&self, query: &QueryState) -> Result<FetchPage<R>>;
}

/// Whether a collection change is a view of the same logical dataset or a
/// swap to a different one. This cannot be inferred from the data, so callers
/// state it explicitly; the selection tracker survives the former and is
/// reconciled on the latter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetChange {
    SameDataset,
    NewDataset,
}

/// Where records come from
pub enum RecordSource<R> {
    /// Complete collection held in memory; filtering, search, sorting, and
    /// paging run synchronously against it
    Local {
        records: Vec<R>,
        adapter: Arc<dyn RecordAdapter<R>>,
    },
    /// Injected async fetch; the coordinator fences stale responses by query
    /// version
    Remote { fetcher: Arc<dyn RecordFetcher<R>> },
}
