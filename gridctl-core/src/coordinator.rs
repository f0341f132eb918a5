//! Result production with stale-response fencing.
//!
//! Consumers must only ever observe results for the most recently requested
//! query. Every remote dispatch is tagged with the query version at dispatch
//! time; a resolution whose tag no longer matches is discarded silently.
//! Discarding is not a failure, it is the normal fate of a superseded
//! request, so it logs at trace level only.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::GridError;
use crate::query::QueryState;
use crate::source::{FetchPage, RecordAdapter};

/// The latest consistent result set for some query version
#[derive(Debug, Clone)]
pub struct ResultSet<R> {
    pub records: Arc<Vec<R>>,
    /// Post-filter record count: materialized locally in local mode, reported
    /// by the source (or not yet reported) in remote mode
    pub total_count: Option<u64>,
    pub query_version: u64,
}

impl<R> ResultSet<R> {
    pub fn empty() -> Self {
        Self {
            records: Arc::new(Vec::new()),
            total_count: None,
            query_version: 0,
        }
    }
}

/// Tracks the in-flight request, the latest accepted result, and
/// loading/error status.
#[derive(Debug)]
pub struct ResultCoordinator<R> {
    latest: ResultSet<R>,
    dispatched_version: u64,
    is_loading: bool,
    error: Option<String>,
    fenced: bool,
}

impl<R> ResultCoordinator<R> {
    pub fn new() -> Self {
        Self {
            latest: ResultSet::empty(),
            dispatched_version: 0,
            is_loading: false,
            error: None,
            fenced: false,
        }
    }

    /// Latest accepted result. Retained across fetch failures so the UI
    /// never flashes empty.
    pub fn result(&self) -> &ResultSet<R> {
        &self.latest
    }

    /// True from dispatch until the response for the latest version resolves.
    /// Stale resolutions do not clear it, so a torrent of rapid requests
    /// stays "loading" until the last one lands.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Display message of the last failed fetch, if the failure is current
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_fenced(&self) -> bool {
        self.fenced
    }

    /// Tag an outgoing remote fetch with the query version at dispatch time
    pub fn begin(&mut self, version: u64) {
        self.dispatched_version = version;
        self.is_loading = true;
        self.error = None;
        debug!(version, "dispatching fetch");
    }

    /// Apply a resolved fetch. Returns `false` when the response was fenced
    /// out and nothing changed.
    pub fn accept(&mut self, version: u64, page: FetchPage<R>) -> bool {
        if self.fenced || version != self.dispatched_version {
            trace!(
                version,
                current = self.dispatched_version,
                "discarding stale response"
            );
            return false;
        }
        self.latest = ResultSet {
            records: Arc::new(page.records),
            total_count: page.total_count,
            query_version: version,
        };
        self.is_loading = false;
        self.error = None;
        debug!(version, count = self.latest.records.len(), "accepted result");
        true
    }

    /// Record a failed fetch. The previous successful result is retained;
    /// retry happens only through an explicit refresh.
    pub fn fail(&mut self, version: u64, error: &GridError) -> bool {
        if self.fenced || version != self.dispatched_version {
            trace!(
                version,
                current = self.dispatched_version,
                "discarding stale failure"
            );
            return false;
        }
        self.is_loading = false;
        self.error = Some(error.to_string());
        warn!(version, %error, "fetch failed");
        true
    }

    /// Install a synchronously computed local result; staleness cannot occur
    /// on the local path.
    pub fn install(&mut self, set: ResultSet<R>) {
        self.dispatched_version = set.query_version;
        self.is_loading = false;
        self.error = None;
        self.latest = set;
    }

    /// Permanently fence every outstanding and future resolution. Called on
    /// dispose; a late response must not mutate a disposed controller.
    pub fn fence(&mut self) {
        self.fenced = true;
        self.is_loading = false;
    }
}

impl<R> Default for ResultCoordinator<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the local-mode pipeline: filter predicates, free-text search, stable
/// sort, then the page slice.
pub fn execute_local<R: Clone>(
    query: &QueryState,
    records: &[R],
    adapter: &dyn RecordAdapter<R>,
) -> ResultSet<R> {
    let mut rows: Vec<&R> = records
        .iter()
        .filter(|r| {
            query
                .filters
                .iter()
                .all(|(id, value)| adapter.filter_matches(r, id, value))
        })
        .collect();

    if !query.search.is_empty() {
        rows.retain(|r| adapter.search_matches(r, &query.search));
    }

    if let Some(sort) = &query.sort {
        // Descending inverts the ascending comparator's result instead of
        // swapping operands; sort_by is stable, so ties keep their original
        // relative order either way.
        match sort.direction {
            crate::query::SortDirection::Asc => {
                rows.sort_by(|a, b| adapter.compare(a, b, &sort.key));
            }
            crate::query::SortDirection::Desc => {
                rows.sort_by(|a, b| adapter.compare(a, b, &sort.key).reverse());
            }
        }
    }

    let total = rows.len() as u64;
    let page: Vec<R> = rows
        .into_iter()
        .skip(query.pagination.offset() as usize)
        .take(query.pagination.page_size as usize)
        .cloned()
        .collect();

    ResultSet {
        records: Arc::new(page),
        total_count: Some(total),
        query_version: query.version(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{RecordId, RecordIdentity, SortValue};

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        id: i64,
        name: &'static str,
        status: &'static str,
    }

    struct PersonAdapter;

    impl RecordIdentity<Person> for PersonAdapter {
        fn id(&self, p: &Person) -> RecordId {
            RecordId::Int(p.id)
        }
    }

    impl RecordAdapter<Person> for PersonAdapter {
        fn filter_matches(&self, p: &Person, filter_id: &str, value: &str) -> bool {
            match filter_id {
                "status" => p.status == value,
                _ => true,
            }
        }

        fn search_haystack(&self, p: &Person) -> String {
            p.name.to_owned()
        }

        fn sort_value(&self, p: &Person, key: &str) -> SortValue {
            match key {
                "name" => SortValue::Text(p.name.to_owned()),
                "id" => SortValue::Number(p.id as f64),
                _ => SortValue::Text(String::new()),
            }
        }
    }

    fn people() -> Vec<Person> {
        vec![
            Person { id: 1, name: "Bob", status: "active" },
            Person { id: 2, name: "Amy", status: "inactive" },
            Person { id: 3, name: "Cid", status: "active" },
        ]
    }

    fn names(set: &ResultSet<Person>) -> Vec<&'static str> {
        set.records.iter().map(|p| p.name).collect()
    }

    #[test]
    fn local_filter_sort_and_page() {
        let data = people();
        let query = QueryState::new(2).with_filter("status", "active");
        let set = execute_local(&query, &data, &PersonAdapter);
        // Order preserved, stable
        assert_eq!(names(&set), vec!["Bob", "Cid"]);
        assert_eq!(set.total_count, Some(2));

        let sorted = query.with_sort_toggled("name");
        let set = execute_local(&sorted, &data, &PersonAdapter);
        assert_eq!(names(&set), vec!["Bob", "Cid"]);

        let descending = sorted.with_sort_toggled("name");
        let set = execute_local(&descending, &data, &PersonAdapter);
        assert_eq!(names(&set), vec!["Cid", "Bob"]);
    }

    #[test]
    fn local_search_is_substring_case_insensitive() {
        let data = people();
        let query = QueryState::new(10).with_committed_search("bo");
        let set = execute_local(&query, &data, &PersonAdapter);
        assert_eq!(names(&set), vec!["Bob"]);
        assert_eq!(set.total_count, Some(1));
    }

    #[test]
    fn local_page_slice() {
        let data = people();
        let query = QueryState::new(2).with_page(2);
        let set = execute_local(&query, &data, &PersonAdapter);
        assert_eq!(names(&set), vec!["Cid"]);
        assert_eq!(set.total_count, Some(3));
    }

    #[test]
    fn stable_sort_preserves_ties() {
        let data = vec![
            Person { id: 1, name: "Bob", status: "active" },
            Person { id: 2, name: "Amy", status: "active" },
            Person { id: 3, name: "Bob", status: "inactive" },
        ];
        let query = QueryState::new(10).with_sort_toggled("name");
        let set = execute_local(&query, &data, &PersonAdapter);
        let ids: Vec<i64> = set.records.iter().map(|p| p.id).collect();
        // The two Bobs keep their original relative order
        assert_eq!(ids, vec![2, 1, 3]);

        let desc = query.with_sort_toggled("name");
        let set = execute_local(&desc, &data, &PersonAdapter);
        let ids: Vec<i64> = set.records.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut coord: ResultCoordinator<Person> = ResultCoordinator::new();
        coord.begin(1);
        coord.begin(2);

        // Version 1 resolves late
        let accepted = coord.accept(
            1,
            FetchPage { records: people(), total_count: Some(3) },
        );
        assert!(!accepted);
        assert!(coord.result().records.is_empty());
        // Still waiting for version 2
        assert!(coord.is_loading());

        let accepted = coord.accept(
            2,
            FetchPage { records: people(), total_count: Some(3) },
        );
        assert!(accepted);
        assert!(!coord.is_loading());
        assert_eq!(coord.result().query_version, 2);
    }

    #[test]
    fn failure_retains_previous_records() {
        let mut coord: ResultCoordinator<Person> = ResultCoordinator::new();
        coord.begin(1);
        coord.accept(1, FetchPage { records: people(), total_count: Some(3) });

        coord.begin(2);
        let noted = coord.fail(2, &GridError::fetch("boom"));
        assert!(noted);
        assert_eq!(coord.result().records.len(), 3);
        assert!(coord.error().unwrap().contains("boom"));
        assert!(!coord.is_loading());
    }

    #[test]
    fn fence_blocks_all_future_resolutions() {
        let mut coord: ResultCoordinator<Person> = ResultCoordinator::new();
        coord.begin(1);
        coord.fence();

        assert!(!coord.is_loading());
        let accepted = coord.accept(
            1,
            FetchPage { records: people(), total_count: Some(3) },
        );
        assert!(!accepted);
        assert!(coord.result().records.is_empty());
    }
}
