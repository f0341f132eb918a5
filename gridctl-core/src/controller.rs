//! Composition root: wires the query state, debounce governor, result
//! coordinator, and selection tracker behind one contract for presentation
//! layers.
//!
//! The controller's state lives in an `Arc<Mutex<..>>` shared with the timer
//! and fetch tasks it spawns; the lock is only ever taken for synchronous
//! read-modify-write sections and is never held across an await. Every
//! mutating operation publishes at most one view-model notification, and an
//! accepted remote resolution publishes one more; fenced resolutions publish
//! nothing.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::warn;

use crate::config::ControllerConfig;
use crate::coordinator::{execute_local, ResultCoordinator};
use crate::debounce::{DebounceGovernor, SearchCommit};
use crate::query::QueryState;
use crate::selection::SelectionTracker;
use crate::source::{
    DatasetChange, RecordAdapter, RecordFetcher, RecordId, RecordIdentity, RecordSource,
};

const LOCK_POISONED: &str = "controller state lock poisoned";

/// Snapshot handed to the render layer. Always a valid, renderable shape,
/// even under failure; nothing is thrown across this boundary.
#[derive(Debug, Clone)]
pub struct ListViewModel<R> {
    pub query: QueryState,
    /// Records of the current page (or latest successfully fetched page)
    pub records: Arc<Vec<R>>,
    pub total_count: Option<u64>,
    pub is_loading: bool,
    /// Display message of the last fetch failure, cleared on the next dispatch
    pub error: Option<String>,
    /// Every selected id, including ids whose record is not currently loaded
    pub selected_ids: BTreeSet<RecordId>,
    /// Selected records that are currently loaded, for bulk-action consumers
    pub selected_records: Vec<R>,
}

struct Inner<R> {
    query: QueryState,
    governor: DebounceGovernor,
    coordinator: ResultCoordinator<R>,
    selection: SelectionTracker,
    source: RecordSource<R>,
    identity: Arc<dyn RecordIdentity<R>>,
    disposed: bool,
}

/// Interactive list/query controller over a record type `R`.
///
/// Cheap to clone; clones share the same state. One instance corresponds to
/// exactly one logical list view.
pub struct ListController<R> {
    inner: Arc<Mutex<Inner<R>>>,
    notify: watch::Sender<ListViewModel<R>>,
}

impl<R> Clone for ListController<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            notify: self.notify.clone(),
        }
    }
}

impl<R> ListController<R>
where
    R: Clone + Send + Sync + 'static,
{
    /// Controller over a complete in-memory collection. All query processing
    /// is synchronous; staleness cannot occur.
    pub fn local<A>(records: Vec<R>, adapter: Arc<A>, config: ControllerConfig) -> Self
    where
        A: RecordAdapter<R> + 'static,
    {
        let identity: Arc<dyn RecordIdentity<R>> = adapter.clone();
        Self::with_source(RecordSource::Local { records, adapter }, identity, config)
    }

    /// Controller over an injected async fetch. Dispatches the initial fetch
    /// immediately, so it must be constructed inside a Tokio runtime.
    pub fn remote<F, I>(fetcher: Arc<F>, identity: Arc<I>, config: ControllerConfig) -> Self
    where
        F: RecordFetcher<R> + 'static,
        I: RecordIdentity<R> + 'static,
    {
        Self::with_source(RecordSource::Remote { fetcher }, identity, config)
    }

    fn with_source(
        source: RecordSource<R>,
        identity: Arc<dyn RecordIdentity<R>>,
        config: ControllerConfig,
    ) -> Self {
        let inner = Inner {
            query: QueryState::new(config.page_size),
            governor: DebounceGovernor::new(config.debounce_delay, config.min_search_chars),
            coordinator: ResultCoordinator::new(),
            selection: SelectionTracker::new(),
            source,
            identity,
            disposed: false,
        };
        let (notify, _initial_rx) = watch::channel(view_of(&inner));
        let controller = Self {
            inner: Arc::new(Mutex::new(inner)),
            notify,
        };
        {
            let mut inner = controller.lock();
            requery(&controller.inner, &controller.notify, &mut inner);
            controller.notify.send_replace(view_of(&inner));
        }
        controller
    }

    fn lock(&self) -> MutexGuard<'_, Inner<R>> {
        self.inner.lock().expect(LOCK_POISONED)
    }

    /// Current view-model snapshot
    pub fn view(&self) -> ListViewModel<R> {
        view_of(&self.lock())
    }

    /// Watch for view-model updates. Each mutating operation produces one
    /// notification; accepted async resolutions produce one more.
    pub fn subscribe(&self) -> watch::Receiver<ListViewModel<R>> {
        self.notify.subscribe()
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    /// Toggle sorting on `key`: same key flips direction, a new key starts
    /// ascending.
    pub fn sort_by(&self, key: &str) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        inner.query = inner.query.with_sort_toggled(key);
        requery(&self.inner, &self.notify, &mut inner);
        self.notify.send_replace(view_of(&inner));
    }

    /// Set a filter value; empty clears that filter. Resets to page 1.
    pub fn set_filter(&self, filter_id: &str, value: &str) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        inner.query = inner.query.with_filter(filter_id, value);
        requery(&self.inner, &self.notify, &mut inner);
        self.notify.send_replace(view_of(&inner));
    }

    /// Raw keystroke from the search box. Commits after the configured quiet
    /// interval; each call restarts the timer (trailing-edge debounce).
    pub fn search_input(&self, raw: &str) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        let ticket = inner.governor.note_input(raw);
        let delay = inner.governor.delay();
        drop(inner);

        let shared = Arc::clone(&self.inner);
        let notify = self.notify.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = shared.lock().expect(LOCK_POISONED);
            if inner.disposed {
                return;
            }
            if let Some(commit) = inner.governor.try_commit(ticket) {
                apply_commit(&shared, &notify, &mut inner, commit);
            }
        });
    }

    /// Commit pending search input immediately (Enter key, form submit)
    pub fn search_flush(&self) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        if let Some(commit) = inner.governor.flush() {
            apply_commit(&self.inner, &self.notify, &mut inner, commit);
        }
    }

    /// Move to `page`, clamped to >= 1 and, when a total count is known, to
    /// the last page
    pub fn set_page(&self, page: u64) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        let page_size = inner.query.pagination.page_size;
        let max_page = inner
            .coordinator
            .result()
            .total_count
            .map(|total| total.div_ceil(page_size).max(1));
        inner.query = match max_page {
            Some(max) => inner.query.with_page_clamped(page, max),
            None => inner.query.with_page(page),
        };
        requery(&self.inner, &self.notify, &mut inner);
        self.notify.send_replace(view_of(&inner));
    }

    /// Start over: drop filters, search, and sort, back to page 1. Also
    /// discards pending search input so it cannot resurrect a cleared
    /// constraint.
    pub fn clear_filters(&self) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        inner.governor.cancel();
        inner.query = inner.query.cleared();
        requery(&self.inner, &self.notify, &mut inner);
        self.notify.send_replace(view_of(&inner));
    }

    /// Flip selection of one row
    pub fn toggle_row(&self, id: RecordId) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        inner.selection.toggle(id);
        self.notify.send_replace(view_of(&inner));
    }

    /// Select or deselect every row on the currently visible page
    pub fn toggle_all_on_page(&self) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        let page_ids: Vec<RecordId> = inner
            .coordinator
            .result()
            .records
            .iter()
            .map(|r| inner.identity.id(r))
            .collect();
        inner.selection.toggle_all(&page_ids);
        self.notify.send_replace(view_of(&inner));
    }

    /// Empty the selection
    pub fn clear_selection(&self) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        inner.selection.clear();
        self.notify.send_replace(view_of(&inner));
    }

    /// Re-run the current query. This is the only retry path after a fetch
    /// failure; there is no automatic retry.
    pub fn refresh(&self) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        inner.query = inner.query.refreshed();
        requery(&self.inner, &self.notify, &mut inner);
        self.notify.send_replace(view_of(&inner));
    }

    /// Swap the local record collection. `change` states whether this is
    /// still the same logical dataset (refreshed contents) or a different
    /// one (hard swap); a hard swap drops selected ids that no longer exist.
    /// Ignored in remote mode; use [`dataset_changed`](Self::dataset_changed)
    /// there.
    pub fn replace_records(&self, records: Vec<R>, change: DatasetChange) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        {
            let Inner {
                source,
                selection,
                identity,
                ..
            } = &mut *inner;
            match source {
                RecordSource::Local { records: slot, .. } => {
                    *slot = records;
                    let known: BTreeSet<RecordId> =
                        slot.iter().map(|r| identity.id(r)).collect();
                    selection.reconcile(&known, change);
                }
                RecordSource::Remote { .. } => {
                    warn!("replace_records called on a remote-mode controller; ignoring");
                    return;
                }
            }
        }
        inner.query = inner.query.refreshed();
        requery(&self.inner, &self.notify, &mut inner);
        self.notify.send_replace(view_of(&inner));
    }

    /// The backing dataset changed behind the data source (remote mode, or a
    /// local source whose contents were mutated in place elsewhere). A hard
    /// swap reconciles the selection: in remote mode the new id universe is
    /// unknown until a fetch lands, so the selection is cleared outright.
    pub fn dataset_changed(&self, change: DatasetChange) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        if change == DatasetChange::NewDataset {
            let Inner {
                source,
                selection,
                identity,
                ..
            } = &mut *inner;
            match source {
                RecordSource::Local { records, .. } => {
                    let known: BTreeSet<RecordId> =
                        records.iter().map(|r| identity.id(r)).collect();
                    selection.reconcile(&known, change);
                }
                RecordSource::Remote { .. } => selection.clear(),
            }
        }
        inner.query = inner.query.refreshed();
        requery(&self.inner, &self.notify, &mut inner);
        self.notify.send_replace(view_of(&inner));
    }

    /// Scoped teardown. Cancels pending debounce timers and permanently
    /// fences in-flight fetches; every subsequent operation is a no-op.
    /// Mandatory when the consuming view unmounts mid-request.
    pub fn dispose(&self) {
        let mut inner = self.lock();
        inner.disposed = true;
        inner.governor.cancel();
        inner.coordinator.fence();
    }
}

/// Apply a committed search: trimmed text (or empty for a below-threshold
/// clear) plus a page reset, as a single query transition.
fn apply_commit<R>(
    shared: &Arc<Mutex<Inner<R>>>,
    notify: &watch::Sender<ListViewModel<R>>,
    inner: &mut Inner<R>,
    commit: SearchCommit,
) where
    R: Clone + Send + Sync + 'static,
{
    let text = match commit {
        SearchCommit::Apply(text) => text,
        SearchCommit::Clear => String::new(),
    };
    inner.query = inner.query.with_committed_search(&text);
    requery(shared, notify, inner);
    notify.send_replace(view_of(inner));
}

/// Produce the result for the current query: synchronously in local mode,
/// via a spawned fetch task in remote mode.
fn requery<R>(
    shared: &Arc<Mutex<Inner<R>>>,
    notify: &watch::Sender<ListViewModel<R>>,
    inner: &mut Inner<R>,
) where
    R: Clone + Send + Sync + 'static,
{
    let Inner {
        query,
        coordinator,
        source,
        ..
    } = inner;
    match source {
        RecordSource::Local { records, adapter } => {
            let mut set = execute_local(query, records, adapter.as_ref());
            // A filter or search change can leave the current page past the
            // end of the shrunken result; restart at page 1.
            let out_of_range = query.pagination.page > 1
                && query.pagination.offset() >= set.total_count.unwrap_or(0);
            if out_of_range {
                *query = query.with_page(1);
                set = execute_local(query, records, adapter.as_ref());
            }
            coordinator.install(set);
        }
        RecordSource::Remote { fetcher } => {
            let version = query.version();
            coordinator.begin(version);

            let fetcher = Arc::clone(fetcher);
            let query = query.clone();
            let shared = Arc::clone(shared);
            let notify = notify.clone();
            tokio::spawn(async move {
                let outcome = fetcher.fetch(&query).await;
                let mut inner = shared.lock().expect(LOCK_POISONED);
                if inner.disposed {
                    return;
                }
                let applied = match outcome {
                    Ok(page) => inner.coordinator.accept(version, page),
                    Err(err) => inner.coordinator.fail(version, &err),
                };
                if applied {
                    notify.send_replace(view_of(&inner));
                }
            });
        }
    }
}

fn view_of<R: Clone>(inner: &Inner<R>) -> ListViewModel<R> {
    let result = inner.coordinator.result();
    let selected_records: Vec<R> = result
        .records
        .iter()
        .filter(|r| inner.selection.contains(&inner.identity.id(r)))
        .cloned()
        .collect();
    ListViewModel {
        query: inner.query.clone(),
        records: Arc::clone(&result.records),
        total_count: result.total_count,
        is_loading: inner.coordinator.is_loading(),
        error: inner.coordinator.error().map(str::to_owned),
        selected_ids: inner.selection.ids().clone(),
        selected_records,
    }
}
