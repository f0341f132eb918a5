//! gridctl-core - interactive list/query controller
//!
//! A generic controller for list views: sorting, filtering, pagination, row
//! selection, and debounced free-text search over a collection of records,
//! correct under rapid user input and overlapping async fetches.
//!
//! ## Architecture
//!
//! ```text
//! input event → DebounceGovernor → QueryState transition
//!                                        ↓
//!                              ResultCoordinator (local pipeline
//!                                        ↓        or version-fenced fetch)
//!                               new ResultSet
//!                                        ↓
//!                            SelectionTracker reconciliation
//!                                        ↓
//!                        ListController publishes ListViewModel
//! ```
//!
//! The controller is agnostic to transport and rendering: data arrives
//! through a [`RecordFetcher`] or an in-memory collection interpreted by a
//! [`RecordAdapter`], and presentation layers consume [`ListViewModel`]
//! snapshots via [`ListController::subscribe`]. Remote-mode controllers
//! spawn their fetch and debounce timers on Tokio, so they must live inside
//! a runtime.

pub mod config;
pub mod controller;
pub mod coordinator;
pub mod debounce;
pub mod error;
pub mod prefs;
pub mod query;
pub mod selection;
pub mod source;

pub use config::{ControllerConfig, DEFAULT_PAGE_SIZE};
pub use controller::{ListController, ListViewModel};
pub use coordinator::{ResultCoordinator, ResultSet};
pub use debounce::{DebounceGovernor, DebounceTicket, SearchCommit, DEFAULT_DEBOUNCE};
pub use error::{GridError, Result};
pub use prefs::{Theme, ViewPrefs};
pub use query::{Pagination, QueryState, SortDirection, SortSpec};
pub use selection::SelectionTracker;
pub use source::{
    DatasetChange, FetchPage, RecordAdapter, RecordFetcher, RecordId, RecordIdentity,
    RecordSource, SortValue,
};
