//! Controller tuning knobs.

use std::time::Duration;

use crate::debounce::DEFAULT_DEBOUNCE;
use crate::prefs::ViewPrefs;

/// Default rows per page for list views
pub const DEFAULT_PAGE_SIZE: u64 = 25;

/// Configuration for a [`ListController`](crate::controller::ListController)
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Quiet interval between the last keystroke and the committed search
    pub debounce_delay: Duration,
    /// Committed searches shorter than this clear the search constraint
    /// instead of applying it
    pub min_search_chars: usize,
    /// Rows per page
    pub page_size: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce_delay: DEFAULT_DEBOUNCE,
            min_search_chars: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ControllerConfig {
    /// Apply user preferences over the defaults
    pub fn from_prefs(prefs: &ViewPrefs) -> Self {
        Self {
            page_size: prefs.page_size.max(1),
            ..Self::default()
        }
    }

    pub fn with_min_search_chars(mut self, min_chars: usize) -> Self {
        self.min_search_chars = min_chars;
        self
    }

    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}
