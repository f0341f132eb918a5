//! Trailing-edge debounce for search input.
//!
//! The governor itself is a synchronous state machine: each input supersedes
//! the previous one and yields a generation ticket. The controller owns the
//! timers; it sleeps for the configured delay and then tries to redeem the
//! ticket. A ticket issued before a newer input is stale and redeems to
//! nothing, which is what cancels the earlier timer's effect.

use std::time::Duration;

/// Default delay between the last keystroke and the committed search
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Outcome of a committed input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCommit {
    /// Apply the committed text as the search constraint
    Apply(String),
    /// Input was below the minimum length: clear any active search constraint
    /// rather than leaving a stale one behind
    Clear,
}

/// Handle for a scheduled commit; superseded by any later input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket(u64);

/// Converts rapid input events into a bounded-rate stream of search commits
#[derive(Debug)]
pub struct DebounceGovernor {
    delay: Duration,
    min_chars: usize,
    generation: u64,
    pending: Option<String>,
}

impl DebounceGovernor {
    pub fn new(delay: Duration, min_chars: usize) -> Self {
        Self {
            delay,
            min_chars,
            generation: 0,
            pending: None,
        }
    }

    /// Delay the controller should sleep before redeeming a ticket
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether an input is waiting to commit
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record raw input. The returned ticket is valid until the next input,
    /// flush, or cancel.
    pub fn note_input(&mut self, raw: &str) -> DebounceTicket {
        self.generation += 1;
        self.pending = Some(raw.to_owned());
        DebounceTicket(self.generation)
    }

    /// Redeem a ticket once its delay has elapsed. Stale tickets return
    /// `None` silently; that is the normal fate of every superseded input.
    pub fn try_commit(&mut self, ticket: DebounceTicket) -> Option<SearchCommit> {
        if ticket.0 != self.generation {
            return None;
        }
        let raw = self.pending.take()?;
        Some(self.commit_of(&raw))
    }

    /// Commit pending input immediately (Enter key, form submit) and
    /// invalidate any outstanding ticket.
    pub fn flush(&mut self) -> Option<SearchCommit> {
        self.generation += 1;
        let raw = self.pending.take()?;
        Some(self.commit_of(&raw))
    }

    /// Discard pending input without committing. Mandatory on teardown so a
    /// late timer cannot mutate state nobody is observing.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = None;
    }

    fn commit_of(&self, raw: &str) -> SearchCommit {
        let trimmed = raw.trim();
        if trimmed.chars().count() < self.min_chars {
            SearchCommit::Clear
        } else {
            SearchCommit::Apply(trimmed.to_owned())
        }
    }
}

impl Default for DebounceGovernor {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE, 0)
    }
}
