#![forbid(unsafe_code)]

//! Revision watching for coalesced rebuilds.
//!
//! Layout graphs bump a monotonic counter once per effective mutation and
//! never push per-field events. A host that applies several mutations in the
//! same tick should rebuild its view once, not once per bump.
//! [`RevisionWatcher`] implements that "latest wins" policy: the host calls
//! [`RevisionWatcher::observe`] once per frame and rebuilds only when it
//! returns `true`, however many bumps happened in between.
//!
//! # Usage
//!
//! ```
//! use dockgraph_core::RevisionWatcher;
//!
//! let mut watcher = RevisionWatcher::new();
//! assert!(watcher.observe(0)); // first observation always rebuilds
//! assert!(!watcher.observe(0));
//!
//! // Three same-tick mutations, one rebuild.
//! assert!(watcher.observe(3));
//! assert_eq!(watcher.coalesced(), 2);
//! ```

/// Tracks the last revision a host rendered.
///
/// Not thread-safe; lives on the host's UI thread next to the graph it
/// watches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevisionWatcher {
    last_seen: Option<u64>,
    rebuilds: u64,
    coalesced: u64,
}

impl RevisionWatcher {
    /// Create a watcher that has not observed anything yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_seen: None,
            rebuilds: 0,
            coalesced: 0,
        }
    }

    /// Record `current` and report whether the host needs to rebuild.
    ///
    /// Returns `true` on the first observation and whenever `current`
    /// differs from the previously observed revision. Jumps of more than one
    /// count the skipped bumps as coalesced.
    pub fn observe(&mut self, current: u64) -> bool {
        match self.last_seen {
            Some(seen) if seen == current => false,
            Some(seen) => {
                self.coalesced = self
                    .coalesced
                    .saturating_add(current.abs_diff(seen).saturating_sub(1));
                self.last_seen = Some(current);
                self.rebuilds = self.rebuilds.saturating_add(1);
                true
            }
            None => {
                self.last_seen = Some(current);
                self.rebuilds = self.rebuilds.saturating_add(1);
                true
            }
        }
    }

    /// Whether `current` differs from the last observed revision, without
    /// recording it.
    #[must_use]
    pub fn is_stale(&self, current: u64) -> bool {
        self.last_seen != Some(current)
    }

    /// Last observed revision.
    #[must_use]
    pub const fn last_seen(&self) -> Option<u64> {
        self.last_seen
    }

    /// Number of rebuilds signalled so far.
    #[must_use]
    pub const fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Number of revision bumps folded into an earlier or later rebuild.
    #[must_use]
    pub const fn coalesced(&self) -> u64 {
        self.coalesced
    }

    /// Forget the last observation so the next poll rebuilds unconditionally.
    pub fn invalidate(&mut self) {
        self.last_seen = None;
    }
}
