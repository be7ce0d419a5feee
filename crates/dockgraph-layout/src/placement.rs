//! Placement memory: where a leaf was before it left its host.
//!
//! Right before a leaf is removed from a tree (pinned, floated, hidden) the
//! graph captures a [`PlacementRecord`] from the leaf's immediate parent:
//!
//! | Parent | preferred | previous | next |
//! |--------|-----------|----------|------|
//! | tabs   | (tabs, center, index) | (prev tab, center, index) | (next tab, center, index) |
//! | split  | previous, else next | (prev, right/bottom) | (next, left/top) |
//! | none   | - | - | - |
//!
//! When the leaf comes back, [`resolve`] picks the first usable option:
//!
//! 1. preferred anchor, if its target is in the intended host,
//! 2. previous-sibling anchor,
//! 3. next-sibling anchor,
//! 4. the recorded floating host's root, if that host still exists,
//! 5. right of the main root,
//! 6. the main root itself when the main tree is empty.
//!
//! The intended host is the recorded one when still alive, otherwise the
//! main tree. Resolution is a pure function over [`PlacementHosts`] so it can
//! be tested without any real host.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::element::{DockPosition, ElementId, ElementKind};
use crate::graph::LayoutGraph;

/// Identifier of a floating host window owned by a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FloatingHostId(pub(crate) u64);

impl FloatingHostId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FloatingHostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "floating-{}", self.0)
    }
}

/// Tree a leaf was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "host", content = "id", rename_all = "snake_case")]
pub enum HostId {
    Main,
    Floating(FloatingHostId),
}

/// Dock target, position, and tab index to retry on restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementAnchor {
    pub target: ElementId,
    pub position: DockPosition,
    pub tab_index: Option<usize>,
}

impl PlacementAnchor {
    #[must_use]
    pub const fn new(target: ElementId, position: DockPosition, tab_index: Option<usize>) -> Self {
        Self {
            target,
            position,
            tab_index,
        }
    }
}

/// Restore anchors captured when a leaf left `host`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub host: HostId,
    pub preferred: Option<PlacementAnchor>,
    pub previous: Option<PlacementAnchor>,
    pub next: Option<PlacementAnchor>,
}

impl PlacementRecord {
    /// Record with no anchors; restore falls through to the host fallbacks.
    #[must_use]
    pub const fn unanchored(host: HostId) -> Self {
        Self {
            host,
            preferred: None,
            previous: None,
            next: None,
        }
    }

    /// Anchors in resolution order.
    pub fn anchors(&self) -> impl Iterator<Item = PlacementAnchor> + '_ {
        [self.preferred, self.previous, self.next].into_iter().flatten()
    }
}

/// Latest [`PlacementRecord`] per leaf.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementMemory {
    records: FxHashMap<ElementId, PlacementRecord>,
}

impl PlacementMemory {
    #[must_use]
    pub fn get(&self, leaf: ElementId) -> Option<&PlacementRecord> {
        self.records.get(&leaf)
    }

    /// Store a record, superseding any earlier capture for the leaf.
    pub fn remember(&mut self, leaf: ElementId, record: PlacementRecord) {
        self.records.insert(leaf, record);
    }

    pub fn forget(&mut self, leaf: ElementId) -> Option<PlacementRecord> {
        self.records.remove(&leaf)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Capture anchors for `leaf` from its position in `graph`.
///
/// Returns `None` if the leaf is not attached to the graph's tree.
#[must_use]
pub fn capture(graph: &LayoutGraph, leaf: ElementId, host: HostId) -> Option<PlacementRecord> {
    if !graph.contains_in_tree(leaf) {
        return None;
    }
    let Some(parent) = graph.parent_of(leaf) else {
        return Some(PlacementRecord::unanchored(host));
    };
    let record = graph.element(parent)?;
    let siblings = record.children();
    let index = siblings.iter().position(|child| *child == leaf)?;
    let previous = index.checked_sub(1).and_then(|i| siblings.get(i).copied());
    let next = siblings.get(index + 1).copied();

    let captured = match record.kind() {
        ElementKind::Tabs(_) => {
            let tab = |target| PlacementAnchor::new(target, DockPosition::Center, Some(index));
            PlacementRecord {
                host,
                preferred: Some(tab(parent)),
                previous: previous.map(tab),
                next: next.map(tab),
            }
        }
        ElementKind::Split(split) => {
            let orientation = split.orientation();
            let previous = previous.map(|target| {
                PlacementAnchor::new(target, DockPosition::trailing(orientation), None)
            });
            let next = next.map(|target| {
                PlacementAnchor::new(target, DockPosition::leading(orientation), None)
            });
            PlacementRecord {
                host,
                preferred: previous.or(next),
                previous,
                next,
            }
        }
        ElementKind::Leaf(_) => PlacementRecord::unanchored(host),
    };
    Some(captured)
}

/// Read-only view of the trees a leaf may be restored into.
pub trait PlacementHosts {
    /// Whether `host` still exists. The main host always does.
    fn host_is_alive(&self, host: HostId) -> bool;

    /// Whether `element` is attached to `host`'s tree.
    fn host_contains(&self, host: HostId, element: ElementId) -> bool;

    /// Whether `host`'s tree has no root.
    fn host_is_empty(&self, host: HostId) -> bool;
}

/// Outcome of placement resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePlan {
    /// Dock against a remembered anchor inside `host`.
    Anchor {
        host: HostId,
        anchor: PlacementAnchor,
    },
    /// Dock right of the floating host's root, or become it if empty.
    HostRoot { host: FloatingHostId },
    /// Dock right of the main root.
    MainRoot,
    /// Become the main root.
    BecomeMainRoot,
}

impl RestorePlan {
    /// Host the leaf ends up in.
    #[must_use]
    pub const fn host(&self) -> HostId {
        match self {
            Self::Anchor { host, .. } => *host,
            Self::HostRoot { host } => HostId::Floating(*host),
            Self::MainRoot | Self::BecomeMainRoot => HostId::Main,
        }
    }
}

/// Host the anchors are looked up in.
fn intended_host<H: PlacementHosts + ?Sized>(record: &PlacementRecord, hosts: &H) -> HostId {
    if hosts.host_is_alive(record.host) {
        record.host
    } else {
        HostId::Main
    }
}

/// Steps 1-3: first anchor whose target is still attached in the intended
/// host. An anchor pointing at the leaf itself never counts.
#[must_use]
pub fn resolve_anchor<H: PlacementHosts + ?Sized>(
    record: Option<&PlacementRecord>,
    leaf: ElementId,
    hosts: &H,
) -> Option<(HostId, PlacementAnchor)> {
    let record = record?;
    let host = intended_host(record, hosts);
    record
        .anchors()
        .find(|anchor| anchor.target != leaf && hosts.host_contains(host, anchor.target))
        .map(|anchor| (host, anchor))
}

/// Steps 4-6: host-level fallbacks.
#[must_use]
pub fn fallback<H: PlacementHosts + ?Sized>(
    record: Option<&PlacementRecord>,
    hosts: &H,
) -> RestorePlan {
    if let Some(HostId::Floating(host)) = record.map(|record| record.host) {
        if hosts.host_is_alive(HostId::Floating(host)) {
            return RestorePlan::HostRoot { host };
        }
    }
    if hosts.host_is_empty(HostId::Main) {
        RestorePlan::BecomeMainRoot
    } else {
        RestorePlan::MainRoot
    }
}

/// Full resolution order, first success wins.
#[must_use]
pub fn resolve<H: PlacementHosts + ?Sized>(
    record: Option<&PlacementRecord>,
    leaf: ElementId,
    hosts: &H,
) -> RestorePlan {
    match resolve_anchor(record, leaf, hosts) {
        Some((host, anchor)) => RestorePlan::Anchor { host, anchor },
        None => fallback(record, hosts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[derive(Default)]
    struct FakeHosts {
        main: FxHashSet<ElementId>,
        floating: FxHashMap<FloatingHostId, FxHashSet<ElementId>>,
    }

    impl FakeHosts {
        fn with_main(ids: &[ElementId]) -> Self {
            Self {
                main: ids.iter().copied().collect(),
                ..Self::default()
            }
        }
    }

    impl PlacementHosts for FakeHosts {
        fn host_is_alive(&self, host: HostId) -> bool {
            match host {
                HostId::Main => true,
                HostId::Floating(id) => self.floating.contains_key(&id),
            }
        }

        fn host_contains(&self, host: HostId, element: ElementId) -> bool {
            match host {
                HostId::Main => self.main.contains(&element),
                HostId::Floating(id) => self
                    .floating
                    .get(&id)
                    .is_some_and(|members| members.contains(&element)),
            }
        }

        fn host_is_empty(&self, host: HostId) -> bool {
            match host {
                HostId::Main => self.main.is_empty(),
                HostId::Floating(id) => self.floating.get(&id).is_none_or(|m| m.is_empty()),
            }
        }
    }

    fn id() -> ElementId {
        ElementId::allocate()
    }

    fn split_record(host: HostId, previous: ElementId, next: ElementId) -> PlacementRecord {
        let previous = PlacementAnchor::new(previous, DockPosition::Right, None);
        PlacementRecord {
            host,
            preferred: Some(previous),
            previous: Some(previous),
            next: Some(PlacementAnchor::new(next, DockPosition::Left, None)),
        }
    }

    #[test]
    fn preferred_anchor_wins() {
        let (leaf, a, b) = (id(), id(), id());
        let hosts = FakeHosts::with_main(&[a, b]);
        let record = split_record(HostId::Main, a, b);
        assert_eq!(
            resolve(Some(&record), leaf, &hosts),
            RestorePlan::Anchor {
                host: HostId::Main,
                anchor: PlacementAnchor::new(a, DockPosition::Right, None),
            }
        );
    }

    #[test]
    fn next_anchor_used_when_previous_gone() {
        let (leaf, a, b) = (id(), id(), id());
        let hosts = FakeHosts::with_main(&[b]);
        let record = split_record(HostId::Main, a, b);
        let plan = resolve(Some(&record), leaf, &hosts);
        assert_eq!(
            plan,
            RestorePlan::Anchor {
                host: HostId::Main,
                anchor: PlacementAnchor::new(b, DockPosition::Left, None),
            }
        );
    }

    #[test]
    fn anchor_on_leaf_itself_is_skipped() {
        let leaf = id();
        let hosts = FakeHosts::with_main(&[leaf]);
        let record = PlacementRecord {
            host: HostId::Main,
            preferred: Some(PlacementAnchor::new(leaf, DockPosition::Center, Some(0))),
            previous: None,
            next: None,
        };
        assert_eq!(resolve(Some(&record), leaf, &hosts), RestorePlan::MainRoot);
    }

    #[test]
    fn live_floating_host_root_before_main() {
        let (leaf, gone, other) = (id(), id(), id());
        let host = FloatingHostId(7);
        let mut hosts = FakeHosts::with_main(&[other]);
        hosts.floating.insert(host, std::iter::once(id()).collect());
        let record = split_record(HostId::Floating(host), gone, gone);
        assert_eq!(
            resolve(Some(&record), leaf, &hosts),
            RestorePlan::HostRoot { host }
        );
    }

    #[test]
    fn dead_floating_host_searches_main() {
        let (leaf, a, b) = (id(), id(), id());
        let hosts = FakeHosts::with_main(&[a]);
        let record = split_record(HostId::Floating(FloatingHostId(3)), a, b);
        assert_eq!(
            resolve(Some(&record), leaf, &hosts).host(),
            HostId::Main
        );
        assert!(matches!(
            resolve(Some(&record), leaf, &hosts),
            RestorePlan::Anchor { .. }
        ));
    }

    #[test]
    fn no_memory_falls_back_to_main() {
        let leaf = id();
        let empty = FakeHosts::default();
        assert_eq!(resolve(None, leaf, &empty), RestorePlan::BecomeMainRoot);
        let populated = FakeHosts::with_main(&[id()]);
        assert_eq!(resolve(None, leaf, &populated), RestorePlan::MainRoot);
    }

    #[test]
    fn memory_supersedes_previous_capture() {
        let leaf = id();
        let mut memory = PlacementMemory::default();
        memory.remember(leaf, PlacementRecord::unanchored(HostId::Main));
        let host = HostId::Floating(FloatingHostId(1));
        memory.remember(leaf, PlacementRecord::unanchored(host));
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.get(leaf).map(|record| record.host), Some(host));
        assert!(memory.forget(leaf).is_some());
        assert!(memory.is_empty());
    }
}
