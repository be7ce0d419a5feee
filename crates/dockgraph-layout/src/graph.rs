//! The layout graph: arena, root, revision, lock, sidebars, placement memory.
//!
//! [`LayoutGraph`] owns every element record of one host (the main layout or
//! one floating window). Elements reachable from the root form the tree;
//! leaves that are pinned to a sidebar or not placed anywhere stay in the
//! arena with no parent.
//!
//! Mutations live in [`crate::mutation`]. This module holds state, the read
//! API, and the invariant checker:
//!
//! 1. attached containers have at least two children,
//! 2. no split directly contains a split of the same orientation,
//! 3. no tab group directly contains a tab group,
//! 4. `dividers.len() == children.len() - 1`, strictly increasing in `(0, 1)`,
//! 5. parent back-references match container child lists, the root has none,
//! 6. a pinned leaf is detached and pinned to exactly one side,
//! 7. a tab group's selected index is in range.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::element::{DockLeaf, ElementId, ElementKind, ElementRecord};
use crate::placement::{HostId, PlacementHosts, PlacementMemory};
use crate::policy::{DockPolicy, DockPolicyError};
use crate::sidebar::{Side, SideBarRegistry, SideBars};

/// Where a leaf currently lives inside one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafLocation {
    MainTree,
    SideBar(Side),
    /// Registered but neither placed in the tree nor pinned.
    Detached,
}

/// One step of a pre-order tree walk.
#[derive(Debug, Clone, Copy)]
pub struct WalkStep<'a> {
    pub depth: usize,
    pub record: &'a ElementRecord,
}

/// Pre-order iterator over the attached tree.
#[derive(Debug)]
pub struct Walk<'a> {
    graph: &'a LayoutGraph,
    stack: Vec<(ElementId, usize)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = WalkStep<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (id, depth) = self.stack.pop()?;
            let Some(record) = self.graph.nodes.get(&id) else {
                continue;
            };
            self.stack
                .extend(record.children().iter().rev().map(|child| (*child, depth + 1)));
            return Some(WalkStep { depth, record });
        }
    }
}

/// Mutable docking layout for one host.
#[derive(Debug, Clone)]
pub struct LayoutGraph {
    pub(crate) nodes: BTreeMap<ElementId, ElementRecord>,
    pub(crate) root: Option<ElementId>,
    pub(crate) revision: u64,
    pub(crate) locked: bool,
    pub(crate) sidebars: SideBars,
    pub(crate) memory: PlacementMemory,
    pub(crate) policy: DockPolicy,
}

impl Default for LayoutGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutGraph {
    /// Empty graph with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::build(DockPolicy::default())
    }

    /// Empty graph with a validated policy.
    pub fn with_policy(policy: DockPolicy) -> Result<Self, DockPolicyError> {
        policy.validate()?;
        Ok(Self::build(policy))
    }

    pub(crate) fn build(policy: DockPolicy) -> Self {
        Self {
            nodes: BTreeMap::new(),
            root: None,
            revision: 0,
            locked: false,
            sidebars: SideBars::new(policy.default_sidebar_width),
            memory: PlacementMemory::default(),
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &DockPolicy {
        &self.policy
    }

    #[must_use]
    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    /// Monotonic counter, bumped once per effective mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Toggle the lock. While locked, every structural mutator is a no-op.
    /// Changing the lock itself does not bump the revision.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&ElementRecord> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn leaf(&self, id: ElementId) -> Option<&DockLeaf> {
        self.nodes.get(&id).and_then(ElementRecord::as_leaf)
    }

    /// Mutable access to leaf presentation data (title, icon, hints).
    ///
    /// Leaf fields carry no structure, so edits here do not bump the
    /// revision.
    pub fn leaf_mut(&mut self, id: ElementId) -> Option<&mut DockLeaf> {
        match self.nodes.get_mut(&id).map(|record| &mut record.kind) {
            Some(ElementKind::Leaf(leaf)) => Some(leaf),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_leaf(&self, id: ElementId) -> bool {
        self.leaf(id).is_some()
    }

    #[must_use]
    pub fn parent_of(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(&id).and_then(ElementRecord::parent)
    }

    #[must_use]
    pub fn children_of(&self, id: ElementId) -> &[ElementId] {
        self.nodes.get(&id).map_or(&[], ElementRecord::children)
    }

    /// Whether the arena holds `id` at all (attached, pinned, or detached).
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Whether `id` is reachable from the root.
    #[must_use]
    pub fn contains_in_tree(&self, id: ElementId) -> bool {
        let mut current = id;
        // Parent chains are bounded by the arena size.
        for _ in 0..=self.nodes.len() {
            let Some(record) = self.nodes.get(&current) else {
                return false;
            };
            match record.parent {
                Some(parent) => current = parent,
                None => return self.root == Some(current),
            }
        }
        false
    }

    /// Whether `ancestor` is a strict ancestor of `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut current = self.parent_of(node);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// Location of a registered leaf.
    #[must_use]
    pub fn location(&self, id: ElementId) -> Option<LeafLocation> {
        if !self.is_leaf(id) {
            return None;
        }
        if let Some(side) = self.sidebars.side_of(id) {
            return Some(LeafLocation::SideBar(side));
        }
        if self.contains_in_tree(id) {
            Some(LeafLocation::MainTree)
        } else {
            Some(LeafLocation::Detached)
        }
    }

    /// Pre-order walk of the attached tree.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            graph: self,
            stack: self.root.map(|root| (root, 0)).into_iter().collect(),
        }
    }

    /// Attached leaves in reading order.
    #[must_use]
    pub fn leaves(&self) -> Vec<ElementId> {
        self.walk()
            .filter(|step| step.record.as_leaf().is_some())
            .map(|step| step.record.id())
            .collect()
    }

    /// Number of attached elements (containers and leaves).
    #[must_use]
    pub fn tree_len(&self) -> usize {
        self.walk().count()
    }

    /// Leaves that are registered but neither attached nor pinned.
    #[must_use]
    pub fn detached_leaves(&self) -> Vec<ElementId> {
        self.nodes
            .values()
            .filter(|record| {
                record.as_leaf().is_some()
                    && record.parent.is_none()
                    && self.root != Some(record.id)
                    && self.sidebars.side_of(record.id).is_none()
            })
            .map(ElementRecord::id)
            .collect()
    }

    /// Number of attached or pinned leaves whose key is `key`.
    #[must_use]
    pub fn leaf_count_for_key(&self, key: &str) -> usize {
        let pinned = Side::ALL
            .into_iter()
            .flat_map(|side| self.sidebars.get(side).entries().iter().copied());
        self.leaves()
            .into_iter()
            .chain(pinned)
            .filter_map(|id| self.leaf(id))
            .filter(|leaf| leaf.key == key)
            .count()
    }

    #[must_use]
    pub fn sidebar(&self, side: Side) -> &SideBarRegistry {
        self.sidebars.get(side)
    }

    #[must_use]
    pub fn pinned_side(&self, leaf: ElementId) -> Option<Side> {
        self.sidebars.side_of(leaf)
    }

    #[must_use]
    pub fn is_pinned(&self, leaf: ElementId) -> bool {
        self.pinned_side(leaf).is_some()
    }

    #[must_use]
    pub fn placement_memory(&self) -> &PlacementMemory {
        &self.memory
    }

    pub(crate) fn placement_memory_mut(&mut self) -> &mut PlacementMemory {
        &mut self.memory
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), DockModelError> {
        let mut reachable = BTreeSet::new();
        if let Some(root) = self.root {
            let record = self
                .nodes
                .get(&root)
                .ok_or(DockModelError::MissingRoot { root })?;
            if let Some(parent) = record.parent {
                return Err(DockModelError::RootHasParent { root, parent });
            }
            let mut stack = vec![(root, record)];
            while let Some((id, record)) = stack.pop() {
                if !reachable.insert(id) {
                    return Err(DockModelError::CycleDetected { element: id });
                }
                self.validate_container(record)?;
                for child in record.children().iter().copied() {
                    let child_record = self
                        .nodes
                        .get(&child)
                        .ok_or(DockModelError::MissingChild { parent: id, child })?;
                    stack.push((child, child_record));
                }
            }
        }

        for record in self.nodes.values() {
            if let Some(parent) = record.parent {
                let Some(parent_record) = self.nodes.get(&parent) else {
                    return Err(DockModelError::MissingParent {
                        element: record.id,
                        parent,
                    });
                };
                if !parent_record.children().contains(&record.id) {
                    return Err(DockModelError::ParentMismatch {
                        element: record.id,
                        expected: None,
                        actual: Some(parent),
                    });
                }
            }
            if record.kind.is_container() && !reachable.contains(&record.id) {
                return Err(DockModelError::OrphanContainer {
                    container: record.id,
                });
            }
        }

        for side in Side::ALL {
            let mut seen = BTreeSet::new();
            for entry in self.sidebars.get(side).entries() {
                if !seen.insert(*entry) || self.sidebars.get(side.opposite()).contains(*entry) {
                    return Err(DockModelError::DuplicatePin { leaf: *entry });
                }
                let Some(record) = self.nodes.get(entry) else {
                    return Err(DockModelError::UnknownPinnedElement {
                        element: *entry,
                        side,
                    });
                };
                if record.as_leaf().is_none() {
                    return Err(DockModelError::PinnedNotLeaf {
                        element: *entry,
                        side,
                    });
                }
                if reachable.contains(entry) || record.parent.is_some() {
                    return Err(DockModelError::PinnedLeafAttached { leaf: *entry, side });
                }
            }
        }
        Ok(())
    }

    fn validate_container(&self, record: &ElementRecord) -> Result<(), DockModelError> {
        let id = record.id;
        let children = record.children();
        if record.kind.is_container() && children.len() < 2 {
            return Err(DockModelError::UnderfilledContainer {
                container: id,
                children: children.len(),
            });
        }
        for child in children {
            let Some(child_record) = self.nodes.get(child) else {
                return Err(DockModelError::MissingChild {
                    parent: id,
                    child: *child,
                });
            };
            if child_record.parent != Some(id) {
                return Err(DockModelError::ParentMismatch {
                    element: *child,
                    expected: Some(id),
                    actual: child_record.parent,
                });
            }
        }
        match &record.kind {
            ElementKind::Leaf(_) => {}
            ElementKind::Split(split) => {
                if split.dividers.len() + 1 != children.len() {
                    return Err(DockModelError::DividerCountMismatch {
                        split: id,
                        dividers: split.dividers.len(),
                        children: children.len(),
                    });
                }
                let mut previous = 0.0;
                for (index, value) in split.dividers.iter().copied().enumerate() {
                    if !(value.is_finite() && value > previous && value < 1.0) {
                        return Err(DockModelError::InvalidDivider {
                            split: id,
                            index,
                            value,
                        });
                    }
                    previous = value;
                }
                for child in children {
                    if let Some(nested) = self.nodes.get(child).and_then(ElementRecord::as_split) {
                        if nested.orientation == split.orientation {
                            return Err(DockModelError::NestedSameOrientationSplit {
                                parent: id,
                                child: *child,
                            });
                        }
                    }
                }
            }
            ElementKind::Tabs(tabs) => {
                if tabs.selected >= children.len() {
                    return Err(DockModelError::SelectionOutOfRange {
                        tabs: id,
                        selected: tabs.selected,
                        len: children.len(),
                    });
                }
                for child in children {
                    if self.nodes.get(child).and_then(ElementRecord::as_tabs).is_some() {
                        return Err(DockModelError::NestedTabs {
                            parent: id,
                            child: *child,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Graphs host only the main tree from the resolver's point of view.
impl PlacementHosts for LayoutGraph {
    fn host_is_alive(&self, host: HostId) -> bool {
        matches!(host, HostId::Main)
    }

    fn host_contains(&self, host: HostId, element: ElementId) -> bool {
        matches!(host, HostId::Main) && self.contains_in_tree(element)
    }

    fn host_is_empty(&self, host: HostId) -> bool {
        !matches!(host, HostId::Main) || self.root.is_none()
    }
}

/// Structural invariant violations.
///
/// These indicate a bug in the mutators or a corrupted graph; they are not
/// part of normal control flow.
#[derive(Debug, Clone, PartialEq)]
pub enum DockModelError {
    MissingRoot {
        root: ElementId,
    },
    RootHasParent {
        root: ElementId,
        parent: ElementId,
    },
    MissingChild {
        parent: ElementId,
        child: ElementId,
    },
    MissingParent {
        element: ElementId,
        parent: ElementId,
    },
    ParentMismatch {
        element: ElementId,
        expected: Option<ElementId>,
        actual: Option<ElementId>,
    },
    CycleDetected {
        element: ElementId,
    },
    OrphanContainer {
        container: ElementId,
    },
    UnderfilledContainer {
        container: ElementId,
        children: usize,
    },
    DividerCountMismatch {
        split: ElementId,
        dividers: usize,
        children: usize,
    },
    InvalidDivider {
        split: ElementId,
        index: usize,
        value: f64,
    },
    NestedSameOrientationSplit {
        parent: ElementId,
        child: ElementId,
    },
    NestedTabs {
        parent: ElementId,
        child: ElementId,
    },
    SelectionOutOfRange {
        tabs: ElementId,
        selected: usize,
        len: usize,
    },
    UnknownPinnedElement {
        element: ElementId,
        side: Side,
    },
    PinnedNotLeaf {
        element: ElementId,
        side: Side,
    },
    PinnedLeafAttached {
        leaf: ElementId,
        side: Side,
    },
    DuplicatePin {
        leaf: ElementId,
    },
}

impl fmt::Display for DockModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoot { root } => write!(f, "root element {root} not found"),
            Self::RootHasParent { root, parent } => {
                write!(f, "root element {root} must not have parent {parent}")
            }
            Self::MissingChild { parent, child } => {
                write!(f, "container {parent} references missing child {child}")
            }
            Self::MissingParent { element, parent } => {
                write!(f, "element {element} references missing parent {parent}")
            }
            Self::ParentMismatch {
                element,
                expected,
                actual,
            } => write!(
                f,
                "element {element} parent mismatch: expected {:?}, got {:?}",
                expected.map(ElementId::get),
                actual.map(ElementId::get)
            ),
            Self::CycleDetected { element } => {
                write!(f, "element {element} is reachable twice from the root")
            }
            Self::OrphanContainer { container } => {
                write!(f, "container {container} is not attached to the tree")
            }
            Self::UnderfilledContainer {
                container,
                children,
            } => write!(
                f,
                "container {container} has {children} child(ren); attached containers need at least 2"
            ),
            Self::DividerCountMismatch {
                split,
                dividers,
                children,
            } => write!(
                f,
                "split {split} has {dividers} divider(s) for {children} children"
            ),
            Self::InvalidDivider {
                split,
                index,
                value,
            } => write!(
                f,
                "split {split} divider {index} = {value} is not strictly increasing in (0, 1)"
            ),
            Self::NestedSameOrientationSplit { parent, child } => write!(
                f,
                "split {child} nested in split {parent} with the same orientation"
            ),
            Self::NestedTabs { parent, child } => {
                write!(f, "tab group {child} nested in tab group {parent}")
            }
            Self::SelectionOutOfRange {
                tabs,
                selected,
                len,
            } => write!(
                f,
                "tab group {tabs} selects index {selected} but has {len} tab(s)"
            ),
            Self::UnknownPinnedElement { element, side } => {
                write!(f, "{side:?} sidebar pins unknown element {element}")
            }
            Self::PinnedNotLeaf { element, side } => {
                write!(f, "{side:?} sidebar pins container {element}")
            }
            Self::PinnedLeafAttached { leaf, side } => write!(
                f,
                "leaf {leaf} is pinned to the {side:?} sidebar and attached to the tree"
            ),
            Self::DuplicatePin { leaf } => write!(f, "leaf {leaf} is pinned more than once"),
        }
    }
}

impl std::error::Error for DockModelError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ContentHandle, DockPosition};

    fn leaf(key: &str) -> DockLeaf {
        DockLeaf::new(key, key.to_uppercase(), ContentHandle(1))
    }

    #[test]
    fn new_graph_is_empty_and_valid() {
        let graph = LayoutGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.revision(), 0);
        assert!(!graph.is_locked());
        assert_eq!(graph.validate(), Ok(()));
        assert_eq!(graph.walk().count(), 0);
        assert_eq!(graph.sidebar(Side::Left).panel_width(), 300.0);
    }

    #[test]
    fn with_policy_rejects_invalid_policy() {
        let policy = DockPolicy {
            min_split_share: 0.0,
            ..DockPolicy::default()
        };
        assert!(LayoutGraph::with_policy(policy).is_err());
        let wide = DockPolicy {
            default_sidebar_width: 420.0,
            ..DockPolicy::default()
        };
        let graph = LayoutGraph::with_policy(wide).expect("valid policy");
        assert_eq!(graph.sidebar(Side::Right).panel_width(), 420.0);
    }

    #[test]
    fn registered_leaf_is_detached() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_leaf(leaf("a"));
        assert!(graph.contains(a));
        assert!(!graph.contains_in_tree(a));
        assert_eq!(graph.location(a), Some(LeafLocation::Detached));
        assert_eq!(graph.detached_leaves(), vec![a]);
        assert_eq!(graph.revision(), 0);
    }

    #[test]
    fn key_count_covers_tree_and_sidebars_only() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_leaf(leaf("log"));
        let b = graph.add_leaf(leaf("log"));
        let c = graph.add_leaf(leaf("log"));
        let d = graph.add_leaf(leaf("log"));
        assert!(graph.dock(a, None, DockPosition::Center, None).is_applied());
        assert!(graph.dock(b, Some(a), DockPosition::Right, None).is_applied());
        assert!(graph.dock(c, Some(b), DockPosition::Center, None).is_applied());
        assert!(graph.pin_to_sidebar(c, Side::Left, None).is_applied());

        // d is registered but never placed.
        assert!(graph.contains(d));
        assert_eq!(graph.leaf_count_for_key("log"), 3);
        assert_eq!(graph.leaf_count_for_key("LOG"), 0);
        assert_eq!(graph.leaf_count_for_key("other"), 0);
    }

    #[test]
    fn walk_is_preorder_with_depth() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_leaf(leaf("a"));
        let b = graph.add_leaf(leaf("b"));
        let c = graph.add_leaf(leaf("c"));
        assert!(graph.dock(a, None, DockPosition::Center, None).is_applied());
        assert!(graph.dock(b, Some(a), DockPosition::Right, None).is_applied());
        assert!(graph.dock(c, Some(b), DockPosition::Bottom, None).is_applied());

        let steps: Vec<(usize, &str)> = graph
            .walk()
            .map(|step| (step.depth, step.record.kind().label()))
            .collect();
        assert_eq!(
            steps,
            vec![(0, "split"), (1, "leaf"), (1, "split"), (2, "leaf"), (2, "leaf")]
        );
        assert_eq!(graph.leaves(), vec![a, b, c]);
        assert_eq!(graph.tree_len(), 5);
        assert!(graph.is_ancestor(graph.root().expect("root"), c));
        assert!(!graph.is_ancestor(c, a));
    }

    #[test]
    fn validate_reports_underfilled_container() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_leaf(leaf("a"));
        let b = graph.add_leaf(leaf("b"));
        assert!(graph.dock(a, None, DockPosition::Center, None).is_applied());
        assert!(graph.dock(b, Some(a), DockPosition::Center, None).is_applied());
        let tabs = graph.root().expect("tabs root");

        // Corrupt the graph by hand.
        if let Some(record) = graph.nodes.get_mut(&tabs) {
            if let ElementKind::Tabs(group) = &mut record.kind {
                group.children.pop();
                group.selected = 0;
            }
        }
        if let Some(record) = graph.nodes.get_mut(&b) {
            record.parent = None;
        }
        assert_eq!(
            graph.validate(),
            Err(DockModelError::UnderfilledContainer {
                container: tabs,
                children: 1,
            })
        );
    }

    #[test]
    fn validate_names_parent_of_missing_child() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_leaf(leaf("a"));
        let b = graph.add_leaf(leaf("b"));
        assert!(graph.dock(a, None, DockPosition::Center, None).is_applied());
        assert!(graph.dock(b, Some(a), DockPosition::Right, None).is_applied());
        let split = graph.root().expect("split root");

        graph.nodes.remove(&b);
        let err = graph.validate().expect_err("dangling child");
        assert_eq!(err, DockModelError::MissingChild { parent: split, child: b });
        assert!(err.to_string().contains("missing child"));
    }

    #[test]
    fn validate_reports_bad_divider() {
        let mut graph = LayoutGraph::new();
        let a = graph.add_leaf(leaf("a"));
        let b = graph.add_leaf(leaf("b"));
        assert!(graph.dock(a, None, DockPosition::Center, None).is_applied());
        assert!(graph.dock(b, Some(a), DockPosition::Left, None).is_applied());
        let split = graph.root().expect("split root");
        if let Some(record) = graph.nodes.get_mut(&split) {
            if let ElementKind::Split(s) = &mut record.kind {
                s.dividers[0] = 1.5;
            }
        }
        let err = graph.validate().expect_err("divider out of range");
        assert!(matches!(err, DockModelError::InvalidDivider { index: 0, .. }));
        assert!(err.to_string().contains("divider 0"));
    }

    #[test]
    fn graph_reports_only_main_host() {
        let mut graph = LayoutGraph::new();
        assert!(graph.host_is_empty(HostId::Main));
        let a = graph.add_leaf(leaf("a"));
        assert!(graph.dock(a, None, DockPosition::Center, None).is_applied());
        assert!(graph.host_contains(HostId::Main, a));
        assert!(!graph.host_is_empty(HostId::Main));
        let floating = HostId::Floating(crate::placement::FloatingHostId(1));
        assert!(!graph.host_is_alive(floating));
        assert!(!graph.host_contains(floating, a));
    }
}
