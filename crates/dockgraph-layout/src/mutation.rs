//! Mutation algorithms for [`LayoutGraph`].
//!
//! Every public mutator either applies fully and bumps the revision exactly
//! once, or returns [`DockOutcome::Noop`] with the graph untouched. Invalid
//! input (unknown ids, self-targets, cycles, a locked graph) is a no-op, never
//! a panic, so gesture code can call these speculatively.
//!
//! Structural rules applied on every change:
//!
//! - Removing a child from a container drops the divider before it (the
//!   first divider when removing the first child) and keeps every other
//!   divider value. Tab selection follows the previously selected tab.
//! - A container left with one child is replaced by that child in its own
//!   slot; an empty container is removed from its parent, cascading upward.
//! - Placing a split into a split of the same orientation, or tabs into
//!   tabs, splices the children in; spliced dividers are mapped into the
//!   segment the inserted element occupies.

use dockgraph_core::geometry::Orientation;
use dockgraph_core::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::element::{
    DockLeaf, DockPosition, ElementId, ElementKind, ElementRecord, SplitContainer, TabContainer,
    segment_of,
};
use crate::graph::LayoutGraph;
use crate::placement::{self, HostId, PlacementAnchor, PlacementRecord, RestorePlan};
use crate::sidebar::Side;

/// Why a mutation was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockNoopReason {
    Locked,
    UnknownElement,
    NotALeaf,
    NotAContainer,
    NotAttached,
    MissingTarget,
    TargetNotInGraph,
    SelfTarget,
    CycleRejected,
    AlreadyInPlace,
    NotPinned,
    IndexOutOfRange,
    InvalidValue,
    Unchanged,
}

/// Result of a mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DockOutcome {
    Applied { revision: u64 },
    Noop { reason: DockNoopReason },
}

impl DockOutcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::Noop { .. })
    }

    #[must_use]
    pub const fn noop_reason(&self) -> Option<DockNoopReason> {
        match self {
            Self::Noop { reason } => Some(*reason),
            Self::Applied { .. } => None,
        }
    }

    /// Revision after an applied mutation.
    #[must_use]
    pub const fn revision(&self) -> Option<u64> {
        match self {
            Self::Applied { revision } => Some(*revision),
            Self::Noop { .. } => None,
        }
    }
}

/// Containers replaced during cleanup: `(removed, successor)`.
type Replacements = Vec<(ElementId, ElementId)>;

impl LayoutGraph {
    fn applied(&mut self, op: &'static str) -> DockOutcome {
        self.revision += 1;
        debug_assert!(
            self.validate().is_ok(),
            "layout invariants violated after {op}: {:?}",
            self.validate()
        );
        debug!(message = "dock.apply", op, revision = self.revision);
        DockOutcome::Applied {
            revision: self.revision,
        }
    }

    fn rejected(&self, op: &'static str, reason: DockNoopReason) -> DockOutcome {
        trace!(message = "dock.noop", op, reason = ?reason, revision = self.revision);
        DockOutcome::Noop { reason }
    }

    // ---------------------------------------------------------------------
    // Leaf registry
    // ---------------------------------------------------------------------

    /// Register a detached leaf. Does not touch the tree or the revision.
    pub fn add_leaf(&mut self, leaf: DockLeaf) -> ElementId {
        let id = ElementId::allocate();
        self.nodes
            .insert(id, ElementRecord::new(id, None, ElementKind::Leaf(leaf)));
        id
    }

    /// Remove a leaf from the graph entirely, undocking or unpinning it
    /// first. Returns `None` while locked or if `id` is not a leaf.
    pub fn remove_leaf(&mut self, id: ElementId) -> Option<DockLeaf> {
        if self.locked || !self.is_leaf(id) {
            return None;
        }
        let mut changed = false;
        if self.contains_in_tree(id) {
            self.detach(id);
            changed = true;
        }
        if self.sidebars.remove(id).is_some() {
            changed = true;
        }
        self.memory.forget(id);
        let record = self.nodes.remove(&id)?;
        if changed {
            self.applied("remove_leaf");
        }
        match record.kind {
            ElementKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Remove a detached leaf so another graph can adopt it.
    pub(crate) fn take_detached_leaf(&mut self, id: ElementId) -> Option<DockLeaf> {
        let record = self.nodes.get(&id)?;
        if record.as_leaf().is_none()
            || record.parent.is_some()
            || self.root == Some(id)
            || self.sidebars.side_of(id).is_some()
        {
            return None;
        }
        match self.nodes.remove(&id).map(|record| record.kind) {
            Some(ElementKind::Leaf(leaf)) => Some(leaf),
            _ => None,
        }
    }

    /// Register a leaf under an existing id (transfer between graphs).
    pub(crate) fn adopt_leaf(&mut self, id: ElementId, leaf: DockLeaf) -> bool {
        if self.nodes.contains_key(&id) {
            return false;
        }
        self.nodes
            .insert(id, ElementRecord::new(id, None, ElementKind::Leaf(leaf)));
        true
    }

    /// Consume the graph, yielding every leaf: tree order first, then
    /// sidebar entries, then detached leaves.
    pub(crate) fn into_leaves(self) -> Vec<(ElementId, DockLeaf)> {
        let mut order = self.leaves();
        for side in Side::ALL {
            order.extend_from_slice(self.sidebars.get(side).entries());
        }
        order.extend(self.detached_leaves());
        let mut nodes = self.nodes;
        order
            .into_iter()
            .filter_map(|id| match nodes.remove(&id)?.kind {
                ElementKind::Leaf(leaf) => Some((id, leaf)),
                _ => None,
            })
            .collect()
    }

    // ---------------------------------------------------------------------
    // dock / undock / move
    // ---------------------------------------------------------------------

    /// Dock `element` relative to `target`.
    ///
    /// A detached or pinned leaf is inserted; an element already in the
    /// tree is moved (see [`move_element`](Self::move_element)). With
    /// `target == None` the element becomes the root of an empty graph.
    /// `tab_index` only matters for [`DockPosition::Center`].
    pub fn dock(
        &mut self,
        element: ElementId,
        target: Option<ElementId>,
        position: DockPosition,
        tab_index: Option<usize>,
    ) -> DockOutcome {
        if self.locked {
            return self.rejected("dock", DockNoopReason::Locked);
        }
        if !self.contains(element) {
            return self.rejected("dock", DockNoopReason::UnknownElement);
        }
        if self.contains_in_tree(element) {
            return self.move_element(element, target, position, tab_index);
        }
        if !self.is_leaf(element) {
            return self.rejected("dock", DockNoopReason::NotALeaf);
        }
        let Some(target) = target else {
            if self.root.is_some() {
                return self.rejected("dock", DockNoopReason::MissingTarget);
            }
            self.sidebars.remove(element);
            self.root = Some(element);
            return self.applied("dock");
        };
        if target == element {
            return self.rejected("dock", DockNoopReason::SelfTarget);
        }
        if !self.contains_in_tree(target) {
            return self.rejected("dock", DockNoopReason::TargetNotInGraph);
        }
        self.sidebars.remove(element);
        let tab_index = tab_index.filter(|_| position == DockPosition::Center);
        self.dock_attached(element, target, position, tab_index);
        self.applied("dock")
    }

    /// Remove an attached leaf from the tree, leaving it detached.
    pub fn undock(&mut self, leaf: ElementId) -> DockOutcome {
        if self.locked {
            return self.rejected("undock", DockNoopReason::Locked);
        }
        if !self.contains(leaf) {
            return self.rejected("undock", DockNoopReason::UnknownElement);
        }
        if !self.is_leaf(leaf) {
            return self.rejected("undock", DockNoopReason::NotALeaf);
        }
        if !self.contains_in_tree(leaf) {
            return self.rejected("undock", DockNoopReason::NotAttached);
        }
        self.detach(leaf);
        self.applied("undock")
    }

    /// Move an attached element next to `target`.
    ///
    /// Reordering inside the element's own tab group or split keeps the
    /// container (and its dividers) intact. A target outside the tree falls
    /// back to the root.
    pub fn move_element(
        &mut self,
        element: ElementId,
        target: Option<ElementId>,
        position: DockPosition,
        tab_index: Option<usize>,
    ) -> DockOutcome {
        if self.locked {
            return self.rejected("move", DockNoopReason::Locked);
        }
        let Some(target) = target else {
            return self.rejected("move", DockNoopReason::MissingTarget);
        };
        if !self.contains(element) {
            return self.rejected("move", DockNoopReason::UnknownElement);
        }
        if !self.contains_in_tree(element) {
            if self.is_leaf(element) {
                return self.dock(element, Some(target), position, tab_index);
            }
            return self.rejected("move", DockNoopReason::NotAttached);
        }
        if target == element {
            return self.rejected("move", DockNoopReason::SelfTarget);
        }
        let target_in_tree = self.contains_in_tree(target);
        if target_in_tree && self.is_ancestor(element, target) {
            return self.rejected("move", DockNoopReason::CycleRejected);
        }
        let tab_index = tab_index.filter(|_| position == DockPosition::Center);

        if target_in_tree {
            if position == DockPosition::Center {
                if let Some(outcome) = self.reorder_within_tabs(element, target, tab_index) {
                    return outcome;
                }
            } else {
                if self.is_drop_on_own_split_edge(element, target, position) {
                    return self.rejected("move", DockNoopReason::AlreadyInPlace);
                }
                if let Some(outcome) = self.reorder_within_split(element, target, position) {
                    return outcome;
                }
            }
        } else if self.root == Some(element) {
            return self.rejected("move", DockNoopReason::TargetNotInGraph);
        }

        let replaced = self.detach(element);
        let anchor = if target_in_tree {
            self.follow_replacements(target, &replaced)
        } else {
            None
        };
        match anchor.or(self.root) {
            Some(anchor) => self.dock_attached(element, anchor, position, tab_index),
            None => self.root = Some(element),
        }
        self.applied("move")
    }

    fn reorder_within_tabs(
        &mut self,
        element: ElementId,
        target: ElementId,
        tab_index: Option<usize>,
    ) -> Option<DockOutcome> {
        let (source_tabs, source_index) = self.index_in_parent(element)?;
        if !self.is_tabs(source_tabs) {
            return None;
        }
        let target_tabs = if self.is_tabs(target) {
            target
        } else {
            self.parent_of(target).filter(|parent| self.is_tabs(*parent))?
        };
        if target_tabs != source_tabs {
            return None;
        }
        let len = self.children_of(source_tabs).len();
        let desired = match tab_index {
            Some(index) => index,
            None if target == source_tabs => len,
            None => self.index_in_parent(target).map_or(len, |(_, index)| index + 1),
        };
        let mut insert = desired.min(len);
        if source_index < insert {
            insert -= 1;
        }
        if insert == source_index {
            return Some(self.rejected("move", DockNoopReason::AlreadyInPlace));
        }
        if let Some(ElementKind::Tabs(tabs)) = self.kind_mut(source_tabs) {
            tabs.children.remove(source_index);
            tabs.children.insert(insert, element);
            tabs.selected = insert;
        }
        Some(self.applied("move.reorder_tab"))
    }

    fn is_drop_on_own_split_edge(
        &self,
        element: ElementId,
        target: ElementId,
        position: DockPosition,
    ) -> bool {
        let Some(orientation) = position.orientation() else {
            return false;
        };
        let Some((parent, index)) = self.index_in_parent(element) else {
            return false;
        };
        if parent != target || self.orientation_of(parent) != Some(orientation) {
            return false;
        }
        let last = self.children_of(parent).len().saturating_sub(1);
        if position.is_leading() {
            index == 0
        } else {
            index == last
        }
    }

    fn reorder_within_split(
        &mut self,
        element: ElementId,
        target: ElementId,
        position: DockPosition,
    ) -> Option<DockOutcome> {
        let orientation = position.orientation()?;
        let (parent, source_index) = self.index_in_parent(element)?;
        if self.orientation_of(parent) != Some(orientation) {
            return None;
        }
        let (target_parent, target_index) = self.index_in_parent(target)?;
        if target_parent != parent {
            return None;
        }
        let mut insert = if position.is_leading() {
            target_index
        } else {
            target_index + 1
        };
        if source_index < insert {
            insert -= 1;
        }
        if insert == source_index {
            return Some(self.rejected("move", DockNoopReason::AlreadyInPlace));
        }
        if let Some(ElementKind::Split(split)) = self.kind_mut(parent) {
            split.children.remove(source_index);
            split.children.insert(insert, element);
        }
        Some(self.applied("move.reorder_split"))
    }

    // ---------------------------------------------------------------------
    // Sidebars
    // ---------------------------------------------------------------------

    /// Pin a leaf to `side` at `index` (clamped; `None` appends).
    ///
    /// An attached leaf has its placement captured and is undocked first. A
    /// leaf pinned to the other side moves across; one already on `side`
    /// is reordered when `index` is given.
    pub fn pin_to_sidebar(
        &mut self,
        leaf: ElementId,
        side: Side,
        index: Option<usize>,
    ) -> DockOutcome {
        if self.locked {
            return self.rejected("pin", DockNoopReason::Locked);
        }
        if !self.contains(leaf) {
            return self.rejected("pin", DockNoopReason::UnknownElement);
        }
        if !self.is_leaf(leaf) {
            return self.rejected("pin", DockNoopReason::NotALeaf);
        }
        match self.sidebars.side_of(leaf) {
            Some(current) if current == side => {
                let moved = index.is_some_and(|index| self.sidebars.get_mut(side).reorder(leaf, index));
                if !moved {
                    return self.rejected("pin", DockNoopReason::AlreadyInPlace);
                }
                return self.applied("pin.reorder");
            }
            Some(current) => {
                self.sidebars.get_mut(current).remove(leaf);
            }
            None => {
                if self.contains_in_tree(leaf) {
                    self.capture_placement(leaf, HostId::Main);
                    self.detach(leaf);
                }
            }
        }
        self.sidebars.get_mut(side).insert(leaf, index);
        if let Some(value) = self.leaf_mut(leaf) {
            value.restore.last_side = Some(side);
        }
        self.applied("pin")
    }

    /// Remove a leaf from its sidebar without placing it. Returns whether it
    /// was pinned.
    pub fn unpin_from_sidebar(&mut self, leaf: ElementId) -> bool {
        if self.locked {
            self.rejected("unpin", DockNoopReason::Locked);
            return false;
        }
        if self.sidebars.remove(leaf).is_none() {
            self.rejected("unpin", DockNoopReason::NotPinned);
            return false;
        }
        self.applied("unpin");
        true
    }

    /// Unpin a leaf and put it back where its placement memory points.
    pub fn restore_from_sidebar(&mut self, leaf: ElementId) -> DockOutcome {
        if self.locked {
            return self.rejected("restore", DockNoopReason::Locked);
        }
        if self.sidebars.remove(leaf).is_none() {
            return self.rejected("restore", DockNoopReason::NotPinned);
        }
        let plan = placement::resolve(self.memory.get(leaf), leaf, &*self);
        let anchor = match plan {
            RestorePlan::Anchor { anchor, .. } => Some(anchor),
            _ => None,
        };
        self.place_detached(leaf, anchor)
    }

    /// Dock a detached leaf against `anchor`, or right of the root, or as
    /// the root.
    pub(crate) fn place_detached(
        &mut self,
        leaf: ElementId,
        anchor: Option<PlacementAnchor>,
    ) -> DockOutcome {
        if self.locked {
            return self.rejected("restore", DockNoopReason::Locked);
        }
        if !self.is_leaf(leaf) {
            return self.rejected("restore", DockNoopReason::UnknownElement);
        }
        if self.contains_in_tree(leaf) {
            return self.rejected("restore", DockNoopReason::AlreadyInPlace);
        }
        self.sidebars.remove(leaf);
        let anchor =
            anchor.filter(|anchor| anchor.target != leaf && self.contains_in_tree(anchor.target));
        match (anchor, self.root) {
            (Some(anchor), _) => {
                self.dock_attached(leaf, anchor.target, anchor.position, anchor.tab_index);
            }
            (None, Some(root)) => self.dock_attached(leaf, root, DockPosition::Right, None),
            (None, None) => self.root = Some(leaf),
        }
        self.applied("restore")
    }

    /// Record where an attached leaf sits, in memory and on the leaf itself.
    pub(crate) fn capture_placement(
        &mut self,
        leaf: ElementId,
        host: HostId,
    ) -> Option<PlacementRecord> {
        let record = placement::capture(self, leaf, host)?;
        if let Some(value) = self.leaf_mut(leaf) {
            value.restore.last_target = record.preferred.map(|anchor| anchor.target);
            value.restore.last_position = record.preferred.map(|anchor| anchor.position);
            value.restore.last_tab_index = record.preferred.and_then(|anchor| anchor.tab_index);
        }
        self.memory.remember(leaf, record);
        Some(record)
    }

    pub fn set_sidebar_pinned_open(&mut self, side: Side, open: bool) -> DockOutcome {
        if self.locked {
            return self.rejected("sidebar.open", DockNoopReason::Locked);
        }
        if !self.sidebars.get_mut(side).set_pinned_open(open) {
            return self.rejected("sidebar.open", DockNoopReason::Unchanged);
        }
        self.applied("sidebar.open")
    }

    /// Let the sidebar consume main-layout space.
    pub fn pin_open_sidebar(&mut self, side: Side) -> DockOutcome {
        self.set_sidebar_pinned_open(side, true)
    }

    /// Shrink the sidebar back to its icon strip.
    pub fn collapse_pinned_sidebar(&mut self, side: Side) -> DockOutcome {
        self.set_sidebar_pinned_open(side, false)
    }

    /// Store a panel width preference.
    ///
    /// Width is a view preference, not structure: it is accepted while
    /// locked and never bumps the revision. Non-finite or non-positive
    /// widths are rejected.
    pub fn set_sidebar_panel_width(&mut self, side: Side, width: f64) -> bool {
        self.sidebars.get_mut(side).set_panel_width(width)
    }

    /// Drop every pinned entry (leaves become detached) and reset both
    /// sides' view preferences.
    pub fn clear_sidebars(&mut self) -> DockOutcome {
        if self.locked {
            return self.rejected("sidebar.clear", DockNoopReason::Locked);
        }
        let structural = Side::ALL.into_iter().any(|side| {
            let registry = self.sidebars.get(side);
            !registry.is_empty() || registry.is_pinned_open()
        });
        let width = self.policy.default_sidebar_width;
        for side in Side::ALL {
            self.sidebars.get_mut(side).reset(width);
        }
        if !structural {
            return self.rejected("sidebar.clear", DockNoopReason::Unchanged);
        }
        self.applied("sidebar.clear")
    }

    // ---------------------------------------------------------------------
    // Divider and tab-selection setters
    // ---------------------------------------------------------------------

    /// Move one divider. The value must stay strictly between its
    /// neighbors (0 and 1 at the edges).
    pub fn set_divider(&mut self, split: ElementId, index: usize, value: f64) -> DockOutcome {
        if self.locked {
            return self.rejected("set_divider", DockNoopReason::Locked);
        }
        let result = match self.kind_mut(split) {
            None => Err(DockNoopReason::UnknownElement),
            Some(ElementKind::Split(container)) => write_divider(container, index, value),
            Some(_) => Err(DockNoopReason::NotAContainer),
        };
        match result {
            Ok(()) => self.applied("set_divider"),
            Err(reason) => self.rejected("set_divider", reason),
        }
    }

    /// Replace all dividers from one positive weight per child.
    pub fn set_split_ratios(&mut self, split: ElementId, weights: &[f64]) -> DockOutcome {
        if self.locked {
            return self.rejected("set_split_ratios", DockNoopReason::Locked);
        }
        let result = match self.kind_mut(split) {
            None => Err(DockNoopReason::UnknownElement),
            Some(ElementKind::Split(container)) => write_ratios(container, weights),
            Some(_) => Err(DockNoopReason::NotAContainer),
        };
        match result {
            Ok(()) => self.applied("set_split_ratios"),
            Err(reason) => self.rejected("set_split_ratios", reason),
        }
    }

    /// Select the tab at `index`.
    pub fn select_tab(&mut self, tabs: ElementId, index: usize) -> DockOutcome {
        if self.locked {
            return self.rejected("select_tab", DockNoopReason::Locked);
        }
        let result = match self.kind_mut(tabs) {
            None => Err(DockNoopReason::UnknownElement),
            Some(ElementKind::Tabs(group)) => {
                if index >= group.children.len() {
                    Err(DockNoopReason::IndexOutOfRange)
                } else if group.selected == index {
                    Err(DockNoopReason::Unchanged)
                } else {
                    group.selected = index;
                    Ok(())
                }
            }
            Some(_) => Err(DockNoopReason::NotAContainer),
        };
        match result {
            Ok(()) => self.applied("select_tab"),
            Err(reason) => self.rejected("select_tab", reason),
        }
    }

    // ---------------------------------------------------------------------
    // Structural primitives
    // ---------------------------------------------------------------------

    pub(crate) fn kind_mut(&mut self, id: ElementId) -> Option<&mut ElementKind> {
        self.nodes.get_mut(&id).map(|record| &mut record.kind)
    }

    pub(crate) fn set_parent(&mut self, id: ElementId, parent: Option<ElementId>) {
        if let Some(record) = self.nodes.get_mut(&id) {
            record.parent = parent;
        }
    }

    pub(crate) fn insert_container(&mut self, kind: ElementKind) -> ElementId {
        let id = ElementId::allocate();
        self.nodes.insert(id, ElementRecord::new(id, None, kind));
        id
    }

    pub(crate) fn index_in_parent(&self, id: ElementId) -> Option<(ElementId, usize)> {
        let parent = self.parent_of(id)?;
        let index = self.children_of(parent).iter().position(|child| *child == id)?;
        Some((parent, index))
    }

    pub(crate) fn orientation_of(&self, id: ElementId) -> Option<Orientation> {
        self.nodes
            .get(&id)
            .and_then(ElementRecord::as_split)
            .map(SplitContainer::orientation)
    }

    pub(crate) fn is_tabs(&self, id: ElementId) -> bool {
        self.nodes
            .get(&id)
            .and_then(ElementRecord::as_tabs)
            .is_some()
    }

    fn hinted_extent(&self, id: ElementId, orientation: Orientation) -> Option<f64> {
        self.leaf(id).and_then(|leaf| leaf.hinted_extent(orientation))
    }

    /// Put `new` (detached) where `old` sits; `old` becomes detached.
    fn replace_slot(&mut self, old: ElementId, new: ElementId) {
        match self.index_in_parent(old) {
            Some((parent, index)) => {
                if let Some(children) = self.kind_mut(parent).and_then(ElementKind::children_mut) {
                    children[index] = new;
                }
                self.set_parent(new, Some(parent));
            }
            None => {
                if self.root == Some(old) {
                    self.root = Some(new);
                }
                self.set_parent(new, None);
            }
        }
        self.set_parent(old, None);
    }

    /// Dissolve `element` if it is a split along `orientation`.
    fn split_pieces(&mut self, element: ElementId, orientation: Orientation) -> (Vec<ElementId>, Vec<f64>) {
        if self.orientation_of(element) == Some(orientation) {
            if let Some(ElementKind::Split(split)) = self.nodes.remove(&element).map(|r| r.kind) {
                return (split.children, split.dividers);
            }
        }
        (vec![element], Vec::new())
    }

    /// Dissolve `element` if it is a tab group.
    fn tab_pieces(&mut self, element: ElementId) -> (Vec<ElementId>, usize) {
        if self.is_tabs(element) {
            if let Some(ElementKind::Tabs(tabs)) = self.nodes.remove(&element).map(|r| r.kind) {
                return (tabs.children, tabs.selected);
            }
        }
        (vec![element], 0)
    }

    /// Insert `element` beside child `anchor_index` of `split_id`, with the
    /// boundary between them at `boundary`.
    fn insert_into_split(
        &mut self,
        split_id: ElementId,
        anchor_index: usize,
        after: bool,
        element: ElementId,
        boundary: f64,
    ) {
        let Some(orientation) = self.orientation_of(split_id) else {
            return;
        };
        let (pieces, inner) = self.split_pieces(element, orientation);
        let Some(ElementKind::Split(split)) = self.kind_mut(split_id) else {
            return;
        };
        let (start, end) = segment_of(&split.dividers, anchor_index);
        let (lo, hi) = if after { (boundary, end) } else { (start, boundary) };
        let mapped = inner.iter().map(|divider| lo + (hi - lo) * divider);

        let insert_at = if after { anchor_index + 1 } else { anchor_index };
        for (offset, piece) in pieces.iter().enumerate() {
            split.children.insert(insert_at + offset, *piece);
        }
        let tail = split.dividers.split_off(anchor_index);
        if after {
            split.dividers.push(boundary);
            split.dividers.extend(mapped);
        } else {
            split.dividers.extend(mapped);
            split.dividers.push(boundary);
        }
        split.dividers.extend(tail);

        for piece in pieces {
            self.set_parent(piece, Some(split_id));
        }
    }

    /// Insert `element` into a tab group at `index` (clamped) and select it.
    fn insert_into_tabs(&mut self, tabs_id: ElementId, index: usize, element: ElementId) {
        let (pieces, selected_offset) = self.tab_pieces(element);
        let Some(ElementKind::Tabs(tabs)) = self.kind_mut(tabs_id) else {
            return;
        };
        let at = index.min(tabs.children.len());
        for (offset, piece) in pieces.iter().enumerate() {
            tabs.children.insert(at + offset, *piece);
        }
        tabs.selected = at + selected_offset;
        for piece in pieces {
            self.set_parent(piece, Some(tabs_id));
        }
    }

    /// Put a detached `child` into slot `index` of `parent`, splicing it
    /// when it would nest a same-orientation split or tabs in tabs.
    /// Returns `true` if `child` was dissolved into `parent`.
    pub(crate) fn place_at(&mut self, parent: ElementId, index: usize, child: ElementId) -> bool {
        let parent_orientation = self.orientation_of(parent);
        if let Some(orientation) = parent_orientation.filter(|o| self.orientation_of(child) == Some(*o)) {
            let (pieces, inner) = self.split_pieces(child, orientation);
            let Some(ElementKind::Split(split)) = self.kind_mut(parent) else {
                return false;
            };
            let (lo, hi) = segment_of(&split.dividers, index);
            split.children.remove(index);
            for (offset, piece) in pieces.iter().enumerate() {
                split.children.insert(index + offset, *piece);
            }
            let tail = split.dividers.split_off(index);
            split
                .dividers
                .extend(inner.iter().map(|divider| lo + (hi - lo) * divider));
            split.dividers.extend(tail);
            for piece in pieces {
                self.set_parent(piece, Some(parent));
            }
            return true;
        }
        if self.is_tabs(parent) && self.is_tabs(child) {
            let (pieces, child_selected) = self.tab_pieces(child);
            let Some(ElementKind::Tabs(tabs)) = self.kind_mut(parent) else {
                return false;
            };
            tabs.children.remove(index);
            for (offset, piece) in pieces.iter().enumerate() {
                tabs.children.insert(index + offset, *piece);
            }
            if tabs.selected == index {
                tabs.selected = index + child_selected;
            } else if tabs.selected > index {
                tabs.selected += pieces.len() - 1;
            }
            for piece in pieces {
                self.set_parent(piece, Some(parent));
            }
            return true;
        }
        if let Some(children) = self.kind_mut(parent).and_then(ElementKind::children_mut) {
            children[index] = child;
        }
        self.set_parent(child, Some(parent));
        false
    }

    /// Drop child `index` from a container with divider and selection
    /// bookkeeping.
    fn remove_child_at(&mut self, container: ElementId, index: usize) {
        match self.kind_mut(container) {
            Some(ElementKind::Split(split)) if index < split.children.len() => {
                split.children.remove(index);
                if !split.dividers.is_empty() {
                    split.dividers.remove(index.max(1) - 1);
                }
            }
            Some(ElementKind::Tabs(tabs)) if index < tabs.children.len() => {
                tabs.children.remove(index);
                if tabs.selected > index {
                    tabs.selected -= 1;
                } else if tabs.selected == index {
                    tabs.selected = index.min(tabs.children.len().saturating_sub(1));
                }
            }
            _ => {}
        }
    }

    /// Take `id` out of the tree with cascading cleanup. Returns the
    /// containers that were replaced along the way.
    pub(crate) fn detach(&mut self, id: ElementId) -> Replacements {
        let mut replaced = Vec::new();
        match self.index_in_parent(id) {
            Some((parent, index)) => {
                self.remove_child_at(parent, index);
                self.set_parent(id, None);
                self.collapse(parent, &mut replaced);
            }
            None => {
                if self.root == Some(id) {
                    self.root = None;
                }
            }
        }
        replaced
    }

    fn collapse(&mut self, container: ElementId, replaced: &mut Replacements) {
        let mut current = container;
        loop {
            let (count, first) = {
                let children = self.children_of(current);
                (children.len(), children.first().copied())
            };
            match (count, first) {
                (0, _) => {
                    let slot = self.index_in_parent(current);
                    self.nodes.remove(&current);
                    match slot {
                        Some((parent, index)) => {
                            self.remove_child_at(parent, index);
                            current = parent;
                        }
                        None => {
                            if self.root == Some(current) {
                                self.root = None;
                            }
                            return;
                        }
                    }
                }
                (1, Some(survivor)) => {
                    let slot = self.index_in_parent(current);
                    let was_root = self.root == Some(current);
                    self.nodes.remove(&current);
                    self.set_parent(survivor, None);
                    replaced.push((current, survivor));
                    match slot {
                        Some((parent, index)) => {
                            if self.place_at(parent, index, survivor) {
                                replaced.push((survivor, parent));
                            }
                        }
                        None => {
                            if was_root {
                                self.root = Some(survivor);
                            }
                        }
                    }
                    return;
                }
                _ => return,
            }
        }
    }

    /// Follow cleanup replacements from `target` to an attached element.
    fn follow_replacements(&self, target: ElementId, replaced: &Replacements) -> Option<ElementId> {
        let mut current = target;
        for _ in 0..=replaced.len() {
            if self.contains_in_tree(current) {
                return Some(current);
            }
            current = replaced
                .iter()
                .find(|(removed, _)| *removed == current)
                .map(|(_, successor)| *successor)?;
        }
        None
    }

    /// A split target of the docking orientation resolves to its edge child.
    fn edge_target(&self, target: ElementId, orientation: Orientation, leading: bool) -> ElementId {
        match self.nodes.get(&target).and_then(ElementRecord::as_split) {
            Some(split) if split.orientation() == orientation => {
                let edge = if leading {
                    split.children().first()
                } else {
                    split.children().last()
                };
                edge.copied().unwrap_or(target)
            }
            _ => target,
        }
    }

    /// Dock a detached `element` against attached `target`.
    pub(crate) fn dock_attached(
        &mut self,
        element: ElementId,
        target: ElementId,
        position: DockPosition,
        tab_index: Option<usize>,
    ) {
        match position.orientation() {
            None => self.dock_center(element, target, tab_index),
            Some(orientation) => {
                self.dock_edge(element, target, orientation, position.is_leading());
            }
        }
    }

    fn dock_center(&mut self, element: ElementId, target: ElementId, tab_index: Option<usize>) {
        if let Some((parent, index)) = self.index_in_parent(target) {
            if self.is_tabs(parent) {
                self.insert_into_tabs(parent, tab_index.unwrap_or(index + 1), element);
                return;
            }
        }
        if self.is_tabs(target) {
            self.insert_into_tabs(target, tab_index.unwrap_or(usize::MAX), element);
            return;
        }
        let tabs = self.insert_container(ElementKind::Tabs(TabContainer::empty()));
        self.replace_slot(target, tabs);
        if let Some(ElementKind::Tabs(group)) = self.kind_mut(tabs) {
            group.children.push(target);
        }
        self.set_parent(target, Some(tabs));
        let slot = if tab_index == Some(0) { 0 } else { 1 };
        self.insert_into_tabs(tabs, slot, element);
    }

    fn dock_edge(
        &mut self,
        element: ElementId,
        target: ElementId,
        orientation: Orientation,
        leading: bool,
    ) {
        let target = self.edge_target(target, orientation, leading);
        if let Some((parent, index)) = self.index_in_parent(target) {
            if let Some(split) = self
                .nodes
                .get(&parent)
                .and_then(ElementRecord::as_split)
                .filter(|split| split.orientation() == orientation)
            {
                let (start, end) = split.segment(index);
                let boundary = (start + end) / 2.0;
                self.insert_into_split(parent, index, !leading, element, boundary);
                return;
            }
        }

        let (first, second) = if leading {
            (element, target)
        } else {
            (target, element)
        };
        let boundary = self.policy.split_share(
            self.hinted_extent(first, orientation),
            self.hinted_extent(second, orientation),
        );
        let split = self.insert_container(ElementKind::Split(SplitContainer::empty(orientation)));
        self.replace_slot(target, split);
        if let Some(ElementKind::Split(container)) = self.kind_mut(split) {
            container.children.push(target);
        }
        self.set_parent(target, Some(split));
        self.insert_into_split(split, 0, !leading, element, boundary);
    }
}

fn write_divider(split: &mut SplitContainer, index: usize, value: f64) -> Result<(), DockNoopReason> {
    let Some(current) = split.dividers.get(index).copied() else {
        return Err(DockNoopReason::IndexOutOfRange);
    };
    let lo = if index == 0 { 0.0 } else { split.dividers[index - 1] };
    let hi = split.dividers.get(index + 1).copied().unwrap_or(1.0);
    if !(value.is_finite() && lo < value && value < hi) {
        return Err(DockNoopReason::InvalidValue);
    }
    if current == value {
        return Err(DockNoopReason::Unchanged);
    }
    split.dividers[index] = value;
    Ok(())
}

fn write_ratios(split: &mut SplitContainer, weights: &[f64]) -> Result<(), DockNoopReason> {
    if weights.len() != split.children.len()
        || weights.iter().any(|weight| !(weight.is_finite() && *weight > 0.0))
    {
        return Err(DockNoopReason::InvalidValue);
    }
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(DockNoopReason::InvalidValue);
    }
    let mut acc = 0.0;
    let mut dividers = Vec::with_capacity(weights.len().saturating_sub(1));
    let mut previous = 0.0;
    for weight in &weights[..weights.len() - 1] {
        acc += weight;
        let divider = acc / total;
        if !(divider > previous && divider < 1.0) {
            return Err(DockNoopReason::InvalidValue);
        }
        dividers.push(divider);
        previous = divider;
    }
    if dividers == split.dividers {
        return Err(DockNoopReason::Unchanged);
    }
    split.dividers = dividers;
    Ok(())
}
