//! Multi-host orchestration.
//!
//! A [`DockWorkspace`] owns the main [`LayoutGraph`], any number of floating
//! hosts (each a graph of its own with optional window bounds), and a list of
//! hidden leaves. It moves leaves between hosts while keeping placement
//! memory in the main graph, so a leaf that floats, hides, or pins can find
//! its way back.
//!
//! Leaf ids are process-unique, so a leaf keeps its id across hosts. Floating
//! hosts that lose their last leaf are dropped.

use std::collections::BTreeMap;
use std::fmt;

use dockgraph_core::geometry::Bounds;
use dockgraph_core::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::element::{DockLeaf, DockPosition, ElementId};
use crate::graph::{DockModelError, LayoutGraph, LeafLocation};
use crate::mutation::{DockNoopReason, DockOutcome};
use crate::placement::{self, FloatingHostId, HostId, PlacementHosts, RestorePlan};
use crate::policy::{DockPolicy, DockPolicyError};
use crate::sidebar::Side;
use crate::snapshot::{DockLeafFactory, LayoutNode, LayoutSnapshot, LayoutSnapshotError, LoadReport};

/// A secondary window with its own tree.
#[derive(Debug, Clone)]
pub struct FloatingHost {
    id: FloatingHostId,
    graph: LayoutGraph,
    bounds: Option<Bounds>,
}

impl FloatingHost {
    #[must_use]
    pub fn id(&self) -> FloatingHostId {
        self.id
    }

    #[must_use]
    pub fn graph(&self) -> &LayoutGraph {
        &self.graph
    }

    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }
}

/// A leaf removed from every host, with the host it should return to.
#[derive(Debug, Clone)]
pub struct HiddenLeaf {
    id: ElementId,
    leaf: DockLeaf,
    restore_to: HostId,
}

impl HiddenLeaf {
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
    }

    #[must_use]
    pub fn leaf(&self) -> &DockLeaf {
        &self.leaf
    }

    #[must_use]
    pub fn restore_to(&self) -> HostId {
        self.restore_to
    }
}

/// Where a leaf lives across the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceLocation {
    MainTree,
    SideBar(Side),
    Floating(FloatingHostId),
    Hidden,
    /// Registered in a host's graph but not placed.
    Detached(HostId),
}

/// Persisted floating window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingHostSnapshot {
    pub root: LayoutNode,
    #[serde(default)]
    pub bounds: Option<Bounds>,
}

/// Persisted workspace: the main layout and every floating window.
///
/// The schema version is the one carried by `main`. Hidden leaves are not
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    pub main: LayoutSnapshot,
    #[serde(default)]
    pub floating: Vec<FloatingHostSnapshot>,
}

impl WorkspaceSnapshot {
    pub fn validate(&self) -> Result<(), LayoutSnapshotError> {
        self.main.validate()
    }

    /// Rebuild every leaf, main and floating, through `factory`.
    #[must_use]
    pub fn hydrate<F: DockLeafFactory + ?Sized>(self, factory: &mut F) -> Self {
        Self {
            main: self.main.hydrate(factory),
            floating: self
                .floating
                .into_iter()
                .map(|host| FloatingHostSnapshot {
                    root: host.root.hydrate(factory),
                    bounds: host.bounds,
                })
                .collect(),
        }
    }
}

/// What a workspace load did, per graph.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkspaceLoadReport {
    pub main: LoadReport,
    /// Reports for the hosts that were recreated, in snapshot order.
    /// Floating layouts that normalized to nothing get no host.
    pub floating: Vec<(FloatingHostId, LoadReport)>,
}

impl WorkspaceLoadReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.main.is_clean() && self.floating.iter().all(|(_, report)| report.is_clean())
    }
}

/// Main layout plus floating hosts and hidden leaves.
#[derive(Debug, Clone)]
pub struct DockWorkspace {
    main: LayoutGraph,
    floating: BTreeMap<FloatingHostId, FloatingHost>,
    hidden: Vec<HiddenLeaf>,
    next_host: u64,
    retired_revisions: u64,
    changes: u64,
}

impl Default for DockWorkspace {
    fn default() -> Self {
        Self::from_graph(LayoutGraph::new())
    }
}

impl DockWorkspace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DockPolicy) -> Result<Self, DockPolicyError> {
        LayoutGraph::with_policy(policy).map(Self::from_graph)
    }

    /// Wrap an existing main graph.
    #[must_use]
    pub fn from_graph(main: LayoutGraph) -> Self {
        Self {
            main,
            floating: BTreeMap::new(),
            hidden: Vec::new(),
            next_host: 1,
            retired_revisions: 0,
            changes: 0,
        }
    }

    #[must_use]
    pub fn main(&self) -> &LayoutGraph {
        &self.main
    }

    /// Mutable main graph for in-host operations (dock, move, setters).
    pub fn main_mut(&mut self) -> &mut LayoutGraph {
        &mut self.main
    }

    /// Register a detached leaf in the main graph.
    pub fn add_leaf(&mut self, leaf: DockLeaf) -> ElementId {
        self.main.add_leaf(leaf)
    }

    #[must_use]
    pub fn floating_host(&self, id: FloatingHostId) -> Option<&FloatingHost> {
        self.floating.get(&id)
    }

    pub fn floating_hosts(&self) -> impl Iterator<Item = &FloatingHost> {
        self.floating.values()
    }

    #[must_use]
    pub fn hidden(&self) -> &[HiddenLeaf] {
        &self.hidden
    }

    /// Record a floating window's new bounds. View state: no revision bump.
    pub fn set_floating_bounds(&mut self, id: FloatingHostId, bounds: Bounds) -> bool {
        match self.floating.get_mut(&id) {
            Some(host) if bounds.is_valid() => {
                host.bounds = Some(bounds);
                true
            }
            _ => false,
        }
    }

    /// Monotonic counter covering every graph and every host-set or
    /// hidden-list change.
    #[must_use]
    pub fn revision(&self) -> u64 {
        let floating: u64 = self
            .floating
            .values()
            .map(|host| host.graph.revision())
            .sum();
        self.main.revision() + floating + self.retired_revisions + self.changes
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.main.is_locked()
    }

    /// Lock or unlock every graph.
    pub fn set_locked(&mut self, locked: bool) {
        self.main.set_locked(locked);
        for host in self.floating.values_mut() {
            host.graph.set_locked(locked);
        }
    }

    /// Leaf data wherever it lives.
    #[must_use]
    pub fn leaf(&self, id: ElementId) -> Option<&DockLeaf> {
        self.main
            .leaf(id)
            .or_else(|| self.floating.values().find_map(|host| host.graph.leaf(id)))
            .or_else(|| {
                self.hidden
                    .iter()
                    .find(|hidden| hidden.id == id)
                    .map(|hidden| &hidden.leaf)
            })
    }

    #[must_use]
    pub fn locate(&self, leaf: ElementId) -> Option<WorkspaceLocation> {
        if let Some(location) = self.main.location(leaf) {
            return Some(match location {
                LeafLocation::MainTree => WorkspaceLocation::MainTree,
                LeafLocation::SideBar(side) => WorkspaceLocation::SideBar(side),
                LeafLocation::Detached => WorkspaceLocation::Detached(HostId::Main),
            });
        }
        for host in self.floating.values() {
            match host.graph.location(leaf) {
                Some(LeafLocation::Detached) => {
                    return Some(WorkspaceLocation::Detached(HostId::Floating(host.id)));
                }
                Some(_) => return Some(WorkspaceLocation::Floating(host.id)),
                None => {}
            }
        }
        self.hidden
            .iter()
            .any(|hidden| hidden.id == leaf)
            .then_some(WorkspaceLocation::Hidden)
    }

    fn graph(&self, host: HostId) -> Option<&LayoutGraph> {
        match host {
            HostId::Main => Some(&self.main),
            HostId::Floating(id) => self.floating.get(&id).map(|host| &host.graph),
        }
    }

    fn graph_mut(&mut self, host: HostId) -> Option<&mut LayoutGraph> {
        match host {
            HostId::Main => Some(&mut self.main),
            HostId::Floating(id) => self.floating.get_mut(&id).map(|host| &mut host.graph),
        }
    }

    fn unlocked(&self, op: &'static str) -> bool {
        if self.main.is_locked() {
            trace!(message = "workspace.noop", op, reason = ?DockNoopReason::Locked);
            return false;
        }
        true
    }

    fn changed(&mut self, op: &'static str) {
        self.changes += 1;
        debug!(
            message = "workspace.apply",
            op,
            revision = self.revision(),
            floating_hosts = self.floating.len(),
            hidden = self.hidden.len()
        );
    }

    fn new_host(&mut self, bounds: Option<Bounds>) -> FloatingHostId {
        let id = FloatingHostId(self.next_host);
        self.next_host += 1;
        let mut graph = LayoutGraph::build(*self.main.policy());
        graph.set_locked(self.main.is_locked());
        self.floating.insert(
            id,
            FloatingHost {
                id,
                graph,
                bounds,
            },
        );
        id
    }

    fn retire_host(&mut self, id: FloatingHostId) -> Option<FloatingHost> {
        let host = self.floating.remove(&id)?;
        self.retired_revisions += host.graph.revision();
        Some(host)
    }

    fn prune_if_empty(&mut self, id: FloatingHostId) {
        let empty = self
            .floating
            .get(&id)
            .is_some_and(|host| host.graph.is_empty() && host.graph.detached_leaves().is_empty());
        if empty {
            self.retire_host(id);
        }
    }

    /// Remove a leaf from wherever it lives, capturing placement memory
    /// (into the main graph) when it leaves a tree. Returns the leaf and the
    /// host it came from.
    fn extract_leaf(&mut self, leaf: ElementId) -> Option<(DockLeaf, HostId)> {
        if self.main.is_leaf(leaf) {
            if self.main.contains_in_tree(leaf) {
                self.main.capture_placement(leaf, HostId::Main);
                self.main.undock(leaf);
            } else if self.main.is_pinned(leaf) {
                self.main.unpin_from_sidebar(leaf);
            }
            let value = self.main.take_detached_leaf(leaf)?;
            return Some((value, HostId::Main));
        }

        let host_id = self
            .floating
            .values()
            .find(|host| host.graph.is_leaf(leaf))
            .map(|host| host.id);
        if let Some(id) = host_id {
            let host = self.floating.get_mut(&id)?;
            let source = HostId::Floating(id);
            if host.graph.contains_in_tree(leaf) {
                if let Some(record) = host.graph.capture_placement(leaf, source) {
                    self.main.placement_memory_mut().remember(leaf, record);
                }
                host.graph.undock(leaf);
            }
            let bounds = host.bounds;
            let mut value = host.graph.take_detached_leaf(leaf)?;
            if bounds.is_some() {
                value.restore.last_floating_bounds = bounds;
            }
            self.prune_if_empty(id);
            return Some((value, source));
        }

        let index = self.hidden.iter().position(|hidden| hidden.id == leaf)?;
        let hidden = self.hidden.remove(index);
        Some((hidden.leaf, hidden.restore_to))
    }

    /// Move a leaf into a new floating host.
    ///
    /// A leaf that is already the only occupant of a floating host keeps
    /// that host. `bounds` defaults to the leaf's last floating bounds.
    pub fn float_leaf(&mut self, leaf: ElementId, bounds: Option<Bounds>) -> Option<FloatingHostId> {
        if !self.unlocked("float") {
            return None;
        }
        if let Some(WorkspaceLocation::Floating(id)) = self.locate(leaf) {
            let host = self.floating.get_mut(&id)?;
            if host.graph.root() == Some(leaf) {
                if bounds.is_some() {
                    host.bounds = bounds;
                }
                return Some(id);
            }
        }
        let (mut value, _) = self.extract_leaf(leaf)?;
        let bounds = bounds.or(value.restore.last_floating_bounds);
        value.restore.last_floating_bounds = bounds;
        let id = self.new_host(bounds);
        let host = self.floating.get_mut(&id)?;
        host.graph.adopt_leaf(leaf, value);
        host.graph.dock(leaf, None, DockPosition::Center, None);
        self.changed("float");
        Some(id)
    }

    /// Dock every leaf of a floating host back into the main layout.
    ///
    /// Leaves are placed against their remembered anchors, retrying while
    /// any placement makes progress (an earlier leaf may be the anchor of a
    /// later one); the rest fall back to the right of the main root.
    pub fn attach_floating_host(&mut self, id: FloatingHostId) -> bool {
        if !self.unlocked("attach") {
            return false;
        }
        let Some(host) = self.retire_host(id) else {
            return false;
        };
        let bounds = host.bounds;
        let mut pending = Vec::new();
        for (leaf, mut value) in host.graph.into_leaves() {
            if bounds.is_some() {
                value.restore.last_floating_bounds = bounds;
            }
            if self.main.adopt_leaf(leaf, value) {
                pending.push(leaf);
            }
        }

        loop {
            let before = pending.len();
            let mut unresolved = Vec::new();
            for leaf in pending {
                let resolved =
                    placement::resolve_anchor(self.main.placement_memory().get(leaf), leaf, &self.main);
                match resolved {
                    Some((_, anchor)) => {
                        self.main.place_detached(leaf, Some(anchor));
                    }
                    None => unresolved.push(leaf),
                }
            }
            pending = unresolved;
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }
        for leaf in pending {
            self.main.place_detached(leaf, None);
        }
        self.changed("attach");
        true
    }

    /// Drop a floating host, hiding its leaves. They remember the host so a
    /// later restore reopens a window for them.
    pub fn close_floating_host(&mut self, id: FloatingHostId) -> bool {
        if !self.unlocked("close_host") {
            return false;
        }
        let Some(host) = self.retire_host(id) else {
            return false;
        };
        let bounds = host.bounds;
        for (leaf, mut value) in host.graph.into_leaves() {
            if bounds.is_some() {
                value.restore.last_floating_bounds = bounds;
            }
            self.hidden.push(HiddenLeaf {
                id: leaf,
                leaf: value,
                restore_to: HostId::Floating(id),
            });
        }
        self.changed("close_host");
        true
    }

    /// Remove a leaf from view, remembering which host it came from.
    pub fn hide_leaf(&mut self, leaf: ElementId) -> bool {
        if !self.unlocked("hide") || self.locate(leaf) == Some(WorkspaceLocation::Hidden) {
            return false;
        }
        let Some((value, source)) = self.extract_leaf(leaf) else {
            return false;
        };
        self.hidden.push(HiddenLeaf {
            id: leaf,
            leaf: value,
            restore_to: source,
        });
        self.changed("hide");
        true
    }

    /// Bring a hidden leaf back.
    ///
    /// A leaf hidden from a floating host that no longer exists gets a new
    /// floating host with its last bounds.
    pub fn restore_hidden(&mut self, leaf: ElementId) -> bool {
        if !self.unlocked("restore_hidden") {
            return false;
        }
        let Some(index) = self.hidden.iter().position(|hidden| hidden.id == leaf) else {
            return false;
        };
        let HiddenLeaf {
            id,
            leaf: value,
            restore_to,
        } = self.hidden.remove(index);

        let record = self.main.placement_memory().get(id).copied();
        let plan = match restore_to {
            HostId::Floating(host) if self.floating.contains_key(&host) => {
                match placement::resolve_anchor(record.as_ref(), id, &*self) {
                    Some((found, anchor)) if found == restore_to => RestorePlan::Anchor {
                        host: found,
                        anchor,
                    },
                    _ => RestorePlan::HostRoot { host },
                }
            }
            HostId::Floating(_) => {
                let bounds = value.restore.last_floating_bounds;
                let host = self.new_host(bounds);
                RestorePlan::HostRoot { host }
            }
            HostId::Main => placement::resolve(record.as_ref(), id, &*self),
        };
        let outcome = self.place_by_plan(id, value, plan);
        self.changed("restore_hidden");
        outcome.is_applied()
    }

    /// Adopt a free-standing leaf into the host chosen by `plan` and dock it.
    pub(crate) fn place_by_plan(
        &mut self,
        leaf: ElementId,
        value: DockLeaf,
        plan: RestorePlan,
    ) -> DockOutcome {
        let anchor = match plan {
            RestorePlan::Anchor { anchor, .. } => Some(anchor),
            RestorePlan::HostRoot { .. } | RestorePlan::MainRoot | RestorePlan::BecomeMainRoot => {
                None
            }
        };
        let host = match plan.host() {
            host @ HostId::Floating(id) if self.floating.contains_key(&id) => host,
            _ => HostId::Main,
        };
        let Some(graph) = self.graph_mut(host) else {
            return DockOutcome::Noop {
                reason: DockNoopReason::TargetNotInGraph,
            };
        };
        if !graph.adopt_leaf(leaf, value) {
            return DockOutcome::Noop {
                reason: DockNoopReason::AlreadyInPlace,
            };
        }
        graph.place_detached(leaf, anchor)
    }

    /// Pin a leaf from any host to a main-layout sidebar.
    pub fn pin_to_sidebar(&mut self, leaf: ElementId, side: Side, index: Option<usize>) -> DockOutcome {
        if !self.unlocked("pin") {
            return DockOutcome::Noop {
                reason: DockNoopReason::Locked,
            };
        }
        if self.main.contains(leaf) {
            return self.main.pin_to_sidebar(leaf, side, index);
        }
        let Some((value, _)) = self.extract_leaf(leaf) else {
            return DockOutcome::Noop {
                reason: DockNoopReason::UnknownElement,
            };
        };
        self.main.adopt_leaf(leaf, value);
        let outcome = self.main.pin_to_sidebar(leaf, side, index);
        self.changed("pin");
        outcome
    }

    /// Unpin a leaf and restore it using placement memory, which may point
    /// into a live floating host.
    pub fn restore_from_sidebar(&mut self, leaf: ElementId) -> DockOutcome {
        if !self.unlocked("restore") {
            return DockOutcome::Noop {
                reason: DockNoopReason::Locked,
            };
        }
        if !self.main.is_pinned(leaf) {
            return DockOutcome::Noop {
                reason: DockNoopReason::NotPinned,
            };
        }
        let plan = placement::resolve(self.main.placement_memory().get(leaf), leaf, &*self);
        if plan.host() == HostId::Main {
            return self.main.restore_from_sidebar(leaf);
        }
        self.main.unpin_from_sidebar(leaf);
        let Some(value) = self.main.take_detached_leaf(leaf) else {
            return DockOutcome::Noop {
                reason: DockNoopReason::UnknownElement,
            };
        };
        let outcome = self.place_by_plan(leaf, value, plan);
        self.changed("restore");
        outcome
    }

    /// Move a leaf into `host`, docking it against `target` there.
    ///
    /// Within one host this is [`LayoutGraph::move_element`]. Across hosts
    /// the leaf's placement is captured before it leaves. `target == None`
    /// is only valid for an empty destination.
    pub fn move_to_host(
        &mut self,
        leaf: ElementId,
        host: HostId,
        target: Option<ElementId>,
        position: DockPosition,
        tab_index: Option<usize>,
    ) -> DockOutcome {
        if !self.unlocked("move_to_host") {
            return DockOutcome::Noop {
                reason: DockNoopReason::Locked,
            };
        }
        let Some(destination) = self.graph(host) else {
            return DockOutcome::Noop {
                reason: DockNoopReason::TargetNotInGraph,
            };
        };
        match target {
            Some(target) if !destination.contains_in_tree(target) => {
                return DockOutcome::Noop {
                    reason: DockNoopReason::TargetNotInGraph,
                };
            }
            Some(target) if target == leaf => {
                return DockOutcome::Noop {
                    reason: DockNoopReason::SelfTarget,
                };
            }
            None if !destination.is_empty() => {
                return DockOutcome::Noop {
                    reason: DockNoopReason::MissingTarget,
                };
            }
            _ => {}
        }
        if destination.contains_in_tree(leaf) {
            return match self.graph_mut(host) {
                Some(graph) => graph.move_element(leaf, target, position, tab_index),
                None => DockOutcome::Noop {
                    reason: DockNoopReason::TargetNotInGraph,
                },
            };
        }
        if self.locate(leaf).is_none() {
            return DockOutcome::Noop {
                reason: DockNoopReason::UnknownElement,
            };
        }

        let Some((value, _)) = self.extract_leaf(leaf) else {
            return DockOutcome::Noop {
                reason: DockNoopReason::NotALeaf,
            };
        };
        let outcome = match self.graph_mut(host) {
            Some(graph) => {
                if graph.adopt_leaf(leaf, value) {
                    graph.dock(leaf, target, position, tab_index)
                } else {
                    DockOutcome::Noop {
                        reason: DockNoopReason::TargetNotInGraph,
                    }
                }
            }
            None => DockOutcome::Noop {
                reason: DockNoopReason::TargetNotInGraph,
            },
        };
        self.changed("move_to_host");
        outcome
    }

    /// Attached or pinned leaves with `key`, across the main layout and
    /// every floating host. Hidden leaves are not counted.
    #[must_use]
    pub fn leaf_count_for_key(&self, key: &str) -> usize {
        let floating: usize = self
            .floating
            .values()
            .map(|host| host.graph.leaf_count_for_key(key))
            .sum();
        self.main.leaf_count_for_key(key) + floating
    }

    /// Drop a leaf from the workspace wherever it lives.
    ///
    /// Unlike [`hide_leaf`](Self::hide_leaf) nothing is kept for a later
    /// restore, and the leaf's placement memory is forgotten. A floating host
    /// left empty is closed.
    pub fn remove_leaf(&mut self, leaf: ElementId) -> Option<DockLeaf> {
        if !self.unlocked("remove") {
            return None;
        }
        if self.main.is_leaf(leaf) {
            return self.main.remove_leaf(leaf);
        }
        let (value, _) = self.extract_leaf(leaf)?;
        self.main.placement_memory_mut().forget(leaf);
        self.changed("remove");
        Some(value)
    }

    /// Close every floating host. With `attach_back` their leaves dock into
    /// the main layout as in [`attach_floating_host`](Self::attach_floating_host);
    /// otherwise the hosts are discarded along with their leaves. Returns the
    /// number of hosts closed.
    pub fn close_floating_hosts(&mut self, attach_back: bool) -> usize {
        if !self.unlocked("close_hosts") {
            return 0;
        }
        let ids: Vec<FloatingHostId> = self.floating.keys().copied().collect();
        let mut closed = 0;
        for id in ids {
            let done = if attach_back {
                self.attach_floating_host(id)
            } else {
                self.discard_floating_host(id)
            };
            if done {
                closed += 1;
            }
        }
        if closed > 0 && !attach_back {
            self.changed("close_hosts");
        }
        closed
    }

    /// Retire a host and drop its leaves without hiding them.
    fn discard_floating_host(&mut self, id: FloatingHostId) -> bool {
        let Some(host) = self.retire_host(id) else {
            return false;
        };
        let memory = self.main.placement_memory_mut();
        for (leaf, _) in host.graph.into_leaves() {
            memory.forget(leaf);
        }
        true
    }

    /// Persist the main layout and every floating host in id order.
    #[must_use]
    pub fn to_snapshot(&self) -> WorkspaceSnapshot {
        let floating = self
            .floating
            .values()
            .filter_map(|host| {
                host.graph.root_node().map(|root| FloatingHostSnapshot {
                    root,
                    bounds: host.bounds,
                })
            })
            .collect();
        WorkspaceSnapshot {
            main: self.main.to_snapshot(),
            floating,
        }
    }

    /// Replace the main layout and all floating hosts from a snapshot.
    ///
    /// Existing floating hosts are discarded; hidden leaves are kept. Like
    /// [`LayoutGraph::load_snapshot`] this is not gated by the lock, and a
    /// version mismatch is rejected before anything changes.
    pub fn load_snapshot(
        &mut self,
        snapshot: WorkspaceSnapshot,
    ) -> Result<WorkspaceLoadReport, LayoutSnapshotError> {
        snapshot.validate()?;
        let stale: Vec<FloatingHostId> = self.floating.keys().copied().collect();
        for id in stale {
            self.discard_floating_host(id);
        }
        let main = self.main.load_snapshot(snapshot.main)?;

        let mut floating = Vec::with_capacity(snapshot.floating.len());
        for host in snapshot.floating {
            let bounds = host.bounds.filter(Bounds::is_valid);
            let id = self.new_host(bounds);
            let Some(graph) = self.graph_mut(HostId::Floating(id)) else {
                continue;
            };
            let report = graph.set_root(Some(host.root));
            if graph.is_empty() {
                self.retire_host(id);
                continue;
            }
            floating.push((id, report));
        }
        self.changed("load");
        Ok(WorkspaceLoadReport { main, floating })
    }

    /// Check every graph plus cross-host rules.
    pub fn validate(&self) -> Result<(), WorkspaceError> {
        self.main.validate().map_err(|source| WorkspaceError::Graph {
            host: HostId::Main,
            source,
        })?;
        for host in self.floating.values() {
            host.graph.validate().map_err(|source| WorkspaceError::Graph {
                host: HostId::Floating(host.id),
                source,
            })?;
            if host.graph.is_empty() {
                return Err(WorkspaceError::EmptyFloatingHost { host: host.id });
            }
            if Side::ALL
                .into_iter()
                .any(|side| !host.graph.sidebar(side).is_empty())
            {
                return Err(WorkspaceError::FloatingHostPins { host: host.id });
            }
        }

        let mut seen = std::collections::BTreeSet::new();
        let graphs = std::iter::once(&self.main).chain(self.floating.values().map(|host| &host.graph));
        let graph_leaves = graphs.flat_map(|graph| {
            graph
                .nodes
                .values()
                .filter(|record| record.as_leaf().is_some())
                .map(|record| record.id())
        });
        for leaf in graph_leaves.chain(self.hidden.iter().map(|hidden| hidden.id)) {
            if !seen.insert(leaf) {
                return Err(WorkspaceError::DuplicateLeaf { leaf });
            }
        }
        Ok(())
    }
}

impl PlacementHosts for DockWorkspace {
    fn host_is_alive(&self, host: HostId) -> bool {
        self.graph(host).is_some()
    }

    fn host_contains(&self, host: HostId, element: ElementId) -> bool {
        self.graph(host)
            .is_some_and(|graph| graph.contains_in_tree(element))
    }

    fn host_is_empty(&self, host: HostId) -> bool {
        self.graph(host).is_none_or(LayoutGraph::is_empty)
    }
}

/// Cross-host invariant violations.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceError {
    Graph {
        host: HostId,
        source: DockModelError,
    },
    EmptyFloatingHost {
        host: FloatingHostId,
    },
    FloatingHostPins {
        host: FloatingHostId,
    },
    DuplicateLeaf {
        leaf: ElementId,
    },
}

impl fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph { host, source } => write!(f, "{host:?}: {source}"),
            Self::EmptyFloatingHost { host } => write!(f, "floating host {host} has no tree"),
            Self::FloatingHostPins { host } => {
                write!(f, "floating host {host} has sidebar entries")
            }
            Self::DuplicateLeaf { leaf } => write!(f, "leaf {leaf} is held by more than one host"),
        }
    }
}

impl std::error::Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph { source, .. } => Some(source),
            _ => None,
        }
    }
}
