//! Serializable layout descriptions.
//!
//! [`LayoutNode`] is the nested, id-free form of a tree. It is what hosts
//! build by hand for default layouts and what [`LayoutSnapshot`] persists.
//! Loading a node normalizes it into a valid graph and reports each repair
//! instead of failing: empty containers are dropped, single-child containers
//! collapse, nested same-orientation splits and nested tab groups are
//! spliced, bad dividers are regenerated and out-of-range tab selections are
//! clamped.
//!
//! Persisted leaves carry only their key and presentation data. A
//! [`DockLeafFactory`] turns keys back into live content on load; keys it
//! does not know become placeholders.

use std::fmt;

use dockgraph_core::geometry::Orientation;
use dockgraph_core::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::element::{
    DockLeaf, ElementId, ElementKind, ElementRecord, RestoreHints, SplitContainer, TabContainer,
    even_dividers,
};
use crate::graph::LayoutGraph;
use crate::sidebar::Side;

/// Current persisted layout schema.
pub const LAYOUT_SCHEMA_VERSION: u16 = 1;

/// Nested layout description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutNode {
    Leaf(DockLeaf),
    Split {
        orientation: Orientation,
        #[serde(default)]
        dividers: Vec<f64>,
        children: Vec<LayoutNode>,
    },
    Tabs {
        #[serde(default)]
        selected: usize,
        children: Vec<LayoutNode>,
    },
}

impl LayoutNode {
    #[must_use]
    pub fn leaf(leaf: DockLeaf) -> Self {
        Self::Leaf(leaf)
    }

    /// A split with evenly spaced dividers.
    #[must_use]
    pub fn split(orientation: Orientation, children: Vec<LayoutNode>) -> Self {
        Self::Split {
            orientation,
            dividers: even_dividers(children.len()),
            children,
        }
    }

    /// A tab group with the first tab selected.
    #[must_use]
    pub fn tabs(children: Vec<LayoutNode>) -> Self {
        Self::Tabs {
            selected: 0,
            children,
        }
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Split { children, .. } | Self::Tabs { children, .. } => {
                children.iter().map(Self::leaf_count).sum()
            }
        }
    }

    /// Rebuild leaves through `factory`.
    #[must_use]
    pub fn hydrate<F: DockLeafFactory + ?Sized>(self, factory: &mut F) -> Self {
        match self {
            Self::Leaf(leaf) => Self::Leaf(hydrate_leaf(leaf, factory)),
            Self::Split {
                orientation,
                dividers,
                children,
            } => Self::Split {
                orientation,
                dividers,
                children: children
                    .into_iter()
                    .map(|child| child.hydrate(factory))
                    .collect(),
            },
            Self::Tabs { selected, children } => Self::Tabs {
                selected,
                children: children
                    .into_iter()
                    .map(|child| child.hydrate(factory))
                    .collect(),
            },
        }
    }
}

/// Recreates leaf content from persisted keys.
pub trait DockLeafFactory {
    /// Build the live leaf for `key`, or `None` if the key is unknown.
    fn create_leaf(&mut self, key: &str) -> Option<DockLeaf>;
}

impl<F> DockLeafFactory for F
where
    F: FnMut(&str) -> Option<DockLeaf>,
{
    fn create_leaf(&mut self, key: &str) -> Option<DockLeaf> {
        self(key)
    }
}

fn hydrate_leaf<F: DockLeafFactory + ?Sized>(persisted: DockLeaf, factory: &mut F) -> DockLeaf {
    match factory.create_leaf(&persisted.key) {
        Some(live) => live,
        None => DockLeaf {
            content: None,
            ..persisted
        },
    }
}

/// Persisted state of one sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideBarSnapshot {
    #[serde(default)]
    pub leaves: Vec<DockLeaf>,
    #[serde(default)]
    pub pinned_open: bool,
    pub panel_width: f64,
}

/// Versioned persisted layout for one graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub schema_version: u16,
    pub root: Option<LayoutNode>,
    pub left: SideBarSnapshot,
    pub right: SideBarSnapshot,
}

impl LayoutSnapshot {
    pub fn validate(&self) -> Result<(), LayoutSnapshotError> {
        if self.schema_version != LAYOUT_SCHEMA_VERSION {
            return Err(LayoutSnapshotError::UnsupportedVersion {
                found: self.schema_version,
                expected: LAYOUT_SCHEMA_VERSION,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn sidebar(&self, side: Side) -> &SideBarSnapshot {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Rebuild every leaf (tree and sidebars) through `factory`.
    #[must_use]
    pub fn hydrate<F: DockLeafFactory + ?Sized>(mut self, factory: &mut F) -> Self {
        self.root = self.root.map(|root| root.hydrate(factory));
        for bar in [&mut self.left, &mut self.right] {
            bar.leaves = std::mem::take(&mut bar.leaves)
                .into_iter()
                .map(|leaf| hydrate_leaf(leaf, factory))
                .collect();
        }
        self
    }
}

/// Snapshot rejected before any state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSnapshotError {
    UnsupportedVersion { found: u16, expected: u16 },
}

impl fmt::Display for LayoutSnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, expected } => write!(
                f,
                "unsupported layout schema version {found} (expected {expected})"
            ),
        }
    }
}

impl std::error::Error for LayoutSnapshotError {}

/// One normalization applied while loading. `path` is the slash-separated
/// child-index path from `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LoadRepair {
    DroppedEmptyContainer { path: String },
    CollapsedSingleChild { path: String },
    MergedNestedSplit { path: String },
    MergedNestedTabs { path: String },
    RegeneratedDividers { path: String },
    ClampedSelection {
        path: String,
        found: usize,
        clamped: usize,
    },
}

/// What a load did.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadReport {
    pub repairs: Vec<LoadRepair>,
    pub revision: u64,
}

impl LoadReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.repairs.is_empty()
    }
}

enum Settled {
    Container(Vec<ElementId>),
    /// The container is dropped; its single child (if any) takes its place.
    Replaced(Option<ElementId>),
}

/// Apply the empty and single-child rules to built children.
fn settle_children(children: Vec<ElementId>, path: &str, repairs: &mut Vec<LoadRepair>) -> Settled {
    match children.len() {
        0 => {
            repairs.push(LoadRepair::DroppedEmptyContainer {
                path: path.to_owned(),
            });
            Settled::Replaced(None)
        }
        1 => {
            repairs.push(LoadRepair::CollapsedSingleChild {
                path: path.to_owned(),
            });
            Settled::Replaced(children.first().copied())
        }
        _ => Settled::Container(children),
    }
}

/// Copy of a leaf without its transient restore hints.
fn persisted_leaf(leaf: &DockLeaf) -> DockLeaf {
    DockLeaf {
        restore: RestoreHints::default(),
        ..leaf.clone()
    }
}

fn dividers_are_valid(dividers: &[f64], children: usize) -> bool {
    if dividers.len() + 1 != children {
        return false;
    }
    let mut previous = 0.0;
    for value in dividers.iter().copied() {
        if !(value.is_finite() && value > previous && value < 1.0) {
            return false;
        }
        previous = value;
    }
    true
}

impl LayoutGraph {
    /// Replace the attached tree with `root`, normalizing it.
    ///
    /// Sidebars and detached leaves are kept. Loading is not gated by the
    /// lock and bumps the revision once.
    pub fn set_root(&mut self, root: Option<LayoutNode>) -> LoadReport {
        let repairs = self.replace_tree(root);
        self.finish_load(repairs)
    }

    /// Replace the tree and both sidebars from a snapshot.
    ///
    /// Pinned leaves and the current tree are discarded; detached leaves are
    /// kept. A non-positive stored width falls back to the policy default.
    pub fn load_snapshot(
        &mut self,
        snapshot: LayoutSnapshot,
    ) -> Result<LoadReport, LayoutSnapshotError> {
        snapshot.validate()?;
        let default_width = self.policy.default_sidebar_width;
        for side in Side::ALL {
            for id in self.sidebars.get_mut(side).reset(default_width) {
                self.nodes.remove(&id);
                self.memory.forget(id);
            }
        }
        let LayoutSnapshot {
            root, left, right, ..
        } = snapshot;
        for (side, bar) in [(Side::Left, left), (Side::Right, right)] {
            let registry = self.sidebars.get_mut(side);
            registry.set_pinned_open(bar.pinned_open);
            registry.set_panel_width(bar.panel_width);
            for leaf in bar.leaves {
                let id = self.add_leaf(leaf);
                self.sidebars.get_mut(side).insert(id, None);
            }
        }
        let repairs = self.replace_tree(root);
        Ok(self.finish_load(repairs))
    }

    fn finish_load(&mut self, repairs: Vec<LoadRepair>) -> LoadReport {
        for repair in &repairs {
            warn!(message = "dock.load.repair", repair = ?repair);
        }
        self.revision += 1;
        debug_assert!(
            self.validate().is_ok(),
            "layout invariants violated after load: {:?}",
            self.validate()
        );
        debug!(
            message = "dock.load",
            repairs = repairs.len(),
            revision = self.revision
        );
        LoadReport {
            repairs,
            revision: self.revision,
        }
    }

    fn replace_tree(&mut self, root: Option<LayoutNode>) -> Vec<LoadRepair> {
        let old: Vec<ElementId> = self.walk().map(|step| step.record.id()).collect();
        for id in old {
            self.nodes.remove(&id);
            self.memory.forget(id);
        }
        self.root = None;

        let mut repairs = Vec::new();
        let built = root.and_then(|node| self.build_node(node, "root".to_owned(), &mut repairs));
        if let Some(root) = built {
            self.set_parent(root, None);
        }
        self.root = built;
        repairs
    }

    fn build_node(
        &mut self,
        node: LayoutNode,
        path: String,
        repairs: &mut Vec<LoadRepair>,
    ) -> Option<ElementId> {
        match node {
            LayoutNode::Leaf(leaf) => Some(self.add_leaf(leaf)),
            LayoutNode::Split {
                orientation,
                dividers,
                children,
            } => {
                let declared = children.len();
                let built = self.build_children(children, &path, repairs);
                let children = match settle_children(built, &path, repairs) {
                    Settled::Container(children) => children,
                    Settled::Replaced(survivor) => return survivor,
                };
                let dividers = if children.len() == declared
                    && dividers_are_valid(&dividers, children.len())
                {
                    dividers
                } else {
                    repairs.push(LoadRepair::RegeneratedDividers { path: path.clone() });
                    even_dividers(children.len())
                };
                let split = self.insert_container(ElementKind::Split(SplitContainer {
                    orientation,
                    children: children.clone(),
                    dividers,
                }));
                self.adopt_children(split, &children);
                for (index, child) in children.iter().enumerate().rev() {
                    if self.orientation_of(*child) == Some(orientation) {
                        self.place_at(split, index, *child);
                        repairs.push(LoadRepair::MergedNestedSplit {
                            path: format!("{path}/{index}"),
                        });
                    }
                }
                Some(split)
            }
            LayoutNode::Tabs { selected, children } => {
                let built = self.build_children(children, &path, repairs);
                let children = match settle_children(built, &path, repairs) {
                    Settled::Container(children) => children,
                    Settled::Replaced(survivor) => return survivor,
                };
                let clamped = selected.min(children.len() - 1);
                if clamped != selected {
                    repairs.push(LoadRepair::ClampedSelection {
                        path: path.clone(),
                        found: selected,
                        clamped,
                    });
                }
                let tabs = self.insert_container(ElementKind::Tabs(TabContainer {
                    children: children.clone(),
                    selected: clamped,
                }));
                self.adopt_children(tabs, &children);
                for (index, child) in children.iter().enumerate().rev() {
                    if self.is_tabs(*child) {
                        self.place_at(tabs, index, *child);
                        repairs.push(LoadRepair::MergedNestedTabs {
                            path: format!("{path}/{index}"),
                        });
                    }
                }
                Some(tabs)
            }
        }
    }

    fn build_children(
        &mut self,
        children: Vec<LayoutNode>,
        path: &str,
        repairs: &mut Vec<LoadRepair>,
    ) -> Vec<ElementId> {
        children
            .into_iter()
            .enumerate()
            .filter_map(|(index, child)| self.build_node(child, format!("{path}/{index}"), repairs))
            .collect()
    }

    fn adopt_children(&mut self, container: ElementId, children: &[ElementId]) {
        for child in children {
            self.set_parent(*child, Some(container));
        }
    }

    /// Nested description of the attached tree.
    #[must_use]
    pub fn root_node(&self) -> Option<LayoutNode> {
        self.root.and_then(|root| self.node_of(root))
    }

    fn node_of(&self, id: ElementId) -> Option<LayoutNode> {
        let record: &ElementRecord = self.nodes.get(&id)?;
        let node = match record.kind() {
            ElementKind::Leaf(leaf) => LayoutNode::Leaf(persisted_leaf(leaf)),
            ElementKind::Split(split) => LayoutNode::Split {
                orientation: split.orientation(),
                dividers: split.dividers().to_vec(),
                children: self.child_nodes(split.children()),
            },
            ElementKind::Tabs(tabs) => LayoutNode::Tabs {
                selected: tabs.selected_index(),
                children: self.child_nodes(tabs.children()),
            },
        };
        Some(node)
    }

    fn child_nodes(&self, children: &[ElementId]) -> Vec<LayoutNode> {
        children
            .iter()
            .filter_map(|child| self.node_of(*child))
            .collect()
    }

    /// Capture the tree and both sidebars.
    #[must_use]
    pub fn to_snapshot(&self) -> LayoutSnapshot {
        let bar = |side: Side| {
            let registry = self.sidebars.get(side);
            SideBarSnapshot {
                leaves: registry
                    .entries()
                    .iter()
                    .filter_map(|id| self.leaf(*id).map(persisted_leaf))
                    .collect(),
                pinned_open: registry.is_pinned_open(),
                panel_width: registry.panel_width(),
            }
        };
        LayoutSnapshot {
            schema_version: LAYOUT_SCHEMA_VERSION,
            root: self.root_node(),
            left: bar(Side::Left),
            right: bar(Side::Right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ContentHandle, DockPosition};

    fn leaf(key: &str) -> DockLeaf {
        DockLeaf::new(key, key.to_uppercase(), ContentHandle(3))
    }

    fn node(key: &str) -> LayoutNode {
        LayoutNode::leaf(leaf(key))
    }

    fn keys(graph: &LayoutGraph) -> Vec<String> {
        graph
            .leaves()
            .into_iter()
            .filter_map(|id| graph.leaf(id).map(|leaf| leaf.key.clone()))
            .collect()
    }

    #[test]
    fn clean_tree_loads_without_repairs() {
        let mut graph = LayoutGraph::new();
        let report = graph.set_root(Some(LayoutNode::split(
            Orientation::Horizontal,
            vec![
                node("files"),
                LayoutNode::split(Orientation::Vertical, vec![node("editor"), node("terminal")]),
            ],
        )));
        assert!(report.is_clean(), "{:?}", report.repairs);
        assert_eq!(report.revision, 1);
        assert_eq!(keys(&graph), ["files", "editor", "terminal"]);
        assert_eq!(graph.validate(), Ok(()));
    }

    #[test]
    fn single_child_and_empty_containers_are_repaired() {
        let mut graph = LayoutGraph::new();
        let report = graph.set_root(Some(LayoutNode::Split {
            orientation: Orientation::Horizontal,
            dividers: vec![0.3, 0.6],
            children: vec![
                LayoutNode::tabs(vec![node("only")]),
                LayoutNode::tabs(Vec::new()),
                node("other"),
            ],
        }));
        assert_eq!(
            report.repairs,
            vec![
                LoadRepair::CollapsedSingleChild {
                    path: "root/0".into()
                },
                LoadRepair::DroppedEmptyContainer {
                    path: "root/1".into()
                },
                LoadRepair::RegeneratedDividers {
                    path: "root".into()
                },
            ]
        );
        let root = graph.root().expect("root");
        let split = graph
            .element(root)
            .and_then(ElementRecord::as_split)
            .expect("split root");
        assert_eq!(split.dividers(), &[0.5]);
        assert_eq!(keys(&graph), ["only", "other"]);
    }

    #[test]
    fn nested_same_orientation_split_is_spliced() {
        let mut graph = LayoutGraph::new();
        let report = graph.set_root(Some(LayoutNode::Split {
            orientation: Orientation::Horizontal,
            dividers: vec![0.5],
            children: vec![
                node("a"),
                LayoutNode::Split {
                    orientation: Orientation::Horizontal,
                    dividers: vec![0.5],
                    children: vec![node("b"), node("c")],
                },
            ],
        }));
        assert_eq!(
            report.repairs,
            vec![LoadRepair::MergedNestedSplit {
                path: "root/1".into()
            }]
        );
        let root = graph.root().expect("root");
        let split = graph
            .element(root)
            .and_then(ElementRecord::as_split)
            .expect("split root");
        assert_eq!(split.children().len(), 3);
        assert_eq!(split.dividers(), &[0.5, 0.75]);
        assert_eq!(graph.validate(), Ok(()));
    }

    #[test]
    fn nested_tabs_are_spliced_and_selection_clamped() {
        let mut graph = LayoutGraph::new();
        let report = graph.set_root(Some(LayoutNode::Tabs {
            selected: 9,
            children: vec![node("a"), LayoutNode::tabs(vec![node("b"), node("c")])],
        }));
        assert_eq!(
            report.repairs,
            vec![
                LoadRepair::ClampedSelection {
                    path: "root".into(),
                    found: 9,
                    clamped: 1,
                },
                LoadRepair::MergedNestedTabs {
                    path: "root/1".into()
                },
            ]
        );
        let root = graph.root().expect("root");
        let tabs = graph
            .element(root)
            .and_then(ElementRecord::as_tabs)
            .expect("tabs root");
        assert_eq!(tabs.children().len(), 3);
        assert_eq!(tabs.selected_index(), 1);
        assert_eq!(graph.validate(), Ok(()));
    }

    #[test]
    fn all_empty_tree_loads_as_empty_graph() {
        let mut graph = LayoutGraph::new();
        let report = graph.set_root(Some(LayoutNode::tabs(Vec::new())));
        assert!(graph.is_empty());
        assert_eq!(report.repairs.len(), 1);
    }

    #[test]
    fn set_root_replaces_previous_tree_but_keeps_sidebars() {
        let mut graph = LayoutGraph::new();
        graph.set_root(Some(LayoutNode::split(
            Orientation::Horizontal,
            vec![node("a"), node("b")],
        )));
        let a = graph.leaves()[0];
        graph.pin_to_sidebar(a, Side::Left, None);
        let old_root = graph.root().expect("root");

        graph.set_root(Some(node("fresh")));
        assert!(!graph.contains(old_root));
        assert_eq!(keys(&graph), ["fresh"]);
        assert_eq!(graph.sidebar(Side::Left).entries(), &[a]);
        assert_eq!(graph.validate(), Ok(()));
    }

    #[test]
    fn set_root_ignores_lock() {
        let mut graph = LayoutGraph::new();
        graph.set_locked(true);
        let report = graph.set_root(Some(node("a")));
        assert_eq!(report.revision, 1);
        assert!(!graph.is_empty());
    }

    #[test]
    fn snapshot_roundtrip_preserves_shape() {
        let mut graph = LayoutGraph::new();
        graph.set_root(Some(LayoutNode::split(
            Orientation::Horizontal,
            vec![node("files"), LayoutNode::tabs(vec![node("a"), node("b")])],
        )));
        let files = graph.leaves()[0];
        let extra = graph.add_leaf(leaf("outline"));
        graph.dock(extra, Some(files), DockPosition::Bottom, None);
        graph.pin_to_sidebar(extra, Side::Right, None);
        graph.pin_open_sidebar(Side::Right);
        graph.set_sidebar_panel_width(Side::Right, 420.0);

        let snapshot = graph.to_snapshot();
        let mut restored = LayoutGraph::new();
        let report = restored.load_snapshot(snapshot.clone()).expect("load");
        assert!(report.is_clean());
        assert_eq!(restored.root_node(), snapshot.root);
        assert_eq!(restored.to_snapshot(), snapshot);
        assert_eq!(restored.sidebar(Side::Right).len(), 1);
        assert!(restored.sidebar(Side::Right).is_pinned_open());
    }

    #[test]
    fn unsupported_version_is_rejected_without_change() {
        let mut graph = LayoutGraph::new();
        let mut snapshot = graph.to_snapshot();
        snapshot.schema_version = LAYOUT_SCHEMA_VERSION + 1;
        let err = graph.load_snapshot(snapshot).expect_err("version mismatch");
        assert_eq!(
            err,
            LayoutSnapshotError::UnsupportedVersion {
                found: LAYOUT_SCHEMA_VERSION + 1,
                expected: LAYOUT_SCHEMA_VERSION,
            }
        );
        assert_eq!(graph.revision(), 0);
    }

    #[test]
    fn hydrate_keeps_known_keys_and_placeholders_the_rest() {
        let persisted = LayoutNode::tabs(vec![
            LayoutNode::leaf(DockLeaf::placeholder("editor", "Editor")),
            LayoutNode::leaf(DockLeaf::new("gone", "Gone", ContentHandle(1)).with_icon("x")),
        ]);
        let mut factory = |key: &str| (key == "editor").then(|| leaf("editor"));
        let hydrated = persisted.hydrate(&mut factory);
        let LayoutNode::Tabs { children, .. } = hydrated else {
            panic!("tabs expected");
        };
        let [LayoutNode::Leaf(editor), LayoutNode::Leaf(gone)] = children.as_slice() else {
            panic!("two leaves expected");
        };
        assert!(!editor.is_placeholder());
        assert!(gone.is_placeholder());
        assert_eq!(gone.title, "Gone");
        assert_eq!(gone.icon.as_deref(), Some("x"));
    }

    #[test]
    fn node_serde_uses_kind_tag() {
        let json = serde_json::to_value(LayoutNode::tabs(vec![node("a"), node("b")]))
            .expect("serialize node");
        assert_eq!(json["kind"], "tabs");
        assert_eq!(json["children"][0]["kind"], "leaf");
        assert_eq!(json["children"][0]["key"], "a");
    }

    #[test]
    fn leaf_count_counts_nested_leaves() {
        let layout = LayoutNode::split(
            Orientation::Vertical,
            vec![node("a"), LayoutNode::tabs(vec![node("b"), node("c")])],
        );
        assert_eq!(layout.leaf_count(), 3);
    }
}
