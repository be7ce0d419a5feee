#![forbid(unsafe_code)]

//! Docking layout engine.
//!
//! # Role in dockgraph
//! `dockgraph-layout` owns the tree of panel placements a host UI renders:
//! splits with normalized dividers, tab groups, and leaves. Every operation
//! (dock, undock, move, pin to a sidebar, float, hide, restore) leaves the
//! tree structurally valid and bumps a revision counter the renderer polls.
//!
//! # Primary responsibilities
//! - **Element tree**: [`ElementKind`] records in an arena keyed by
//!   [`ElementId`], with parent back-references.
//! - **Mutations**: [`LayoutGraph`] methods returning [`DockOutcome`]; invalid
//!   input is a no-op with a [`DockNoopReason`], never a panic.
//! - **Sidebars and placement memory**: pinned leaves per [`Side`], and
//!   [`PlacementMemory`] anchors that put a returning leaf back near its old
//!   neighbors.
//! - **Persistence**: [`LayoutNode`] / [`LayoutSnapshot`] with load-time
//!   normalization reported through [`LoadReport`].
//! - **Workspace**: [`DockWorkspace`] moves leaves between the main layout,
//!   floating hosts, and the hidden list, and persists floating hosts in a
//!   [`WorkspaceSnapshot`].
//!
//! # Example
//! ```
//! use dockgraph_layout::{ContentHandle, DockLeaf, DockPosition, LayoutGraph};
//!
//! let mut graph = LayoutGraph::new();
//! let files = graph.add_leaf(DockLeaf::new("files", "Files", ContentHandle(1)));
//! let editor = graph.add_leaf(DockLeaf::new("editor", "Editor", ContentHandle(2)));
//! assert!(graph.dock(files, None, DockPosition::Center, None).is_applied());
//! assert!(graph.dock(editor, Some(files), DockPosition::Right, None).is_applied());
//! assert_eq!(graph.leaves(), vec![files, editor]);
//! assert_eq!(graph.revision(), 2);
//! ```

pub mod element;
pub mod graph;
pub mod mutation;
pub mod placement;
pub mod policy;
pub mod sidebar;
pub mod snapshot;
pub mod workspace;

pub use dockgraph_core::geometry::{Bounds, Orientation, Size};
pub use element::{
    ContentHandle, DockLeaf, DockPosition, ElementId, ElementKind, ElementRecord, RestoreHints,
    SplitContainer, TabContainer,
};
pub use graph::{DockModelError, LayoutGraph, LeafLocation, Walk, WalkStep};
pub use mutation::{DockNoopReason, DockOutcome};
pub use placement::{
    FloatingHostId, HostId, PlacementAnchor, PlacementHosts, PlacementMemory, PlacementRecord,
    RestorePlan,
};
pub use policy::{DockPolicy, DockPolicyError};
pub use sidebar::{Side, SideBarRegistry};
pub use snapshot::{
    DockLeafFactory, LAYOUT_SCHEMA_VERSION, LayoutNode, LayoutSnapshot, LayoutSnapshotError,
    LoadRepair, LoadReport, SideBarSnapshot,
};
pub use workspace::{
    DockWorkspace, FloatingHost, FloatingHostSnapshot, HiddenLeaf, WorkspaceError,
    WorkspaceLoadReport, WorkspaceLocation, WorkspaceSnapshot,
};
