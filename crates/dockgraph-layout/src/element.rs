//! Element vocabulary for the docking tree.
//!
//! A layout is a tree of three element shapes, modeled as the closed sum
//! [`ElementKind`]:
//!
//! - [`DockLeaf`]: one user-facing panel.
//! - [`SplitContainer`]: ordered children laid out along an [`Orientation`]
//!   with normalized divider positions between them.
//! - [`TabContainer`]: ordered children shown one at a time.
//!
//! Elements live as [`ElementRecord`]s in the arena owned by
//! [`LayoutGraph`](crate::LayoutGraph). Containers own their children by id;
//! each record carries a `parent` back-reference used for sibling lookups and
//! attachment checks. Nothing here mutates structure: the graph is the only
//! writer.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use dockgraph_core::geometry::{Bounds, Orientation, Size};
use serde::{Deserialize, Serialize};

use crate::sidebar::Side;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier for a dock element.
///
/// `0` is reserved/invalid. Ids are allocated from a process-wide counter
/// and never reused, so a leaf keeps its id when it travels between the main
/// layout, sidebars, and floating hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(u64);

impl ElementId {
    pub(crate) fn allocate() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw id, rejecting 0.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Placement intent relative to a target element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockPosition {
    Top,
    Bottom,
    Left,
    Right,
    /// Merge into (or create) a tab group with the target.
    Center,
}

impl DockPosition {
    /// Split orientation implied by an edge position; `None` for `Center`.
    #[must_use]
    pub const fn orientation(self) -> Option<Orientation> {
        match self {
            Self::Left | Self::Right => Some(Orientation::Horizontal),
            Self::Top | Self::Bottom => Some(Orientation::Vertical),
            Self::Center => None,
        }
    }

    /// `Left` and `Top` place the incoming element before the target.
    #[must_use]
    pub const fn is_leading(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }

    /// The edge that places an element before its neighbor along `orientation`.
    #[must_use]
    pub const fn leading(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Horizontal => Self::Left,
            Orientation::Vertical => Self::Top,
        }
    }

    /// The edge that places an element after its neighbor along `orientation`.
    #[must_use]
    pub const fn trailing(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Horizontal => Self::Right,
            Orientation::Vertical => Self::Bottom,
        }
    }
}

/// Opaque handle to host-owned panel content.
///
/// The engine never interprets it. A leaf without one is a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHandle(pub u64);

/// Transient restore bookkeeping carried by a leaf.
///
/// Updated whenever the leaf leaves a host. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RestoreHints {
    pub last_target: Option<ElementId>,
    pub last_position: Option<DockPosition>,
    pub last_tab_index: Option<usize>,
    pub last_floating_bounds: Option<Bounds>,
    pub last_side: Option<Side>,
}

fn default_closeable() -> bool {
    true
}

/// One user-facing panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockLeaf {
    /// Stable, externally supplied identifier used by persistence.
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<ContentHandle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default = "default_closeable")]
    pub closeable: bool,
    /// Preferred size, consulted when a new split is created around this leaf.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_hint: Option<Size>,
    #[serde(skip)]
    pub restore: RestoreHints,
}

impl DockLeaf {
    /// A leaf wrapping host content.
    #[must_use]
    pub fn new(key: impl Into<String>, title: impl Into<String>, content: ContentHandle) -> Self {
        Self {
            content: Some(content),
            ..Self::placeholder(key, title)
        }
    }

    /// A leaf whose content could not be reconstructed.
    #[must_use]
    pub fn placeholder(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            content: None,
            icon: None,
            closeable: true,
            size_hint: None,
            restore: RestoreHints::default(),
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn with_size_hint(mut self, size: Size) -> Self {
        self.size_hint = Some(size);
        self
    }

    #[must_use]
    pub fn with_closeable(mut self, closeable: bool) -> Self {
        self.closeable = closeable;
        self
    }

    /// Whether this leaf has no host content attached.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.content.is_none()
    }

    /// Preferred extent along `orientation`, if the hint carries a usable one.
    #[must_use]
    pub fn hinted_extent(&self, orientation: Orientation) -> Option<f64> {
        self.size_hint
            .and_then(|size| size.usable_extent(orientation))
    }
}

/// Children laid out along an axis.
///
/// `dividers[i]` is the normalized boundary between `children[i]` and
/// `children[i + 1]`. While attached, a split has at least two children and
/// its dividers are strictly increasing in `(0, 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitContainer {
    pub(crate) orientation: Orientation,
    pub(crate) children: Vec<ElementId>,
    pub(crate) dividers: Vec<f64>,
}

impl SplitContainer {
    pub(crate) fn empty(orientation: Orientation) -> Self {
        Self {
            orientation,
            children: Vec::new(),
            dividers: Vec::new(),
        }
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    #[must_use]
    pub fn dividers(&self) -> &[f64] {
        &self.dividers
    }

    /// Normalized `[start, end)` span of the child at `index`.
    #[must_use]
    pub fn segment(&self, index: usize) -> (f64, f64) {
        segment_of(&self.dividers, index)
    }
}

/// Span of child `index` given a divider list.
pub(crate) fn segment_of(dividers: &[f64], index: usize) -> (f64, f64) {
    let start = if index == 0 {
        0.0
    } else {
        dividers.get(index - 1).copied().unwrap_or(1.0)
    };
    let end = dividers.get(index).copied().unwrap_or(1.0);
    (start, end)
}

/// Evenly spaced dividers for `count` children.
pub(crate) fn even_dividers(count: usize) -> Vec<f64> {
    (1..count).map(|i| i as f64 / count as f64).collect()
}

/// Children presented as tabs with one selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabContainer {
    pub(crate) children: Vec<ElementId>,
    pub(crate) selected: usize,
}

impl TabContainer {
    pub(crate) fn empty() -> Self {
        Self {
            children: Vec::new(),
            selected: 0,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Id of the selected tab.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.children.get(self.selected).copied()
    }
}

/// The three element shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Leaf(DockLeaf),
    Split(SplitContainer),
    Tabs(TabContainer),
}

impl ElementKind {
    /// Child ids; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        match self {
            Self::Leaf(_) => &[],
            Self::Split(split) => &split.children,
            Self::Tabs(tabs) => &tabs.children,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<ElementId>> {
        match self {
            Self::Leaf(_) => None,
            Self::Split(split) => Some(&mut split.children),
            Self::Tabs(tabs) => Some(&mut tabs.children),
        }
    }

    #[must_use]
    pub fn is_container(&self) -> bool {
        !matches!(self, Self::Leaf(_))
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Leaf(_) => "leaf",
            Self::Split(_) => "split",
            Self::Tabs(_) => "tabs",
        }
    }
}

/// Arena entry for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRecord {
    pub(crate) id: ElementId,
    pub(crate) parent: Option<ElementId>,
    pub(crate) kind: ElementKind,
}

impl ElementRecord {
    pub(crate) fn new(id: ElementId, parent: Option<ElementId>, kind: ElementKind) -> Self {
        Self { id, parent, kind }
    }

    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Containing element; `None` for the root and for detached leaves.
    #[must_use]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    #[must_use]
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        self.kind.children()
    }

    #[must_use]
    pub fn as_leaf(&self) -> Option<&DockLeaf> {
        match &self.kind {
            ElementKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_split(&self) -> Option<&SplitContainer> {
        match &self.kind {
            ElementKind::Split(split) => Some(split),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_tabs(&self) -> Option<&TabContainer> {
        match &self.kind {
            ElementKind::Tabs(tabs) => Some(tabs),
            _ => None,
        }
    }
}
