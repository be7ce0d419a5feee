//! Sidebar pin registries.
//!
//! Each side keeps an ordered list of pinned leaves outside the main tree,
//! plus two view preferences: whether the side is pinned open (consuming
//! layout space rather than showing an icon strip) and its panel width.

use serde::{Deserialize, Serialize};

use crate::element::ElementId;

/// Which edge of the main layout a sidebar lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Ordered pinned leaves for one side.
#[derive(Debug, Clone, PartialEq)]
pub struct SideBarRegistry {
    entries: Vec<ElementId>,
    pinned_open: bool,
    panel_width: f64,
}

impl SideBarRegistry {
    pub(crate) fn new(panel_width: f64) -> Self {
        Self {
            entries: Vec::new(),
            pinned_open: false,
            panel_width,
        }
    }

    /// Pinned leaves in display order.
    #[must_use]
    pub fn entries(&self) -> &[ElementId] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.entries.contains(&id)
    }

    #[must_use]
    pub fn position(&self, id: ElementId) -> Option<usize> {
        self.entries.iter().position(|entry| *entry == id)
    }

    #[must_use]
    pub fn is_pinned_open(&self) -> bool {
        self.pinned_open
    }

    #[must_use]
    pub fn panel_width(&self) -> f64 {
        self.panel_width
    }

    /// Insert at `index` clamped to `[0, len]`, or append. Returns the slot
    /// used.
    pub(crate) fn insert(&mut self, id: ElementId, index: Option<usize>) -> usize {
        let slot = index.map_or(self.entries.len(), |index| index.min(self.entries.len()));
        self.entries.insert(slot, id);
        slot
    }

    pub(crate) fn remove(&mut self, id: ElementId) -> Option<usize> {
        let index = self.position(id)?;
        self.entries.remove(index);
        Some(index)
    }

    /// Move an existing entry so it lands before the entry currently at
    /// `index` (clamped to `[0, len]`). Returns `false` when the entry is
    /// absent or would not move.
    pub(crate) fn reorder(&mut self, id: ElementId, index: usize) -> bool {
        let Some(source) = self.position(id) else {
            return false;
        };
        let mut slot = index.min(self.entries.len());
        if source < slot {
            slot -= 1;
        }
        if slot == source {
            return false;
        }
        self.entries.remove(source);
        self.entries.insert(slot, id);
        true
    }

    pub(crate) fn set_pinned_open(&mut self, open: bool) -> bool {
        if self.pinned_open == open {
            return false;
        }
        self.pinned_open = open;
        true
    }

    /// Store a new width if it is finite and positive. Returns whether the
    /// stored value changed.
    pub(crate) fn set_panel_width(&mut self, width: f64) -> bool {
        if !(width.is_finite() && width > 0.0) || width == self.panel_width {
            return false;
        }
        self.panel_width = width;
        true
    }

    /// Drop every entry and restore default view preferences. Returns the
    /// removed entries.
    pub(crate) fn reset(&mut self, panel_width: f64) -> Vec<ElementId> {
        self.pinned_open = false;
        self.panel_width = panel_width;
        std::mem::take(&mut self.entries)
    }
}

/// The pair of registries owned by a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SideBars {
    left: SideBarRegistry,
    right: SideBarRegistry,
}

impl SideBars {
    pub(crate) fn new(panel_width: f64) -> Self {
        Self {
            left: SideBarRegistry::new(panel_width),
            right: SideBarRegistry::new(panel_width),
        }
    }

    #[must_use]
    pub fn get(&self, side: Side) -> &SideBarRegistry {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub(crate) fn get_mut(&mut self, side: Side) -> &mut SideBarRegistry {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Side a leaf is pinned to, if any.
    #[must_use]
    pub fn side_of(&self, id: ElementId) -> Option<Side> {
        Side::ALL
            .into_iter()
            .find(|side| self.get(*side).contains(id))
    }

    /// Remove a leaf from whichever side holds it.
    pub(crate) fn remove(&mut self, id: ElementId) -> Option<Side> {
        let side = self.side_of(id)?;
        self.get_mut(side).remove(id);
        Some(side)
    }
}
