#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! The docking engine never does pixel math. These types only carry the
//! preferences a host hands in (preferred panel sizes, floating-window
//! bounds) so the engine can derive normalized ratios from them.

use serde::{Deserialize, Serialize};

/// Axis along which a split lays out its children.
///
/// `Horizontal` places children side by side (left to right), `Vertical`
/// stacks them (top to bottom).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// The other axis.
    #[inline]
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// A preferred size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[inline]
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Extent along `orientation`: width for horizontal, height for vertical.
    #[inline]
    #[must_use]
    pub const fn along(self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    /// Extent along `orientation`, or `None` when it is not a usable length
    /// (non-finite, zero, or negative).
    #[must_use]
    pub fn usable_extent(self, orientation: Orientation) -> Option<f64> {
        let extent = self.along(orientation);
        (extent.is_finite() && extent > 0.0).then_some(extent)
    }
}

/// Screen-space bounds of a floating host window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Create new bounds.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Size component of the bounds.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// All coordinates are finite and both dimensions are positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}
