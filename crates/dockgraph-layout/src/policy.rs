//! Docking policy configuration.
//!
//! [`DockPolicy`] collects the tunables that shape new splits and sidebars.
//! It deserializes with per-field defaults so a host can load a partial
//! table from its own configuration file.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tunables for divider placement and sidebar sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockPolicy {
    /// Smallest share the first child of a freshly created split may get.
    pub min_split_share: f64,
    /// Largest share the first child of a freshly created split may get.
    pub max_split_share: f64,
    /// Extent assumed for a side without a size hint when the other side
    /// has one.
    pub default_panel_extent: f64,
    /// Initial panel width for both sidebars.
    pub default_sidebar_width: f64,
}

impl Default for DockPolicy {
    fn default() -> Self {
        Self {
            min_split_share: 0.2,
            max_split_share: 0.8,
            default_panel_extent: 300.0,
            default_sidebar_width: 300.0,
        }
    }
}

impl DockPolicy {
    /// Check that the share range is a proper sub-interval of `(0, 1)`
    /// containing the even split, and that extents are positive.
    pub fn validate(&self) -> Result<(), DockPolicyError> {
        let min = self.min_split_share;
        let max = self.max_split_share;
        if !(min.is_finite() && max.is_finite() && 0.0 < min && min <= 0.5 && 0.5 <= max && max < 1.0)
        {
            return Err(DockPolicyError::ShareRange { min, max });
        }
        for (field, value) in [
            ("default_panel_extent", self.default_panel_extent),
            ("default_sidebar_width", self.default_sidebar_width),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(DockPolicyError::NonPositiveExtent { field, value });
            }
        }
        Ok(())
    }

    /// Divider position for a new two-child split.
    ///
    /// With no hints on either side the split is even. Otherwise the first
    /// child's share of the combined extent is used, an unhinted side
    /// counting as [`default_panel_extent`](Self::default_panel_extent),
    /// clamped to the configured share range.
    #[must_use]
    pub fn split_share(&self, first: Option<f64>, second: Option<f64>) -> f64 {
        if first.is_none() && second.is_none() {
            return 0.5;
        }
        let first = first.unwrap_or(self.default_panel_extent);
        let second = second.unwrap_or(self.default_panel_extent);
        let total = first + second;
        if !(total.is_finite() && total > 0.0) {
            return 0.5;
        }
        (first / total).clamp(self.min_split_share, self.max_split_share)
    }
}

/// Invalid [`DockPolicy`] values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DockPolicyError {
    ShareRange { min: f64, max: f64 },
    NonPositiveExtent { field: &'static str, value: f64 },
}

impl fmt::Display for DockPolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShareRange { min, max } => write!(
                f,
                "split share range [{min}, {max}] must satisfy 0 < min <= 0.5 <= max < 1"
            ),
            Self::NonPositiveExtent { field, value } => {
                write!(f, "{field} must be finite and > 0 (got {value})")
            }
        }
    }
}

impl std::error::Error for DockPolicyError {}
