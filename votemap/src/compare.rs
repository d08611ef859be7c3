//! Swipe comparison of two maps.
//!
//! Both maps occupy the same container. The divider splits the container, the "before" map is visible on one side
//! of it and the "after" map on the other. The divider itself and the camera sync of the two maps are the job of
//! the compare widget of the renderer, which takes [`CompareOptions`].

use serde::{Deserialize, Serialize};

/// Direction of the divider line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Vertical divider, maps are split into left and right parts.
    #[default]
    Vertical,
    /// Horizontal divider, maps are split into top and bottom parts.
    Horizontal,
}

/// Options of the swipe control, in the format of the compare widget.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Divider follows the pointer without pressing the handle.
    pub mousemove: bool,
    /// Divider direction.
    pub orientation: Orientation,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            mousemove: true,
            orientation: Orientation::Vertical,
        }
    }
}

/// One of the two compared maps.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MapSide {
    /// Left (or top) map.
    Before,
    /// Right (or bottom) map.
    After,
}
