//! Helpers that keep scene objects attached to the anchor or to each other.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Selects which axes follow a driver position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisMask {
    /// Follow the driver along X.
    pub x: bool,
    /// Follow the driver along Y.
    pub y: bool,
    /// Follow the driver along Z.
    pub z: bool,
}

impl AxisMask {
    /// Every axis follows.
    pub const ALL: Self = Self {
        x: true,
        y: true,
        z: true,
    };

    /// Only the horizontal plane follows; height stays put.
    pub const HORIZONTAL: Self = Self {
        x: true,
        y: false,
        z: true,
    };
}

/// Returns `pinned` with the masked axes replaced by `driver`'s.
///
/// # Examples
///
/// ```
/// use anchor_sync::alignment::{pin_axes, AxisMask};
/// use glam::Vec3;
///
/// let pinned = pin_axes(Vec3::new(0.0, 5.0, 0.0), Vec3::new(1.0, 2.0, 3.0), AxisMask::HORIZONTAL);
/// assert_eq!(pinned, Vec3::new(1.0, 5.0, 3.0));
/// ```
#[must_use]
pub const fn pin_axes(pinned: Vec3, driver: Vec3, mask: AxisMask) -> Vec3 {
    Vec3::new(
        if mask.x { driver.x } else { pinned.x },
        if mask.y { driver.y } else { pinned.y },
        if mask.z { driver.z } else { pinned.z },
    )
}
