//! Rigid poses and the reference-relative encoding.
//!
//! A [`Pose`] pairs a translation with a unit quaternion. Authorities encode
//! their world pose relative to the shared reference frame before sending it,
//! and observers decode it against their own copy of that frame, so two
//! participants whose tracking spaces disagree still place the entity at the
//! same spot relative to the anchor.
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::POSE_TOLERANCE;

/// Position and orientation of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Translation component.
    pub position: Vec3,
    /// Orientation component, kept normalised.
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// The pose at the origin with no rotation.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Creates a pose, normalising `rotation`.
    ///
    /// Degenerate or non-finite rotations collapse to [`Quat::IDENTITY`].
    #[must_use]
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation: sanitise_rotation(rotation),
        }
    }

    /// Creates an unrotated pose at `position`.
    #[must_use]
    pub const fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Maps a point from this pose's local space into the parent space.
    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * point
    }

    /// Maps a point from the parent space into this pose's local space.
    #[must_use]
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }

    /// Euclidean distance between the two translations.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f32 {
        self.position.distance(other.position)
    }

    /// Smallest rotation angle, in radians, between the two orientations.
    #[must_use]
    pub fn angle_to(&self, other: &Self) -> f32 {
        self.rotation.angle_between(other.rotation)
    }

    /// Returns `true` when every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }

    /// Compares translations and orientations within `tolerance`.
    ///
    /// Orientations are compared up to sign since `q` and `-q` describe the
    /// same rotation.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        self.position.abs_diff_eq(other.position, tolerance)
            && (self.rotation.abs_diff_eq(other.rotation, tolerance)
                || self.rotation.abs_diff_eq(-other.rotation, tolerance))
    }

    /// [`Pose::approx_eq`] with the crate-wide default tolerance.
    #[must_use]
    pub fn close_to(&self, other: &Self) -> bool {
        self.approx_eq(other, POSE_TOLERANCE)
    }
}

fn sanitise_rotation(rotation: Quat) -> Quat {
    if !rotation.is_finite() {
        return Quat::IDENTITY;
    }
    let length = rotation.length();
    if length <= f32::EPSILON {
        return Quat::IDENTITY;
    }
    rotation / length
}

/// Expresses `world` in the local space of `frame`.
///
/// # Examples
///
/// ```
/// use anchor_sync::pose::{compute_relative_pose, Pose};
/// use glam::Vec3;
///
/// let frame = Pose::from_position(Vec3::new(2.0, 0.0, 0.0));
/// let world = Pose::from_position(Vec3::new(3.0, 1.0, 0.0));
/// let relative = compute_relative_pose(&frame, &world);
/// assert!(relative.position.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-6));
/// ```
#[must_use]
pub fn compute_relative_pose(frame: &Pose, world: &Pose) -> Pose {
    let inverse = frame.rotation.inverse();
    Pose::new(
        frame.inverse_transform_point(world.position),
        inverse * world.rotation,
    )
}

/// Places `relative`, expressed in the local space of `frame`, back into
/// world space. Inverse of [`compute_relative_pose`].
#[must_use]
pub fn reconstruct_world_pose(frame: &Pose, relative: &Pose) -> Pose {
    Pose::new(
        frame.transform_point(relative.position),
        frame.rotation * relative.rotation,
    )
}
