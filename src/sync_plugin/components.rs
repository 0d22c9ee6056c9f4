//! ECS components marking synchronised and anchored entities.

use bevy::prelude::*;

use crate::alignment::AxisMask;
use crate::message::EntityId;
use crate::pose::Pose;

/// Network identity of a synchronised entity.
///
/// Spawning an entity with this component registers it with the engine;
/// removing it (or despawning the entity) unregisters it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncId(pub EntityId);

/// Marks a synchronised entity as owned by this participant. Entities with a
/// [`SyncId`] but without this marker are observed.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct LocalAuthority;

/// Publishes the entity's transform as the session reference frame.
///
/// Only the first anchor found is used.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct AnchorFrame;

/// Snaps the entity onto the reference frame every tick.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct AlignWithAnchor;

/// Drags `target`'s masked axes to this entity's position every tick.
#[derive(Component, Debug, Clone, Copy)]
pub struct AxisPin {
    /// Entity whose translation is overwritten.
    pub target: Entity,
    /// Axes copied from this entity.
    pub mask: AxisMask,
}

impl From<Transform> for Pose {
    fn from(transform: Transform) -> Self {
        Self::new(transform.translation, transform.rotation)
    }
}

impl From<&Transform> for Pose {
    fn from(transform: &Transform) -> Self {
        Self::new(transform.translation, transform.rotation)
    }
}

impl From<Pose> for Transform {
    fn from(pose: Pose) -> Self {
        Self::from_translation(pose.position).with_rotation(pose.rotation)
    }
}

/// Writes `pose` into `transform`, keeping its scale.
pub(crate) fn write_pose(transform: &mut Transform, pose: Pose) {
    transform.translation = pose.position;
    transform.rotation = pose.rotation;
}
