//! Identifiers and wire messages exchanged between participants.

use std::fmt;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::pose::Pose;

/// Network-wide identifier of a synchronised entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl EntityId {
    /// Returns the raw identifier.
    #[must_use]
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Engine tick counter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the following tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Ticks elapsed since `earlier`, saturating at zero.
    #[must_use]
    pub const fn since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-authority, per-entity message counter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Sequence(pub u64);

impl Sequence {
    /// Returns the following sequence number.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relative pose broadcast by an entity's authority.
///
/// Encoded as two plain arrays so the payload does not depend on the
/// in-memory layout of the maths types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseUpdate {
    /// Entity the pose belongs to.
    pub entity: EntityId,
    /// Position of this update in the authority's stream.
    pub sequence: Sequence,
    /// Translation relative to the reference frame.
    pub position: [f32; 3],
    /// Rotation relative to the reference frame, as `[x, y, z, w]`.
    pub rotation: [f32; 4],
}

impl PoseUpdate {
    /// Builds an update for `entity` carrying `relative`.
    #[must_use]
    pub fn new(entity: EntityId, sequence: Sequence, relative: &Pose) -> Self {
        Self {
            entity,
            sequence,
            position: relative.position.to_array(),
            rotation: relative.rotation.to_array(),
        }
    }

    /// Returns the carried relative pose.
    ///
    /// # Errors
    /// Returns [`SyncError::InvalidPose`] when any component is not finite.
    pub fn relative_pose(&self) -> Result<Pose, SyncError> {
        let position = Vec3::from_array(self.position);
        let rotation = Quat::from_array(self.rotation);
        if !position.is_finite() || !rotation.is_finite() {
            return Err(SyncError::InvalidPose {
                entity: self.entity,
            });
        }
        Ok(Pose::new(position, rotation))
    }

    /// Serialises the update for the transport.
    ///
    /// # Errors
    /// Returns [`SyncError::Encode`] if serialisation fails.
    pub fn encode(&self) -> Result<Vec<u8>, SyncError> {
        serde_json::to_vec(self).map_err(SyncError::Encode)
    }

    /// Parses an update received from the transport.
    ///
    /// # Errors
    /// Returns [`SyncError::Decode`] for malformed payloads.
    ///
    /// # Examples
    ///
    /// ```
    /// use anchor_sync::message::{EntityId, PoseUpdate, Sequence};
    /// use anchor_sync::pose::Pose;
    ///
    /// let update = PoseUpdate::new(EntityId(3), Sequence(1), &Pose::IDENTITY);
    /// let bytes = update.encode().expect("encode pose update");
    /// assert_eq!(PoseUpdate::decode(&bytes).expect("decode pose update"), update);
    /// ```
    pub fn decode(bytes: &[u8]) -> Result<Self, SyncError> {
        serde_json::from_slice(bytes).map_err(SyncError::Decode)
    }
}

/// Most recent relative pose accepted from an entity's authority.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteSample {
    /// Pose relative to the reference frame.
    pub relative: Pose,
    /// Local tick on which the sample arrived.
    pub received_at: Tick,
    /// Sequence number the authority stamped on it.
    pub sequence: Sequence,
}
