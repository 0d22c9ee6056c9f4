//! Shared reference frame handle.
//!
//! Every participant resolves relative poses against the same anchor. The
//! handle is cloned into the sync engine at construction time; an external
//! tracking collaborator establishes, recenters or clears it. The engine only
//! ever reads it.

use std::sync::{Arc, PoisonError, RwLock};

use bevy::prelude::Resource;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::pose::Pose;

/// Identifier of a reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceFrameId(pub u32);

impl ReferenceFrameId {
    /// The well-known frame shared by every participant in a session.
    pub const SESSION: Self = Self(1);
}

/// The anchor pose all relative poses are expressed against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFrame {
    /// Stable identifier of the frame.
    pub id: ReferenceFrameId,
    /// World-space pose of the anchor.
    pub pose: Pose,
}

/// Cloneable handle to the session's reference frame.
///
/// The frame starts out unset until the anchor has been located. Reads
/// return a copy so callers never hold the lock across a tick.
#[derive(Resource, Debug, Clone, Default)]
pub struct ReferenceFrameHandle {
    inner: Arc<RwLock<Option<ReferenceFrame>>>,
}

impl ReferenceFrameHandle {
    /// Creates a handle whose frame is not yet available.
    #[must_use]
    pub fn new_unset() -> Self {
        Self::default()
    }

    /// Creates a handle with the session frame already established at `pose`.
    ///
    /// # Examples
    ///
    /// ```
    /// use anchor_sync::pose::Pose;
    /// use anchor_sync::reference_frame::ReferenceFrameHandle;
    ///
    /// let handle = ReferenceFrameHandle::with_pose(Pose::IDENTITY);
    /// assert!(handle.is_available());
    /// ```
    #[must_use]
    pub fn with_pose(pose: Pose) -> Self {
        let handle = Self::new_unset();
        handle.establish(pose);
        handle
    }

    /// Sets the session frame to `pose`, creating it when absent.
    pub fn establish(&self, pose: Pose) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(frame) => frame.pose = pose,
            None => {
                info!("reference frame established");
                *guard = Some(ReferenceFrame {
                    id: ReferenceFrameId::SESSION,
                    pose,
                });
            }
        }
    }

    /// Moves an existing frame to `pose`, keeping its identifier.
    ///
    /// Returns `false` when no frame has been established yet.
    pub fn recenter(&self, pose: Pose) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let Some(frame) = guard.as_mut() else {
            debug!("recenter requested before the reference frame exists");
            return false;
        };
        frame.pose = pose;
        true
    }

    /// Drops the frame, as on session teardown.
    pub fn clear(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            info!("reference frame cleared");
        }
    }

    /// Returns a copy of the current frame, if any.
    #[must_use]
    pub fn current(&self) -> Option<ReferenceFrame> {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the current frame pose, if any.
    #[must_use]
    pub fn pose(&self) -> Option<Pose> {
        self.current().map(|frame| frame.pose)
    }

    /// Returns `true` once the frame has been established.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.current().is_some()
    }
}
