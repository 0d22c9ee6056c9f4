#![cfg_attr(docsrs, feature(doc_cfg))]
//! Reference-relative transform synchronisation for networked entities.
//!
//! Participants agree on a shared reference frame. The authority of each
//! entity encodes its world pose relative to that frame and broadcasts it;
//! observers rebuild the world pose against their own copy of the frame and
//! ease toward it. [`TransformSyncEngine`] implements the protocol without
//! any engine dependency beyond its resource derive, and
//! [`TransformSyncPlugin`] wires it into a Bevy app.
pub mod alignment;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod logging;
pub mod message;
pub mod policy;
pub mod pose;
pub mod reference_frame;
pub mod sequence;
pub mod sync_plugin;
pub use constants::*;

// Re-export commonly used items
pub use config::SyncConfig;
pub use engine::{
    AuthorityOutcome, ObserverOutcome, PoseTransport, Role, SampleOutcome, SyncEntity,
    TickSummary, TransformSyncEngine,
};
pub use error::SyncError;
pub use logging::init as init_logging;
pub use message::{EntityId, PoseUpdate, RemoteSample, Sequence, Tick};
pub use policy::{InterpolationPolicy, RotationPolicy, SendPolicy};
pub use pose::{compute_relative_pose, reconstruct_world_pose, Pose};
pub use reference_frame::{ReferenceFrame, ReferenceFrameHandle, ReferenceFrameId};
pub use sync_plugin::{
    AlignWithAnchor, AnchorFrame, AxisPin, LocalAuthority, PoseInbox, PoseOutbox, SyncId,
    TransformSyncPlugin,
};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use anchor_sync::prelude::*;
    //! ```

    pub use crate::compute_relative_pose;
    pub use crate::reconstruct_world_pose;
    pub use crate::EntityId;
    pub use crate::Pose;
    pub use crate::ReferenceFrameHandle;
    pub use crate::SyncConfig;
    pub use crate::TransformSyncEngine;
    pub use crate::TransformSyncPlugin;
}
