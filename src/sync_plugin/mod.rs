//! Bevy ECS adapter for the transform sync engine.
//!
//! This module re-exports the plugin, components, mailboxes and systems that
//! bridge Bevy transforms with [`TransformSyncEngine`](crate::engine::TransformSyncEngine).

mod components;
mod mailbox;
mod plugin;
mod systems;

pub use components::{AlignWithAnchor, AnchorFrame, AxisPin, LocalAuthority, SyncId};
pub use mailbox::{PoseInbox, PoseOutbox};
pub use plugin::{SyncErrorContext, SyncErrorEvent, TransformSyncPlugin};
pub use systems::{
    align_with_anchor_system, apply_observer_poses_system, capture_authority_system,
    engine_tick_system, ingest_inbox_system, pin_axes_system, publish_anchor_system,
    track_registrations_system, SyncRegistry,
};
