//! Bevy plugin wiring the sync engine into the schedule.

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use log::error;
use thiserror::Error;

use crate::config::SyncConfig;
use crate::engine::TransformSyncEngine;
use crate::reference_frame::ReferenceFrameHandle;

use super::mailbox::{PoseInbox, PoseOutbox};
use super::systems::{
    align_with_anchor_system, apply_observer_poses_system, capture_authority_system,
    engine_tick_system, ingest_inbox_system, pin_axes_system, publish_anchor_system,
    track_registrations_system, SyncRegistry,
};

/// Context carried by [`SyncErrorEvent`] events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorContext {
    /// Failure surfaced while initialising the plugin.
    Init,
    /// Failure surfaced while registering a spawned entity.
    Register,
    /// Failure surfaced while ingesting a peer update.
    Receive,
    /// Failure surfaced while capturing an owned transform.
    Capture,
}

/// Event raised when synchronisation hits an error path.
#[derive(Event, Debug, Clone, Error)]
#[error("{context:?}: {detail}")]
pub struct SyncErrorEvent {
    /// Where the failure occurred.
    pub context: SyncErrorContext,
    /// Description of the underlying error.
    pub detail: String,
}

impl SyncErrorEvent {
    /// Convenience constructor used by systems to emit error events.
    pub fn new(context: SyncErrorContext, detail: impl Into<String>) -> Self {
        Self {
            context,
            detail: detail.into(),
        }
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn log_sync_error(event: On<SyncErrorEvent>) {
    let SyncErrorEvent { context, detail } = event.event();
    error!("transform sync error during {context:?}: {detail}");
}

/// Bevy plugin installing the transform synchronisation systems.
///
/// A [`ReferenceFrameHandle`] already present in the world is reused so
/// callers can share it with other subsystems; otherwise an unset one is
/// created and filled from the first [`AnchorFrame`](super::AnchorFrame).
#[derive(Default)]
pub struct TransformSyncPlugin {
    /// Engine configuration.
    pub config: SyncConfig,
}

impl TransformSyncPlugin {
    /// Plugin using `config` instead of the defaults.
    #[must_use]
    pub const fn with_config(config: SyncConfig) -> Self {
        Self { config }
    }
}

impl Plugin for TransformSyncPlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(log_sync_error);

        let frame = app
            .world()
            .get_resource::<ReferenceFrameHandle>()
            .cloned()
            .unwrap_or_default();
        let engine = match TransformSyncEngine::new(self.config.clone(), frame.clone()) {
            Ok(engine) => engine,
            Err(e) => {
                app.world_mut()
                    .trigger(SyncErrorEvent::new(SyncErrorContext::Init, e.to_string()));
                return;
            }
        };

        app.insert_resource(frame);
        app.insert_resource(engine);
        app.init_resource::<PoseInbox>();
        app.init_resource::<PoseOutbox>();
        app.init_resource::<SyncRegistry>();

        app.add_systems(
            Update,
            (
                publish_anchor_system,
                track_registrations_system,
                ingest_inbox_system,
                capture_authority_system,
                engine_tick_system,
                apply_observer_poses_system,
                align_with_anchor_system,
                pin_axes_system,
            )
                .chain(),
        );
    }
}
