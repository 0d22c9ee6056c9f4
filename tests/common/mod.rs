//! Shared fixtures for Bevy-level synchronisation tests.

use anchor_sync::{
    AnchorFrame, EntityId, LocalAuthority, PoseInbox, PoseOutbox, SyncConfig, SyncId,
    TransformSyncPlugin,
};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

/// Builder for headless participant apps running [`TransformSyncPlugin`].
pub struct ParticipantBuilder {
    app: App,
}

impl ParticipantBuilder {
    /// Create a participant with `MinimalPlugins` and the sync plugin.
    #[must_use]
    pub fn new(config: SyncConfig) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(TransformSyncPlugin::with_config(config));
        Self { app }
    }

    /// Advance the clock by exactly `frame` on every update.
    #[must_use]
    pub fn with_frame_time(mut self, frame: Duration) -> Self {
        self.app
            .insert_resource(TimeUpdateStrategy::ManualDuration(frame));
        self
    }

    /// Spawn the shared anchor where this participant's tracking sees it.
    #[must_use]
    pub fn with_anchor(mut self, transform: Transform) -> Self {
        self.app.world_mut().spawn((AnchorFrame, transform));
        self
    }

    /// Spawn an entity owned by this participant.
    #[must_use]
    pub fn with_owned(mut self, id: u64, transform: Transform) -> (Self, Entity) {
        let entity = self
            .app
            .world_mut()
            .spawn((SyncId(EntityId(id)), LocalAuthority, transform))
            .id();
        (self, entity)
    }

    /// Spawn an entity owned by another participant.
    #[must_use]
    pub fn with_observed(mut self, id: u64, transform: Transform) -> (Self, Entity) {
        let entity = self
            .app
            .world_mut()
            .spawn((SyncId(EntityId(id)), transform))
            .id();
        (self, entity)
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> App {
        self.app
    }
}

/// Move every update in `from`'s outbox into `to`'s inbox, through the codec.
pub fn deliver(from: &mut App, to: &mut App) -> usize {
    let payloads: Vec<Vec<u8>> = from
        .world_mut()
        .resource_mut::<PoseOutbox>()
        .drain()
        .map(|update| update.encode().expect("pose update should encode"))
        .collect();
    let mut inbox = to.world_mut().resource_mut::<PoseInbox>();
    for bytes in &payloads {
        inbox
            .push_encoded(bytes)
            .expect("pose update should decode");
    }
    payloads.len()
}

