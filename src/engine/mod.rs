//! Reference-relative transform synchronisation engine.
//!
//! The engine owns every entity this participant knows about. Authorities
//! encode their world pose against the shared reference frame and queue
//! [`PoseUpdate`]s in an outbox; observers store the newest accepted sample
//! and ease their displayed pose toward its reconstruction. One call to
//! [`TransformSyncEngine::tick`] performs a full pass.

mod authority;
mod entity;
mod observer;
mod transport;

use bevy::prelude::Resource;
use hashbrown::HashMap;
use log::{debug, info};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::message::{EntityId, PoseUpdate, RemoteSample, Tick};
use crate::pose::Pose;
use crate::reference_frame::ReferenceFrameHandle;

pub use authority::AuthorityOutcome;
pub use entity::{Role, SyncEntity};
pub use observer::{ObserverOutcome, SampleOutcome};
pub use transport::PoseTransport;

/// Counts gathered during one [`TransformSyncEngine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickSummary {
    /// Tick that was processed.
    pub tick: Tick,
    /// Whether the reference frame was available.
    pub frame_available: bool,
    /// Updates queued by authorities.
    pub sent: usize,
    /// Observers whose displayed pose was updated.
    pub applied: usize,
}

/// Synchronises entity poses relative to a shared reference frame.
#[derive(Resource)]
pub struct TransformSyncEngine {
    config: SyncConfig,
    frame: ReferenceFrameHandle,
    entities: HashMap<EntityId, SyncEntity>,
    tick: Tick,
    /// Length of the running tick in seconds; `None` means the configured
    /// nominal length.
    elapsed: Option<f32>,
    outbox: Vec<PoseUpdate>,
}

impl TransformSyncEngine {
    /// Creates an engine reading the reference frame through `frame`.
    ///
    /// # Errors
    /// Returns [`SyncError::InvalidConfig`] if `config` fails validation.
    ///
    /// # Examples
    ///
    /// ```
    /// use anchor_sync::config::SyncConfig;
    /// use anchor_sync::engine::TransformSyncEngine;
    /// use anchor_sync::reference_frame::ReferenceFrameHandle;
    ///
    /// let engine = TransformSyncEngine::new(SyncConfig::default(), ReferenceFrameHandle::new_unset())
    ///     .expect("default configuration is valid");
    /// assert_eq!(engine.entity_count(), 0);
    /// ```
    pub fn new(config: SyncConfig, frame: ReferenceFrameHandle) -> Result<Self, SyncError> {
        config.validate()?;
        Ok(Self {
            config,
            frame,
            entities: HashMap::new(),
            tick: Tick::default(),
            elapsed: None,
            outbox: Vec::new(),
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Handle to the reference frame the engine reads.
    #[must_use]
    pub const fn frame(&self) -> &ReferenceFrameHandle {
        &self.frame
    }

    /// Most recently processed tick.
    #[must_use]
    pub const fn current_tick(&self) -> Tick {
        self.tick
    }

    /// Registers an entity owned by this participant.
    ///
    /// # Errors
    /// Returns [`SyncError::AlreadyRegistered`] if `id` is taken, or
    /// [`SyncError::InvalidPose`] for a non-finite pose.
    pub fn register_authority(&mut self, id: EntityId, world: Pose) -> Result<(), SyncError> {
        self.insert(SyncEntity::authority(id, world))
    }

    /// Registers an entity owned by another participant, displayed at
    /// `initial` until its first sample arrives.
    ///
    /// # Errors
    /// Returns [`SyncError::AlreadyRegistered`] if `id` is taken, or
    /// [`SyncError::InvalidPose`] for a non-finite pose.
    pub fn register_observer(&mut self, id: EntityId, initial: Pose) -> Result<(), SyncError> {
        self.insert(SyncEntity::observer(id, initial))
    }

    fn insert(&mut self, entity: SyncEntity) -> Result<(), SyncError> {
        let id = entity.id();
        if !entity.world_pose().is_finite() {
            return Err(SyncError::InvalidPose { entity: id });
        }
        if self.entities.contains_key(&id) {
            return Err(SyncError::AlreadyRegistered(id));
        }
        info!("entity {id} registered as {:?}", entity.role());
        self.entities.insert(id, entity);
        Ok(())
    }

    /// Forgets an entity after despawn or disconnect. Returns `false` when it
    /// was not registered.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let removed = self.entities.remove(&id).is_some();
        if removed {
            self.outbox.retain(|update| update.entity != id);
            info!("entity {id} despawned");
        }
        removed
    }

    /// Feeds the authority's current world pose from input or physics.
    ///
    /// # Errors
    /// Returns [`SyncError::UnknownEntity`], [`SyncError::NotAuthority`] for
    /// observed entities, or [`SyncError::InvalidPose`] for non-finite input.
    pub fn set_local_pose(&mut self, id: EntityId, world: Pose) -> Result<(), SyncError> {
        let entity = self.entity_mut(id)?;
        if !entity.is_authority() {
            return Err(SyncError::NotAuthority(id));
        }
        if !world.is_finite() {
            return Err(SyncError::InvalidPose { entity: id });
        }
        entity.world = world;
        Ok(())
    }

    /// Advances the tick counter and runs every entity once.
    ///
    /// Authorities run before observers so a loopback participant sees its
    /// own updates no earlier than the next tick. Entities are visited in id
    /// order to keep the outbox deterministic.
    pub fn tick(&mut self) -> TickSummary {
        self.elapsed = None;
        self.run_tick()
    }

    /// As [`TransformSyncEngine::tick`], for a tick that lasted `seconds`.
    ///
    /// Hosts with a variable frame length call this with the measured frame
    /// time so time-normalised smoothing converges at wall-clock speed.
    pub fn tick_elapsed(&mut self, seconds: f32) -> TickSummary {
        self.elapsed = Some(seconds);
        self.run_tick()
    }

    /// Observer lerp factor for the running tick.
    pub(crate) fn lerp_factor(&self) -> f32 {
        self.elapsed.map_or_else(
            || self.config.lerp_factor(),
            |seconds| {
                self.config
                    .interpolation
                    .factor_over(self.config.lerp_rate, seconds)
            },
        )
    }

    fn run_tick(&mut self) -> TickSummary {
        self.tick = self.tick.next();
        let mut summary = TickSummary {
            tick: self.tick,
            frame_available: self.frame.is_available(),
            ..TickSummary::default()
        };

        let mut ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.sort_unstable();

        for &id in &ids {
            if let Ok(AuthorityOutcome::Sent(_)) = self.on_authority_tick(id) {
                summary.sent += 1;
            }
        }
        for &id in &ids {
            if let Ok(ObserverOutcome::Applied { .. }) = self.on_observer_tick(id) {
                summary.applied += 1;
            }
        }

        if !summary.frame_available {
            debug!("tick {}: reference frame unavailable, retrying next tick", self.tick);
        }
        summary
    }

    /// Removes and returns every queued update.
    pub fn drain_outbox(&mut self) -> std::vec::Drain<'_, PoseUpdate> {
        self.outbox.drain(..)
    }

    /// Number of updates waiting in the outbox.
    #[must_use]
    pub fn pending_updates(&self) -> usize {
        self.outbox.len()
    }

    /// Looks up an entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&SyncEntity> {
        self.entities.get(&id)
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut SyncEntity, SyncError> {
        self.entities
            .get_mut(&id)
            .ok_or(SyncError::UnknownEntity(id))
    }

    /// World pose the entity is currently shown at.
    #[must_use]
    pub fn displayed_pose(&self, id: EntityId) -> Option<Pose> {
        self.entity(id).map(SyncEntity::world_pose)
    }

    /// Latest relative pose computed for an owned entity.
    #[must_use]
    pub fn relative_pose(&self, id: EntityId) -> Option<Pose> {
        self.entity(id).and_then(SyncEntity::relative_pose)
    }

    /// Latest accepted sample for an observed entity.
    #[must_use]
    pub fn remote_sample(&self, id: EntityId) -> Option<RemoteSample> {
        self.entity(id).and_then(SyncEntity::remote_sample)
    }

    /// Role this participant plays for `id`.
    #[must_use]
    pub fn role(&self, id: EntityId) -> Option<Role> {
        self.entity(id).map(SyncEntity::role)
    }

    /// Total samples discarded as stale across all observed entities.
    #[must_use]
    pub fn stale_discards(&self) -> u64 {
        self.entities.values().map(SyncEntity::stale_discards).sum()
    }

    /// Number of registered entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Identifiers of every registered entity, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Sequence;
    use crate::policy::{InterpolationPolicy, SendPolicy};
    use approx::assert_relative_eq;
    use glam::Vec3;
    use rstest::{fixture, rstest};
    use static_assertions::assert_impl_all;

    assert_impl_all!(TransformSyncEngine: Send, Sync);

    const OWNED: EntityId = EntityId(1);
    const REMOTE: EntityId = EntityId(2);

    #[fixture]
    fn engine() -> TransformSyncEngine {
        TransformSyncEngine::new(
            SyncConfig::default(),
            ReferenceFrameHandle::with_pose(Pose::IDENTITY),
        )
        .expect("default configuration is valid")
    }

    #[rstest]
    fn invalid_config_is_rejected() {
        let config = SyncConfig {
            lerp_rate: f32::NAN,
            ..SyncConfig::default()
        };
        let result = TransformSyncEngine::new(config, ReferenceFrameHandle::new_unset());
        assert!(matches!(result, Err(SyncError::InvalidConfig(_))));
    }

    #[rstest]
    fn duplicate_registration_is_rejected(mut engine: TransformSyncEngine) {
        engine
            .register_authority(OWNED, Pose::IDENTITY)
            .expect("first registration succeeds");
        let err = engine
            .register_observer(OWNED, Pose::IDENTITY)
            .expect_err("second registration should fail");
        assert!(matches!(err, SyncError::AlreadyRegistered(id) if id == OWNED));
        assert_eq!(engine.role(OWNED), Some(Role::Authority));
    }

    #[rstest]
    fn non_finite_registration_is_rejected(mut engine: TransformSyncEngine) {
        let bad = Pose::from_position(Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(matches!(
            engine.register_observer(REMOTE, bad),
            Err(SyncError::InvalidPose { .. })
        ));
        assert_eq!(engine.entity_count(), 0);
    }

    #[rstest]
    fn observers_cannot_set_local_pose(mut engine: TransformSyncEngine) {
        engine
            .register_observer(REMOTE, Pose::IDENTITY)
            .expect("observer registration succeeds");
        let err = engine
            .set_local_pose(REMOTE, Pose::from_position(Vec3::X))
            .expect_err("observer pose is not writable");
        assert!(matches!(err, SyncError::NotAuthority(_)));
    }

    #[rstest]
    fn unknown_entity_is_reported(mut engine: TransformSyncEngine) {
        assert!(matches!(
            engine.set_local_pose(EntityId(99), Pose::IDENTITY),
            Err(SyncError::UnknownEntity(EntityId(99)))
        ));
    }

    #[rstest]
    fn tick_sends_for_each_authority(mut engine: TransformSyncEngine) {
        engine
            .register_authority(EntityId(5), Pose::IDENTITY)
            .expect("registration succeeds");
        engine
            .register_authority(EntityId(3), Pose::IDENTITY)
            .expect("registration succeeds");
        let summary = engine.tick();
        assert_eq!(summary.tick, Tick(1));
        assert!(summary.frame_available);
        assert_eq!(summary.sent, 2);
        let order: Vec<EntityId> = engine.drain_outbox().map(|u| u.entity).collect();
        assert_eq!(order, vec![EntityId(3), EntityId(5)]);
        assert_eq!(engine.pending_updates(), 0);
    }

    #[rstest]
    fn despawn_drops_queued_updates(mut engine: TransformSyncEngine) {
        engine
            .register_authority(OWNED, Pose::IDENTITY)
            .expect("registration succeeds");
        engine.tick();
        assert!(engine.despawn(OWNED));
        assert_eq!(engine.pending_updates(), 0);
        assert!(!engine.despawn(OWNED));
        assert!(engine.displayed_pose(OWNED).is_none());
    }

    #[rstest]
    fn tick_without_frame_is_a_no_op() {
        let mut engine = TransformSyncEngine::new(
            SyncConfig {
                send: SendPolicy::EveryTick,
                ..SyncConfig::default()
            },
            ReferenceFrameHandle::new_unset(),
        )
        .expect("configuration is valid");
        engine
            .register_authority(OWNED, Pose::from_position(Vec3::X))
            .expect("registration succeeds");
        let summary = engine.tick();
        assert!(!summary.frame_available);
        assert_eq!(summary.sent, 0);
        assert!(engine.relative_pose(OWNED).is_none());
    }

    #[rstest]
    fn accessors_expose_config_frame_and_ids(mut engine: TransformSyncEngine) {
        assert_eq!(engine.config(), &SyncConfig::default());
        assert!(engine.frame().is_available());
        engine.frame().recenter(Pose::from_position(Vec3::Y));
        assert_eq!(engine.frame().pose(), Some(Pose::from_position(Vec3::Y)));

        engine
            .register_authority(OWNED, Pose::IDENTITY)
            .expect("registration succeeds");
        engine
            .register_observer(REMOTE, Pose::IDENTITY)
            .expect("registration succeeds");
        let mut ids: Vec<EntityId> = engine.ids().collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![OWNED, REMOTE]);
    }

    fn time_normalised_observer() -> TransformSyncEngine {
        let config = SyncConfig {
            lerp_rate: 2.0,
            interpolation: InterpolationPolicy::time_normalized(),
            ..SyncConfig::default()
        };
        let mut engine =
            TransformSyncEngine::new(config, ReferenceFrameHandle::with_pose(Pose::IDENTITY))
                .expect("configuration is valid");
        engine
            .register_observer(REMOTE, Pose::IDENTITY)
            .expect("registration succeeds");
        engine
            .on_remote_sample_received(REMOTE, Pose::from_position(Vec3::X), Sequence(1))
            .expect("sample accepted");
        engine
    }

    fn remaining(engine: &TransformSyncEngine) -> f32 {
        engine
            .displayed_pose(REMOTE)
            .map_or(f32::NAN, |pose| pose.position.distance(Vec3::X))
    }

    #[rstest]
    fn elapsed_ticks_converge_at_wall_clock_speed() {
        let mut coarse = time_normalised_observer();
        for _ in 0..10 {
            coarse.tick_elapsed(0.1);
        }
        let mut fine = time_normalised_observer();
        for _ in 0..40 {
            fine.tick_elapsed(0.025);
        }
        // One second at rate 2 leaves exp(-2) of the initial distance.
        assert_relative_eq!(remaining(&coarse), (-2.0_f32).exp(), epsilon = 1e-4);
        assert_relative_eq!(remaining(&coarse), remaining(&fine), epsilon = 1e-4);
    }

    #[rstest]
    fn plain_tick_reverts_to_nominal_length() {
        let mut engine = time_normalised_observer();
        engine.tick_elapsed(0.5);
        let after_long = remaining(&engine);
        engine.tick();
        let expected = after_long * (-2.0_f32 / 60.0).exp();
        assert_relative_eq!(remaining(&engine), expected, epsilon = 1e-5);
    }
}
