//! Observer side: accept samples and ease the displayed pose toward them.

use log::{debug, trace};

use crate::error::SyncError;
use crate::message::{EntityId, PoseUpdate, RemoteSample, Sequence};
use crate::policy::step_position;
use crate::pose::{reconstruct_world_pose, Pose};

use super::entity::EntityState;
use super::TransformSyncEngine;

/// Result of offering a sample to [`TransformSyncEngine::on_remote_sample_received`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// The sample replaced the previous one.
    Stored,
    /// The sample was older than one already accepted.
    Stale,
    /// The entity is owned here; its own pose is never overwritten.
    IgnoredAuthority,
}

/// Result of running [`TransformSyncEngine::on_observer_tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObserverOutcome {
    /// The entity is owned here, so there is nothing to follow.
    NotObserver,
    /// The reference frame is not available yet; the pose was held.
    FrameUnavailable,
    /// No sample has arrived yet; the pose was held.
    AwaitingSample,
    /// The displayed pose moved toward the target.
    Applied {
        /// Remaining distance between displayed and target positions.
        remaining: f32,
    },
}

impl TransformSyncEngine {
    /// Stores a relative pose received from the entity's authority.
    ///
    /// The sample is stamped with the current tick and only consumed by the
    /// next [`TransformSyncEngine::on_observer_tick`].
    ///
    /// # Errors
    /// Returns [`SyncError::UnknownEntity`] for unregistered ids and
    /// [`SyncError::InvalidPose`] for non-finite poses.
    pub fn on_remote_sample_received(
        &mut self,
        id: EntityId,
        relative: Pose,
        sequence: Sequence,
    ) -> Result<SampleOutcome, SyncError> {
        let now = self.tick;
        let discard_stale = self.config.discard_stale;
        let entity = self.entity_mut(id)?;
        let EntityState::Observer(state) = &mut entity.state else {
            trace!("entity {id}: echoed sample ignored by its authority");
            return Ok(SampleOutcome::IgnoredAuthority);
        };
        if !relative.is_finite() {
            return Err(SyncError::InvalidPose { entity: id });
        }
        if !state.filter.admit(id, sequence, discard_stale) {
            return Ok(SampleOutcome::Stale);
        }
        state.sample = Some(RemoteSample {
            relative,
            received_at: now,
            sequence,
        });
        Ok(SampleOutcome::Stored)
    }

    /// Accepts a decoded wire message.
    ///
    /// # Errors
    /// As [`TransformSyncEngine::on_remote_sample_received`], plus
    /// [`SyncError::InvalidPose`] for non-finite payloads.
    pub fn receive(&mut self, update: &PoseUpdate) -> Result<SampleOutcome, SyncError> {
        let relative = update.relative_pose()?;
        self.on_remote_sample_received(update.entity, relative, update.sequence)
    }

    /// Moves an observed entity's displayed pose toward the reconstruction
    /// of its latest sample.
    ///
    /// # Errors
    /// Returns [`SyncError::UnknownEntity`] if `id` is not registered.
    pub fn on_observer_tick(&mut self, id: EntityId) -> Result<ObserverOutcome, SyncError> {
        let frame = self.frame.pose();
        let factor = self.lerp_factor();
        let rotation_policy = self.config.rotation;
        let entity = self.entity_mut(id)?;
        let EntityState::Observer(state) = &entity.state else {
            return Ok(ObserverOutcome::NotObserver);
        };
        let Some(frame) = frame else {
            return Ok(ObserverOutcome::FrameUnavailable);
        };
        let Some(sample) = state.sample else {
            return Ok(ObserverOutcome::AwaitingSample);
        };

        let target = reconstruct_world_pose(&frame, &sample.relative);
        let current = entity.world;
        let position = step_position(current.position, target.position, factor);
        let rotation = rotation_policy.step(current.rotation, target.rotation, factor);
        entity.world = Pose::new(position, rotation);

        let remaining = position.distance(target.position);
        if remaining > 0.0 {
            debug!("entity {id}: {remaining:.4} from target after easing");
        }
        Ok(ObserverOutcome::Applied { remaining })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::engine::Role;
    use crate::policy::RotationPolicy;
    use crate::reference_frame::ReferenceFrameHandle;
    use glam::{Quat, Vec3};
    use rstest::rstest;

    const REMOTE: EntityId = EntityId(11);

    fn observer_engine(config: SyncConfig, frame: &ReferenceFrameHandle) -> TransformSyncEngine {
        let mut engine =
            TransformSyncEngine::new(config, frame.clone()).expect("configuration is valid");
        engine
            .register_observer(REMOTE, Pose::IDENTITY)
            .expect("registration succeeds");
        engine
    }

    fn eased(rate: f32) -> SyncConfig {
        SyncConfig {
            lerp_rate: rate,
            ..SyncConfig::default()
        }
    }

    #[rstest]
    fn sample_is_stored_not_applied() {
        let frame = ReferenceFrameHandle::with_pose(Pose::IDENTITY);
        let mut engine = observer_engine(SyncConfig::default(), &frame);
        let outcome = engine
            .on_remote_sample_received(REMOTE, Pose::from_position(Vec3::X), Sequence(1))
            .expect("entity registered");
        assert_eq!(outcome, SampleOutcome::Stored);
        assert_eq!(engine.displayed_pose(REMOTE), Some(Pose::IDENTITY));
        let sample = engine.remote_sample(REMOTE).expect("sample stored");
        assert_eq!(sample.received_at, engine.current_tick());
    }

    #[rstest]
    fn default_config_snaps_to_target() {
        let frame = ReferenceFrameHandle::with_pose(Pose::from_position(Vec3::Y));
        let mut engine = observer_engine(SyncConfig::default(), &frame);
        engine
            .on_remote_sample_received(REMOTE, Pose::from_position(Vec3::X), Sequence(1))
            .expect("entity registered");
        let outcome = engine.on_observer_tick(REMOTE).expect("entity registered");
        assert_eq!(outcome, ObserverOutcome::Applied { remaining: 0.0 });
        let shown = engine.displayed_pose(REMOTE).expect("entity registered");
        assert!(shown.close_to(&Pose::from_position(Vec3::new(1.0, 1.0, 0.0))));
    }

    #[rstest]
    fn partial_factor_moves_part_way() {
        let frame = ReferenceFrameHandle::with_pose(Pose::IDENTITY);
        let mut engine = observer_engine(eased(0.25), &frame);
        engine
            .on_remote_sample_received(REMOTE, Pose::from_position(Vec3::X * 4.0), Sequence(1))
            .expect("entity registered");
        engine.on_observer_tick(REMOTE).expect("entity registered");
        let shown = engine.displayed_pose(REMOTE).expect("entity registered");
        assert!(shown.position.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[rstest]
    fn snap_rotation_is_assigned_even_when_position_eases() {
        let frame = ReferenceFrameHandle::with_pose(Pose::IDENTITY);
        let mut engine = observer_engine(eased(0.1), &frame);
        let turned = Pose::new(Vec3::X, Quat::from_rotation_y(1.0));
        engine
            .on_remote_sample_received(REMOTE, turned, Sequence(1))
            .expect("entity registered");
        engine.on_observer_tick(REMOTE).expect("entity registered");
        let shown = engine.displayed_pose(REMOTE).expect("entity registered");
        assert!(shown.rotation.abs_diff_eq(turned.rotation, 1e-6));
        assert!(shown.position.x < 0.5);
    }

    #[rstest]
    fn slerp_rotation_blends() {
        let frame = ReferenceFrameHandle::with_pose(Pose::IDENTITY);
        let config = SyncConfig {
            rotation: RotationPolicy::Slerp,
            ..eased(0.5)
        };
        let mut engine = observer_engine(config, &frame);
        let turned = Pose::new(Vec3::ZERO, Quat::from_rotation_y(1.0));
        engine
            .on_remote_sample_received(REMOTE, turned, Sequence(1))
            .expect("entity registered");
        engine.on_observer_tick(REMOTE).expect("entity registered");
        let shown = engine.displayed_pose(REMOTE).expect("entity registered");
        assert!((shown.angle_to(&turned) - 0.5).abs() < 1e-4);
    }

    #[rstest]
    fn stale_sample_keeps_newer_one() {
        let frame = ReferenceFrameHandle::with_pose(Pose::IDENTITY);
        let mut engine = observer_engine(SyncConfig::default(), &frame);
        engine
            .on_remote_sample_received(REMOTE, Pose::from_position(Vec3::X), Sequence(2))
            .expect("entity registered");
        let outcome = engine
            .on_remote_sample_received(REMOTE, Pose::from_position(Vec3::Y), Sequence(1))
            .expect("entity registered");
        assert_eq!(outcome, SampleOutcome::Stale);
        let sample = engine.remote_sample(REMOTE).expect("sample stored");
        assert_eq!(sample.sequence, Sequence(2));
        assert_eq!(engine.stale_discards(), 1);
    }

    #[rstest]
    fn authority_ignores_echoed_samples() {
        let frame = ReferenceFrameHandle::with_pose(Pose::IDENTITY);
        let mut engine = observer_engine(SyncConfig::default(), &frame);
        let owned = EntityId(12);
        engine
            .register_authority(owned, Pose::from_position(Vec3::Z))
            .expect("registration succeeds");
        engine.tick();
        let before = engine.relative_pose(owned);
        let outcome = engine
            .on_remote_sample_received(owned, Pose::from_position(Vec3::X), Sequence(99))
            .expect("entity registered");
        assert_eq!(outcome, SampleOutcome::IgnoredAuthority);
        assert_eq!(engine.relative_pose(owned), before);
        assert_eq!(engine.role(owned), Some(Role::Authority));
        assert_eq!(
            engine.on_observer_tick(owned).expect("entity registered"),
            ObserverOutcome::NotObserver
        );
    }

    #[rstest]
    fn missing_frame_holds_pose() {
        let frame = ReferenceFrameHandle::new_unset();
        let mut engine = observer_engine(SyncConfig::default(), &frame);
        engine
            .on_remote_sample_received(REMOTE, Pose::from_position(Vec3::X), Sequence(1))
            .expect("entity registered");
        assert_eq!(
            engine.on_observer_tick(REMOTE).expect("entity registered"),
            ObserverOutcome::FrameUnavailable
        );
        assert_eq!(engine.displayed_pose(REMOTE), Some(Pose::IDENTITY));
    }

    #[rstest]
    fn receive_decodes_wire_update() {
        let frame = ReferenceFrameHandle::with_pose(Pose::IDENTITY);
        let mut engine = observer_engine(SyncConfig::default(), &frame);
        let update = PoseUpdate::new(REMOTE, Sequence(1), &Pose::from_position(Vec3::Y));
        let bytes = update.encode().expect("encode pose update");
        let decoded = PoseUpdate::decode(&bytes).expect("decode pose update");
        assert_eq!(
            engine.receive(&decoded).expect("entity registered"),
            SampleOutcome::Stored
        );
    }

    #[rstest]
    fn non_finite_sample_is_rejected() {
        let frame = ReferenceFrameHandle::with_pose(Pose::IDENTITY);
        let mut engine = observer_engine(SyncConfig::default(), &frame);
        let bad = Pose {
            position: Vec3::new(f32::INFINITY, 0.0, 0.0),
            rotation: Quat::IDENTITY,
        };
        assert!(matches!(
            engine.on_remote_sample_received(REMOTE, bad, Sequence(1)),
            Err(SyncError::InvalidPose { .. })
        ));
        assert!(engine.remote_sample(REMOTE).is_none());
    }
}
