//! Systems bridging Bevy transforms and the sync engine.
//!
//! They run chained once per frame: publish the anchor, track registrations,
//! ingest received updates, capture owned transforms, tick the engine, write
//! observed transforms back, then align anchored helpers.

use bevy::prelude::*;
use hashbrown::HashMap;
use log::{debug, trace, warn};

use crate::alignment::pin_axes;
use crate::engine::{Role, SampleOutcome, TransformSyncEngine};
use crate::error::SyncError;
use crate::message::EntityId;
use crate::pose::Pose;
use crate::reference_frame::ReferenceFrameHandle;

use super::components::{
    write_pose, AlignWithAnchor, AnchorFrame, AxisPin, LocalAuthority, SyncId,
};
use super::mailbox::{PoseInbox, PoseOutbox};
use super::plugin::{SyncErrorContext, SyncErrorEvent};

/// Maps Bevy entities to the network ids they were registered under, so a
/// removed [`SyncId`] can still be resolved.
#[derive(Resource, Default)]
pub struct SyncRegistry {
    by_entity: HashMap<Entity, EntityId>,
}

impl SyncRegistry {
    /// Network id registered for `entity`, if any.
    #[must_use]
    pub fn id_for(&self, entity: Entity) -> Option<EntityId> {
        self.by_entity.get(&entity).copied()
    }
}

type Registrations<'w, 's> = Query<
    'w,
    's,
    (Entity, &'static SyncId, &'static Transform, Has<LocalAuthority>),
    Added<SyncId>,
>;

fn report(commands: &mut Commands, context: SyncErrorContext, error: &SyncError) {
    commands.trigger(SyncErrorEvent::new(context, error.to_string()));
}

/// Copies the first [`AnchorFrame`] transform into the reference frame.
///
/// When the anchor disappears the frame is cleared so synchronisation pauses
/// instead of using a stale pose.
pub fn publish_anchor_system(
    anchors: Query<&Transform, With<AnchorFrame>>,
    frame: Res<ReferenceFrameHandle>,
    mut published: Local<bool>,
) {
    if let Some(transform) = anchors.iter().next() {
        frame.establish(Pose::from(transform));
        *published = true;
    } else if *published {
        frame.clear();
        *published = false;
    }
}

/// Registers newly tagged entities and forgets removed ones.
pub fn track_registrations_system(
    mut commands: Commands,
    mut engine: ResMut<TransformSyncEngine>,
    mut registry: ResMut<SyncRegistry>,
    added: Registrations<'_, '_>,
    mut removed: RemovedComponents<SyncId>,
) {
    for entity in removed.read() {
        if let Some(id) = registry.by_entity.remove(&entity) {
            engine.despawn(id);
        }
    }

    for (entity, &SyncId(id), transform, owned) in &added {
        let pose = Pose::from(transform);
        let result = if owned {
            engine.register_authority(id, pose)
        } else {
            engine.register_observer(id, pose)
        };
        match result {
            Ok(()) => {
                if let Some(previous) = registry.by_entity.insert(entity, id) {
                    if previous != id {
                        engine.despawn(previous);
                    }
                }
            }
            Err(error) => report(&mut commands, SyncErrorContext::Register, &error),
        }
    }
}

/// Feeds queued peer updates to the engine.
pub fn ingest_inbox_system(
    mut commands: Commands,
    mut engine: ResMut<TransformSyncEngine>,
    mut inbox: ResMut<PoseInbox>,
) {
    for update in inbox.drain() {
        match engine.receive(&update) {
            Ok(SampleOutcome::Stale) => {
                debug!("stale update for entity {} dropped", update.entity);
            }
            Ok(_) => {}
            Err(SyncError::UnknownEntity(id)) => {
                warn!("update for unregistered entity {id} dropped");
            }
            Err(error) => report(&mut commands, SyncErrorContext::Receive, &error),
        }
    }
}

/// Hands owned transforms to the engine as authoritative world poses.
///
/// Only entities registered under their own id are captured. An entity whose
/// registration was refused has already been reported once and is skipped.
pub fn capture_authority_system(
    mut commands: Commands,
    mut engine: ResMut<TransformSyncEngine>,
    registry: Res<SyncRegistry>,
    owned: Query<(Entity, &SyncId, &Transform), With<LocalAuthority>>,
) {
    for (entity, &SyncId(id), transform) in &owned {
        if registry.id_for(entity) != Some(id) {
            continue;
        }
        match engine.set_local_pose(id, Pose::from(transform)) {
            Ok(()) | Err(SyncError::UnknownEntity(_)) => {}
            Err(SyncError::NotAuthority(_)) => {
                trace!("entity {id} gained LocalAuthority after registering as observer");
            }
            Err(error) => report(&mut commands, SyncErrorContext::Capture, &error),
        }
    }
}

/// Runs one engine pass and moves produced updates to the [`PoseOutbox`].
///
/// The pass is told how long the frame took, so time-normalised smoothing
/// does not depend on the frame rate.
pub fn engine_tick_system(
    time: Res<Time>,
    mut engine: ResMut<TransformSyncEngine>,
    mut outbox: ResMut<PoseOutbox>,
) {
    engine.tick_elapsed(time.delta_secs());
    outbox.extend(engine.drain_outbox());
}

/// Writes displayed poses back onto observed entities.
pub fn apply_observer_poses_system(
    engine: Res<TransformSyncEngine>,
    mut observed: Query<(&SyncId, &mut Transform), Without<LocalAuthority>>,
) {
    for (&SyncId(id), mut transform) in &mut observed {
        if engine.role(id) != Some(Role::Observer) {
            continue;
        }
        if let Some(pose) = engine.displayed_pose(id) {
            write_pose(&mut transform, pose);
        }
    }
}

/// Keeps [`AlignWithAnchor`] entities on top of the reference frame.
pub fn align_with_anchor_system(
    frame: Res<ReferenceFrameHandle>,
    mut aligned: Query<&mut Transform, (With<AlignWithAnchor>, Without<AnchorFrame>)>,
) {
    let Some(pose) = frame.pose() else {
        return;
    };
    for mut transform in &mut aligned {
        write_pose(&mut transform, pose);
    }
}

/// Applies every [`AxisPin`] to its target.
pub fn pin_axes_system(pins: Query<(Entity, &AxisPin)>, mut transforms: Query<&mut Transform>) {
    let moves: Vec<_> = pins
        .iter()
        .filter_map(|(driver, pin)| {
            transforms
                .get(driver)
                .ok()
                .map(|transform| (pin.target, transform.translation, pin.mask))
        })
        .collect();

    for (target, driver_position, mask) in moves {
        let Ok(mut transform) = transforms.get_mut(target) else {
            debug!("axis pin target {target:?} has no transform");
            continue;
        };
        transform.translation = pin_axes(transform.translation, driver_position, mask);
    }
}
