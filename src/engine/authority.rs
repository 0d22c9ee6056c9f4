//! Authority side: encode the owned pose and queue it for broadcast.

use log::{debug, trace};

use crate::error::SyncError;
use crate::message::{EntityId, PoseUpdate};
use crate::policy::LastSend;
use crate::pose::compute_relative_pose;

use super::entity::EntityState;
use super::TransformSyncEngine;

/// Result of running [`TransformSyncEngine::on_authority_tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthorityOutcome {
    /// The reference frame is not available yet; nothing was computed.
    FrameUnavailable,
    /// The entity is observed here, so there is nothing to send.
    NotAuthority,
    /// The relative pose was refreshed but the send policy held it back.
    Held,
    /// An update was queued in the outbox.
    Sent(PoseUpdate),
}

impl TransformSyncEngine {
    /// Recomputes the relative pose of an owned entity and queues it when the
    /// send policy allows.
    ///
    /// # Errors
    /// Returns [`SyncError::UnknownEntity`] if `id` is not registered.
    pub fn on_authority_tick(&mut self, id: EntityId) -> Result<AuthorityOutcome, SyncError> {
        let now = self.tick;
        let send_policy = self.config.send;
        let frame = self.frame.pose();
        let entity = self.entity_mut(id)?;
        let world = entity.world;
        let EntityState::Authority(state) = &mut entity.state else {
            return Ok(AuthorityOutcome::NotAuthority);
        };
        let Some(frame) = frame else {
            trace!("entity {id}: no reference frame, authority tick skipped");
            return Ok(AuthorityOutcome::FrameUnavailable);
        };

        let relative = compute_relative_pose(&frame, &world);
        state.relative = Some(relative);

        if !send_policy.should_send(now, &relative, state.last_send.as_ref()) {
            return Ok(AuthorityOutcome::Held);
        }

        let sequence = state.take_sequence();
        state.last_send = Some(LastSend {
            tick: now,
            relative,
        });
        let update = PoseUpdate::new(id, sequence, &relative);
        debug!("entity {id}: queued update seq {sequence} at tick {now}");
        self.outbox.push(update);
        Ok(AuthorityOutcome::Sent(update))
    }
}
