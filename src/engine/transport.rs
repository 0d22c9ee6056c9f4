//! Seam between the engine's outbox and whatever carries updates to peers.

use log::warn;

use crate::error::SyncError;
use crate::message::PoseUpdate;

use super::TransformSyncEngine;

/// Fire-and-forget broadcast channel for pose updates.
#[cfg_attr(test, mockall::automock)]
pub trait PoseTransport {
    /// Hands one update to the transport.
    ///
    /// # Errors
    /// Implementations return [`SyncError::Transport`] when the update could
    /// not be queued.
    fn broadcast(&mut self, update: &PoseUpdate) -> Result<(), SyncError>;
}

impl TransformSyncEngine {
    /// Drains the outbox into `transport`, returning how many updates were
    /// accepted.
    ///
    /// Delivery is best-effort: a rejected update is logged and dropped, and
    /// the remaining updates are still offered. The next tick produces a
    /// fresher pose anyway.
    pub fn flush(&mut self, transport: &mut dyn PoseTransport) -> usize {
        let mut delivered = 0;
        for update in self.outbox.drain(..) {
            match transport.broadcast(&update) {
                Ok(()) => delivered += 1,
                Err(error) => warn!("dropping update for entity {}: {error}", update.entity),
            }
        }
        delivered
    }
}
