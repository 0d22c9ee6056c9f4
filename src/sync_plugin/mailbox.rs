//! Buffers connecting the plugin to the caller's transport.

use bevy::prelude::Resource;

use crate::error::SyncError;
use crate::message::PoseUpdate;

/// Updates received from peers, awaiting ingestion on the next frame.
#[derive(Resource, Default)]
pub struct PoseInbox {
    updates: Vec<PoseUpdate>,
}

impl PoseInbox {
    /// Queues a decoded update.
    pub fn push(&mut self, update: PoseUpdate) {
        self.updates.push(update);
    }

    /// Decodes and queues a raw payload.
    ///
    /// # Errors
    /// Returns [`SyncError::Decode`] for malformed payloads; nothing is queued.
    pub fn push_encoded(&mut self, bytes: &[u8]) -> Result<(), SyncError> {
        self.updates.push(PoseUpdate::decode(bytes)?);
        Ok(())
    }

    /// Queues several decoded updates.
    pub fn extend<I>(&mut self, updates: I)
    where
        I: IntoIterator<Item = PoseUpdate>,
    {
        self.updates.extend(updates);
    }

    /// Removes every queued update in arrival order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, PoseUpdate> {
        self.updates.drain(..)
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Updates produced by local authorities, awaiting the transport.
#[derive(Resource, Default)]
pub struct PoseOutbox {
    updates: Vec<PoseUpdate>,
}

impl PoseOutbox {
    pub(crate) fn extend<I>(&mut self, updates: I)
    where
        I: IntoIterator<Item = PoseUpdate>,
    {
        self.updates.extend(updates);
    }

    /// Removes every queued update.
    pub fn drain(&mut self) -> std::vec::Drain<'_, PoseUpdate> {
        self.updates.drain(..)
    }

    /// Number of queued updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{EntityId, Sequence};
    use crate::pose::Pose;
    use rstest::rstest;

    fn sample(id: u64) -> PoseUpdate {
        PoseUpdate::new(EntityId(id), Sequence(1), &Pose::IDENTITY)
    }

    #[rstest]
    fn inbox_drains_in_arrival_order() {
        let mut inbox = PoseInbox::default();
        inbox.push(sample(2));
        inbox.extend(vec![sample(1), sample(3)]);
        let ids: Vec<u64> = inbox.drain().map(|u| u.entity.into_inner()).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert!(inbox.is_empty());
    }

    #[rstest]
    fn malformed_payload_is_not_queued() {
        let mut inbox = PoseInbox::default();
        assert!(inbox.push_encoded(b"{").is_err());
        assert!(inbox.is_empty());
        let bytes = sample(4).encode().expect("encode pose update");
        inbox.push_encoded(&bytes).expect("valid payload");
        assert!(!inbox.is_empty());
    }

    #[rstest]
    fn outbox_reports_length() {
        let mut outbox = PoseOutbox::default();
        outbox.extend([sample(1), sample(2)]);
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox.drain().count(), 2);
        assert!(outbox.is_empty());
    }
}
