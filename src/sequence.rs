//! Stale sample filtering for observer entities.

use log::debug;

use crate::message::{EntityId, Sequence};

/// Tracks the newest sequence number accepted for one observed entity.
#[derive(Debug, Clone, Default)]
pub struct SequenceFilter {
    latest: Option<Sequence>,
    discarded: u64,
}

impl SequenceFilter {
    /// Returns `true` and records `sequence` when it is newer than anything
    /// accepted so far. Older or repeated samples are counted and rejected.
    ///
    /// Last-write-wins is preserved when `discard_stale` is `false`: every
    /// sample is accepted and becomes the new reference point.
    pub fn admit(&mut self, entity: EntityId, sequence: Sequence, discard_stale: bool) -> bool {
        if discard_stale {
            if let Some(latest) = self.latest {
                if sequence <= latest {
                    debug!(
                        "stale sample ignored for entity {entity}: seq {sequence} <= {latest}"
                    );
                    self.discarded += 1;
                    return false;
                }
            }
        }
        self.latest = Some(sequence);
        true
    }

    /// Newest sequence accepted, if any.
    #[must_use]
    pub const fn latest(&self) -> Option<Sequence> {
        self.latest
    }

    /// Number of samples rejected as stale.
    #[must_use]
    pub const fn discarded(&self) -> u64 {
        self.discarded
    }
}
