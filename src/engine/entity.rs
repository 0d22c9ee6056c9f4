//! Per-entity synchronisation state.
//!
//! Role-specific state lives in [`EntityState`], so an authority has no slot
//! for remote samples and an observer has no relative pose of its own.

use serde::{Deserialize, Serialize};

use crate::message::{EntityId, RemoteSample, Sequence};
use crate::policy::LastSend;
use crate::pose::Pose;
use crate::sequence::SequenceFilter;

/// Which side of the synchronisation this participant plays for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// This participant originates the entity's pose.
    Authority,
    /// This participant displays a pose received from elsewhere.
    Observer,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct AuthorityState {
    pub(crate) relative: Option<Pose>,
    pub(crate) next_sequence: Sequence,
    pub(crate) last_send: Option<LastSend>,
}

impl AuthorityState {
    pub(crate) fn take_sequence(&mut self) -> Sequence {
        self.next_sequence = self.next_sequence.next();
        self.next_sequence
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ObserverState {
    pub(crate) sample: Option<RemoteSample>,
    pub(crate) filter: SequenceFilter,
}

#[derive(Debug, Clone)]
pub(crate) enum EntityState {
    Authority(AuthorityState),
    Observer(ObserverState),
}

/// A synchronised entity as seen by one participant.
#[derive(Debug, Clone)]
pub struct SyncEntity {
    id: EntityId,
    /// World pose: the input pose for authorities, the displayed pose for
    /// observers.
    pub(crate) world: Pose,
    pub(crate) state: EntityState,
}

impl SyncEntity {
    pub(crate) fn authority(id: EntityId, world: Pose) -> Self {
        Self {
            id,
            world,
            state: EntityState::Authority(AuthorityState::default()),
        }
    }

    pub(crate) fn observer(id: EntityId, world: Pose) -> Self {
        Self {
            id,
            world,
            state: EntityState::Observer(ObserverState::default()),
        }
    }

    /// Network identifier of the entity.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Role this participant plays for the entity.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self.state {
            EntityState::Authority(_) => Role::Authority,
            EntityState::Observer(_) => Role::Observer,
        }
    }

    /// Returns `true` when this participant owns the entity.
    #[must_use]
    pub const fn is_authority(&self) -> bool {
        matches!(self.state, EntityState::Authority(_))
    }

    /// Current world pose.
    #[must_use]
    pub const fn world_pose(&self) -> Pose {
        self.world
    }

    /// Latest relative pose computed by the authority.
    #[must_use]
    pub const fn relative_pose(&self) -> Option<Pose> {
        match &self.state {
            EntityState::Authority(state) => state.relative,
            EntityState::Observer(_) => None,
        }
    }

    /// Latest accepted remote sample, for observers.
    #[must_use]
    pub const fn remote_sample(&self) -> Option<RemoteSample> {
        match &self.state {
            EntityState::Authority(_) => None,
            EntityState::Observer(state) => state.sample,
        }
    }

    /// Number of samples discarded as stale.
    #[must_use]
    pub const fn stale_discards(&self) -> u64 {
        match &self.state {
            EntityState::Authority(_) => 0,
            EntityState::Observer(state) => state.filter.discarded(),
        }
    }
}
