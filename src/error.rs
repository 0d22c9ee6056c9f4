//! Error type for the synchronisation API.
//!
//! The tick loop itself never fails: a missing reference frame or a missing
//! sample only postpones work. These variants cover misuse of the API and
//! malformed wire input.

use thiserror::Error;

use crate::message::EntityId;

/// Failures reported by the sync engine and the wire codec.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The entity id has not been registered with the engine.
    #[error("entity {0} is not registered")]
    UnknownEntity(EntityId),
    /// The entity id is already registered.
    #[error("entity {0} is already registered")]
    AlreadyRegistered(EntityId),
    /// A local pose was supplied for an entity this participant observes.
    #[error("entity {0} is observed here; only its authority may set its pose")]
    NotAuthority(EntityId),
    /// A pose contained NaN or infinite components.
    #[error("pose for entity {entity} has non-finite components")]
    InvalidPose {
        /// Entity the rejected pose was meant for.
        entity: EntityId,
    },
    /// The configuration failed validation.
    #[error("invalid sync configuration: {0}")]
    InvalidConfig(String),
    /// Serialising a message failed.
    #[error("failed to encode pose update: {0}")]
    Encode(#[source] serde_json::Error),
    /// Parsing a message or configuration failed.
    #[error("failed to decode payload: {0}")]
    Decode(#[source] serde_json::Error),
    /// Reading a configuration file failed.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The transport refused an outgoing update.
    #[error("transport rejected update for entity {entity}: {detail}")]
    Transport {
        /// Entity whose update was rejected.
        entity: EntityId,
        /// Transport-provided description.
        detail: String,
    },
}
