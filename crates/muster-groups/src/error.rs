//! Error types for the group and party engines.
//!
//! Every variant is a caller error: the request is invalid against the
//! current state. Variants carry structured fields so command handlers can
//! branch on the kind without matching message text.

use muster_types::{ActorId, GroupId};

/// Why an operation was refused even though its target exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// The owner cannot be removed; transfer leadership first.
    RemoveOwner,
    /// Only a current member can become leader.
    LeaderNotMember,
}

impl core::fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RemoveOwner => f.write_str("cannot remove the owner, transfer leadership first"),
            Self::LeaderNotMember => f.write_str("leader must be a current member"),
        }
    }
}

/// Errors returned by group and party operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    /// No group of the engine's kind has this id.
    #[error("group not found: {group}")]
    NotFound {
        /// The missing group.
        group: GroupId,
    },

    /// The actor does not exist in the world.
    #[error("actor not found: {actor}")]
    ActorNotFound {
        /// The missing actor.
        actor: ActorId,
    },

    /// The operation would break an ownership invariant.
    #[error("forbidden operation on {group}: {reason}")]
    ForbiddenOperation {
        /// The group the operation targeted.
        group: GroupId,
        /// Which rule refused it.
        reason: ForbiddenReason,
    },

    /// The candidate is already a member and cannot be invited.
    #[error("already a member of {group}")]
    AlreadyMember {
        /// The group.
        group: GroupId,
    },

    /// There is no valid (unexpired) invitation to accept or reject.
    #[error("no pending invitation for {group}")]
    NoPendingInvitation {
        /// The group.
        group: GroupId,
    },

    /// The actor is committed to another party.
    #[error("actor {actor} is already in a different party: {party}")]
    AlreadyInDifferentParty {
        /// The actor.
        actor: ActorId,
        /// The party the actor currently belongs to.
        party: GroupId,
    },

    /// The actor is not a member of the party.
    #[error("actor {actor} is not in party {party}")]
    NotInThisParty {
        /// The actor.
        actor: ActorId,
        /// The party the removal targeted.
        party: GroupId,
    },

    /// The party has reached its configured capacity.
    #[error("party {party} is full (limit {limit})")]
    PartyFull {
        /// The full party.
        party: GroupId,
        /// The configured maximum size.
        limit: usize,
    },

    /// The id generator kept producing ids that are already registered.
    #[error("could not allocate a free group id after {attempts} attempts")]
    IdSpaceExhausted {
        /// How many ids were tried.
        attempts: u32,
    },
}
