//! Core value types: the generic [`Group`] and its tooling read model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::GroupKind;
use crate::ids::{ActorId, GroupId};

/// Milliseconds read from the engine's injected monotonic clock.
pub type Timestamp = u64;

/// A membership group of any kind, keyed by member type `M`.
///
/// `size` is a cache of `members.len()` that the engine recomputes on every
/// membership change. Code that mutates `members` directly must call the
/// engine's `refresh` afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group<M> {
    /// Kind-namespaced identifier, also usable as a chat-room name.
    pub id: GroupId,
    /// Clock reading when the group was built.
    pub created_at: Timestamp,
    /// Variant tag.
    pub kind: GroupKind,
    /// Owner-assigned display name (empty by default).
    pub name: String,
    /// Current owner. `None` only after disband or on corrupted input.
    pub owner: Option<M>,
    /// Cached member count.
    pub size: usize,
    /// Members mapped to their join timestamp.
    pub members: BTreeMap<M, Timestamp>,
    /// Pending candidates mapped to the time of their latest invite.
    pub invitations: BTreeMap<M, Timestamp>,
}

impl<M: Ord> Group<M> {
    /// Whether `key` is currently a member.
    pub fn is_member(&self, key: &M) -> bool {
        self.members.contains_key(key)
    }

    /// Whether `key` is the current owner.
    pub fn is_owner(&self, key: &M) -> bool {
        self.owner.as_ref() == Some(key)
    }

    /// When `key` joined, if it is a member.
    pub fn joined_at(&self, key: &M) -> Option<Timestamp> {
        self.members.get(key).copied()
    }

    /// Milliseconds the group has existed at `now` (zero if the clock is behind).
    pub const fn age(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.created_at)
    }
}

/// Snapshot of a party for management screens.
///
/// Built from a live group; invitations are copied as they are, so callers
/// purge expired entries through the engine before taking the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PartySummary {
    /// Party identifier.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Current leader, if any.
    pub owner: Option<ActorId>,
    /// Members in join order.
    pub members: Vec<ActorId>,
    /// Candidates with a pending invitation.
    pub pending_invitations: Vec<ActorId>,
    /// Clock reading at creation.
    pub created_at: Timestamp,
}

impl From<&Group<ActorId>> for PartySummary {
    fn from(group: &Group<ActorId>) -> Self {
        let mut members: Vec<(ActorId, Timestamp)> =
            group.members.iter().map(|(id, ts)| (*id, *ts)).collect();
        members.sort_by_key(|(id, ts)| (*ts, *id));

        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            owner: group.owner,
            members: members.into_iter().map(|(id, _)| id).collect(),
            pending_invitations: group.invitations.keys().copied().collect(),
            created_at: group.created_at,
        }
    }
}
