//! Generic group engine, shared by every group kind.
//!
//! A [`GroupEngine`] is bound to one [`GroupKind`] and borrows the world's
//! group registry mutably. It only sees groups of its own kind: an id that
//! names a group of another kind is reported as [`GroupError::NotFound`].
//!
//! # Invariants
//!
//! - `size == members.len()` after every operation that changes membership.
//! - The owner is a member, except after [`GroupEngine::disband`].
//! - A key is never both a member and invited.
//! - Readers purge expired invitations before answering.
//!
//! Capacity and exclusivity are not enforced here; kind-specific engines
//! such as [`PartyEngine`](crate::party::PartyEngine) layer them on top.

use std::collections::BTreeMap;
use std::fmt::Debug;

use muster_types::{Group, GroupId, GroupKind, Timestamp};
use tracing::{debug, info, warn};

use crate::clock::EngineDeps;
use crate::config::GroupPolicy;
use crate::error::{ForbiddenReason, GroupError};
use crate::factory;
use crate::world::GroupRegistry;

/// How many fresh ids to try before giving up on a collision streak.
const MAX_ID_ATTEMPTS: u32 = 16;

/// Membership, leadership, and invitation operations for one group kind.
pub struct GroupEngine<'w, M> {
    kind: GroupKind,
    policy: GroupPolicy,
    deps: &'w mut EngineDeps,
    groups: &'w mut GroupRegistry<M>,
}

impl<'w, M: Ord + Clone + Debug> GroupEngine<'w, M> {
    /// Bind an engine to `kind` over the given registry.
    pub const fn new(
        kind: GroupKind,
        policy: GroupPolicy,
        deps: &'w mut EngineDeps,
        groups: &'w mut GroupRegistry<M>,
    ) -> Self {
        Self {
            kind,
            policy,
            deps,
            groups,
        }
    }

    /// The injected clock's current reading.
    pub fn now(&self) -> Timestamp {
        self.deps.now()
    }

    // -----------------------------------------------------------------------
    // Creation and lookup
    // -----------------------------------------------------------------------

    /// Create and register a group owned by `owner`.
    pub fn create_group(&mut self, owner: M) -> Result<&Group<M>, GroupError> {
        self.create_group_with(owner, |_| {})
    }

    /// Create and register a group, letting `transform` adjust the defaults.
    pub fn create_group_with(
        &mut self,
        owner: M,
        transform: impl FnOnce(&mut Group<M>),
    ) -> Result<&Group<M>, GroupError> {
        let mut group = factory::build_group(self.kind, owner, self.deps, transform);

        let mut attempts: u32 = 1;
        while self.groups.contains_key(&group.id) {
            if attempts >= MAX_ID_ATTEMPTS {
                return Err(GroupError::IdSpaceExhausted { attempts });
            }
            warn!(group = %group.id, "Group id collision, regenerating");
            group.id = GroupId::compose(self.kind, &self.deps.next_id());
            attempts = attempts.saturating_add(1);
        }

        info!(group = %group.id, kind = %self.kind, owner = ?group.owner, "Group created");
        Ok(self.groups.entry(group.id.clone()).or_insert(group))
    }

    /// Look up a group of this engine's kind.
    pub fn get_group(&self, id: &GroupId) -> Result<&Group<M>, GroupError> {
        self.groups
            .get(id)
            .filter(|group| group.kind == self.kind)
            .ok_or_else(|| GroupError::NotFound { group: id.clone() })
    }

    fn group_mut(&mut self, id: &GroupId) -> Result<&mut Group<M>, GroupError> {
        let kind = self.kind;
        self.groups
            .get_mut(id)
            .filter(|group| group.kind == kind)
            .ok_or_else(|| GroupError::NotFound { group: id.clone() })
    }

    /// Every registered group of this engine's kind.
    pub fn groups_of_kind(&self) -> impl Iterator<Item = &Group<M>> {
        let kind = self.kind;
        self.groups.values().filter(move |group| group.kind == kind)
    }

    /// Whether two groups are the same group.
    pub fn same_group(a: &Group<M>, b: &Group<M>) -> bool {
        a.id == b.id
    }

    /// Change a group's display name.
    pub fn rename_group(&mut self, id: &GroupId, name: impl Into<String>) -> Result<(), GroupError> {
        let group = self.group_mut(id)?;
        group.name = name.into();
        debug!(group = %id, name = %group.name, "Group renamed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Whether `key` is a member of group `id`.
    pub fn is_member(&self, id: &GroupId, key: &M) -> Result<bool, GroupError> {
        Ok(self.get_group(id)?.is_member(key))
    }

    /// Add `key` as a member. No-op if it already is one.
    ///
    /// Any pending invitation for `key` is dropped, since members cannot be
    /// invited.
    pub fn add_member(&mut self, id: &GroupId, key: M) -> Result<(), GroupError> {
        let now = self.now();
        let group = self.group_mut(id)?;
        if group.is_member(&key) {
            return Ok(());
        }
        group.invitations.remove(&key);
        debug!(group = %id, member = ?key, "Member added");
        group.members.insert(key, now);
        refresh_group(group);
        Ok(())
    }

    /// Remove `key` from the group. No-op if it is not a member.
    ///
    /// # Errors
    ///
    /// [`GroupError::ForbiddenOperation`] if `key` is the owner.
    pub fn remove_member(&mut self, id: &GroupId, key: &M) -> Result<(), GroupError> {
        let group = self.group_mut(id)?;
        if group.is_owner(key) {
            return Err(GroupError::ForbiddenOperation {
                group: id.clone(),
                reason: ForbiddenReason::RemoveOwner,
            });
        }
        if group.members.remove(key).is_some() {
            debug!(group = %id, member = ?key, "Member removed");
            refresh_group(group);
        }
        Ok(())
    }

    /// Recompute the cached size and heal a missing owner.
    pub fn refresh(&mut self, id: &GroupId) -> Result<(), GroupError> {
        refresh_group(self.group_mut(id)?);
        Ok(())
    }

    /// Make `key` the owner.
    ///
    /// # Errors
    ///
    /// [`GroupError::ForbiddenOperation`] if `key` is not a member.
    pub fn set_leader(&mut self, id: &GroupId, key: &M) -> Result<(), GroupError> {
        let group = self.group_mut(id)?;
        if !group.is_member(key) {
            return Err(GroupError::ForbiddenOperation {
                group: id.clone(),
                reason: ForbiddenReason::LeaderNotMember,
            });
        }
        if group.is_owner(key) {
            return Ok(());
        }
        debug!(group = %id, previous = ?group.owner, leader = ?key, "Leadership transferred");
        group.owner = Some(key.clone());
        refresh_group(group);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Invitations
    // -----------------------------------------------------------------------

    /// Invite `key`, or refresh the timestamp of an existing invitation.
    ///
    /// # Errors
    ///
    /// [`GroupError::AlreadyMember`] if `key` is a member.
    pub fn invite(&mut self, id: &GroupId, key: M) -> Result<(), GroupError> {
        let now = self.now();
        let group = self.group_mut(id)?;
        if group.is_member(&key) {
            return Err(GroupError::AlreadyMember { group: id.clone() });
        }
        debug!(group = %id, candidate = ?key, at = now, "Invitation sent");
        group.invitations.insert(key, now);
        Ok(())
    }

    /// Whether an invitation sent at `sent_at` has lapsed by `now`.
    pub const fn is_expired(&self, sent_at: Timestamp, now: Timestamp) -> bool {
        self.policy.is_expired(sent_at, now)
    }

    /// Drop every expired invitation of the group. Returns how many went.
    pub fn cleanup_expired_invitations(&mut self, id: &GroupId) -> Result<usize, GroupError> {
        let now = self.now();
        let policy = self.policy;
        let group = self.group_mut(id)?;
        Ok(purge_expired(group, &policy, now))
    }

    /// Whether `key` holds a valid invitation. Purges expired ones first.
    pub fn is_invited(&mut self, id: &GroupId, key: &M) -> Result<bool, GroupError> {
        self.cleanup_expired_invitations(id)?;
        Ok(self.get_group(id)?.invitations.contains_key(key))
    }

    /// The live invitation map, after purging expired entries.
    ///
    /// The view borrows the engine, so it cannot outlive the next mutation.
    pub fn get_invitations(
        &mut self,
        id: &GroupId,
    ) -> Result<&BTreeMap<M, Timestamp>, GroupError> {
        self.cleanup_expired_invitations(id)?;
        Ok(&self.get_group(id)?.invitations)
    }

    /// Consume `key`'s invitation and make it a member.
    ///
    /// # Errors
    ///
    /// [`GroupError::NoPendingInvitation`] if there is no valid invitation.
    pub fn accept_invitation(&mut self, id: &GroupId, key: M) -> Result<(), GroupError> {
        self.take_invitation(id, &key)?;
        self.add_member(id, key)
    }

    /// Consume `key`'s invitation without joining.
    ///
    /// # Errors
    ///
    /// [`GroupError::NoPendingInvitation`] if there is no valid invitation.
    pub fn reject_invitation(&mut self, id: &GroupId, key: &M) -> Result<(), GroupError> {
        self.take_invitation(id, key)?;
        debug!(group = %id, candidate = ?key, "Invitation rejected");
        Ok(())
    }

    fn take_invitation(&mut self, id: &GroupId, key: &M) -> Result<Timestamp, GroupError> {
        self.cleanup_expired_invitations(id)?;
        self.group_mut(id)?
            .invitations
            .remove(key)
            .ok_or_else(|| GroupError::NoPendingInvitation { group: id.clone() })
    }

    // -----------------------------------------------------------------------
    // Disband and sweep
    // -----------------------------------------------------------------------

    /// Tear the group down and remove it from the registry.
    ///
    /// `on_member_removed` runs once per member before anything is cleared.
    /// Returns the emptied group (no members, invitations, or owner).
    pub fn disband(
        &mut self,
        id: &GroupId,
        mut on_member_removed: impl FnMut(&M),
    ) -> Result<Group<M>, GroupError> {
        self.get_group(id)?;
        let mut group = self
            .groups
            .remove(id)
            .ok_or_else(|| GroupError::NotFound { group: id.clone() })?;

        for key in group.members.keys() {
            on_member_removed(key);
        }
        let removed = group.members.len();

        group.members.clear();
        group.invitations.clear();
        group.size = 0;
        group.owner = None;

        info!(group = %id, kind = %self.kind, removed, "Group disbanded");
        Ok(group)
    }

    /// One pass over every group of this kind: purge expired invitations,
    /// refresh, and collect the ids for which `is_stale` holds.
    ///
    /// `is_stale` sees each group after its purge and refresh, together with
    /// the current clock reading.
    pub fn collect_stale(
        &mut self,
        mut is_stale: impl FnMut(&Group<M>, Timestamp) -> bool,
    ) -> Vec<GroupId> {
        let now = self.now();
        let policy = self.policy;
        let kind = self.kind;

        let mut stale = Vec::new();
        for group in self.groups.values_mut().filter(|g| g.kind == kind) {
            purge_expired(group, &policy, now);
            refresh_group(group);
            if is_stale(group, now) {
                stale.push(group.id.clone());
            }
        }
        stale
    }
}

/// Recompute `size`; promote the first member if the owner is missing.
fn refresh_group<M: Ord + Clone + Debug>(group: &mut Group<M>) {
    group.size = group.members.len();
    if group.owner.is_none() {
        if let Some(first) = group.members.keys().next() {
            warn!(group = %group.id, owner = ?first, "Group had no owner, promoting first member");
            group.owner = Some(first.clone());
        }
    }
}

/// Drop expired invitations in a single pass.
fn purge_expired<M: Ord>(group: &mut Group<M>, policy: &GroupPolicy, now: Timestamp) -> usize {
    let before = group.invitations.len();
    group
        .invitations
        .retain(|_, sent_at| !policy.is_expired(*sent_at, now));
    let purged = before.saturating_sub(group.invitations.len());
    if purged > 0 {
        debug!(group = %group.id, purged, "Expired invitations purged");
    }
    purged
}
