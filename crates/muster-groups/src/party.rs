//! Party engine: actor-keyed groups with exclusivity and a size cap.
//!
//! Layers two rules over the generic [`GroupEngine`]:
//!
//! - An actor belongs to at most one party. Membership is mirrored on the
//!   actor's party back-reference, which only this engine writes:
//!   `actor.party() == Some(P.id)` iff the actor is a member of `P`.
//! - A party never grows past [`PartyPolicy::max_size`].
//!
//! [`PartyEngine::cleanup_expired_parties`] sweeps idle and corrupted
//! parties in one pass over the registry.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use muster_types::{ActorId, Group, GroupId, GroupKind, PartySummary, Timestamp};
use tracing::{debug, info, warn};

use crate::clock::EngineDeps;
use crate::config::PartyPolicy;
use crate::engine::GroupEngine;
use crate::error::GroupError;
use crate::world::{Actor, ActorRegistry, World};

/// What happened when an actor left a party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The actor left; the party continues under the same owner.
    Left,
    /// The owner left and leadership passed to the longest-standing member.
    LeftAndPromoted {
        /// The new owner.
        new_owner: ActorId,
    },
    /// The owner was alone, so the party was disbanded.
    Disbanded,
}

/// Whether an actor may join a party right now.
enum JoinCheck {
    /// The back-reference already names this party.
    AlreadyJoined,
    /// Exclusivity and capacity both allow the join.
    Allowed,
}

/// Party operations over a borrowed [`World`].
pub struct PartyEngine<'w> {
    groups: GroupEngine<'w, ActorId>,
    actors: &'w mut ActorRegistry,
    policy: PartyPolicy,
}

impl<'w> PartyEngine<'w> {
    /// Bind a party engine to `world`.
    pub fn new(world: &'w mut World, deps: &'w mut EngineDeps, policy: PartyPolicy) -> Self {
        let World { groups, actors } = world;
        Self {
            groups: GroupEngine::new(GroupKind::Party, policy.group_policy(), deps, groups),
            actors,
            policy,
        }
    }

    fn actor(&self, actor_id: ActorId) -> Result<&Actor, GroupError> {
        self.actors
            .get(&actor_id)
            .ok_or(GroupError::ActorNotFound { actor: actor_id })
    }

    fn set_back_reference(&mut self, actor_id: ActorId, party: Option<GroupId>) {
        if let Some(actor) = self.actors.get_mut(&actor_id) {
            actor.party = party;
        }
    }

    /// Clear a back-reference that points at a party which no longer exists.
    fn heal_dangling(&mut self, actor_id: ActorId, err: GroupError) -> GroupError {
        if let GroupError::NotFound { group } = &err {
            warn!(actor = %actor_id, party = %group, "Clearing back-reference to missing party");
            self.set_back_reference(actor_id, None);
        }
        err
    }

    fn check_can_join(&self, id: &GroupId, actor_id: ActorId) -> Result<JoinCheck, GroupError> {
        match self.actor(actor_id)?.party() {
            Some(current) if current == id => return Ok(JoinCheck::AlreadyJoined),
            Some(current) => {
                return Err(GroupError::AlreadyInDifferentParty {
                    actor: actor_id,
                    party: current.clone(),
                });
            }
            None => {}
        }
        self.check_capacity(id)?;
        Ok(JoinCheck::Allowed)
    }

    fn check_capacity(&self, id: &GroupId) -> Result<(), GroupError> {
        if self.groups.get_group(id)?.size >= self.policy.max_size {
            return Err(GroupError::PartyFull {
                party: id.clone(),
                limit: self.policy.max_size,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Creation and lookup
    // -----------------------------------------------------------------------

    /// Create a party owned by `owner`.
    ///
    /// The owner is a member of the new party, but their back-reference is
    /// not set here; call [`add_party_member`](Self::add_party_member) for
    /// the owner too, or use [`found_party`](Self::found_party).
    pub fn create_party(&mut self, owner: ActorId) -> Result<&Group<ActorId>, GroupError> {
        self.groups.create_group(owner)
    }

    /// [`create_party`](Self::create_party) with a transform over the defaults.
    pub fn create_party_with(
        &mut self,
        owner: ActorId,
        transform: impl FnOnce(&mut Group<ActorId>),
    ) -> Result<&Group<ActorId>, GroupError> {
        self.groups.create_group_with(owner, transform)
    }

    /// Create a party and point the owner's back-reference at it.
    ///
    /// The owner already holds the first seat, so this works for any
    /// capacity, including a single-seat policy.
    ///
    /// # Errors
    ///
    /// [`GroupError::ActorNotFound`] if the owner does not exist, and
    /// [`GroupError::AlreadyInDifferentParty`] if they already have a party.
    pub fn found_party(
        &mut self,
        owner: ActorId,
        transform: impl FnOnce(&mut Group<ActorId>),
    ) -> Result<GroupId, GroupError> {
        if let Some(current) = self.actor(owner)?.party() {
            return Err(GroupError::AlreadyInDifferentParty {
                actor: owner,
                party: current.clone(),
            });
        }
        let id = self.groups.create_group_with(owner, transform)?.id.clone();
        self.set_back_reference(owner, Some(id.clone()));
        Ok(id)
    }

    /// Look up a party.
    pub fn get_party(&self, id: &GroupId) -> Result<&Group<ActorId>, GroupError> {
        self.groups.get_group(id)
    }

    /// The party an actor belongs to, resolved through its back-reference.
    pub fn party_of(&self, actor_id: ActorId) -> Result<Option<&Group<ActorId>>, GroupError> {
        let actor = self.actor(actor_id)?;
        Ok(actor
            .party()
            .and_then(|party| self.groups.get_group(party).ok()))
    }

    /// Every live party.
    pub fn parties(&self) -> impl Iterator<Item = &Group<ActorId>> {
        self.groups.groups_of_kind()
    }

    /// A management-screen snapshot, taken after purging stale invitations.
    pub fn summary(&mut self, id: &GroupId) -> Result<PartySummary, GroupError> {
        self.groups.cleanup_expired_invitations(id)?;
        Ok(PartySummary::from(self.groups.get_group(id)?))
    }

    /// Whether two parties are the same party.
    pub fn same_party(a: &Group<ActorId>, b: &Group<ActorId>) -> bool {
        GroupEngine::same_group(a, b)
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Whether `actor_id` is a member of party `id`.
    pub fn is_party_member(&self, id: &GroupId, actor_id: ActorId) -> Result<bool, GroupError> {
        self.groups.is_member(id, &actor_id)
    }

    /// Add an actor to a party and point its back-reference at it.
    ///
    /// Silently succeeds if the actor's back-reference already names this
    /// party. Otherwise a party at capacity refuses the call, even when the
    /// actor already sits in its member set.
    ///
    /// # Errors
    ///
    /// - [`GroupError::ActorNotFound`] if the actor does not exist.
    /// - [`GroupError::AlreadyInDifferentParty`] if it belongs elsewhere.
    /// - [`GroupError::PartyFull`] if the party is at capacity.
    pub fn add_party_member(&mut self, id: &GroupId, actor_id: ActorId) -> Result<(), GroupError> {
        if let JoinCheck::AlreadyJoined = self.check_can_join(id, actor_id)? {
            return Ok(());
        }
        self.groups.add_member(id, actor_id)?;
        self.set_back_reference(actor_id, Some(id.clone()));
        debug!(party = %id, actor = %actor_id, "Actor joined party");
        Ok(())
    }

    /// Remove an actor from a party and clear its back-reference.
    ///
    /// # Errors
    ///
    /// - [`GroupError::ActorNotFound`] if the actor does not exist.
    /// - [`GroupError::NotInThisParty`] if its back-reference names another
    ///   party or none.
    /// - [`GroupError::ForbiddenOperation`] if the actor is the owner.
    pub fn remove_party_member(&mut self, id: &GroupId, actor_id: ActorId) -> Result<(), GroupError> {
        if !self.actor(actor_id)?.is_in_party(id) {
            return Err(GroupError::NotInThisParty {
                actor: actor_id,
                party: id.clone(),
            });
        }
        if let Err(err) = self.groups.remove_member(id, &actor_id) {
            return Err(self.heal_dangling(actor_id, err));
        }
        self.set_back_reference(actor_id, None);
        debug!(party = %id, actor = %actor_id, "Actor left party");
        Ok(())
    }

    /// Make `actor_id` the party leader.
    pub fn set_party_leader(&mut self, id: &GroupId, actor_id: ActorId) -> Result<(), GroupError> {
        self.groups.set_leader(id, &actor_id)
    }

    /// Leave a party, handing over leadership or disbanding as needed.
    ///
    /// A departing owner is replaced by the member who joined earliest. An
    /// owner with nobody left to lead disbands the party.
    pub fn leave_party(&mut self, id: &GroupId, actor_id: ActorId) -> Result<LeaveOutcome, GroupError> {
        if !self.actor(actor_id)?.is_in_party(id) {
            return Err(GroupError::NotInThisParty {
                actor: actor_id,
                party: id.clone(),
            });
        }

        let lookup = self
            .groups
            .get_group(id)
            .map(|party| (party.is_owner(&actor_id), longest_standing_except(party, actor_id)));
        let (is_owner, successor) = match lookup {
            Ok(found) => found,
            Err(err) => return Err(self.heal_dangling(actor_id, err)),
        };

        if !is_owner {
            self.remove_party_member(id, actor_id)?;
            return Ok(LeaveOutcome::Left);
        }

        match successor {
            Some(new_owner) => {
                self.groups.set_leader(id, &new_owner)?;
                self.remove_party_member(id, actor_id)?;
                info!(party = %id, from = %actor_id, to = %new_owner, "Party leadership handed over");
                Ok(LeaveOutcome::LeftAndPromoted { new_owner })
            }
            None => {
                self.disband_party(id)?;
                Ok(LeaveOutcome::Disbanded)
            }
        }
    }

    /// Disband a party and clear every member's back-reference.
    pub fn disband_party(&mut self, id: &GroupId) -> Result<Group<ActorId>, GroupError> {
        let actors = &mut *self.actors;
        self.groups.disband(id, |member| {
            if let Some(actor) = actors.get_mut(member) {
                if actor.is_in_party(id) {
                    actor.party = None;
                }
            }
        })
    }

    // -----------------------------------------------------------------------
    // Invitations
    // -----------------------------------------------------------------------

    /// Invite an actor, or refresh an existing invitation.
    ///
    /// # Errors
    ///
    /// [`GroupError::ActorNotFound`] or [`GroupError::AlreadyMember`].
    pub fn invite_to_party(&mut self, id: &GroupId, actor_id: ActorId) -> Result<(), GroupError> {
        self.actor(actor_id)?;
        self.groups.invite(id, actor_id)
    }

    /// Whether the actor holds a valid invitation.
    pub fn is_invited_to_party(&mut self, id: &GroupId, actor_id: ActorId) -> Result<bool, GroupError> {
        self.groups.is_invited(id, &actor_id)
    }

    /// The live invitations of a party, after purging expired ones.
    pub fn party_invitations(
        &mut self,
        id: &GroupId,
    ) -> Result<&BTreeMap<ActorId, Timestamp>, GroupError> {
        self.groups.get_invitations(id)
    }

    /// Accept an invitation, subject to the same rules as
    /// [`add_party_member`](Self::add_party_member).
    ///
    /// The invitation is only consumed when the join goes through, so an
    /// actor refused for being in another party can leave it and accept
    /// later while the invitation is still valid.
    pub fn accept_party_invitation(&mut self, id: &GroupId, actor_id: ActorId) -> Result<(), GroupError> {
        self.actor(actor_id)?;
        if !self.groups.is_invited(id, &actor_id)? {
            return Err(GroupError::NoPendingInvitation { group: id.clone() });
        }
        match self.check_can_join(id, actor_id)? {
            JoinCheck::AlreadyJoined if self.groups.is_member(id, &actor_id)? => {
                self.groups.reject_invitation(id, &actor_id)
            }
            JoinCheck::AlreadyJoined => {
                warn!(party = %id, actor = %actor_id, "Back-reference without membership, joining");
                self.check_capacity(id)?;
                self.join_by_invitation(id, actor_id)
            }
            JoinCheck::Allowed => self.join_by_invitation(id, actor_id),
        }
    }

    fn join_by_invitation(&mut self, id: &GroupId, actor_id: ActorId) -> Result<(), GroupError> {
        self.groups.accept_invitation(id, actor_id)?;
        self.set_back_reference(actor_id, Some(id.clone()));
        debug!(party = %id, actor = %actor_id, "Invitation accepted");
        Ok(())
    }

    /// Decline an invitation.
    pub fn reject_party_invitation(&mut self, id: &GroupId, actor_id: ActorId) -> Result<(), GroupError> {
        self.groups.reject_invitation(id, &actor_id)
    }

    // -----------------------------------------------------------------------
    // Sweep
    // -----------------------------------------------------------------------

    /// Disband every idle or corrupted party in one pass.
    ///
    /// Expired invitations are purged first. A party is disbanded when it
    /// has no members at all, or when it has nobody beyond its owner, no
    /// valid invitations, and has existed longer than the invitation
    /// timeout. Never fails; returns the disbanded parties.
    pub fn cleanup_expired_parties(&mut self) -> Vec<Group<ActorId>> {
        let timeout = self.policy.invitation_timeout_ms;
        let mut corrupted = BTreeSet::new();

        let stale = self.groups.collect_stale(|party, now| {
            if party.members.is_empty() {
                warn!(party = %party.id, "Party has no members, disbanding");
                corrupted.insert(party.id.clone());
                return true;
            }
            is_idle(party, now, timeout)
        });

        let mut disbanded = Vec::with_capacity(stale.len());
        for id in &stale {
            match self.disband_party(id) {
                Ok(party) => disbanded.push(party),
                Err(err) => warn!(party = %id, %err, "Sweep could not disband party"),
            }
        }

        // Back-references into an empty party were never reached through
        // its member list.
        if !corrupted.is_empty() {
            for actor in self.actors.values_mut() {
                if actor.party.as_ref().is_some_and(|p| corrupted.contains(p)) {
                    actor.party = None;
                }
            }
        }

        if !disbanded.is_empty() {
            info!(disbanded = disbanded.len(), corrupted = corrupted.len(), "Party sweep complete");
        }
        disbanded
    }
}

/// A lone owner, nothing pending, older than the timeout.
fn is_idle(party: &Group<ActorId>, now: Timestamp, timeout_ms: u64) -> bool {
    party.size <= 1 && party.invitations.is_empty() && party.age(now) > timeout_ms
}

/// The member other than `actor_id` who joined first (ties broken by id).
fn longest_standing_except(party: &Group<ActorId>, actor_id: ActorId) -> Option<ActorId> {
    party
        .members
        .iter()
        .filter(|(member, _)| **member != actor_id)
        .min_by_key(|(member, joined)| (**joined, **member))
        .map(|(member, _)| *member)
}
