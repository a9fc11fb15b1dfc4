//! The slice of world state the engines read and write.
//!
//! The surrounding simulation owns the [`World`]; the engines borrow its
//! registries for the duration of a call sequence and mutate entries in
//! place. The actor's party back-reference is private to this crate, so the
//! party engine is its only writer.

use std::collections::BTreeMap;

use muster_types::{ActorId, Group, GroupId};

/// Every group of every kind, keyed by id.
pub type GroupRegistry<M> = BTreeMap<GroupId, Group<M>>;

/// Every actor in the world, keyed by id.
pub type ActorRegistry = BTreeMap<ActorId, Actor>;

/// The fields of an actor this engine cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Unique identifier.
    pub id: ActorId,
    /// Display name.
    pub name: String,
    /// Party back-reference, written only by the party engine.
    pub(crate) party: Option<GroupId>,
}

impl Actor {
    /// An actor with a fresh id who belongs to no party.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(ActorId::new(), name)
    }

    /// An actor with an existing id who belongs to no party.
    pub fn with_id(id: ActorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            party: None,
        }
    }

    /// The party this actor belongs to, if any.
    pub const fn party(&self) -> Option<&GroupId> {
        self.party.as_ref()
    }

    /// Whether the actor belongs to party `id`.
    pub fn is_in_party(&self, id: &GroupId) -> bool {
        self.party.as_ref() == Some(id)
    }
}

/// The world registries shared with the rest of the simulation.
#[derive(Debug, Clone, Default)]
pub struct World {
    /// All groups (parties, factions, ...).
    pub groups: GroupRegistry<ActorId>,
    /// All actors.
    pub actors: ActorRegistry,
}

impl World {
    /// An empty world.
    pub const fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
            actors: BTreeMap::new(),
        }
    }

    /// Add a new actor and return its id.
    pub fn spawn_actor(&mut self, name: impl Into<String>) -> ActorId {
        let actor = Actor::new(name);
        let id = actor.id;
        self.actors.insert(id, actor);
        id
    }

    /// Look up an actor.
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Find an actor by display name (first match in id order).
    pub fn actor_by_name(&self, name: &str) -> Option<&Actor> {
        self.actors
            .values()
            .find(|actor| actor.name.eq_ignore_ascii_case(name))
    }
}
