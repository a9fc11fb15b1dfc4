//! Startup roster: spawn the configured actors and found their parties.

use muster_groups::{EngineDeps, PartyEngine, PartyPolicy, World};
use muster_types::{ActorId, GroupId};
use tracing::{info, warn};

use crate::config::RosterConfig;
use crate::error::EngineError;

/// Populate `world` from the roster.
///
/// Duplicate actor names are spawned once. Parties are founded in order,
/// so an actor listed in two parties fails the second with
/// `AlreadyInDifferentParty`.
///
/// # Errors
///
/// [`EngineError::UnknownActor`] if a party names an actor missing from
/// `roster.actors`, and [`EngineError::Group`] if a membership rule rejects
/// the roster.
pub fn seed_world(
    roster: &RosterConfig,
    world: &mut World,
    deps: &mut EngineDeps,
    policy: PartyPolicy,
) -> Result<Vec<GroupId>, EngineError> {
    for name in &roster.actors {
        if world.actor_by_name(name).is_some() {
            warn!(name = %name, "Duplicate actor in roster, skipping");
            continue;
        }
        world.spawn_actor(name.clone());
    }

    let mut founded = Vec::with_capacity(roster.parties.len());
    for seed in &roster.parties {
        let owner = resolve(world, &seed.owner)?;
        let members = resolve_all(world, &seed.members)?;
        let invited = resolve_all(world, &seed.invited)?;

        let mut parties = PartyEngine::new(world, deps, policy);
        let id = parties.found_party(owner, |party| {
            if let Some(name) = &seed.name {
                party.name.clone_from(name);
            }
        })?;
        for member in members {
            parties.add_party_member(&id, member)?;
        }
        for actor in invited {
            parties.invite_to_party(&id, actor)?;
        }

        info!(
            party = %id,
            owner = %seed.owner,
            members = seed.members.len(),
            invited = seed.invited.len(),
            "Seed party founded"
        );
        founded.push(id);
    }

    Ok(founded)
}

fn resolve(world: &World, name: &str) -> Result<ActorId, EngineError> {
    world
        .actor_by_name(name)
        .map(|actor| actor.id)
        .ok_or_else(|| EngineError::UnknownActor {
            name: name.to_owned(),
        })
}

fn resolve_all(world: &World, names: &[String]) -> Result<Vec<ActorId>, EngineError> {
    names.iter().map(|name| resolve(world, name)).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use muster_groups::{GroupError, ManualClock, SequentialIdGenerator};

    use super::*;
    use crate::config::SeedParty;

    fn deps() -> EngineDeps {
        EngineDeps::new(ManualClock::default(), SequentialIdGenerator::new())
    }

    fn seed_party(owner: &str, members: &[&str]) -> SeedParty {
        SeedParty {
            owner: owner.to_owned(),
            name: None,
            members: members.iter().map(|m| (*m).to_owned()).collect(),
            invited: Vec::new(),
        }
    }

    fn roster(actors: &[&str], parties: Vec<SeedParty>) -> RosterConfig {
        RosterConfig {
            actors: actors.iter().map(|a| (*a).to_owned()).collect(),
            parties,
        }
    }

    #[test]
    fn spawns_actors_and_founds_parties() {
        let mut world = World::new();
        let mut deps = deps();
        let mut lanterns = seed_party("Alice", &["Bob"]);
        lanterns.name = Some(String::from("Lanterns"));
        lanterns.invited = vec![String::from("Eve")];
        let roster = roster(&["Alice", "Bob", "Eve"], vec![lanterns]);

        let founded = seed_world(&roster, &mut world, &mut deps, PartyPolicy::default()).unwrap();

        assert_eq!(world.actors.len(), 3);
        assert_eq!(founded.len(), 1);
        let id = founded.first().unwrap();
        let party = world.groups.get(id).unwrap();
        assert_eq!(party.name, "Lanterns");
        assert_eq!(party.size, 2);
        assert_eq!(party.invitations.len(), 1);

        let bob = world.actor_by_name("Bob").unwrap();
        assert_eq!(bob.party(), Some(id));
        assert_eq!(world.actor_by_name("Eve").unwrap().party(), None);
    }

    #[test]
    fn duplicate_names_spawn_once() {
        let mut world = World::new();
        let mut deps = deps();
        let roster = roster(&["Alice", "Alice"], Vec::new());
        seed_world(&roster, &mut world, &mut deps, PartyPolicy::default()).unwrap();
        assert_eq!(world.actors.len(), 1);
    }

    #[test]
    fn unknown_actor_is_rejected() {
        let mut world = World::new();
        let mut deps = deps();
        let roster = roster(&["Alice"], vec![seed_party("Alice", &["Zed"])]);
        let err = seed_world(&roster, &mut world, &mut deps, PartyPolicy::default()).unwrap_err();
        assert!(matches!(err, EngineError::UnknownActor { name } if name == "Zed"));
    }

    #[test]
    fn over_capacity_roster_is_rejected() {
        let mut world = World::new();
        let mut deps = deps();
        let roster = roster(
            &["Alice", "Bob", "Carol", "Dave"],
            vec![seed_party("Alice", &["Bob", "Carol", "Dave"])],
        );
        let err = seed_world(&roster, &mut world, &mut deps, PartyPolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Group {
                source: GroupError::PartyFull { limit: 3, .. }
            }
        ));
    }

    #[test]
    fn actor_in_two_seed_parties_is_rejected() {
        let mut world = World::new();
        let mut deps = deps();
        let roster = roster(
            &["Alice", "Bob", "Carol"],
            vec![seed_party("Alice", &["Bob"]), seed_party("Carol", &["Bob"])],
        );
        let err = seed_world(&roster, &mut world, &mut deps, PartyPolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Group {
                source: GroupError::AlreadyInDifferentParty { .. }
            }
        ));
    }
}
