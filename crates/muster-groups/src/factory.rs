//! Construction of fresh group values.

use std::collections::BTreeMap;

use muster_types::{Group, GroupId, GroupKind};

use crate::clock::EngineDeps;

/// Build a group of `kind` owned by `owner`.
///
/// The id is `group:<kind>:<suffix>` with the suffix taken from the injected
/// id generator, `created_at` is the injected clock's reading, and the owner
/// is already a member (joined at `created_at`, `size == 1`). `transform`
/// runs last and may adjust defaults such as `name`; it is trusted not to
/// break the group's invariants.
pub fn build_group<M: Ord + Clone>(
    kind: GroupKind,
    owner: M,
    deps: &mut EngineDeps,
    transform: impl FnOnce(&mut Group<M>),
) -> Group<M> {
    let now = deps.now();
    let id = GroupId::compose(kind, &deps.next_id());

    let mut members = BTreeMap::new();
    members.insert(owner.clone(), now);

    let mut group = Group {
        id,
        created_at: now,
        kind,
        name: String::new(),
        owner: Some(owner),
        size: 1,
        members,
        invitations: BTreeMap::new(),
    };
    transform(&mut group);
    group
}
