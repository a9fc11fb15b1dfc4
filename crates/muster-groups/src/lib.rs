//! Group membership logic for the Muster world simulation.
//!
//! This crate holds every rule about who belongs to which group, with no
//! I/O. It sits between `muster-types` (which defines the data structures)
//! and the `muster-engine` binary (which seeds a world and runs the sweep).
//!
//! # Modules
//!
//! - [`clock`] -- Injected time and id sources ([`EngineDeps`])
//! - [`config`] -- Invitation and capacity policies ([`PartyPolicy`])
//! - [`engine`] -- The generic engine shared by every group kind ([`GroupEngine`])
//! - [`error`] -- Error types for all membership operations ([`GroupError`])
//! - [`factory`] -- Construction of new groups with sensible defaults
//! - [`party`] -- Party exclusivity, capacity, and the idle sweep ([`PartyEngine`])
//! - [`world`] -- Group and actor registries ([`World`])

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod party;
pub mod world;

// Re-export primary types at crate root for convenience.
pub use clock::{
    Clock, DEFAULT_ID_SUFFIX_LEN, EngineDeps, IdGenerator, ManualClock, MonotonicClock,
    RoomSafeIdGenerator, SequentialIdGenerator,
};
pub use config::{
    ConfigError, DEFAULT_INVITATION_TIMEOUT_MS, DEFAULT_MAX_PARTY_SIZE, GroupPolicy, PartyPolicy,
};
pub use engine::GroupEngine;
pub use error::{ForbiddenReason, GroupError};
pub use factory::build_group;
pub use party::{LeaveOutcome, PartyEngine};
pub use world::{Actor, ActorRegistry, GroupRegistry, World};
