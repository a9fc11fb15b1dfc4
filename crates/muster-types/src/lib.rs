//! Shared type definitions for the Muster group membership engine.
//!
//! This crate is the single source of truth for the identifiers and value
//! types used across the workspace. Types meant for party management tooling
//! flow downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Actor and group identifiers
//! - [`enums`] -- Group kind tags
//! - [`structs`] -- The generic [`Group`] value and the [`PartySummary`] read model

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::GroupKind;
pub use ids::{ActorId, GroupId, ROOM_SAFE_ALPHABET};
pub use structs::{Group, PartySummary, Timestamp};

#[cfg(test)]
mod tests {
    //! Binding generation for the tooling-facing types.

    #[test]
    fn export_bindings() {
        // The files are written to the `bindings/` directory relative to the
        // crate root.
        use ts_rs::TS;

        let _ = crate::ids::ActorId::export_all();
        let _ = crate::ids::GroupId::export_all();
        let _ = crate::enums::GroupKind::export_all();
        let _ = crate::structs::PartySummary::export_all();
    }
}
