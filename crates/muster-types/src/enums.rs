//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The variant tag of a group.
///
/// Every kind shares the generic membership engine; kind-specific policy
/// (exclusivity, capacity) is layered on top by a specialized engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// A small adventuring party. An actor belongs to at most one.
    Party,
    /// A larger, non-exclusive allegiance.
    Faction,
}

impl GroupKind {
    /// The lowercase tag used inside group ids.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Party => "party",
            Self::Faction => "faction",
        }
    }
}

impl core::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
