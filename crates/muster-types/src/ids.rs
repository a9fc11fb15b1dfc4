//! Type-safe identifiers for actors and groups.
//!
//! Actors use UUID v7 (time-ordered) wrappers, the same shape every entity id
//! in the wider simulation has. Group ids are different: they are strings of
//! the form `group:<kind>:<suffix>` because downstream code reuses them as
//! chat-room names, so the suffix is restricted to [`ROOM_SAFE_ALPHABET`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::GroupKind;

/// Characters allowed in the random suffix of a [`GroupId`].
pub const ROOM_SAFE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Prefix shared by every group id.
const GROUP_PREFIX: &str = "group";

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an actor in the world.
    ActorId
}

/// Unique identifier for a group, namespaced by kind.
///
/// Rendered as `group:<kind>:<suffix>`, e.g. `group:party:k3v9q2`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GroupId(String);

impl GroupId {
    /// Build a group id from a kind tag and a random suffix.
    ///
    /// The suffix is taken as-is; use [`GroupId::is_room_safe`] to check it
    /// when it does not come from a room-safe generator.
    pub fn compose(kind: GroupKind, suffix: &str) -> Self {
        Self(format!("{GROUP_PREFIX}:{}:{suffix}", kind.as_str()))
    }

    /// The full id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The random part of the id (everything after the last `:`).
    pub fn suffix(&self) -> &str {
        self.0.rsplit(':').next().unwrap_or_default()
    }

    /// Whether the suffix is non-empty and only uses [`ROOM_SAFE_ALPHABET`].
    pub fn is_room_safe(&self) -> bool {
        let suffix = self.suffix();
        !suffix.is_empty() && suffix.bytes().all(|b| ROOM_SAFE_ALPHABET.contains(&b))
    }
}

impl core::fmt::Display for GroupId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for GroupId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for GroupId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
