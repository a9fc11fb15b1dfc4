//! Policy configuration for the group and party engines.
//!
//! [`GroupPolicy`] carries what every group kind needs (the invitation
//! timeout); [`PartyPolicy`] adds the party capacity. Both deserialize from
//! partial YAML/JSON with per-field defaults, so a host configuration file
//! only lists what it overrides.

use serde::Deserialize;

use muster_types::Timestamp;

/// Default maximum number of party members.
pub const DEFAULT_MAX_PARTY_SIZE: usize = 3;

/// Default lifetime of an invitation, in milliseconds.
pub const DEFAULT_INVITATION_TIMEOUT_MS: u64 = 60_000;

/// Errors raised when a policy fails validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A policy value is out of range.
    #[error("invalid policy: {reason}")]
    InvalidPolicy {
        /// What is wrong with the policy.
        reason: String,
    },
}

/// Policy shared by every group kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GroupPolicy {
    /// How long an invitation stays valid after its latest (re)send.
    #[serde(default = "default_invitation_timeout_ms")]
    pub invitation_timeout_ms: u64,
}

impl Default for GroupPolicy {
    fn default() -> Self {
        Self {
            invitation_timeout_ms: DEFAULT_INVITATION_TIMEOUT_MS,
        }
    }
}

impl GroupPolicy {
    /// Whether an invitation sent at `sent_at` has lapsed by `now`.
    ///
    /// The boundary is inclusive: an invitation exactly
    /// `invitation_timeout_ms` old is still valid.
    pub const fn is_expired(&self, sent_at: Timestamp, now: Timestamp) -> bool {
        now.saturating_sub(sent_at) > self.invitation_timeout_ms
    }

    /// Reject a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.invitation_timeout_ms == 0 {
            return Err(ConfigError::InvalidPolicy {
                reason: "invitation_timeout_ms must be greater than 0".to_owned(),
            });
        }
        Ok(())
    }
}

/// Party capacity and invitation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PartyPolicy {
    /// Maximum members, owner included.
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// How long an invitation stays valid. Also the idle age after which a
    /// lone-owner party is swept.
    #[serde(default = "default_invitation_timeout_ms")]
    pub invitation_timeout_ms: u64,
}

impl Default for PartyPolicy {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_PARTY_SIZE,
            invitation_timeout_ms: DEFAULT_INVITATION_TIMEOUT_MS,
        }
    }
}

impl PartyPolicy {
    /// The generic part of this policy.
    pub const fn group_policy(&self) -> GroupPolicy {
        GroupPolicy {
            invitation_timeout_ms: self.invitation_timeout_ms,
        }
    }

    /// Reject a zero capacity or a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::InvalidPolicy {
                reason: "max_size must be at least 1".to_owned(),
            });
        }
        self.group_policy().validate()
    }
}

const fn default_max_size() -> usize {
    DEFAULT_MAX_PARTY_SIZE
}

const fn default_invitation_timeout_ms() -> u64 {
    DEFAULT_INVITATION_TIMEOUT_MS
}
