//! Error types for the engine host.
//!
//! [`EngineError`] wraps every failure mode during startup and the sweep
//! loop.

use muster_groups::GroupError;

/// Top-level error for the engine host binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// A membership operation failed while seeding the world.
    #[error("group error: {source}")]
    Group {
        /// The underlying membership error.
        #[from]
        source: GroupError,
    },

    /// The roster refers to an actor that was never spawned.
    #[error("seed error: unknown actor '{name}' in roster")]
    UnknownActor {
        /// The name that failed to resolve.
        name: String,
    },
}
