//! Error types surfaced at construction and spawn time.
//!
//! `tick` and `render` operate on already-validated state and never fail,
//! so every variant here originates from a constructor or spawn call.

use thiserror::Error;

/// Errors that can occur when building or populating a [`crate::Universe`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UniverseError {
    /// The plane must have a positive extent on both axes.
    #[error("plane dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Age-group parameters outside their allowed ranges.
    #[error("invalid age group: {0}")]
    InvalidAgeGroup(&'static str),

    /// A configuration value that cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// An explicit agent spawn that would break an agent invariant.
    #[error("invalid spawn: {0}")]
    InvalidSpawn(&'static str),
}
