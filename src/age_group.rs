//! Cohort descriptors used to compose a heterogeneous population.

use crate::components::AgeProfile;
use crate::error::UniverseError;
use serde::{Deserialize, Serialize};

/// Spawn parameters for one cohort of agents.
///
/// Values are copied into every agent spawned from the group, so the group
/// itself can be dropped or reused afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeGroup {
    /// Number of agents to spawn.
    pub size: u32,
    /// Displacement multiplier (> 0).
    pub activity: f64,
    /// Infection probability per qualifying contact, in `[0, 1]`.
    pub vulnerability: f64,
    /// Probability an infection ends in death, in `[0, 1]`.
    pub letality: f64,
}

impl AgeGroup {
    /// Build a validated age group.
    pub fn new(
        size: u32,
        activity: f64,
        vulnerability: f64,
        letality: f64,
    ) -> Result<Self, UniverseError> {
        let group = Self {
            size,
            activity,
            vulnerability,
            letality,
        };
        group.validate()?;
        Ok(group)
    }

    pub fn validate(&self) -> Result<(), UniverseError> {
        validate_profile(&self.profile())
    }

    /// The per-agent parameters carried by members of this group.
    pub fn profile(&self) -> AgeProfile {
        AgeProfile {
            activity: self.activity,
            vulnerability: self.vulnerability,
            letality: self.letality,
        }
    }
}

/// Range checks shared by age groups and explicit spawns.
pub(crate) fn validate_profile(profile: &AgeProfile) -> Result<(), UniverseError> {
    if !profile.activity.is_finite() || profile.activity <= 0.0 {
        return Err(UniverseError::InvalidAgeGroup(
            "activity must be positive and finite",
        ));
    }
    if !(0.0..=1.0).contains(&profile.vulnerability) {
        return Err(UniverseError::InvalidAgeGroup(
            "vulnerability must be between 0.0 and 1.0",
        ));
    }
    if !(0.0..=1.0).contains(&profile.letality) {
        return Err(UniverseError::InvalidAgeGroup(
            "letality must be between 0.0 and 1.0",
        ));
    }
    Ok(())
}
