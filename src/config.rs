//! Tunable simulation parameters.

use crate::components::{AgeProfile, Position};
use crate::error::UniverseError;
use crate::render::RenderConfig;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for epidemic dynamics, movement and rendering.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpidemicConfig {
    /// Seed for the universe-owned RNG. Same seed, same run.
    pub rng_seed: u64,
    /// Maximum distance at which an infected agent exposes a susceptible one.
    pub contagion_radius: f64,
    /// Spatial grid cell edge; `None` uses the contagion radius.
    pub cell_size: Option<f64>,
    /// Ticks an infection lasts before it resolves.
    pub infection_duration: u32,
    /// Displacement per tick at `activity = 1`.
    pub base_speed: f64,
    /// Maximum heading change per tick, in radians.
    pub turn_jitter: f64,
    /// Activity of the agents seeded by `Universe::new`.
    pub baseline_activity: f64,
    /// Vulnerability of the agents seeded by `Universe::new`.
    pub baseline_vulnerability: f64,
    /// Letality of the agents seeded by `Universe::new`.
    pub baseline_letality: f64,
    /// How many seeded agents start infected; `None` means all of them.
    pub seed_infected: Option<u32>,
    /// Optional isolation strip.
    pub quarantine: Option<QuarantineZone>,
    /// Census samples kept in history; 0 keeps everything.
    pub history_limit: usize,
    pub render: RenderConfig,
}

impl Default for EpidemicConfig {
    fn default() -> Self {
        Self {
            rng_seed: 0x5EED_CAFE,
            contagion_radius: 8.0,
            cell_size: None,
            infection_duration: 840, // 14 s at 60 ticks/s
            base_speed: 1.0,
            turn_jitter: 0.35,
            baseline_activity: 1.0,
            baseline_vulnerability: 0.5,
            baseline_letality: 0.05,
            seed_infected: None,
            quarantine: None,
            history_limit: 4096,
            render: RenderConfig::default(),
        }
    }
}

impl EpidemicConfig {
    /// Effective spatial grid cell edge.
    pub fn grid_cell_size(&self) -> f64 {
        self.cell_size.unwrap_or(self.contagion_radius)
    }

    /// Profile given to agents seeded at construction.
    pub fn baseline_profile(&self) -> AgeProfile {
        AgeProfile {
            activity: self.baseline_activity,
            vulnerability: self.baseline_vulnerability,
            letality: self.baseline_letality,
        }
    }

    pub fn validate(&self) -> Result<(), UniverseError> {
        if !self.contagion_radius.is_finite() || self.contagion_radius <= 0.0 {
            return Err(UniverseError::InvalidConfig(
                "contagion_radius must be positive and finite",
            ));
        }
        let cell = self.grid_cell_size();
        if !cell.is_finite() || cell < self.contagion_radius {
            return Err(UniverseError::InvalidConfig(
                "cell_size must be finite and at least contagion_radius",
            ));
        }
        if self.infection_duration == 0 {
            return Err(UniverseError::InvalidConfig(
                "infection_duration must be at least one tick",
            ));
        }
        if !self.base_speed.is_finite() || self.base_speed < 0.0 {
            return Err(UniverseError::InvalidConfig(
                "base_speed must be non-negative and finite",
            ));
        }
        if !self.turn_jitter.is_finite() || self.turn_jitter < 0.0 {
            return Err(UniverseError::InvalidConfig(
                "turn_jitter must be non-negative and finite",
            ));
        }
        crate::age_group::validate_profile(&self.baseline_profile())
            .map_err(|_| UniverseError::InvalidConfig("baseline profile out of range"))?;
        if let Some(zone) = &self.quarantine {
            if !(zone.x_min.is_finite() && zone.x_max.is_finite()) || zone.x_min >= zone.x_max {
                return Err(UniverseError::InvalidConfig(
                    "quarantine x_min must be below x_max",
                ));
            }
        }
        self.render.validate()
    }
}

/// Vertical isolation strip `[x_min, x_max)` spanning the full plane height.
///
/// Agents inside the strip neither expose nor get exposed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuarantineZone {
    pub x_min: f64,
    pub x_max: f64,
}

impl QuarantineZone {
    pub fn contains(&self, pos: &Position) -> bool {
        pos.x >= self.x_min && pos.x < self.x_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EpidemicConfig::default().validate().is_ok());
        assert_eq!(EpidemicConfig::default().grid_cell_size(), 8.0);
    }

    #[test]
    fn test_cell_smaller_than_radius_rejected() {
        let config = EpidemicConfig {
            contagion_radius: 10.0,
            cell_size: Some(5.0),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(UniverseError::InvalidConfig(
                "cell_size must be finite and at least contagion_radius"
            ))
        );
    }

    #[test]
    fn test_zero_duration_rejected() {
        let config = EpidemicConfig {
            infection_duration: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_baseline_rejected() {
        let config = EpidemicConfig {
            baseline_vulnerability: 2.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_quarantine_zone() {
        let zone = QuarantineZone { x_min: 0.0, x_max: 20.0 };
        assert!(zone.contains(&Position::new(0.0, 50.0)));
        assert!(zone.contains(&Position::new(19.9, 0.0)));
        assert!(!zone.contains(&Position::new(20.0, 0.0)));

        let inverted = EpidemicConfig {
            quarantine: Some(QuarantineZone { x_min: 5.0, x_max: 5.0 }),
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EpidemicConfig =
            serde_json::from_str(r#"{ "contagion_radius": 12.5, "rng_seed": 7 }"#).unwrap();
        assert_eq!(config.contagion_radius, 12.5);
        assert_eq!(config.rng_seed, 7);
        assert_eq!(config.infection_duration, 840);
    }
}
