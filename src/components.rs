//! ECS Components for the Contagion simulation.
//!
//! Components are pure data containers attached to agent entities.
//! All per-tick logic lives in systems that query these components.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// Position on the plane, always inside `[0, width) x [0, height)`.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Unit direction of travel.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub dx: f64,
    pub dy: f64,
}

impl Heading {
    pub fn from_angle(angle: f64) -> Self {
        Self {
            dx: angle.cos(),
            dy: angle.sin(),
        }
    }

    /// Rotate by `angle` radians, staying unit length.
    pub fn rotate(&mut self, angle: f64) {
        let (sin, cos) = angle.sin_cos();
        let dx = self.dx * cos - self.dy * sin;
        let dy = self.dx * sin + self.dy * cos;
        let len = (dx * dx + dy * dy).sqrt();
        if len > f64::EPSILON {
            self.dx = dx / len;
            self.dy = dy / len;
        }
    }
}

impl Default for Heading {
    fn default() -> Self {
        Self { dx: 1.0, dy: 0.0 }
    }
}

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Spawn-order ordinal of an agent. Never reused.
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct AgentId(pub u32);

// ============================================================================
// HEALTH COMPONENTS
// ============================================================================

/// Epidemic compartment of an agent.
///
/// Only `Susceptible -> Infected -> {Removed, Died}` transitions exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum HealthStatus {
    #[default]
    Susceptible = 0,
    Infected = 1,
    Removed = 2,
    Died = 3,
}

impl HealthStatus {
    pub const ALL: [HealthStatus; 4] = [
        HealthStatus::Susceptible,
        HealthStatus::Infected,
        HealthStatus::Removed,
        HealthStatus::Died,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, HealthStatus::Removed | HealthStatus::Died)
    }

    /// Whether `self -> next` is an edge of the compartment graph.
    pub fn can_become(self, next: HealthStatus) -> bool {
        matches!(
            (self, next),
            (HealthStatus::Susceptible, HealthStatus::Infected)
                | (HealthStatus::Infected, HealthStatus::Removed)
                | (HealthStatus::Infected, HealthStatus::Died)
        )
    }
}

/// Health state of an agent.
///
/// The infection countdown is present exactly while the status is
/// `Infected`; fields are private so only the transition methods below can
/// change them.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Health {
    status: HealthStatus,
    infection_ticks_remaining: Option<u32>,
}

impl Health {
    pub fn susceptible() -> Self {
        Self::default()
    }

    /// An infected state with `ticks` left. Zero is bumped to one.
    pub fn infected(ticks: u32) -> Self {
        Self {
            status: HealthStatus::Infected,
            infection_ticks_remaining: Some(ticks.max(1)),
        }
    }

    pub fn removed() -> Self {
        Self {
            status: HealthStatus::Removed,
            infection_ticks_remaining: None,
        }
    }

    pub fn died() -> Self {
        Self {
            status: HealthStatus::Died,
            infection_ticks_remaining: None,
        }
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn infection_ticks_remaining(&self) -> Option<u32> {
        self.infection_ticks_remaining
    }

    pub fn is_susceptible(&self) -> bool {
        self.status == HealthStatus::Susceptible
    }

    pub fn is_infected(&self) -> bool {
        self.status == HealthStatus::Infected
    }

    pub fn is_dead(&self) -> bool {
        self.status == HealthStatus::Died
    }

    /// Susceptible -> Infected. Returns false (and changes nothing) for any
    /// other starting status.
    pub fn infect(&mut self, duration: u32) -> bool {
        if !self.is_susceptible() {
            return false;
        }
        *self = Self::infected(duration);
        true
    }

    /// Count one tick of infection down. Returns true when the countdown has
    /// just reached zero and the infection must be resolved.
    pub fn count_down(&mut self) -> bool {
        match self.infection_ticks_remaining.as_mut() {
            Some(remaining) => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
            None => false,
        }
    }

    /// Infected -> Died when `fatal`, otherwise Infected -> Removed.
    pub fn resolve(&mut self, fatal: bool) {
        if !self.is_infected() {
            return;
        }
        *self = if fatal { Self::died() } else { Self::removed() };
    }

    /// Status/timer agreement.
    pub fn is_consistent(&self) -> bool {
        self.is_infected() == self.infection_ticks_remaining.is_some()
    }
}

/// Per-agent copy of the cohort parameters it was spawned with.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeProfile {
    /// Scales per-tick displacement.
    pub activity: f64,
    /// Probability of infection per qualifying contact.
    pub vulnerability: f64,
    /// Probability an infection resolves to death.
    pub letality: f64,
}

impl Default for AgeProfile {
    fn default() -> Self {
        Self {
            activity: 1.0,
            vulnerability: 0.5,
            letality: 0.05,
        }
    }
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for spawning a complete agent entity.
#[derive(Bundle, Default)]
pub struct AgentBundle {
    pub id: AgentId,
    pub position: Position,
    pub heading: Heading,
    pub health: Health,
    pub profile: AgeProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_transitions_follow_compartments() {
        let mut health = Health::susceptible();
        assert!(health.is_consistent());

        assert!(health.infect(3));
        assert_eq!(health.status(), HealthStatus::Infected);
        assert_eq!(health.infection_ticks_remaining(), Some(3));

        // A second infection is a no-op.
        assert!(!health.infect(10));
        assert_eq!(health.infection_ticks_remaining(), Some(3));

        assert!(!health.count_down());
        assert!(!health.count_down());
        assert!(health.count_down());
        health.resolve(false);
        assert_eq!(health.status(), HealthStatus::Removed);
        assert_eq!(health.infection_ticks_remaining(), None);

        // Terminal.
        assert!(!health.infect(3));
        health.resolve(true);
        assert_eq!(health.status(), HealthStatus::Removed);
    }

    #[test]
    fn test_fatal_resolution() {
        let mut health = Health::infected(1);
        assert!(health.count_down());
        health.resolve(true);
        assert!(health.is_dead());
        assert!(health.is_consistent());
    }

    #[test]
    fn test_infected_never_starts_at_zero() {
        assert_eq!(Health::infected(0).infection_ticks_remaining(), Some(1));
    }

    #[test]
    fn test_status_edges() {
        use HealthStatus::*;
        assert!(Susceptible.can_become(Infected));
        assert!(Infected.can_become(Removed));
        assert!(Infected.can_become(Died));
        assert!(!Susceptible.can_become(Removed));
        assert!(!Removed.can_become(Infected));
        assert!(!Died.can_become(Removed));
        assert!(Removed.is_terminal() && Died.is_terminal());
    }

    #[test]
    fn test_heading_rotation_stays_unit() {
        let mut heading = Heading::from_angle(0.3);
        for _ in 0..1000 {
            heading.rotate(0.17);
        }
        let len = (heading.dx * heading.dx + heading.dy * heading.dy).sqrt();
        assert!((len - 1.0).abs() < 1e-9);
    }
}
