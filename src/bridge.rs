//! Host Integration Bridge
//!
//! Flat buffers for hosts that draw agents themselves (a JS canvas, a game
//! engine) instead of handing a [`crate::render::Surface`] to the renderer.
//!
//! # Buffer Layout (Version 1.0)
//!
//! The flat buffer is a `Vec<f32>` with the following structure:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ HEADER (2 elements)                                             │
//! │ [0] agent_count (as f32)                                        │
//! │ [1] tick        (as f32)                                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ For each agent i (offset = 2 + i * AGENT_STRIDE):               │
//! │   [+0] id              - Agent id (u32 as f32)                  │
//! │   [+1] x               - X position (plane units)               │
//! │   [+2] y               - Y position (plane units)               │
//! │   [+3] status          - See STATUS_* constants                 │
//! │   [+4] ticks_remaining - Infection countdown, -1.0 when none    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Agents appear in id order; the same `Snapshot` always produces the same
//! buffer.

use crate::components::HealthStatus;
use crate::systems::census::Census;
use crate::world::Snapshot;

// ============================================================================
// CONSTANTS - STABLE HOST CONTRACT
// ============================================================================

/// Number of f32 values per agent in the flat buffer.
pub const AGENT_STRIDE: usize = 5;

/// Number of f32 values in the buffer header: agent_count, tick.
pub const HEADER_SIZE: usize = 2;

pub const STATUS_SUSCEPTIBLE: f32 = 0.0;
pub const STATUS_INFECTED: f32 = 1.0;
pub const STATUS_REMOVED: f32 = 2.0;
pub const STATUS_DIED: f32 = 3.0;

/// Written in the ticks_remaining slot of agents that are not infected.
pub const NO_INFECTION: f32 = -1.0;

pub const FIELD_ID: usize = 0;
pub const FIELD_X: usize = 1;
pub const FIELD_Y: usize = 2;
pub const FIELD_STATUS: usize = 3;
pub const FIELD_TICKS_REMAINING: usize = 4;

#[inline]
pub fn status_to_id(status: HealthStatus) -> f32 {
    match status {
        HealthStatus::Susceptible => STATUS_SUSCEPTIBLE,
        HealthStatus::Infected => STATUS_INFECTED,
        HealthStatus::Removed => STATUS_REMOVED,
        HealthStatus::Died => STATUS_DIED,
    }
}

/// Inverse of [`status_to_id`]; `None` for values outside the table.
#[inline]
pub fn status_from_id(id: f32) -> Option<HealthStatus> {
    HealthStatus::ALL
        .into_iter()
        .find(|&status| status_to_id(status) == id)
}

/// Convert a snapshot to a flat buffer. See module docs for the layout.
pub fn snapshot_to_flatbuffer(snapshot: &Snapshot) -> Vec<f32> {
    let agent_count = snapshot.agents.len();
    let buffer_size = calculate_buffer_size(agent_count);

    let mut buffer = Vec::with_capacity(buffer_size);
    buffer.push(agent_count as f32);
    buffer.push(snapshot.tick as f32);

    for agent in &snapshot.agents {
        buffer.push(agent.id as f32);
        buffer.push(agent.x as f32);
        buffer.push(agent.y as f32);
        buffer.push(status_to_id(agent.status));
        buffer.push(
            agent
                .infection_ticks_remaining
                .map_or(NO_INFECTION, |ticks| ticks as f32),
        );
    }

    debug_assert_eq!(buffer.len(), buffer_size, "Buffer size mismatch");
    buffer
}

/// The four compartment counts, in status order.
pub fn census_to_array(census: &Census) -> [f32; 4] {
    HealthStatus::ALL.map(|status| census.count(status) as f32)
}

#[inline]
pub fn calculate_buffer_size(agent_count: usize) -> usize {
    HEADER_SIZE + agent_count * AGENT_STRIDE
}

/// Parse the agent count from a flat buffer, `None` if the header is missing.
#[inline]
pub fn parse_agent_count(buffer: &[f32]) -> Option<usize> {
    if buffer.len() < HEADER_SIZE {
        return None;
    }
    Some(buffer[0] as usize)
}

#[inline]
pub const fn agent_offset(agent_index: usize) -> usize {
    HEADER_SIZE + agent_index * AGENT_STRIDE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AgentSpawn, Universe};
    use crate::components::{AgeProfile, Health};
    use crate::config::EpidemicConfig;

    fn still_config() -> EpidemicConfig {
        EpidemicConfig {
            base_speed: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_universe_buffer() {
        let universe = Universe::with_config(10, 10, 0, still_config()).unwrap();
        let buffer = snapshot_to_flatbuffer(&universe.snapshot());
        assert_eq!(buffer, vec![0.0, 0.0]);
    }

    #[test]
    fn test_buffer_fields() {
        let mut universe = Universe::with_config(100, 100, 0, still_config()).unwrap();
        universe
            .spawn_agent(AgentSpawn {
                x: 10.0,
                y: 20.0,
                health: Health::infected(9),
                profile: AgeProfile::default(),
            })
            .unwrap();
        universe
            .spawn_agent(AgentSpawn {
                x: 50.0,
                y: 60.0,
                health: Health::removed(),
                profile: AgeProfile::default(),
            })
            .unwrap();

        let buffer = snapshot_to_flatbuffer(&universe.snapshot());
        assert_eq!(buffer.len(), calculate_buffer_size(2));
        assert_eq!(parse_agent_count(&buffer), Some(2));

        let first = agent_offset(0);
        assert_eq!(buffer[first + FIELD_ID], 0.0);
        assert_eq!(buffer[first + FIELD_X], 10.0);
        assert_eq!(buffer[first + FIELD_Y], 20.0);
        assert_eq!(buffer[first + FIELD_STATUS], STATUS_INFECTED);
        assert_eq!(buffer[first + FIELD_TICKS_REMAINING], 9.0);

        let second = agent_offset(1);
        assert_eq!(buffer[second + FIELD_ID], 1.0);
        assert_eq!(buffer[second + FIELD_STATUS], STATUS_REMOVED);
        assert_eq!(buffer[second + FIELD_TICKS_REMAINING], NO_INFECTION);
    }

    #[test]
    fn test_buffer_determinism() {
        let run = || {
            let mut universe = Universe::new(120, 80, 20).unwrap();
            for _ in 0..25 {
                universe.tick();
            }
            snapshot_to_flatbuffer(&universe.snapshot())
        };
        assert_eq!(run(), run(), "determinism violated");
    }

    #[test]
    fn test_census_array() {
        let census = Census {
            susceptible: 4,
            infected: 3,
            removed: 2,
            died: 1,
        };
        assert_eq!(census_to_array(&census), [4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_status_ids_roundtrip() {
        for status in HealthStatus::ALL {
            assert_eq!(status_from_id(status_to_id(status)), Some(status));
        }
        assert_eq!(status_from_id(7.0), None);
    }

    #[test]
    fn test_parse_agent_count() {
        assert_eq!(parse_agent_count(&[]), None);
        assert_eq!(parse_agent_count(&[3.0]), None);
        assert_eq!(parse_agent_count(&[3.0, 0.0]), Some(3));
    }

    #[test]
    fn test_field_offsets_are_valid() {
        assert_eq!(AGENT_STRIDE, FIELD_TICKS_REMAINING + 1);
        assert_eq!(agent_offset(0), HEADER_SIZE);
        assert_eq!(agent_offset(10), HEADER_SIZE + 10 * AGENT_STRIDE);
    }
}
