//! Serializable views of the simulation state.
//!
//! The `Snapshot` struct is a detached copy of the population that hosts can
//! inspect, diff or ship across a process boundary.

use crate::components::*;
use crate::systems::census::Census;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub status: HealthStatus,
    pub infection_ticks_remaining: Option<u32>,
    pub activity: f64,
    pub vulnerability: f64,
    pub letality: f64,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ticks completed so far.
    pub tick: u64,
    pub width: u32,
    pub height: u32,
    pub census: Census,
    /// All agents, ordered by id.
    pub agents: Vec<AgentSnapshot>,
}

impl Snapshot {
    /// Create a snapshot from the ECS world without mutating it.
    pub fn from_world(world: &World, tick: u64, width: u32, height: u32) -> Self {
        let mut agents = collect_agents(world);
        agents.sort_by_key(|a| a.id);
        let census = world.get_resource::<Census>().copied().unwrap_or_default();

        Self {
            tick,
            width,
            height,
            census,
            agents,
        }
    }

    /// Agent with the given id.
    pub fn agent(&self, id: AgentId) -> Option<&AgentSnapshot> {
        self.agents
            .binary_search_by_key(&id.0, |a| a.id)
            .ok()
            .map(|index| &self.agents[index])
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn collect_agents(world: &World) -> Vec<AgentSnapshot> {
    world
        .iter_entities()
        .filter_map(|entity| {
            let id = entity.get::<AgentId>()?;
            let pos = entity.get::<Position>()?;
            let health = entity.get::<Health>()?;
            let profile = entity.get::<AgeProfile>()?;
            Some(AgentSnapshot {
                id: id.0,
                x: pos.x,
                y: pos.y,
                status: health.status(),
                infection_ticks_remaining: health.infection_ticks_remaining(),
                activity: profile.activity,
                vulnerability: profile.vulnerability,
                letality: profile.letality,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_sorted_by_id() {
        let mut world = World::new();
        for id in [3, 1, 2] {
            world.spawn(AgentBundle {
                id: AgentId(id),
                position: Position::new(id as f64, 0.0),
                ..Default::default()
            });
        }
        let snapshot = Snapshot::from_world(&world, 0, 10, 10);
        let ids: Vec<u32> = snapshot.agents.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(snapshot.agent(AgentId(2)).unwrap().x, 2.0);
        assert!(snapshot.agent(AgentId(9)).is_none());
    }

    #[test]
    fn test_snapshot_json_fields() {
        let mut world = World::new();
        world.spawn(AgentBundle {
            health: Health::infected(12),
            ..Default::default()
        });
        let json = Snapshot::from_world(&world, 4, 50, 60).to_json().unwrap();
        assert!(json.contains("\"status\":\"Infected\""));
        assert!(json.contains("\"infection_ticks_remaining\":12"));
        assert!(json.contains("\"tick\":4"));
    }
}
