//! Contagion system - proximity-based exposure and infection.
//!
//! ## Two Phases
//!
//! 1. **Gather Phase** - O(n × k) where n = infected sources, k = avg
//!    neighbors per spatial query
//!    - For each infected source, query the spatial grid for susceptible
//!      agents within the contagion radius
//!    - Reads only the grid snapshot taken after movement, so no status
//!      change from this tick can leak into the exposure list
//!    - Pure geometry, no randomness, parallelizable
//!
//! 2. **Apply Phase** - O(m) where m = exposures
//!    - One Bernoulli trial per exposure with the target's vulnerability
//!    - A target infected by an earlier exposure this tick is skipped, so
//!      each susceptible agent is infected at most once per tick
//!    - Sequential, draws from the universe RNG in exposure order
//!
//! ## Parallel Feature
//!
//! When compiled with `--features parallel`, the gather phase uses rayon.
//! Partial results are concatenated in source order, so the exposure list
//! (and therefore the whole run) is identical to the sequential build.

use crate::components::*;
use crate::config::EpidemicConfig;
use crate::spatial::SpatialGrid;
use crate::systems::movement::SimRng;
use bevy_ecs::prelude::*;
use rand::Rng;
use std::collections::HashSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One infected-to-susceptible contact within the contagion radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exposure {
    pub source: Entity,
    pub target: Entity,
}

/// Exposures gathered this tick and the agents they infected.
#[derive(Resource, Debug, Default)]
pub struct PendingContagion {
    pub exposures: Vec<Exposure>,
    /// Agents that became infected during this tick, in infection order.
    pub newly_infected: Vec<Entity>,
}

#[derive(Debug, Clone, Copy)]
struct SourceData {
    entity: Entity,
    x: f64,
    y: f64,
}

/// Contagion gather system - lists exposures without touching health.
///
/// ## Data Access (READ-ONLY on entities)
/// - Reads: SpatialGrid, EpidemicConfig, Position, Health
/// - Writes: PendingContagion (resource only)
pub fn contagion_gather_system(
    grid: Res<SpatialGrid>,
    config: Res<EpidemicConfig>,
    mut pending: ResMut<PendingContagion>,
    query: Query<(Entity, &Position, &Health)>,
) {
    pending.exposures.clear();
    pending.newly_infected.clear();

    let quarantine = config.quarantine;
    let sources: Vec<SourceData> = query
        .iter()
        .filter(|(_, pos, health)| {
            health.is_infected() && !quarantine.is_some_and(|zone| zone.contains(pos))
        })
        .map(|(entity, pos, _)| SourceData {
            entity,
            x: pos.x,
            y: pos.y,
        })
        .collect();

    // Quiescent: nothing can spread.
    if sources.is_empty() {
        return;
    }

    let radius = config.contagion_radius;

    #[cfg(feature = "parallel")]
    {
        let partial: Vec<Vec<Exposure>> = sources
            .par_iter()
            .map(|source| gather_exposures(source, &grid, radius, quarantine))
            .collect();
        for exposures in partial {
            pending.exposures.extend(exposures);
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        for source in &sources {
            let exposures = gather_exposures(source, &grid, radius, quarantine);
            pending.exposures.extend(exposures);
        }
    }
}

/// Susceptible neighbors of a single source. Pure, safe to call in parallel.
fn gather_exposures(
    source: &SourceData,
    grid: &SpatialGrid,
    radius: f64,
    quarantine: Option<crate::config::QuarantineZone>,
) -> Vec<Exposure> {
    let mut exposures = Vec::new();
    grid.for_each_within(source.x, source.y, radius, |entry| {
        if entry.status != HealthStatus::Susceptible || entry.entity == source.entity {
            return;
        }
        if let Some(zone) = quarantine {
            if zone.contains(&Position::new(entry.x, entry.y)) {
                return;
            }
        }
        exposures.push(Exposure {
            source: source.entity,
            target: entry.entity,
        });
    });
    exposures
}

/// Contagion apply system - resolves exposures into infections.
///
/// ## Data Access
/// - Reads: EpidemicConfig, AgeProfile
/// - Writes: SimRng, PendingContagion, Health
pub fn contagion_apply_system(
    config: Res<EpidemicConfig>,
    mut rng: ResMut<SimRng>,
    mut pending: ResMut<PendingContagion>,
    mut query: Query<(&mut Health, &AgeProfile)>,
) {
    if pending.exposures.is_empty() {
        return;
    }

    let pending = &mut *pending;
    let mut infected_now: HashSet<Entity> = HashSet::new();
    for exposure in &pending.exposures {
        if infected_now.contains(&exposure.target) {
            continue;
        }
        let Ok((mut health, profile)) = query.get_mut(exposure.target) else {
            continue;
        };
        if !health.is_susceptible() {
            continue;
        }
        if rng.0.gen_bool(profile.vulnerability) && health.infect(config.infection_duration) {
            infected_now.insert(exposure.target);
            pending.newly_infected.push(exposure.target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::spatial_grid_update_system;

    fn contagion_world(config: EpidemicConfig) -> World {
        let mut world = World::new();
        world.insert_resource(SpatialGrid::new(config.grid_cell_size(), 100.0, 100.0));
        world.insert_resource(SimRng::seeded(config.rng_seed));
        world.insert_resource(PendingContagion::default());
        world.insert_resource(config);
        world
    }

    fn contagion_schedule() -> Schedule {
        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                spatial_grid_update_system,
                contagion_gather_system,
                contagion_apply_system,
            )
                .chain(),
        );
        schedule
    }

    fn spawn(world: &mut World, x: f64, y: f64, health: Health, vulnerability: f64) -> Entity {
        world
            .spawn(AgentBundle {
                position: Position::new(x, y),
                health,
                profile: AgeProfile {
                    vulnerability,
                    ..Default::default()
                },
                ..Default::default()
            })
            .id()
    }

    #[test]
    fn test_certain_infection_within_radius() {
        let mut world = contagion_world(EpidemicConfig {
            contagion_radius: 5.0,
            infection_duration: 30,
            ..Default::default()
        });
        spawn(&mut world, 50.0, 50.0, Health::infected(10), 1.0);
        let near = spawn(&mut world, 53.0, 50.0, Health::susceptible(), 1.0);
        let far = spawn(&mut world, 70.0, 50.0, Health::susceptible(), 1.0);

        contagion_schedule().run(&mut world);

        let near_health = world.get::<Health>(near).unwrap();
        assert_eq!(near_health.status(), HealthStatus::Infected);
        assert_eq!(near_health.infection_ticks_remaining(), Some(30));
        assert!(world.get::<Health>(far).unwrap().is_susceptible());
        assert_eq!(world.resource::<PendingContagion>().newly_infected, vec![near]);
    }

    #[test]
    fn test_zero_vulnerability_never_infects() {
        let mut world = contagion_world(EpidemicConfig::default());
        spawn(&mut world, 50.0, 50.0, Health::infected(10), 0.0);
        let target = spawn(&mut world, 51.0, 50.0, Health::susceptible(), 0.0);

        let mut schedule = contagion_schedule();
        for _ in 0..100 {
            schedule.run(&mut world);
        }
        assert!(world.get::<Health>(target).unwrap().is_susceptible());
    }

    #[test]
    fn test_two_sources_infect_once() {
        let mut world = contagion_world(EpidemicConfig {
            contagion_radius: 5.0,
            ..Default::default()
        });
        spawn(&mut world, 48.0, 50.0, Health::infected(10), 1.0);
        spawn(&mut world, 52.0, 50.0, Health::infected(10), 1.0);
        spawn(&mut world, 50.0, 50.0, Health::susceptible(), 1.0);

        contagion_schedule().run(&mut world);

        let pending = world.resource::<PendingContagion>();
        assert_eq!(pending.exposures.len(), 2);
        assert_eq!(pending.newly_infected.len(), 1);
    }

    #[test]
    fn test_newly_infected_do_not_spread_same_tick() {
        let mut world = contagion_world(EpidemicConfig {
            contagion_radius: 5.0,
            ..Default::default()
        });
        spawn(&mut world, 10.0, 50.0, Health::infected(10), 1.0);
        let second = spawn(&mut world, 14.0, 50.0, Health::susceptible(), 1.0);
        let third = spawn(&mut world, 18.0, 50.0, Health::susceptible(), 1.0);

        let mut schedule = contagion_schedule();
        schedule.run(&mut world);
        assert!(world.get::<Health>(second).unwrap().is_infected());
        assert!(world.get::<Health>(third).unwrap().is_susceptible());

        schedule.run(&mut world);
        assert!(world.get::<Health>(third).unwrap().is_infected());
    }

    #[test]
    fn test_removed_agents_are_immune() {
        let mut world = contagion_world(EpidemicConfig::default());
        spawn(&mut world, 50.0, 50.0, Health::infected(10), 1.0);
        let immune = spawn(&mut world, 51.0, 50.0, Health::removed(), 1.0);

        contagion_schedule().run(&mut world);
        assert_eq!(
            world.get::<Health>(immune).unwrap().status(),
            HealthStatus::Removed
        );
    }

    #[test]
    fn test_quarantine_isolates_agents() {
        let mut world = contagion_world(EpidemicConfig {
            contagion_radius: 5.0,
            quarantine: Some(crate::config::QuarantineZone {
                x_min: 0.0,
                x_max: 20.0,
            }),
            ..Default::default()
        });
        // Isolated source next to a free susceptible agent.
        spawn(&mut world, 19.0, 50.0, Health::infected(10), 1.0);
        let outside = spawn(&mut world, 22.0, 50.0, Health::susceptible(), 1.0);
        // Free source next to an isolated susceptible agent.
        spawn(&mut world, 60.0, 10.0, Health::infected(10), 1.0);
        let free_target = spawn(&mut world, 62.0, 10.0, Health::susceptible(), 1.0);
        spawn(&mut world, 22.0, 80.0, Health::infected(10), 1.0);
        let inside = spawn(&mut world, 18.0, 80.0, Health::susceptible(), 1.0);

        contagion_schedule().run(&mut world);

        assert!(world.get::<Health>(outside).unwrap().is_susceptible());
        assert!(world.get::<Health>(inside).unwrap().is_susceptible());
        assert!(world.get::<Health>(free_target).unwrap().is_infected());
    }

    #[test]
    fn test_no_sources_is_noop() {
        let mut world = contagion_world(EpidemicConfig::default());
        let a = spawn(&mut world, 50.0, 50.0, Health::susceptible(), 1.0);
        spawn(&mut world, 50.5, 50.0, Health::removed(), 1.0);

        contagion_schedule().run(&mut world);
        assert!(world.get::<Health>(a).unwrap().is_susceptible());
        assert!(world.resource::<PendingContagion>().exposures.is_empty());
    }
}
