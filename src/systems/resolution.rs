//! Resolution system - infections run their course and end in recovery or death.

use crate::components::*;
use crate::systems::movement::SimRng;
use bevy_ecs::prelude::*;
use rand::Rng;

/// System that counts down every infection and resolves the finished ones.
///
/// Runs after the contagion pass, so an agent infected earlier in this tick
/// is already counting: an infection of duration `D` resolves on the `D`th
/// resolution pass that sees it, including the one in its own tick.
///
/// ## Data Access
/// - Reads: AgeProfile
/// - Writes: SimRng, Health
pub fn resolution_system(
    mut rng: ResMut<SimRng>,
    mut query: Query<(&mut Health, &AgeProfile)>,
) {
    for (mut health, profile) in query.iter_mut() {
        if !health.is_infected() {
            continue;
        }
        if health.count_down() {
            let fatal = rng.0.gen_bool(profile.letality);
            health.resolve(fatal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EpidemicConfig;
    use crate::spatial::{spatial_grid_update_system, SpatialGrid};
    use crate::systems::contagion::{
        contagion_apply_system, contagion_gather_system, PendingContagion,
    };

    fn resolution_world() -> World {
        let mut world = World::new();
        world.insert_resource(SimRng::seeded(7));
        world
    }

    fn spawn(world: &mut World, health: Health, letality: f64) -> Entity {
        world
            .spawn(AgentBundle {
                health,
                profile: AgeProfile {
                    letality,
                    ..Default::default()
                },
                ..Default::default()
            })
            .id()
    }

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(resolution_system);
        schedule.run(world);
    }

    #[test]
    fn test_last_tick_with_certain_death() {
        let mut world = resolution_world();
        let agent = spawn(&mut world, Health::infected(1), 1.0);
        run(&mut world);
        assert_eq!(world.get::<Health>(agent).unwrap().status(), HealthStatus::Died);
    }

    #[test]
    fn test_last_tick_with_no_letality_recovers() {
        let mut world = resolution_world();
        let agent = spawn(&mut world, Health::infected(1), 0.0);
        run(&mut world);
        let health = world.get::<Health>(agent).unwrap();
        assert_eq!(health.status(), HealthStatus::Removed);
        assert_eq!(health.infection_ticks_remaining(), None);
    }

    #[test]
    fn test_countdown_takes_full_duration() {
        let mut world = resolution_world();
        let agent = spawn(&mut world, Health::infected(3), 0.0);
        run(&mut world);
        run(&mut world);
        assert_eq!(
            world.get::<Health>(agent).unwrap().infection_ticks_remaining(),
            Some(1)
        );
        run(&mut world);
        assert_eq!(world.get::<Health>(agent).unwrap().status(), HealthStatus::Removed);
    }

    #[test]
    fn test_infection_from_this_tick_counts_down_too() {
        let mut world = resolution_world();
        world.insert_resource(PendingContagion::default());
        world.insert_resource(EpidemicConfig {
            infection_duration: 3,
            contagion_radius: 5.0,
            ..Default::default()
        });
        world.insert_resource(SpatialGrid::new(5.0, 20.0, 20.0));

        let source = spawn(&mut world, Health::infected(100), 0.0);
        let target = world
            .spawn(AgentBundle {
                position: Position::new(1.0, 0.0),
                profile: AgeProfile {
                    vulnerability: 1.0,
                    letality: 0.0,
                    ..Default::default()
                },
                ..Default::default()
            })
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                spatial_grid_update_system,
                contagion_gather_system,
                contagion_apply_system,
                resolution_system,
            )
                .chain(),
        );

        schedule.run(&mut world);
        let health = *world.get::<Health>(target).unwrap();
        assert!(health.is_infected());
        assert_eq!(health.infection_ticks_remaining(), Some(2));

        schedule.run(&mut world);
        assert_eq!(
            world.get::<Health>(target).unwrap().infection_ticks_remaining(),
            Some(1)
        );
        schedule.run(&mut world);
        assert_eq!(world.get::<Health>(target).unwrap().status(), HealthStatus::Removed);
        assert!(world.get::<Health>(source).unwrap().is_infected());
    }

    #[test]
    fn test_other_statuses_untouched() {
        let mut world = resolution_world();
        let s = spawn(&mut world, Health::susceptible(), 1.0);
        let r = spawn(&mut world, Health::removed(), 1.0);
        let d = spawn(&mut world, Health::died(), 0.0);
        for _ in 0..5 {
            run(&mut world);
        }
        assert!(world.get::<Health>(s).unwrap().is_susceptible());
        assert_eq!(world.get::<Health>(r).unwrap().status(), HealthStatus::Removed);
        assert!(world.get::<Health>(d).unwrap().is_dead());
    }
}
