//! Public API for the simulation.
//!
//! This module provides the main interface for a UI host (chart, counters,
//! canvas) to drive the simulation.
//!
//! ## Driving
//!
//! The engine has no clock. The host calls [`Universe::tick`] once per frame
//! (typically from its animation callback) and then [`Universe::render`];
//! how often that happens is entirely up to the host.
//!
//! ## Determinism
//!
//! Every random draw comes from one ChaCha8 stream seeded by
//! [`EpidemicConfig::rng_seed`], and every stage runs on the single-threaded
//! executor, so the same seed and the same sequence of calls always yield
//! the same population.

use crate::age_group::{validate_profile, AgeGroup};
use crate::components::*;
use crate::config::EpidemicConfig;
use crate::error::UniverseError;
#[cfg(feature = "profile")]
use crate::profiler::Profiler;
use crate::render::{Marker, Renderer, Surface};
use crate::spatial::{spatial_grid_update_system, SpatialGrid};
use crate::systems::*;
use crate::world::Snapshot;
use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use rand::Rng;
use std::f64::consts::TAU;

/// One tick phase with its own schedule.
struct Stage {
    label: &'static str,
    schedule: Schedule,
}

impl Stage {
    fn new<M>(label: &'static str, systems: impl IntoSystemConfigs<M>) -> Self {
        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule.add_systems(systems);
        Self { label, schedule }
    }
}

/// Explicit placement of a single agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSpawn {
    pub x: f64,
    pub y: f64,
    pub health: Health,
    pub profile: AgeProfile,
}

/// The epidemic simulation: a bounded plane and the agents on it.
///
/// Holds the ECS world and one schedule per tick stage, providing a narrow
/// API for:
/// - Composing the population
/// - Advancing one tick at a time
/// - Reading aggregate counts, history and snapshots
/// - Rendering onto a caller-owned surface
pub struct Universe {
    world: World,
    stages: Vec<Stage>,
    width: u32,
    height: u32,
    renderer: Renderer,
    /// Next agent id; also the population size since agents are never removed.
    next_id: u32,
    #[cfg(feature = "profile")]
    profiler: Profiler,
}

impl Universe {
    /// Create a universe with default configuration, seeded with
    /// `initial_infected` agents at random positions.
    pub fn new(width: u32, height: u32, initial_infected: u32) -> Result<Self, UniverseError> {
        Self::with_config(width, height, initial_infected, EpidemicConfig::default())
    }

    /// Create a universe with custom configuration.
    ///
    /// `config.seed_infected` decides how many of the seeded agents start
    /// infected; the rest start susceptible.
    pub fn with_config(
        width: u32,
        height: u32,
        initial_infected: u32,
        config: EpidemicConfig,
    ) -> Result<Self, UniverseError> {
        if width == 0 || height == 0 {
            return Err(UniverseError::InvalidDimensions { width, height });
        }
        config.validate()?;

        let mut world = World::new();
        world.insert_resource(PlaneBounds {
            width: width as f64,
            height: height as f64,
        });
        world.insert_resource(SimRng::seeded(config.rng_seed));
        world.insert_resource(SpatialGrid::new(
            config.grid_cell_size(),
            width as f64,
            height as f64,
        ));
        world.insert_resource(PendingContagion::default());
        world.insert_resource(Census::default());
        world.insert_resource(SimTick::default());
        world.insert_resource(CensusHistory::with_limit(config.history_limit));

        let renderer = Renderer::new(config.render);
        let seed_profile = config.baseline_profile();
        let seed_infected = config
            .seed_infected
            .map_or(initial_infected, |count| count.min(initial_infected));
        let duration = config.infection_duration;
        tracing::debug!(
            width,
            height,
            seed = config.rng_seed,
            seeded = initial_infected,
            infected = seed_infected,
            "creating universe"
        );
        world.insert_resource(config);

        // Fixed stage order: no stage observes a half-finished earlier one.
        let stages = vec![
            Stage::new("movement", movement_system),
            Stage::new("reindex", spatial_grid_update_system),
            Stage::new(
                "contagion",
                (contagion_gather_system, contagion_apply_system).chain(),
            ),
            Stage::new("resolution", resolution_system),
            Stage::new("census", census_system),
        ];

        let mut universe = Self {
            world,
            stages,
            width,
            height,
            renderer,
            next_id: 0,
            #[cfg(feature = "profile")]
            profiler: Profiler::new(),
        };
        universe.spawn_scattered(initial_infected, seed_profile, |index| {
            if index < seed_infected {
                Health::infected(duration)
            } else {
                Health::susceptible()
            }
        });
        Ok(universe)
    }

    /// Append `group.size` susceptible agents at uniformly random positions.
    /// Returns the number of agents spawned.
    pub fn spawn_age_group(&mut self, group: &AgeGroup) -> Result<usize, UniverseError> {
        group.validate()?;
        self.spawn_scattered(group.size, group.profile(), |_| Health::susceptible());
        tracing::info!(
            size = group.size,
            activity = group.activity,
            vulnerability = group.vulnerability,
            letality = group.letality,
            population = self.population(),
            "spawned age group"
        );
        Ok(group.size as usize)
    }

    /// Shorthand for building an [`AgeGroup`] and spawning it.
    pub fn spawn_cohort(
        &mut self,
        size: u32,
        activity: f64,
        vulnerability: f64,
        letality: f64,
    ) -> Result<usize, UniverseError> {
        let group = AgeGroup::new(size, activity, vulnerability, letality)?;
        self.spawn_age_group(&group)
    }

    /// Place one agent at an exact position with an explicit health state.
    pub fn spawn_agent(&mut self, spawn: AgentSpawn) -> Result<AgentId, UniverseError> {
        if !(0.0..self.width as f64).contains(&spawn.x)
            || !(0.0..self.height as f64).contains(&spawn.y)
        {
            return Err(UniverseError::InvalidSpawn("position outside the plane"));
        }
        if !spawn.health.is_consistent() {
            return Err(UniverseError::InvalidSpawn(
                "infection timer does not match status",
            ));
        }
        validate_profile(&spawn.profile)?;

        let angle = self.world.resource_mut::<SimRng>().0.gen_range(0.0..TAU);
        let id = AgentId(self.next_id);
        self.world.spawn(AgentBundle {
            id,
            position: Position::new(spawn.x, spawn.y),
            heading: Heading::from_angle(angle),
            health: spawn.health,
            profile: spawn.profile,
        });
        self.next_id += 1;
        self.world
            .resource_mut::<Census>()
            .record(spawn.health.status());
        Ok(id)
    }

    /// Spawn `count` agents uniformly over the plane.
    fn spawn_scattered<F>(&mut self, count: u32, profile: AgeProfile, health_for: F)
    where
        F: Fn(u32) -> Health,
    {
        let (width, height) = (self.width as f64, self.height as f64);
        let first_id = self.next_id;
        let bundles: Vec<AgentBundle> = {
            let mut rng = self.world.resource_mut::<SimRng>();
            (0..count)
                .map(|index| AgentBundle {
                    id: AgentId(first_id + index),
                    position: Position::new(
                        rng.0.gen_range(0.0..width),
                        rng.0.gen_range(0.0..height),
                    ),
                    heading: Heading::from_angle(rng.0.gen_range(0.0..TAU)),
                    health: health_for(index),
                    profile,
                })
                .collect()
        };

        let mut census = *self.world.resource::<Census>();
        for bundle in &bundles {
            census.record(bundle.health.status());
        }
        *self.world.resource_mut::<Census>() = census;

        self.world.spawn_batch(bundles);
        self.next_id += count;
    }

    /// Advance the simulation by exactly one tick:
    /// movement, reindex, contagion, resolution, census.
    pub fn tick(&mut self) {
        for stage in &mut self.stages {
            #[cfg(feature = "profile")]
            let start = std::time::Instant::now();

            let world = &mut self.world;
            let schedule = &mut stage.schedule;
            tracing::trace_span!("stage", name = stage.label).in_scope(|| schedule.run(world));

            #[cfg(feature = "profile")]
            self.profiler.record(stage.label, start.elapsed());
        }
        #[cfg(feature = "profile")]
        self.profiler.tick();

        debug_assert_eq!(
            self.census().total(),
            self.next_id,
            "census out of sync with population"
        );
    }

    /// Draw every agent onto `surface`. Reads state only and streams agents
    /// from the world without collecting them.
    pub fn render<S>(&self, surface: &mut S)
    where
        S: Surface + ?Sized,
    {
        let markers = || {
            self.world.iter_entities().filter_map(|entity| {
                let pos = entity.get::<Position>()?;
                let health = entity.get::<Health>()?;
                Some(Marker {
                    x: pos.x,
                    y: pos.y,
                    status: health.status(),
                })
            })
        };
        self.renderer
            .draw_with((self.width as f64, self.height as f64), markers, surface);
    }

    pub fn susceptible(&self) -> u32 {
        self.census().susceptible
    }

    pub fn infected(&self) -> u32 {
        self.census().infected
    }

    pub fn removed(&self) -> u32 {
        self.census().removed
    }

    pub fn died(&self) -> u32 {
        self.census().died
    }

    /// All four counts at once.
    pub fn census(&self) -> Census {
        *self.world.resource::<Census>()
    }

    pub fn population(&self) -> usize {
        self.next_id as usize
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of completed ticks.
    pub fn tick_count(&self) -> u64 {
        self.world.resource::<SimTick>().0
    }

    pub fn config(&self) -> &EpidemicConfig {
        self.world.resource::<EpidemicConfig>()
    }

    /// Census after each tick, oldest first.
    pub fn history(&self) -> &CensusHistory {
        self.world.resource::<CensusHistory>()
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_world(&self.world, self.tick_count(), self.width, self.height)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&self) -> String {
        self.snapshot()
            .to_json()
            .unwrap_or_else(|_| "{}".to_string())
    }

    /// Flat host buffer, see [`crate::bridge`].
    pub fn agent_buffer(&self) -> Vec<f32> {
        crate::bridge::snapshot_to_flatbuffer(&self.snapshot())
    }

    /// The spatial grid as of the last reindex (for debugging/visualization).
    pub fn spatial_grid(&self) -> &SpatialGrid {
        self.world.resource::<SpatialGrid>()
    }

    /// Read-only access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Stage timings recorded by `tick`.
    #[cfg(feature = "profile")]
    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }
}
