//! Contagion - Epidemic Spread Simulation Core
//!
//! A deterministic, tick-driven simulation of a disease moving through a
//! population of wandering agents on a bounded 2D plane.
//! Uses `bevy_ecs` for the entity-component-system architecture.
//!
//! Agents move by random walk, infected agents expose susceptible neighbours
//! found through a uniform spatial grid, and infections resolve into recovery
//! or death after a fixed number of ticks. A host (chart, counters, canvas)
//! drives the [`Universe`] one tick at a time and reads the four compartment
//! counts or renders onto any [`Surface`].

pub mod age_group;
pub mod api;
pub mod bridge;
pub mod components;
pub mod config;
pub mod error;
pub mod profiler;
pub mod render;
pub mod spatial;
pub mod systems;
pub mod world;

pub use age_group::AgeGroup;
pub use api::{AgentSpawn, Universe};
pub use components::*;
pub use config::{EpidemicConfig, QuarantineZone};
pub use error::UniverseError;
pub use render::{Marker, Palette, PixelBuffer, RenderConfig, Renderer, Rgba, Surface};
pub use spatial::{SpatialEntry, SpatialGrid};
pub use systems::*;
pub use world::{AgentSnapshot, Snapshot};
