//! ECS Systems for the Contagion simulation.
//!
//! Systems contain the epidemic logic that operates on components.
//!
//! ## Stage Order
//!
//! Each tick runs the stages below strictly in sequence, each from its own
//! schedule, so no partial-tick state is ever observable:
//!
//! 1. **Movement** - `movement_system` random-walks every living agent
//! 2. **Reindex** - `spatial_grid_update_system` rebuilds the spatial grid
//! 3. **Contagion** - `contagion_gather_system` then `contagion_apply_system`
//! 4. **Resolution** - `resolution_system` counts infections down
//! 5. **Census** - `census_system` recounts compartments and advances the tick

pub mod census;
pub mod contagion;
pub mod movement;
pub mod resolution;
pub mod serialization;

pub use census::*;
pub use contagion::*;
pub use movement::*;
pub use resolution::*;
pub use serialization::*;
