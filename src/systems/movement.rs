//! Movement system - random-walk displacement with reflecting walls.

use crate::components::*;
use crate::config::EpidemicConfig;
use bevy_ecs::prelude::*;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Extent of the plane agents move on.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PlaneBounds {
    pub width: f64,
    pub height: f64,
}

/// The universe-owned random source. Every stochastic decision draws from
/// here, in a fixed order, so a seed fully determines a run.
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub ChaCha8Rng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

/// Fold `value` back into `[0, extent)` by mirroring about the walls.
///
/// Returns the folded coordinate and whether the direction of travel along
/// this axis ends up reversed (an odd number of wall crossings).
pub fn reflect_into(value: f64, extent: f64) -> (f64, bool) {
    if (0.0..extent).contains(&value) {
        return (value, false);
    }
    let period = 2.0 * extent;
    let folded = value.rem_euclid(period);
    let (mut reflected, flipped) = if folded >= extent {
        (period - folded, true)
    } else {
        (folded, false)
    };
    if reflected >= extent {
        // Landed exactly on the far wall.
        reflected = f64::from_bits(extent.to_bits() - 1);
    }
    (reflected, flipped)
}

/// System that advances every living agent one random-walk step.
///
/// ## Data Access
/// - Reads: PlaneBounds, EpidemicConfig, Health, AgeProfile
/// - Writes: SimRng, Position, Heading
pub fn movement_system(
    bounds: Res<PlaneBounds>,
    config: Res<EpidemicConfig>,
    mut rng: ResMut<SimRng>,
    mut query: Query<(&mut Position, &mut Heading, &Health, &AgeProfile)>,
) {
    let jitter = config.turn_jitter;
    for (mut pos, mut heading, health, profile) in query.iter_mut() {
        // Dead agents are frozen in place for good
        if health.is_dead() {
            continue;
        }

        if jitter > 0.0 {
            heading.rotate(rng.0.gen_range(-jitter..=jitter));
        }

        let step = config.base_speed * profile.activity;
        let (x, flip_x) = reflect_into(pos.x + heading.dx * step, bounds.width);
        let (y, flip_y) = reflect_into(pos.y + heading.dy * step, bounds.height);
        pos.x = x;
        pos.y = y;
        if flip_x {
            heading.dx = -heading.dx;
        }
        if flip_y {
            heading.dy = -heading.dy;
        }
    }
}
