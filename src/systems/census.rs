//! Census system - aggregate compartment counts, tick counter and history.

use crate::components::*;
use crate::systems::contagion::PendingContagion;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Global simulation tick counter.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// Number of agents in each compartment.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    pub susceptible: u32,
    pub infected: u32,
    pub removed: u32,
    pub died: u32,
}

impl Census {
    pub fn total(&self) -> u32 {
        self.susceptible + self.infected + self.removed + self.died
    }

    pub fn count(&self, status: HealthStatus) -> u32 {
        match status {
            HealthStatus::Susceptible => self.susceptible,
            HealthStatus::Infected => self.infected,
            HealthStatus::Removed => self.removed,
            HealthStatus::Died => self.died,
        }
    }

    pub fn record(&mut self, status: HealthStatus) {
        match status {
            HealthStatus::Susceptible => self.susceptible += 1,
            HealthStatus::Infected => self.infected += 1,
            HealthStatus::Removed => self.removed += 1,
            HealthStatus::Died => self.died += 1,
        }
    }

    /// Count statuses from scratch.
    pub fn tally<'a, I>(healths: I) -> Self
    where
        I: IntoIterator<Item = &'a Health>,
    {
        let mut census = Self::default();
        for health in healths {
            census.record(health.status());
        }
        census
    }
}

/// One point of the epidemic curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusSample {
    pub tick: u64,
    pub susceptible: u32,
    pub infected: u32,
    pub removed: u32,
    pub died: u32,
}

impl CensusSample {
    pub fn new(tick: u64, census: &Census) -> Self {
        Self {
            tick,
            susceptible: census.susceptible,
            infected: census.infected,
            removed: census.removed,
            died: census.died,
        }
    }
}

/// Bounded history of census samples, oldest first.
#[derive(Resource, Debug, Clone, Default)]
pub struct CensusHistory {
    samples: VecDeque<CensusSample>,
    /// Maximum retained samples; 0 is unbounded.
    limit: usize,
}

impl CensusHistory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            limit,
        }
    }

    pub fn push(&mut self, sample: CensusSample) {
        if self.limit > 0 && self.samples.len() == self.limit {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&CensusSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CensusSample> {
        self.samples.iter()
    }
}

/// System that recounts compartments, advances the tick and records history.
///
/// ## Data Access
/// - Reads: Health, PendingContagion
/// - Writes: Census, SimTick, CensusHistory
pub fn census_system(
    mut census: ResMut<Census>,
    mut tick: ResMut<SimTick>,
    mut history: ResMut<CensusHistory>,
    pending: Option<Res<PendingContagion>>,
    query: Query<&Health>,
) {
    let previous_infected = census.infected;
    let next = Census::tally(query.iter());
    debug_assert!(
        query.iter().all(Health::is_consistent),
        "infection timer out of sync with status"
    );

    *census = next;
    tick.increment();
    history.push(CensusSample::new(tick.0, &census));

    if previous_infected > 0 && census.infected == 0 {
        tracing::debug!(
            tick = tick.0,
            removed = census.removed,
            died = census.died,
            "epidemic quiescent: no infected agents remain"
        );
    }
    tracing::trace!(
        tick = tick.0,
        susceptible = census.susceptible,
        infected = census.infected,
        removed = census.removed,
        died = census.died,
        new_infections = pending.map(|p| p.newly_infected.len()).unwrap_or(0),
        "tick complete"
    );
}
