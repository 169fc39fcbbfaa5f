//! Spatial partitioning for efficient neighbor queries.
//!
//! Provides O(1) cell lookup and O(k) neighbor queries where k is the number
//! of agents in nearby cells, rather than O(n) for brute force.
//!
//! Only occupied cells are stored. Each rebuild is a counting sort over the
//! occupied cells: entries live in one flat vector and each cell maps to a
//! contiguous run of slot indices into it. Rebuild cost and memory follow
//! the population, never the plane area.

use crate::components::{Health, HealthStatus, Position};
use bevy_ecs::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Grid-based spatial partitioning structure over a bounded plane.
///
/// Divides the plane into square cells and tracks which agents are in each
/// cell. Enables fast neighbor queries by only checking nearby cells.
#[derive(Resource, Debug, Clone)]
pub struct SpatialGrid {
    /// Cell size in world units.
    cell_size: f64,
    cols: usize,
    rows: usize,
    /// All indexed agents, in insertion order.
    entries: Vec<SpatialEntry>,
    /// Occupied cells, keyed by `(col, row)`.
    cells: HashMap<(usize, usize), CellRun>,
    /// Occupied cells in first-seen order; fixes the slot layout.
    occupied: Vec<(usize, usize)>,
    /// Indices into `entries`, grouped by cell.
    slots: Vec<u32>,
}

/// The run `slots[start..start + len]` of one cell.
#[derive(Debug, Clone, Copy, Default)]
struct CellRun {
    start: u32,
    len: u32,
}

/// Entry in a spatial cell.
///
/// `status` is a snapshot taken when the grid was rebuilt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub x: f64,
    pub y: f64,
    pub status: HealthStatus,
}

impl SpatialGrid {
    /// Create an empty grid covering a `width` x `height` plane.
    pub fn new(cell_size: f64, width: f64, height: f64) -> Self {
        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((height / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            cols,
            rows,
            entries: Vec::new(),
            cells: HashMap::new(),
            occupied: Vec::new(),
            slots: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Grid extent in cells, `(cols, rows)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Convert world coordinates to clamped cell coordinates.
    #[inline]
    pub fn world_to_cell(&self, x: f64, y: f64) -> (usize, usize) {
        let cx = (x / self.cell_size).floor().max(0.0) as usize;
        let cy = (y / self.cell_size).floor().max(0.0) as usize;
        (cx.min(self.cols - 1), cy.min(self.rows - 1))
    }

    /// Replace the contents of the grid with `entries`.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = SpatialEntry>,
    {
        self.entries.clear();
        self.entries.extend(entries);
        self.cells.clear();
        self.occupied.clear();

        // Count per occupied cell.
        for entry in &self.entries {
            let key = self.world_to_cell(entry.x, entry.y);
            match self.cells.entry(key) {
                Entry::Occupied(mut run) => run.get_mut().len += 1,
                Entry::Vacant(slot) => {
                    slot.insert(CellRun { start: 0, len: 1 });
                    self.occupied.push(key);
                }
            }
        }

        // Prefix-sum into run starts; `len` is reused as the fill cursor.
        let mut start = 0;
        for key in &self.occupied {
            if let Some(run) = self.cells.get_mut(key) {
                run.start = start;
                start += run.len;
                run.len = 0;
            }
        }

        self.slots.clear();
        self.slots.resize(self.entries.len(), 0);
        for (index, entry) in self.entries.iter().enumerate() {
            let key = self.world_to_cell(entry.x, entry.y);
            if let Some(run) = self.cells.get_mut(&key) {
                self.slots[(run.start + run.len) as usize] = index as u32;
                run.len += 1;
            }
        }
    }

    /// Clear all entries.
    pub fn clear(&mut self) {
        self.rebuild(std::iter::empty());
    }

    /// Visit every entry within `radius` of `(x, y)`.
    ///
    /// Cells are scanned row by row; when the search window spans more cells
    /// than there are entries, the entries are scanned directly instead.
    pub fn for_each_within<F>(&self, x: f64, y: f64, radius: f64, mut visit: F)
    where
        F: FnMut(&SpatialEntry),
    {
        if self.entries.is_empty() {
            return;
        }
        let radius_sq = radius * radius;
        let mut visit_near = |entry: &SpatialEntry| {
            let dx = entry.x - x;
            let dy = entry.y - y;
            if dx * dx + dy * dy <= radius_sq {
                visit(entry);
            }
        };

        let reach = (radius / self.cell_size).ceil() as usize;
        let (cx, cy) = self.world_to_cell(x, y);
        let (x0, x1) = (cx.saturating_sub(reach), cx.saturating_add(reach).min(self.cols - 1));
        let (y0, y1) = (cy.saturating_sub(reach), cy.saturating_add(reach).min(self.rows - 1));

        let window = (x1 - x0 + 1).saturating_mul(y1 - y0 + 1);
        if window > self.entries.len() {
            for entry in &self.entries {
                visit_near(entry);
            }
            return;
        }

        for row in y0..=y1 {
            for col in x0..=x1 {
                let Some(run) = self.cells.get(&(col, row)) else {
                    continue;
                };
                let run = run.start as usize..(run.start + run.len) as usize;
                for &slot in &self.slots[run] {
                    visit_near(&self.entries[slot as usize]);
                }
            }
        }
    }

/// Query all entries within a radius of a point.
    /// Returns entries sorted by distance (closest first).
    pub fn query_radius(&self, x: f64, y: f64, radius: f64) -> Vec<SpatialEntry> {
        let mut results = Vec::new();
        self.for_each_within(x, y, radius, |entry| results.push(*entry));

        results.sort_by(|a, b| {
            let dist_a = (a.x - x).powi(2) + (a.y - y).powi(2);
            let dist_b = (b.x - x).powi(2) + (b.y - y).powi(2);
            dist_a.partial_cmp(&dist_b).unwrap_or(std::cmp::Ordering::Equal)
        });

        results
    }

    /// Query entries within radius that currently have `status`.
    pub fn query_status(&self, x: f64, y: f64, radius: f64, status: HealthStatus) -> Vec<SpatialEntry> {
        let mut results = self.query_radius(x, y, radius);
        results.retain(|e| e.status == status);
        results
    }

    /// Get count of entries in a cell.
    pub fn cell_count(&self, cell: (usize, usize)) -> usize {
        self.cells.get(&cell).map_or(0, |run| run.len as usize)
    }

    /// Number of cells holding at least one entry.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Get total entry count.
    pub fn total_count(&self) -> usize {
        self.entries.len()
    }

    /// All indexed entries in insertion order.
    pub fn entries(&self) -> &[SpatialEntry] {
        &self.entries
    }
}

/// System that rebuilds the spatial grid each tick.
///
/// Died agents are frozen and inert, so they are left out.
pub fn spatial_grid_update_system(
    mut grid: ResMut<SpatialGrid>,
    query: Query<(Entity, &Position, &Health)>,
) {
    grid.rebuild(
        query
            .iter()
            .filter(|(_, _, health)| !health.is_dead())
            .map(|(entity, pos, health)| SpatialEntry {
                entity,
                x: pos.x,
                y: pos.y,
                status: health.status(),
            }),
    );
}
