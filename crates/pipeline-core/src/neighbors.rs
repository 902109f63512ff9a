//! Lattice over the search area and neighbour expansion.

use crate::models::{Position, PositionKey};
use crate::spatial::{degrees_to_km, haversine_km};
use crate::terrain::TerrainProbe;

/// Integer lattice coordinate relative to the search origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub row: i64,
    pub col: i64,
}

impl GridCell {
    pub const ORIGIN: GridCell = GridCell { row: 0, col: 0 };

    fn offset(self, d_row: i64, d_col: i64) -> GridCell {
        GridCell {
            row: self.row + d_row,
            col: self.col + d_col,
        }
    }
}

/// Square lattice anchored at the search start.
///
/// Positions are always derived as `origin + index * step`, never by
/// accumulating offsets, so every visit of a cell yields the same
/// [`PositionKey`].
#[derive(Debug, Clone, Copy)]
pub struct SearchGrid {
    origin: Position,
    step_deg: f64,
}

impl SearchGrid {
    pub fn new(origin: Position, step_deg: f64) -> Self {
        Self { origin, step_deg }
    }

    pub fn position(&self, cell: GridCell) -> Position {
        Position::new(
            self.origin.lat + cell.row as f64 * self.step_deg,
            self.origin.lon + cell.col as f64 * self.step_deg,
        )
    }

    pub fn step_deg(&self) -> f64 {
        self.step_deg
    }

    /// Length in kilometres of one move at the given stride.
    pub fn step_km(&self, stride: i64) -> f64 {
        degrees_to_km(self.step_deg * stride as f64)
    }

    /// Number of single-step lattice moves needed to cover `a -> b`.
    pub fn moves_between(&self, a: Position, b: Position) -> usize {
        let span = (b.lat - a.lat).abs().max((b.lon - a.lon).abs());
        ((span / self.step_deg - 1e-9).ceil() as usize).max(1)
    }
}

/// A candidate successor. `cell` is `None` only for the exact goal, which
/// lies off the lattice and is never expanded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: Position,
    pub cell: Option<GridCell>,
}

const COMPASS: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

pub struct NeighborGenerator<'g> {
    grid: &'g SearchGrid,
    goal: Position,
    goal_key: PositionKey,
    escape_factor: f64,
    attach_factor: f64,
}

impl<'g> NeighborGenerator<'g> {
    pub fn new(grid: &'g SearchGrid, goal: Position, escape_factor: f64, attach_factor: f64) -> Self {
        Self {
            grid,
            goal,
            goal_key: goal.key(),
            escape_factor,
            attach_factor,
        }
    }

    /// Up to eight compass moves of `stride` cells, plus the exact goal
    /// when it is close enough to attach.
    ///
    /// Non-traversable cells are dropped unless they are within the escape
    /// radius of the goal, so a goal sitting in or next to forbidden terrain
    /// can still be reached.
    pub(crate) fn neighbors(&self, probe: &TerrainProbe<'_>, cell: GridCell, stride: i64) -> Vec<Neighbor> {
        let current = self.grid.position(cell);
        let step_km = self.grid.step_km(stride);
        let escape_km = self.escape_factor * step_km;
        let mut out = Vec::with_capacity(COMPASS.len() + 1);

        for (d_row, d_col) in COMPASS {
            let next = cell.offset(d_row * stride, d_col * stride);
            let position = self.grid.position(next);
            if !position.is_valid() {
                continue;
            }
            if probe.is_traversable(position) {
                out.push(Neighbor {
                    position,
                    cell: Some(next),
                });
            } else if haversine_km(position, self.goal) < escape_km {
                tracing::debug!(%position, "admitting non-traversable cell next to goal");
                out.push(Neighbor {
                    position,
                    cell: Some(next),
                });
            }
        }

        let goal_listed = out.iter().any(|n| n.position.key() == self.goal_key);
        if !goal_listed && haversine_km(current, self.goal) < self.attach_factor * step_km {
            out.push(Neighbor {
                position: self.goal,
                cell: None,
            });
        }

        out
    }
}
