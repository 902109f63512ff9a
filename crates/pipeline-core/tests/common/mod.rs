//! Shared terrain fixtures for route search integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use pipeline_core::terrain::TerrainResult;
use pipeline_core::{
    CostModel, PipeSpec, PipeType, Position, RouteEngine, SearchConfig, TerrainError, TerrainService,
};

/// About 3.5 km apart, south-west to north-east.
pub const START: Position = Position::new(52.28, 104.28);
pub const GOAL: Position = Position::new(52.30, 104.32);
pub const MIDPOINT: Position = Position::new(52.29, 104.30);

/// Axis-aligned square in degrees.
#[derive(Debug, Clone, Copy)]
pub struct Square {
    pub center: Position,
    pub half_side_deg: f64,
}

impl Square {
    pub fn contains(&self, p: Position) -> bool {
        (p.lat - self.center.lat).abs() <= self.half_side_deg
            && (p.lon - self.center.lon).abs() <= self.half_side_deg
    }
}

/// Disc of elevated difficulty, radius in degrees.
#[derive(Debug, Clone, Copy)]
pub struct Disc {
    pub center: Position,
    pub radius_deg: f64,
    pub difficulty: f64,
}

impl Disc {
    pub fn contains(&self, p: Position) -> bool {
        ((p.lat - self.center.lat).powi(2) + (p.lon - self.center.lon).powi(2)).sqrt() <= self.radius_deg
    }
}

/// Flat, fully accessible terrain with optional forbidden squares and
/// difficult discs. Counts difficulty lookups.
#[derive(Debug, Default)]
pub struct GridTerrain {
    pub forbidden: Vec<Square>,
    pub discs: Vec<Disc>,
    pub difficulty_calls: AtomicUsize,
}

impl GridTerrain {
    pub fn difficulty_calls(&self) -> usize {
        self.difficulty_calls.load(Ordering::SeqCst)
    }
}

impl TerrainService for GridTerrain {
    fn is_traversable(&self, position: Position) -> TerrainResult<bool> {
        Ok(!self.forbidden.iter().any(|square| square.contains(position)))
    }

    fn difficulty(&self, position: Position) -> TerrainResult<f64> {
        self.difficulty_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .discs
            .iter()
            .filter(|disc| disc.contains(position))
            .map(|disc| disc.difficulty)
            .fold(0.0, f64::max))
    }

    fn accessibility(&self, _position: Position) -> TerrainResult<f64> {
        Ok(1.0)
    }
}

pub fn flat() -> GridTerrain {
    GridTerrain::default()
}

/// A forbidden square straddling the straight start-goal line.
pub fn forbidden_midpoint() -> GridTerrain {
    GridTerrain {
        forbidden: vec![Square {
            center: MIDPOINT,
            half_side_deg: 0.003,
        }],
        ..GridTerrain::default()
    }
}

/// A traversable but maximally difficult disc on the start-goal line.
pub fn difficult_disc() -> GridTerrain {
    difficult_disc_at(0.5)
}

/// Same disc, centred `fraction` of the way from start to goal.
pub fn difficult_disc_at(fraction: f64) -> GridTerrain {
    let center = Position::new(
        START.lat + (GOAL.lat - START.lat) * fraction,
        START.lon + (GOAL.lon - START.lon) * fraction,
    );
    GridTerrain {
        discs: vec![Disc {
            center,
            radius_deg: 0.004,
            difficulty: 1.0,
        }],
        ..GridTerrain::default()
    }
}

/// Terrain whose difficulty and accessibility lookups fail north of the
/// midpoint latitude.
pub struct FlakyTerrain;

impl TerrainService for FlakyTerrain {
    fn is_traversable(&self, _position: Position) -> TerrainResult<bool> {
        Ok(true)
    }

    fn difficulty(&self, position: Position) -> TerrainResult<f64> {
        if position.lat > MIDPOINT.lat {
            Err(TerrainError::Timeout { millis: 100 })
        } else {
            Ok(0.1)
        }
    }

    fn accessibility(&self, position: Position) -> TerrainResult<f64> {
        if position.lat > MIDPOINT.lat {
            Err(TerrainError::Lookup {
                position,
                message: "tile missing".into(),
            })
        } else {
            Ok(0.9)
        }
    }
}

/// Terrain that never answers.
pub struct FailingTerrain;

impl TerrainService for FailingTerrain {
    fn is_traversable(&self, position: Position) -> TerrainResult<bool> {
        Err(TerrainError::Lookup {
            position,
            message: "service unavailable".into(),
        })
    }

    fn difficulty(&self, _position: Position) -> TerrainResult<f64> {
        Err(TerrainError::Timeout { millis: 100 })
    }

    fn accessibility(&self, _position: Position) -> TerrainResult<f64> {
        Err(TerrainError::Timeout { millis: 100 })
    }
}

/// Flat construction price and no environmental impact, so only distance
/// and terrain drive the search.
pub struct CheapCostModel;

impl CostModel for CheapCostModel {
    fn construction_cost(&self, _spec: &PipeSpec, _terrain_difficulty: f64) -> f64 {
        1.0
    }

    fn environmental_impact(
        &self,
        _pipe_type: PipeType,
        _spec: &PipeSpec,
        _terrain_difficulty: f64,
        _accessibility: f64,
    ) -> f64 {
        0.0
    }
}

pub fn engine(terrain: &dyn TerrainService) -> RouteEngine<'_> {
    engine_with(terrain, SearchConfig::default())
}

pub fn engine_with(terrain: &dyn TerrainService, config: SearchConfig) -> RouteEngine<'_> {
    RouteEngine::new(terrain, &CheapCostModel, PipeSpec::default(), config)
}
