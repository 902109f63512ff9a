//! Long-haul routing by decomposition into grid-searched segments.
//!
//! The start-goal line is cut into evenly spaced waypoints, each interior
//! waypoint is nudged to the most suitable spot nearby, every consecutive
//! pair is routed on its own lattice, and the stitched result is thinned
//! down to the points that matter for construction.

use std::f64::consts::TAU;

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::models::{CriteriaWeights, CriterionCosts, PathResult, Position, SearchStrategy};
use crate::route_engine::RouteEngine;
use crate::spatial::{haversine_km, intermediate_point, turn_angle_deg};
use crate::terrain::{TerrainCache, TerrainProbe, TerrainService};

/// Number of segments for a route of `distance_km`.
pub fn segment_count(distance_km: f64, config: &SearchConfig) -> usize {
    let raw = if config.segment_length_km > 0.0 {
        (distance_km / config.segment_length_km).ceil() as usize
    } else {
        config.max_segments
    };
    raw.max(config.min_segments).min(config.max_segments.max(config.min_segments))
}

/// Lattice step for a leg of `leg_km`. Legs no longer than the nominal
/// segment length use the configured step; longer ones, which appear once
/// the segment count is capped, get a proportionally coarser lattice so
/// each leg spans about as many cells as a nominal one.
pub fn leg_step_deg(leg_km: f64, config: &SearchConfig) -> f64 {
    if config.segment_length_km <= 0.0 {
        return config.grid_step_deg;
    }
    config.grid_step_deg * (leg_km / config.segment_length_km).max(1.0)
}

/// `segments + 1` points evenly spaced on the great circle, beginning and
/// ending exactly at `start` and `goal`.
pub fn interpolate_waypoints(start: Position, goal: Position, segments: usize) -> Vec<Position> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| intermediate_point(start, goal, i as f64 / segments as f64))
        .collect()
}

/// Thin a route down to its significant points using `terrain` for the
/// feature checks. Endpoints are always kept and the result is a fixed
/// point: smoothing it again changes nothing.
pub fn smooth_route(terrain: &dyn TerrainService, path: &[Position], config: &SearchConfig) -> Vec<Position> {
    let cache = TerrainCache::new();
    let probe = TerrainProbe::new(terrain, &cache);
    smooth_path(&probe, path, config)
}

pub(crate) fn smooth_path(probe: &TerrainProbe<'_>, path: &[Position], config: &SearchConfig) -> Vec<Position> {
    let mut current = path.to_vec();
    loop {
        let next = smoothing_pass(probe, &current, config);
        if next.len() == current.len() {
            return next;
        }
        current = next;
    }
}

fn smoothing_pass(probe: &TerrainProbe<'_>, path: &[Position], config: &SearchConfig) -> Vec<Position> {
    if path.len() <= 2 {
        return path.to_vec();
    }
    let last = path.len() - 1;
    let mut kept = vec![path[0]];
    for i in 1..last {
        let prev = kept[kept.len() - 1];
        if is_significant(probe, prev, path[i], path[i + 1], config) {
            kept.push(path[i]);
        }
    }
    kept.push(path[last]);
    kept
}

fn is_significant(
    probe: &TerrainProbe<'_>,
    prev: Position,
    point: Position,
    next: Position,
    config: &SearchConfig,
) -> bool {
    let gap = config.smoothing_max_gap_deg;
    turn_angle_deg(prev, point, next) >= config.smoothing_min_turn_deg
        || probe.near_road(point).present
        || probe.water_crossing(point).present
        || probe.difficulty(point) > config.smoothing_difficulty_threshold
        || (next.lat - prev.lat).abs() > gap
        || (next.lon - prev.lon).abs() > gap
}

pub(crate) struct LongRangeDecomposer<'e, 'a> {
    engine: &'e RouteEngine<'a>,
}

impl<'e, 'a> LongRangeDecomposer<'e, 'a> {
    pub(crate) fn new(engine: &'e RouteEngine<'a>) -> Self {
        Self { engine }
    }

    pub(crate) fn plan(&self, start: Position, goal: Position, weights: &CriteriaWeights) -> Result<PathResult> {
        let config = self.engine.config();
        let probe = self.engine.probe();

        let segments = segment_count(haversine_km(start, goal), config);
        let waypoints = self.optimize_waypoints(&probe, &interpolate_waypoints(start, goal, segments));
        tracing::info!(segments, waypoints = waypoints.len(), "Routing long-range segments");

        let mut stitched = vec![start];
        let mut costs = CriterionCosts::default();
        let mut nodes_expanded = 0usize;

        for (segment, pair) in waypoints.windows(2).enumerate() {
            if self.engine.is_cancelled() {
                return Err(SearchError::Cancelled {
                    iterations: nodes_expanded,
                });
            }
            let step_deg = leg_step_deg(haversine_km(pair[0], pair[1]), config);
            let leg = self
                .engine
                .search_leg(&probe, pair[0], pair[1], weights, step_deg)
                .map_err(|err| match err {
                    SearchError::Cancelled { iterations } => SearchError::Cancelled {
                        iterations: nodes_expanded + iterations,
                    },
                    other => {
                        tracing::warn!(segment, error = %other, "Long-range segment failed");
                        SearchError::SegmentFailed {
                            segment,
                            source: Box::new(other),
                        }
                    }
                })?;
            stitched.extend(leg.coordinates.into_iter().skip(1));
            costs += leg.costs;
            nodes_expanded += leg.nodes_expanded;
        }

        let coordinates = smooth_path(&probe, &stitched, config);
        let terrain_score = coordinates
            .iter()
            .map(|point| probe.difficulty(*point))
            .sum::<f64>()
            / coordinates.len() as f64;
        tracing::info!(
            stitched = stitched.len(),
            points = coordinates.len(),
            nodes_expanded,
            "Long-range route assembled"
        );

        Ok(PathResult {
            metrics: self.engine.metrics().with_terrain_score(&costs, terrain_score),
            coordinates,
            strategy: SearchStrategy::LongRange,
            nodes_expanded,
        })
    }

    /// Move every interior waypoint to the best-scoring spot among itself
    /// and a ring of samples around it. Endpoints never move.
    fn optimize_waypoints(&self, probe: &TerrainProbe<'_>, waypoints: &[Position]) -> Vec<Position> {
        if waypoints.len() <= 2 {
            return waypoints.to_vec();
        }
        let last = waypoints.len() - 1;
        let mut accepted = vec![waypoints[0]];
        for &waypoint in &waypoints[1..last] {
            let best = self.best_candidate(probe, waypoint);
            if accepted.last().map(Position::key) == Some(best.key()) {
                tracing::debug!(%best, "Skipping duplicate waypoint");
                continue;
            }
            if best != waypoint {
                tracing::debug!(from = %waypoint, to = %best, "Waypoint moved to better terrain");
            }
            accepted.push(best);
        }
        accepted.push(waypoints[last]);
        accepted
    }

    fn best_candidate(&self, probe: &TerrainProbe<'_>, waypoint: Position) -> Position {
        let config = self.engine.config();
        let radius = config.waypoint_sample_radius_deg;
        let directions = config.waypoint_sample_directions;

        let ring = (0..directions).map(|k| {
            let angle = TAU * k as f64 / directions as f64;
            Position::new(waypoint.lat + radius * angle.cos(), waypoint.lon + radius * angle.sin())
        });

        let mut best = waypoint;
        let mut best_score = self.suitability(probe, waypoint);
        for candidate in ring.filter(Position::is_valid) {
            let score = self.suitability(probe, candidate);
            if score > best_score {
                best = candidate;
                best_score = score;
            }
        }
        best
    }

    /// How good a spot is for a waypoint, in `[0, 1]`.
    pub(crate) fn suitability(&self, probe: &TerrainProbe<'_>, point: Position) -> f64 {
        if !probe.is_traversable(point) {
            return 0.01;
        }
        let difficulty = probe.difficulty(point);
        let accessibility = probe.accessibility(point);
        let spec = self.engine.pipe_spec();
        let impact = self
            .engine
            .cost_model()
            .environmental_impact(spec.pipe_type, spec, difficulty, accessibility);

        let mut score = 0.7;
        let road = probe.near_road(point);
        if road.present {
            score += 0.18 * road.factor;
        }
        let water = probe.water_crossing(point);
        if water.present {
            score -= 0.08 * water.factor * (1.0 + difficulty);
        }
        score -= 0.15 * (impact + difficulty) / 2.0;
        let protected = probe.protected_area(point);
        if protected.present {
            score -= 0.12 * protected.factor;
        }
        let settlement = probe.near_settlement(point);
        if settlement.present {
            score -= 0.12 * settlement.factor;
        }
        score.clamp(0.0, 1.0)
    }
}
