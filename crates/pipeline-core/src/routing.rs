//! Primary and alternative route generation.
//!
//! Alternatives come from re-running the same engine with perturbed
//! criterion weights, alternately favouring the environment and terrain,
//! then distance and construction cost.

use rayon::prelude::*;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::config::SearchConfig;
use crate::costs::{CostModel, PipelineCostModel};
use crate::error::Result;
use crate::models::{CriteriaWeights, Criterion, PathResult, PipeSpec, Position};
use crate::route_engine::RouteEngine;
use crate::terrain::TerrainService;

/// Weights for the `index`-th alternative (1-based).
///
/// Odd alternatives boost terrain difficulty and environmental impact while
/// damping distance; even ones boost distance and construction cost while
/// damping environmental impact. The boost doubles every two alternatives.
/// The result is normalised to sum to one.
pub fn alternative_weights(base: &CriteriaWeights, index: usize, config: &SearchConfig) -> CriteriaWeights {
    let round = index.div_ceil(2).max(1);
    let exponent = i32::try_from(round).unwrap_or(i32::MAX);
    let multiplier = config.alternative_weight_multiplier.powi(exponent);
    let floor = config.alternative_weight_floor;

    let mut weights = base.clone();
    let boost = |criterion: Criterion| base.get(criterion).max(floor) * multiplier;
    let damp = |criterion: Criterion| (base.get(criterion) / multiplier).max(floor);

    if index % 2 == 1 {
        weights.set(Criterion::TerrainDifficulty, boost(Criterion::TerrainDifficulty));
        weights.set(Criterion::EnvironmentalImpact, boost(Criterion::EnvironmentalImpact));
        weights.set(Criterion::Distance, damp(Criterion::Distance));
    } else {
        weights.set(Criterion::Distance, boost(Criterion::Distance));
        weights.set(Criterion::ConstructionCost, boost(Criterion::ConstructionCost));
        weights.set(Criterion::EnvironmentalImpact, damp(Criterion::EnvironmentalImpact));
    }
    weights.normalized()
}

/// Find a primary route plus up to `alternative_count` alternatives using
/// the reference cost model and default search configuration.
pub fn find_routes(
    start: Position,
    goal: Position,
    terrain: &dyn TerrainService,
    pipe_spec: &PipeSpec,
    weights: &CriteriaWeights,
    alternative_count: usize,
) -> Result<Vec<PathResult>> {
    RoutePlanner::new(terrain, pipe_spec.clone()).find_routes(start, goal, weights, alternative_count)
}

/// Builder over [`RouteEngine`] for callers that need a custom cost model,
/// configuration or cancellation flag.
pub struct RoutePlanner<'a> {
    terrain: &'a dyn TerrainService,
    cost_model: &'a dyn CostModel,
    pipe_spec: PipeSpec,
    config: SearchConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> RoutePlanner<'a> {
    pub fn new(terrain: &'a dyn TerrainService, pipe_spec: PipeSpec) -> Self {
        Self {
            terrain,
            cost_model: &PipelineCostModel,
            pipe_spec,
            config: SearchConfig::default(),
            cancel: None,
        }
    }

    pub fn with_cost_model(mut self, cost_model: &'a dyn CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// A fresh engine, with its own empty terrain cache.
    pub fn engine(&self) -> RouteEngine<'a> {
        let engine = RouteEngine::new(
            self.terrain,
            self.cost_model,
            self.pipe_spec.clone(),
            self.config.clone(),
        );
        match &self.cancel {
            Some(flag) => engine.with_cancellation(Arc::clone(flag)),
            None => engine,
        }
    }

    /// The primary route first, then every alternative that succeeded, in
    /// order. A failing primary search is the error; failing alternatives
    /// are logged and left out.
    pub fn find_routes(
        &self,
        start: Position,
        goal: Position,
        weights: &CriteriaWeights,
        alternative_count: usize,
    ) -> Result<Vec<PathResult>> {
        let engine = self.engine();
        let primary = engine.search(start, goal, weights)?;
        tracing::info!(
            points = primary.coordinates.len(),
            distance_km = primary.metrics.total_distance,
            "Primary route found"
        );

        let run = |index: usize| {
            let alt_weights = alternative_weights(weights, index, &self.config);
            tracing::debug!(index, weights = ?alt_weights, "Searching alternative route");
            (index, engine.search(start, goal, &alt_weights))
        };
        let outcomes: Vec<(usize, Result<PathResult>)> =
            if self.config.parallel_alternatives && alternative_count > 1 {
                (1..=alternative_count).into_par_iter().map(run).collect()
            } else {
                (1..=alternative_count).map(run).collect()
            };

        let mut routes = Vec::with_capacity(alternative_count + 1);
        routes.push(primary);
        for (index, outcome) in outcomes {
            match outcome {
                Ok(mut route) => {
                    route.metrics.alternative_num = Some(index);
                    routes.push(route);
                }
                Err(err) => {
                    tracing::warn!(index, error = %err, "Alternative route failed");
                }
            }
        }
        Ok(routes)
    }
}
