//! Path recovery from the search arena and aggregate route metrics.

use crate::costs::CostModel;
use crate::models::{CriterionCosts, PipeSpec, RouteMetrics};
use crate::route_engine::SearchNode;

/// Indices of the nodes from the root to `terminal`, in travel order.
///
/// The walk is bounded by the arena size, so a corrupted predecessor chain
/// cannot loop forever.
pub(crate) fn node_chain(arena: &[SearchNode], terminal: usize) -> Vec<usize> {
    let mut chain = Vec::new();
    let mut current = Some(terminal);
    while let Some(idx) = current {
        if chain.len() > arena.len() {
            break;
        }
        chain.push(idx);
        current = arena.get(idx).and_then(|node| node.predecessor);
    }
    chain.reverse();
    chain
}

/// Construction time in days: ten days per km, stretched by rough terrain.
pub fn construction_time_days(total_distance_km: f64, terrain_difficulty_score: f64) -> f64 {
    (total_distance_km * 10.0 * (1.0 + terrain_difficulty_score * 2.0)).round()
}

/// Builds [`RouteMetrics`] from accumulated per-criterion costs.
pub struct MetricsBuilder<'a> {
    cost_model: &'a dyn CostModel,
    pipe_spec: &'a PipeSpec,
}

impl<'a> MetricsBuilder<'a> {
    pub fn new(cost_model: &'a dyn CostModel, pipe_spec: &'a PipeSpec) -> Self {
        Self {
            cost_model,
            pipe_spec,
        }
    }

    /// Metrics whose terrain score is the per-step mean of the accumulated
    /// terrain cost.
    pub fn from_costs(&self, costs: &CriterionCosts) -> RouteMetrics {
        self.with_terrain_score(costs, per_step_mean(costs.terrain_difficulty, costs.steps))
    }

    /// Metrics with an externally sampled terrain score.
    pub fn with_terrain_score(&self, costs: &CriterionCosts, terrain_difficulty_score: f64) -> RouteMetrics {
        let total_distance = costs.distance;
        RouteMetrics {
            total_distance,
            estimated_cost: costs.construction_cost,
            terrain_difficulty_score,
            environmental_impact_score: per_step_mean(costs.environmental_impact, costs.steps),
            estimated_construction_time: construction_time_days(total_distance, terrain_difficulty_score),
            annual_operating_cost: self.cost_model.annual_operating_cost(
                self.pipe_spec,
                total_distance,
                terrain_difficulty_score,
            ),
            alternative_num: None,
        }
    }
}

fn per_step_mean(total: f64, steps: u32) -> f64 {
    if steps == 0 {
        0.0
    } else {
        total / steps as f64
    }
}
