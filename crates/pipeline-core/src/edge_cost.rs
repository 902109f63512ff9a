//! Per-criterion cost of moving between two positions.

use crate::costs::CostModel;
use crate::models::{CriterionCosts, PipeSpec, Position};
use crate::spatial::{haversine_km, intermediate_point};
use crate::terrain::TerrainProbe;

/// Prices a move against the terrain at its destination.
pub struct EdgeCostModel<'a> {
    cost_model: &'a dyn CostModel,
    pipe_spec: &'a PipeSpec,
}

impl<'a> EdgeCostModel<'a> {
    pub fn new(cost_model: &'a dyn CostModel, pipe_spec: &'a PipeSpec) -> Self {
        Self {
            cost_model,
            pipe_spec,
        }
    }

    /// Cost of a single move `from -> to`.
    ///
    /// Terrain difficulty and accessibility are sampled at `to`. Construction
    /// cost is the model's per-km price times the move length.
    pub(crate) fn edge_cost(&self, probe: &TerrainProbe<'_>, from: Position, to: Position) -> CriterionCosts {
        let distance = haversine_km(from, to);
        let difficulty = probe.difficulty(to);
        let accessibility = probe.accessibility(to);

        CriterionCosts {
            distance,
            terrain_difficulty: difficulty,
            environmental_impact: self.cost_model.environmental_impact(
                self.pipe_spec.pipe_type,
                self.pipe_spec,
                difficulty,
                accessibility,
            ),
            construction_cost: self.cost_model.construction_cost(self.pipe_spec, difficulty) * distance,
            maintenance_access: 1.0 - accessibility,
            steps: 1,
        }
    }

    /// Cost of a straight segment, priced as `moves` equal moves along the
    /// great circle from `from` to `to`.
    pub(crate) fn segment_cost(
        &self,
        probe: &TerrainProbe<'_>,
        from: Position,
        to: Position,
        moves: usize,
    ) -> CriterionCosts {
        let moves = moves.max(1);
        let mut total = CriterionCosts::default();
        let mut previous = from;
        for i in 1..=moves {
            let next = intermediate_point(from, to, i as f64 / moves as f64);
            total += self.edge_cost(probe, previous, next);
            previous = next;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costs::PipelineCostModel;
    use crate::models::{CriteriaWeights, Criterion};
    use crate::terrain::{TerrainCache, TerrainError, TerrainResult, TerrainService};

    struct Ramp;

    impl TerrainService for Ramp {
        fn is_traversable(&self, _position: Position) -> TerrainResult<bool> {
            Ok(true)
        }
        fn difficulty(&self, position: Position) -> TerrainResult<f64> {
            Ok(if position.lon > 104.0 { 0.5 } else { 0.0 })
        }
        fn accessibility(&self, _position: Position) -> TerrainResult<f64> {
            Ok(0.75)
        }
    }

    struct Offline;

    impl TerrainService for Offline {
        fn is_traversable(&self, _position: Position) -> TerrainResult<bool> {
            Err(TerrainError::Timeout { millis: 10 })
        }
        fn difficulty(&self, _position: Position) -> TerrainResult<f64> {
            Err(TerrainError::Timeout { millis: 10 })
        }
        fn accessibility(&self, _position: Position) -> TerrainResult<f64> {
            Err(TerrainError::Timeout { millis: 10 })
        }
    }

    #[test]
    fn edge_cost_samples_destination() {
        let spec = PipeSpec::default();
        let model = PipelineCostModel;
        let edges = EdgeCostModel::new(&model, &spec);
        let cache = TerrainCache::new();
        let probe = TerrainProbe::new(&Ramp, &cache);

        let from = Position::new(52.0, 103.999);
        let to = Position::new(52.0, 104.001);
        let cost = edges.edge_cost(&probe, from, to);

        assert_eq!(cost.terrain_difficulty, 0.5);
        assert!((cost.maintenance_access - 0.25).abs() < 1e-12);
        assert!((cost.distance - haversine_km(from, to)).abs() < 1e-12);
        let per_km = model.construction_cost(&spec, 0.5);
        assert!((cost.construction_cost - per_km * cost.distance).abs() < 1e-9);
        assert_eq!(cost.steps, 1);
    }

    #[test]
    fn failed_probes_price_at_worst_case() {
        let spec = PipeSpec::default();
        let model = PipelineCostModel;
        let edges = EdgeCostModel::new(&model, &spec);
        let cache = TerrainCache::new();
        let probe = TerrainProbe::new(&Offline, &cache);

        let cost = edges.edge_cost(&probe, Position::new(0.0, 0.0), Position::new(0.0, 0.001));
        assert_eq!(cost.terrain_difficulty, 1.0);
        assert_eq!(cost.maintenance_access, 1.0);
    }

    #[test]
    fn segment_cost_splits_into_moves() {
        let spec = PipeSpec::default();
        let model = PipelineCostModel;
        let edges = EdgeCostModel::new(&model, &spec);
        let cache = TerrainCache::new();
        let probe = TerrainProbe::new(&Ramp, &cache);

        let from = Position::new(52.0, 104.001);
        let to = Position::new(52.0, 104.003);
        let whole = edges.segment_cost(&probe, from, to, 4);
        assert_eq!(whole.steps, 4);
        assert!((whole.distance - haversine_km(from, to)).abs() < 1e-9);
        assert!((whole.terrain_difficulty - 2.0).abs() < 1e-12);
    }

    #[test]
    fn distance_only_weights_score_plain_length() {
        let spec = PipeSpec::default();
        let model = PipelineCostModel;
        let edges = EdgeCostModel::new(&model, &spec);
        let cache = TerrainCache::new();
        let probe = TerrainProbe::new(&Ramp, &cache);

        let from = Position::new(52.0, 104.001);
        let to = Position::new(52.001, 104.002);
        let cost = edges.edge_cost(&probe, from, to);
        assert_eq!(cost.combine(&CriteriaWeights::only(Criterion::Distance)), cost.distance);
    }
}
