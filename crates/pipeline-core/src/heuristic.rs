//! Goal-distance estimate used to order the open set.

use crate::models::Position;
use crate::spatial::haversine_km;
use crate::terrain::TerrainProbe;

/// Great-circle distance to the goal, inflated by the terrain difficulty at
/// the evaluated position.
///
/// With a non-zero inflation the estimate is not admissible, so the first
/// route found is not guaranteed to be the cheapest.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicEstimator {
    goal: Position,
    terrain_inflation: f64,
}

impl HeuristicEstimator {
    pub fn new(goal: Position, terrain_inflation: f64) -> Self {
        Self {
            goal,
            terrain_inflation,
        }
    }

    pub(crate) fn estimate(&self, probe: &TerrainProbe<'_>, position: Position) -> f64 {
        let terrain_factor = probe.difficulty(position);
        haversine_km(position, self.goal) * (1.0 + self.terrain_inflation * terrain_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{TerrainCache, TerrainResult, TerrainService};

    struct Uniform(f64);

    impl TerrainService for Uniform {
        fn is_traversable(&self, _position: Position) -> TerrainResult<bool> {
            Ok(true)
        }
        fn difficulty(&self, _position: Position) -> TerrainResult<f64> {
            Ok(self.0)
        }
        fn accessibility(&self, _position: Position) -> TerrainResult<f64> {
            Ok(1.0)
        }
    }

    #[test]
    fn flat_terrain_gives_plain_distance() {
        let goal = Position::new(52.30, 104.32);
        let start = Position::new(52.28, 104.28);
        let cache = TerrainCache::new();
        let probe = TerrainProbe::new(&Uniform(0.0), &cache);
        let h = HeuristicEstimator::new(goal, 0.3).estimate(&probe, start);
        assert!((h - haversine_km(start, goal)).abs() < 1e-12);
    }

    #[test]
    fn difficult_terrain_inflates_estimate() {
        let goal = Position::new(52.30, 104.32);
        let start = Position::new(52.28, 104.28);
        let cache = TerrainCache::new();
        let probe = TerrainProbe::new(&Uniform(1.0), &cache);
        let h = HeuristicEstimator::new(goal, 0.3).estimate(&probe, start);
        assert!((h - haversine_km(start, goal) * 1.3).abs() < 1e-9);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn estimate_is_zero_at_goal() {
        let goal = Position::new(52.30, 104.32);
        let cache = TerrainCache::new();
        let probe = TerrainProbe::new(&Uniform(0.7), &cache);
        assert_eq!(HeuristicEstimator::new(goal, 0.3).estimate(&probe, goal), 0.0);
    }
}
