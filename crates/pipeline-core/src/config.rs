//! Search tuning constants.

use serde::{Deserialize, Serialize};

use crate::spatial::degrees_to_km;

/// Configuration for the route search engine.
///
/// Every field has a default, so a partial JSON document only overrides
/// what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base lattice step in degrees
    pub grid_step_deg: f64,
    /// Hard cap on A* expansions per search
    pub max_iterations: usize,
    /// Emit a progress log line every N expansions
    pub progress_log_interval: usize,
    /// Expansions after which the lattice stride is enlarged
    pub grid_escalation_after: usize,
    /// Stride multiplier applied at each escalation
    pub grid_escalation_factor: u32,
    /// Upper bound on escalations for one search
    pub max_grid_escalations: u32,
    /// Below this start-goal distance the route is a single straight step
    pub direct_path_threshold_km: f64,
    /// Above this start-goal distance the route is decomposed into segments
    pub long_range_threshold_km: f64,
    /// Target length of one long-range segment
    pub segment_length_km: f64,
    pub min_segments: usize,
    pub max_segments: usize,
    /// Radius of the candidate ring around each long-range waypoint
    pub waypoint_sample_radius_deg: f64,
    /// Number of candidates evenly spread around the ring
    pub waypoint_sample_directions: usize,
    /// Heuristic inflation applied per unit of terrain difficulty
    pub heuristic_terrain_inflation: f64,
    /// Non-traversable cells closer than this many steps to the goal are allowed
    pub goal_escape_factor: f64,
    /// The exact goal becomes a neighbour within this many steps
    pub goal_attach_factor: f64,
    pub smoothing_min_turn_deg: f64,
    pub smoothing_max_gap_deg: f64,
    pub smoothing_difficulty_threshold: f64,
    /// Base of the geometric weight boost for alternatives
    pub alternative_weight_multiplier: f64,
    /// Lowest weight a perturbed criterion may take
    pub alternative_weight_floor: f64,
    /// Run alternative searches on the rayon pool
    pub parallel_alternatives: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            grid_step_deg: 0.0005,
            max_iterations: 20_000,
            progress_log_interval: 500,
            grid_escalation_after: 1_000,
            grid_escalation_factor: 2,
            max_grid_escalations: 3,
            direct_path_threshold_km: 0.5,
            long_range_threshold_km: 50.0,
            segment_length_km: 2.0,
            min_segments: 2,
            max_segments: 40,
            waypoint_sample_radius_deg: 0.002,
            waypoint_sample_directions: 8,
            heuristic_terrain_inflation: 0.3,
            goal_escape_factor: 3.0,
            goal_attach_factor: 4.0,
            smoothing_min_turn_deg: 20.0,
            smoothing_max_gap_deg: 0.4,
            smoothing_difficulty_threshold: 0.6,
            alternative_weight_multiplier: 2.0,
            alternative_weight_floor: 0.1,
            parallel_alternatives: true,
        }
    }
}

impl SearchConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Base lattice step expressed in kilometres.
    pub fn grid_step_km(&self) -> f64 {
        degrees_to_km(self.grid_step_deg)
    }
}
