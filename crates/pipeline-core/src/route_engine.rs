//! Weighted multi-criteria A* route engine.
//!
//! Short hops are answered with a single straight step, long hauls are
//! decomposed into segments, and everything in between is searched on a
//! lattice anchored at the start. The raw lattice path is then tightened
//! with line-of-sight shortcuts that never raise the weighted cost.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::config::SearchConfig;
use crate::costs::CostModel;
use crate::edge_cost::EdgeCostModel;
use crate::error::{Result, SearchError};
use crate::heuristic::HeuristicEstimator;
use crate::long_range::LongRangeDecomposer;
use crate::models::{
    CriteriaWeights, CriterionCosts, PathResult, PipeSpec, Position, PositionKey, SearchStrategy,
};
use crate::neighbors::{GridCell, NeighborGenerator, SearchGrid};
use crate::reconstruct::{node_chain, MetricsBuilder};
use crate::spatial::{haversine_km, intermediate_point};
use crate::terrain::{TerrainCache, TerrainProbe, TerrainService};

/// Furthest a shortcut may reach ahead along the raw path.
const MAX_TIGHTEN_SPAN: usize = 256;

const G_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub(crate) struct SearchNode {
    pub(crate) position: Position,
    pub(crate) cell: Option<GridCell>,
    pub(crate) costs: CriterionCosts,
    pub(crate) combined_g: f64,
    pub(crate) combined_score: f64,
    pub(crate) predecessor: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    node: usize,
    g_score: FloatOrd,
    f_score: FloatOrd,
}

impl OpenEntry {
    fn new(node: usize, g_score: f64, f_score: f64) -> Self {
        Self {
            node,
            g_score: FloatOrd(g_score),
            f_score: FloatOrd(f_score),
        }
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.g_score.cmp(&other.g_score))
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// A routed stretch before it is wrapped into a [`PathResult`].
#[derive(Debug, Clone)]
pub(crate) struct Leg {
    pub(crate) coordinates: Vec<Position>,
    pub(crate) costs: CriterionCosts,
    pub(crate) nodes_expanded: usize,
}

/// Route search engine bound to one terrain service, cost model and pipe.
///
/// The engine owns a terrain-difficulty cache that lives exactly as long as
/// the engine, so every search run through it (including parallel
/// alternatives) reuses earlier terrain probes.
pub struct RouteEngine<'a> {
    terrain: &'a dyn TerrainService,
    cost_model: &'a dyn CostModel,
    pipe_spec: PipeSpec,
    config: SearchConfig,
    cache: TerrainCache,
    cancel: Arc<AtomicBool>,
}

impl<'a> RouteEngine<'a> {
    pub fn new(
        terrain: &'a dyn TerrainService,
        cost_model: &'a dyn CostModel,
        pipe_spec: PipeSpec,
        config: SearchConfig,
    ) -> Self {
        Self {
            terrain,
            cost_model,
            pipe_spec,
            config,
            cache: TerrainCache::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a cancellation flag with the caller. Raising it makes running
    /// and future searches return [`SearchError::Cancelled`].
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cache(&self) -> &TerrainCache {
        &self.cache
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn pipe_spec(&self) -> &PipeSpec {
        &self.pipe_spec
    }

    pub(crate) fn probe(&self) -> TerrainProbe<'_> {
        TerrainProbe::new(self.terrain, &self.cache)
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.load(AtomicOrdering::Relaxed)
    }

    pub(crate) fn edges(&self) -> EdgeCostModel<'_> {
        EdgeCostModel::new(self.cost_model, &self.pipe_spec)
    }

    pub(crate) fn metrics(&self) -> MetricsBuilder<'_> {
        MetricsBuilder::new(self.cost_model, &self.pipe_spec)
    }

    pub(crate) fn cost_model(&self) -> &dyn CostModel {
        self.cost_model
    }

    /// Find a route from `start` to `goal` under `weights`.
    ///
    /// The returned coordinates begin at exactly `start` and end at exactly
    /// `goal`.
    pub fn search(&self, start: Position, goal: Position, weights: &CriteriaWeights) -> Result<PathResult> {
        weights.validate()?;
        start.validate()?;
        goal.validate()?;
        self.pipe_spec.validate()?;

        let distance_km = haversine_km(start, goal);
        if distance_km > self.config.long_range_threshold_km {
            tracing::info!(
                distance_km,
                "Planning long-range route {} -> {} by segments",
                start,
                goal
            );
            return LongRangeDecomposer::new(self).plan(start, goal, weights);
        }

        let probe = self.probe();
        if distance_km < self.config.direct_path_threshold_km {
            tracing::info!(distance_km, "Short hop {} -> {}, using direct path", start, goal);
            let leg = self.direct_leg(&probe, start, goal, weights);
            return Ok(self.finish(leg, SearchStrategy::Direct));
        }

        tracing::info!(distance_km, "Searching grid route {} -> {}", start, goal);
        let leg = self.grid_leg(&probe, start, goal, weights, self.config.grid_step_deg)?;
        Ok(self.finish(leg, SearchStrategy::Grid))
    }

    /// Route one stretch on a lattice of `step_deg` without ever decomposing
    /// it further.
    pub(crate) fn search_leg(
        &self,
        probe: &TerrainProbe<'_>,
        start: Position,
        goal: Position,
        weights: &CriteriaWeights,
        step_deg: f64,
    ) -> Result<Leg> {
        if haversine_km(start, goal) < self.config.direct_path_threshold_km {
            Ok(self.direct_leg(probe, start, goal, weights))
        } else {
            self.grid_leg(probe, start, goal, weights, step_deg)
        }
    }

    fn finish(&self, leg: Leg, strategy: SearchStrategy) -> PathResult {
        PathResult {
            metrics: self.metrics().from_costs(&leg.costs),
            coordinates: leg.coordinates,
            strategy,
            nodes_expanded: leg.nodes_expanded,
        }
    }

    fn direct_leg(
        &self,
        probe: &TerrainProbe<'_>,
        start: Position,
        goal: Position,
        weights: &CriteriaWeights,
    ) -> Leg {
        let costs = self.edges().edge_cost(probe, start, goal);
        tracing::debug!(combined = costs.combine(weights), "direct path priced");
        Leg {
            coordinates: vec![start, goal],
            costs,
            nodes_expanded: 1,
        }
    }

    fn grid_leg(
        &self,
        probe: &TerrainProbe<'_>,
        start: Position,
        goal: Position,
        weights: &CriteriaWeights,
        step_deg: f64,
    ) -> Result<Leg> {
        let config = &self.config;
        let grid = SearchGrid::new(start, step_deg);
        let heuristic = HeuristicEstimator::new(goal, config.heuristic_terrain_inflation);
        let generator = NeighborGenerator::new(&grid, goal, config.goal_escape_factor, config.goal_attach_factor);
        let edges = self.edges();
        let goal_key = goal.key();

        let mut arena: Vec<SearchNode> = Vec::new();
        let mut index: HashMap<PositionKey, usize> = HashMap::new();
        let mut closed_set: HashSet<PositionKey> = HashSet::new();
        let mut open_set: BinaryHeap<Reverse<OpenEntry>> = BinaryHeap::new();

        let start_h = heuristic.estimate(probe, start);
        arena.push(SearchNode {
            position: start,
            cell: Some(GridCell::ORIGIN),
            costs: CriterionCosts::default(),
            combined_g: 0.0,
            combined_score: start_h,
            predecessor: None,
        });
        index.insert(start.key(), 0);
        open_set.push(Reverse(OpenEntry::new(0, 0.0, start_h)));

        let mut stride: i64 = 1;
        let mut escalations = 0u32;
        let mut iterations = 0usize;
        let mut terminal: Option<usize> = None;

        while iterations < config.max_iterations {
            let Some(current) = pop_live(&mut open_set, &arena, &closed_set) else {
                break;
            };
            let node = &arena[current.node];
            let current_key = node.position.key();
            if self.is_cancelled() {
                tracing::info!(iterations, "Search cancelled");
                return Err(SearchError::Cancelled { iterations });
            }
            iterations += 1;

            let position = node.position;
            let cell = node.cell;
            let costs = node.costs;

            if current_key == goal_key {
                terminal = Some(current.node);
                break;
            }
            if haversine_km(position, goal) <= grid.step_km(stride) {
                let closing = costs + edges.edge_cost(probe, position, goal);
                let combined = closing.combine(weights);
                arena.push(SearchNode {
                    position: goal,
                    cell: None,
                    costs: closing,
                    combined_g: combined,
                    combined_score: combined,
                    predecessor: Some(current.node),
                });
                terminal = Some(arena.len() - 1);
                break;
            }

            if config.progress_log_interval > 0 && iterations % config.progress_log_interval == 0 {
                tracing::debug!(
                    iterations,
                    open = open_set.len(),
                    step_deg = grid.step_deg() * stride as f64,
                    "search progress"
                );
            }
            if config.grid_escalation_after > 0
                && escalations < config.max_grid_escalations
                && iterations >= config.grid_escalation_after * (escalations as usize + 1)
            {
                stride *= i64::from(config.grid_escalation_factor.max(1));
                escalations += 1;
                tracing::debug!(iterations, stride, "enlarging grid step");
            }

            closed_set.insert(current_key);
            let Some(cell) = cell else {
                continue;
            };

            for neighbor in generator.neighbors(probe, cell, stride) {
                let next_key = neighbor.position.key();
                if closed_set.contains(&next_key) {
                    continue;
                }
                let next_costs = costs + edges.edge_cost(probe, position, neighbor.position);
                let tentative_g = next_costs.combine(weights);
                let existing = index.get(&next_key).copied();
                if let Some(idx) = existing {
                    if tentative_g >= arena[idx].combined_g {
                        continue;
                    }
                }

                let f_score = tentative_g + heuristic.estimate(probe, neighbor.position);
                let next = SearchNode {
                    position: neighbor.position,
                    cell: neighbor.cell,
                    costs: next_costs,
                    combined_g: tentative_g,
                    combined_score: f_score,
                    predecessor: Some(current.node),
                };
                let idx = match existing {
                    Some(idx) => {
                        arena[idx] = next;
                        idx
                    }
                    None => {
                        arena.push(next);
                        index.insert(next_key, arena.len() - 1);
                        arena.len() - 1
                    }
                };
                open_set.push(Reverse(OpenEntry::new(idx, tentative_g, f_score)));
            }
        }

        let Some(terminal) = terminal else {
            if arena.len() == 1 && probe.failures() > 0 {
                if let Some(err) = probe.take_last_error() {
                    tracing::warn!(error = %err, "No terrain data around start");
                    return Err(SearchError::TerrainServiceUnavailable(err));
                }
            }
            let reason = if iterations >= config.max_iterations {
                format!("iteration cap of {} reached", config.max_iterations)
            } else {
                "open set exhausted".to_string()
            };
            tracing::warn!(iterations, %reason, "No path found");
            return Err(SearchError::NoPathFound { reason, iterations });
        };

        let chain = node_chain(&arena, terminal);
        let mut raw: Vec<Position> = chain.iter().map(|&idx| arena[idx].position).collect();
        let cumulative: Vec<CriterionCosts> = chain.iter().map(|&idx| arena[idx].costs).collect();
        if let Some(last) = raw.last_mut() {
            *last = goal;
        }

        let (coordinates, costs) = self.tighten(probe, &grid, goal, weights, &raw, &cumulative);
        tracing::info!(
            iterations,
            raw_points = raw.len(),
            points = coordinates.len(),
            "Grid search reached goal"
        );

        Ok(Leg {
            coordinates,
            costs,
            nodes_expanded: iterations,
        })
    }

    /// Replace runs of lattice moves with straight segments.
    ///
    /// From each kept point the furthest later point is taken whose segment
    /// is clear and costs no more, under `weights`, than the stretch it
    /// replaces. A shortcut is priced as the same number of equal moves as
    /// the edges it replaces. Returns the kept points and their accumulated
    /// costs.
    fn tighten(
        &self,
        probe: &TerrainProbe<'_>,
        grid: &SearchGrid,
        goal: Position,
        weights: &CriteriaWeights,
        path: &[Position],
        cumulative: &[CriterionCosts],
    ) -> (Vec<Position>, CriterionCosts) {
        let Some(&first) = path.first() else {
            return (Vec::new(), CriterionCosts::default());
        };
        let edges = self.edges();
        let escape_km = self.config.goal_escape_factor * grid.step_km(1);

        let mut kept = vec![first];
        let mut total = CriterionCosts::default();
        let mut current_idx = 0usize;

        while current_idx + 1 < path.len() {
            let from = path[current_idx];
            let mut furthest_valid = current_idx + 1;
            let mut shortcut_cost = None;

            let reach = (current_idx + MAX_TIGHTEN_SPAN).min(path.len() - 1);
            for target_idx in ((current_idx + 2)..=reach).rev() {
                let to = path[target_idx];
                if !segment_clear(probe, grid, from, to, goal, escape_km) {
                    continue;
                }
                let replaced = cumulative[target_idx] - cumulative[current_idx];
                let shortcut = edges.segment_cost(probe, from, to, replaced.steps.max(1) as usize);
                if shortcut.combine(weights) <= replaced.combine(weights) + G_EPSILON {
                    furthest_valid = target_idx;
                    shortcut_cost = Some(shortcut);
                    break;
                }
            }

            total += shortcut_cost
                .unwrap_or_else(|| cumulative[furthest_valid] - cumulative[current_idx]);
            kept.push(path[furthest_valid]);
            current_idx = furthest_valid;
        }

        (kept, total)
    }
}

/// Pop the best open entry whose node is not closed yet and has not been
/// reached more cheaply since the entry was pushed.
fn pop_live(
    open_set: &mut BinaryHeap<Reverse<OpenEntry>>,
    arena: &[SearchNode],
    closed_set: &HashSet<PositionKey>,
) -> Option<OpenEntry> {
    while let Some(Reverse(entry)) = open_set.pop() {
        let node = &arena[entry.node];
        if closed_set.contains(&node.position.key()) || entry.g_score.0 > node.combined_g + G_EPSILON {
            continue;
        }
        return Some(entry);
    }
    None
}

/// True when every sample along `a -> b` is traversable, or close enough to
/// the goal to be admitted anyway.
fn segment_clear(
    probe: &TerrainProbe<'_>,
    grid: &SearchGrid,
    a: Position,
    b: Position,
    goal: Position,
    escape_km: f64,
) -> bool {
    let samples = grid.moves_between(a, b) * 2;
    (1..samples).all(|k| {
        let point = intermediate_point(a, b, k as f64 / samples as f64);
        probe.is_traversable(point) || haversine_km(point, goal) < escape_km
    })
}
