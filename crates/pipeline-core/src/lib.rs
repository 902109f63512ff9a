//! Pipeline routing core.
//!
//! A weighted multi-criteria A* search that lays a pipeline route between two
//! geographic points, balancing distance, terrain difficulty, environmental
//! impact, construction cost and maintenance access. Terrain and cost data
//! come from collaborators behind the [`TerrainService`] and [`CostModel`]
//! traits.

pub mod config;
pub mod costs;
pub mod edge_cost;
pub mod error;
pub mod heuristic;
pub mod long_range;
pub mod models;
pub mod neighbors;
pub mod reconstruct;
pub mod route_engine;
pub mod routing;
pub mod spatial;
pub mod terrain;
pub mod terrain_model;

pub use config::SearchConfig;
pub use costs::{CostModel, OperationalCosts, PipelineCostModel};
pub use error::{ParseError, Result, SearchError};
pub use models::{
    CriteriaWeights, Criterion, CriterionCosts, PathResult, PipeMaterial, PipeSpec, PipeType,
    Position, PositionKey, RouteMetrics, SearchStrategy,
};
pub use route_engine::RouteEngine;
pub use routing::{alternative_weights, find_routes, RoutePlanner};
pub use spatial::haversine_km;
pub use terrain::{Feature, TerrainCache, TerrainError, TerrainService};
pub use terrain_model::{FeatureTerrain, TerrainFeatures};
