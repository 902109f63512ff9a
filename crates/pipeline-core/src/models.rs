//! Core data models for pipeline route search.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use crate::error::{ParseError, SearchError};

/// Coordinates are quantised to 1e-7 degree (about 1 cm) for hashing.
const KEY_SCALE: f64 = 1e7;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Hashable identity of this position.
    pub fn key(&self) -> PositionKey {
        PositionKey {
            lat: (self.lat * KEY_SCALE).round() as i64,
            lon: (self.lon * KEY_SCALE).round() as i64,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SearchError::InvalidCoordinate {
                lat: self.lat,
                lon: self.lon,
            })
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Quantised position used as the identity of search nodes and cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey {
    lat: i64,
    lon: i64,
}

/// Optimisation criteria a route is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Distance,
    TerrainDifficulty,
    EnvironmentalImpact,
    ConstructionCost,
    MaintenanceAccess,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Distance,
        Criterion::TerrainDifficulty,
        Criterion::EnvironmentalImpact,
        Criterion::ConstructionCost,
        Criterion::MaintenanceAccess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Distance => "distance",
            Criterion::TerrainDifficulty => "terrain_difficulty",
            Criterion::EnvironmentalImpact => "environmental_impact",
            Criterion::ConstructionCost => "construction_cost",
            Criterion::MaintenanceAccess => "maintenance_access",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Criterion::ALL
            .into_iter()
            .find(|criterion| criterion.as_str() == needle)
            .ok_or_else(|| ParseError::UnknownCriterion(s.to_string()))
    }
}

/// Relative importance of each criterion. Criteria absent from the map
/// weigh zero. Weights are used as given; callers that want them to sum
/// to one call [`CriteriaWeights::normalized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriteriaWeights(BTreeMap<Criterion, f64>);

impl Default for CriteriaWeights {
    fn default() -> Self {
        Self::empty()
            .with(Criterion::Distance, 0.3)
            .with(Criterion::TerrainDifficulty, 0.2)
            .with(Criterion::EnvironmentalImpact, 0.15)
            .with(Criterion::ConstructionCost, 0.2)
            .with(Criterion::MaintenanceAccess, 0.15)
    }
}

impl CriteriaWeights {
    /// A weight map with no criteria at all.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Weight 1 on a single criterion, nothing else.
    pub fn only(criterion: Criterion) -> Self {
        Self::empty().with(criterion, 1.0)
    }

    pub fn with(mut self, criterion: Criterion, weight: f64) -> Self {
        self.set(criterion, weight);
        self
    }

    pub fn set(&mut self, criterion: Criterion, weight: f64) {
        self.0.insert(criterion, weight);
    }

    pub fn get(&self, criterion: Criterion) -> f64 {
        self.0.get(&criterion).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, criterion: Criterion) -> bool {
        self.0.contains_key(&criterion)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Criterion, f64)> + '_ {
        self.0.iter().map(|(criterion, weight)| (*criterion, *weight))
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Reject negative or non-finite weights.
    pub fn validate(&self) -> Result<(), SearchError> {
        for (criterion, weight) in self.iter() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(SearchError::InvalidWeights { criterion, weight });
            }
        }
        Ok(())
    }

    /// Rescale so the weights sum to one. A map whose total is zero is
    /// returned unchanged.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total <= 0.0 {
            return self.clone();
        }
        self.iter()
            .map(|(criterion, weight)| (criterion, weight / total))
            .collect()
    }
}

impl FromIterator<(Criterion, f64)> for CriteriaWeights {
    fn from_iter<I: IntoIterator<Item = (Criterion, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Per-criterion cost of one edge, or the running total along a path.
///
/// `steps` counts the unit edges folded into the record, so per-step means
/// can be derived from the totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionCosts {
    pub distance: f64,
    pub terrain_difficulty: f64,
    pub environmental_impact: f64,
    pub construction_cost: f64,
    pub maintenance_access: f64,
    pub steps: u32,
}

impl CriterionCosts {
    pub fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Distance => self.distance,
            Criterion::TerrainDifficulty => self.terrain_difficulty,
            Criterion::EnvironmentalImpact => self.environmental_impact,
            Criterion::ConstructionCost => self.construction_cost,
            Criterion::MaintenanceAccess => self.maintenance_access,
        }
    }

    /// Weighted sum over every criterion.
    pub fn combine(&self, weights: &CriteriaWeights) -> f64 {
        Criterion::ALL
            .iter()
            .map(|criterion| weights.get(*criterion) * self.get(*criterion))
            .sum()
    }
}

impl Add for CriterionCosts {
    type Output = CriterionCosts;

    fn add(self, rhs: CriterionCosts) -> CriterionCosts {
        CriterionCosts {
            distance: self.distance + rhs.distance,
            terrain_difficulty: self.terrain_difficulty + rhs.terrain_difficulty,
            environmental_impact: self.environmental_impact + rhs.environmental_impact,
            construction_cost: self.construction_cost + rhs.construction_cost,
            maintenance_access: self.maintenance_access + rhs.maintenance_access,
            steps: self.steps + rhs.steps,
        }
    }
}

impl AddAssign for CriterionCosts {
    fn add_assign(&mut self, rhs: CriterionCosts) {
        *self = *self + rhs;
    }
}

impl Sub for CriterionCosts {
    type Output = CriterionCosts;

    fn sub(self, rhs: CriterionCosts) -> CriterionCosts {
        CriterionCosts {
            distance: self.distance - rhs.distance,
            terrain_difficulty: self.terrain_difficulty - rhs.terrain_difficulty,
            environmental_impact: self.environmental_impact - rhs.environmental_impact,
            construction_cost: self.construction_cost - rhs.construction_cost,
            maintenance_access: self.maintenance_access - rhs.maintenance_access,
            steps: self.steps.saturating_sub(rhs.steps),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipeType {
    Oil,
    Gas,
    Water,
}

impl FromStr for PipeType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oil" => Ok(PipeType::Oil),
            "gas" => Ok(PipeType::Gas),
            "water" => Ok(PipeType::Water),
            _ => Err(ParseError::UnknownPipeType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipeMaterial {
    Steel,
    Plastic,
    Composite,
}

impl FromStr for PipeMaterial {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "steel" => Ok(PipeMaterial::Steel),
            "plastic" => Ok(PipeMaterial::Plastic),
            "composite" => Ok(PipeMaterial::Composite),
            _ => Err(ParseError::UnknownPipeMaterial(s.to_string())),
        }
    }
}

/// Physical description of the pipe being laid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeSpec {
    pub pipe_type: PipeType,
    pub diameter_mm: f64,
    pub material: PipeMaterial,
    pub max_pressure_atm: f64,
}

impl Default for PipeSpec {
    fn default() -> Self {
        Self {
            pipe_type: PipeType::Oil,
            diameter_mm: 500.0,
            material: PipeMaterial::Steel,
            max_pressure_atm: 50.0,
        }
    }
}

impl PipeSpec {
    pub const DIAMETER_RANGE_MM: (f64, f64) = (100.0, 2000.0);
    pub const PRESSURE_RANGE_ATM: (f64, f64) = (1.0, 100.0);

    pub fn validate(&self) -> Result<(), SearchError> {
        let (min_d, max_d) = Self::DIAMETER_RANGE_MM;
        if !(min_d..=max_d).contains(&self.diameter_mm) {
            return Err(SearchError::InvalidPipeSpec {
                message: format!(
                    "diameter {} mm outside {}..={} mm",
                    self.diameter_mm, min_d, max_d
                ),
            });
        }
        let (min_p, max_p) = Self::PRESSURE_RANGE_ATM;
        if !(min_p..=max_p).contains(&self.max_pressure_atm) {
            return Err(SearchError::InvalidPipeSpec {
                message: format!(
                    "pressure {} atm outside {}..={} atm",
                    self.max_pressure_atm, min_p, max_p
                ),
            });
        }
        Ok(())
    }
}

/// Which branch of the engine produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    Direct,
    Grid,
    LongRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMetrics {
    /// Kilometres.
    pub total_distance: f64,
    pub estimated_cost: f64,
    /// Mean per-step terrain difficulty in [0, 1].
    pub terrain_difficulty_score: f64,
    /// Mean per-step environmental impact in [0, 1].
    pub environmental_impact_score: f64,
    /// Days.
    pub estimated_construction_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_operating_cost: Option<f64>,
    /// `None` for the primary route, `Some(i)` for the i-th alternative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_num: Option<usize>,
}

/// A found route: the ordered coordinates from exact start to exact goal
/// plus their aggregate metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    pub coordinates: Vec<Position>,
    pub metrics: RouteMetrics,
    pub strategy: SearchStrategy,
    pub nodes_expanded: usize,
}

impl PathResult {
    pub fn start(&self) -> Option<Position> {
        self.coordinates.first().copied()
    }

    pub fn goal(&self) -> Option<Position> {
        self.coordinates.last().copied()
    }
}
