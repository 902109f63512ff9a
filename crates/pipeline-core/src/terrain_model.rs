//! Deterministic synthetic terrain built from a list of map features.
//!
//! Base difficulty comes from a smooth analytic relief (slope) and a soil
//! pattern; protected areas, rivers, roads, settlements and hard
//! restricted zones are layered on top. Feature geometry is expressed in
//! degrees.

use serde::{Deserialize, Serialize};

use crate::models::Position;
use crate::spatial::{degree_distance, point_to_segment_deg};
use crate::terrain::{Feature, TerrainResult, TerrainService};

/// Circular feature such as a park or a town.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaFeature {
    pub name: String,
    pub center: Position,
    pub radius_deg: f64,
    /// Impact or restriction strength in `[0, 1]`.
    #[serde(default)]
    pub factor: f64,
}

impl AreaFeature {
    pub fn new(name: &str, lat: f64, lon: f64, radius_deg: f64, factor: f64) -> Self {
        Self {
            name: name.to_string(),
            center: Position::new(lat, lon),
            radius_deg,
            factor,
        }
    }

    fn contains(&self, position: Position) -> bool {
        degree_distance(position, self.center) <= self.radius_deg
    }
}

/// Polyline feature such as a river or a road.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineFeature {
    pub name: String,
    pub points: Vec<Position>,
    pub width_deg: f64,
    /// Crossing difficulty for rivers, accessibility bonus for roads.
    #[serde(default)]
    pub factor: f64,
}

impl LineFeature {
    pub fn new(name: &str, points: &[(f64, f64)], width_deg: f64, factor: f64) -> Self {
        Self {
            name: name.to_string(),
            points: points.iter().map(|&(lat, lon)| Position::new(lat, lon)).collect(),
            width_deg,
            factor,
        }
    }

    fn distance_deg(&self, position: Position) -> f64 {
        match self.points.as_slice() {
            [] => f64::INFINITY,
            [only] => degree_distance(position, *only),
            points => points
                .windows(2)
                .map(|pair| point_to_segment_deg(position, pair[0], pair[1]))
                .fold(f64::INFINITY, f64::min),
        }
    }
}

/// Map features that shape a [`FeatureTerrain`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainFeatures {
    pub protected_areas: Vec<AreaFeature>,
    pub rivers: Vec<LineFeature>,
    pub roads: Vec<LineFeature>,
    pub settlements: Vec<AreaFeature>,
    /// Zones where no pipe may be laid at all.
    pub restricted_zones: Vec<AreaFeature>,
    /// Include slope and soil in the base difficulty. When off, only the
    /// features contribute.
    pub relief: bool,
}

impl Default for TerrainFeatures {
    fn default() -> Self {
        Self {
            protected_areas: Vec::new(),
            rivers: Vec::new(),
            roads: Vec::new(),
            settlements: Vec::new(),
            restricted_zones: Vec::new(),
            relief: true,
        }
    }
}

impl TerrainFeatures {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_relief(mut self, relief: bool) -> Self {
        self.relief = relief;
        self
    }

    /// Sample features around Irkutsk and Lake Baikal.
    pub fn irkutsk_region() -> Self {
        Self {
            protected_areas: vec![
                AreaFeature::new("Pribaikalsky National Park", 52.0, 105.5, 0.5, 0.9),
                AreaFeature::new("Baikal-Lena Reserve", 53.5, 107.8, 0.4, 0.95),
            ],
            rivers: vec![
                LineFeature::new(
                    "Angara",
                    &[(52.3, 104.3), (52.5, 104.2), (52.7, 104.0), (52.9, 103.8)],
                    0.01,
                    0.8,
                ),
                LineFeature::new("Lena", &[(53.1, 105.5), (53.3, 105.7), (53.5, 105.9)], 0.008, 0.7),
            ],
            roads: vec![
                LineFeature::new("M53", &[(52.2, 104.1), (52.3, 104.3), (52.4, 104.5)], 0.003, 0.6),
                LineFeature::new("M55", &[(52.3, 104.3), (52.3, 104.5), (52.3, 104.7)], 0.002, 0.5),
            ],
            settlements: vec![
                AreaFeature::new("Irkutsk", 52.3, 104.3, 0.1, 0.8),
                AreaFeature::new("Angarsk", 52.5, 103.9, 0.07, 0.7),
            ],
            restricted_zones: vec![
                AreaFeature::new("Irkutsk", 52.3, 104.3, 0.12, 1.0),
                AreaFeature::new("Angarsk", 52.5, 103.9, 0.08, 1.0),
                AreaFeature::new("Shelekhov", 52.2, 104.08, 0.04, 1.0),
                AreaFeature::new("Usolye-Sibirskoye", 52.75, 103.65, 0.05, 1.0),
                AreaFeature::new("Pribaikalsky National Park core", 53.2, 107.35, 0.35, 1.0),
                AreaFeature::new("Baikal-Lena Reserve core", 53.9, 108.0, 0.4, 1.0),
                AreaFeature::new("Baikal Reserve", 51.5, 105.0, 0.3, 1.0),
            ],
            relief: true,
        }
    }
}

const SOIL_FACTORS: [f64; 5] = [
    0.4, // clay
    0.2, // loam
    0.3, // sand
    0.8, // rock
    0.6, // peat
];

const SLOPE_PROBE_DEG: f64 = 0.001;

/// Terrain service answering from a [`TerrainFeatures`] description.
#[derive(Debug, Clone)]
pub struct FeatureTerrain {
    features: TerrainFeatures,
}

impl FeatureTerrain {
    pub fn new(features: TerrainFeatures) -> Self {
        Self { features }
    }

    pub fn features(&self) -> &TerrainFeatures {
        &self.features
    }

    /// Elevation in metres of the analytic relief.
    pub fn elevation_m(&self, position: Position) -> f64 {
        let (lat, lon) = (position.lat, position.lon);
        500.0 + (lat * 10.0).sin() * (lon * 8.0).cos() * 200.0 + (lon * 12.0).sin() * (lat * 9.0).cos() * 150.0
    }

    /// Steepness in `[0, 1]` from elevation change over ~100 m.
    pub fn slope(&self, position: Position) -> f64 {
        let center = self.elevation_m(position);
        let north = self.elevation_m(Position::new(position.lat + SLOPE_PROBE_DEG, position.lon));
        let east = self.elevation_m(Position::new(position.lat, position.lon + SLOPE_PROBE_DEG));
        let slope_north = ((north - center).abs() / 100.0).min(1.0);
        let slope_east = ((east - center).abs() / 100.0).min(1.0);
        slope_north.max(slope_east)
    }

    pub fn soil_factor(&self, position: Position) -> f64 {
        let value = (((position.lat * 100.0).sin() + 1.0) / 2.0 + ((position.lon * 100.0).cos() + 1.0) / 2.0) / 2.0;
        let index = ((value * SOIL_FACTORS.len() as f64) as usize).min(SOIL_FACTORS.len() - 1);
        SOIL_FACTORS[index]
    }

    fn area_feature(areas: &[AreaFeature], position: Position) -> Feature {
        areas
            .iter()
            .find(|area| area.contains(position))
            .map(|area| Feature::present(area.factor))
            .unwrap_or(Feature::ABSENT)
    }

    fn water(&self, position: Position) -> Feature {
        self.features
            .rivers
            .iter()
            .find(|river| river.distance_deg(position) <= river.width_deg)
            .map(|river| Feature::present(river.factor))
            .unwrap_or(Feature::ABSENT)
    }

    /// Directly on a road scores -0.2; alongside it the bonus peaks at twice
    /// the road width and fades out at five widths.
    fn road(&self, position: Position) -> Feature {
        for road in &self.features.roads {
            let width = road.width_deg;
            let dist = road.distance_deg(position);
            if dist <= width {
                return Feature::present(-0.2);
            }
            if dist <= width * 5.0 {
                let proximity = 1.0 - (dist - width * 2.0).abs() / (width * 3.0);
                return Feature::present(road.factor * proximity);
            }
        }
        Feature::ABSENT
    }

    fn compute_difficulty(&self, position: Position) -> f64 {
        let mut difficulty = if self.features.relief {
            0.3 * self.slope(position) + 0.2 * self.soil_factor(position)
        } else {
            0.0
        };
        let water = self.water(position);
        if water.present {
            difficulty += 0.25 * water.factor;
        }
        let protected = Self::area_feature(&self.features.protected_areas, position);
        if protected.present {
            difficulty += 0.15 * protected.factor;
        }
        let settlement = Self::area_feature(&self.features.settlements, position);
        if settlement.present {
            difficulty += 0.1 * settlement.factor;
        }
        difficulty.clamp(0.0, 1.0)
    }
}

impl Default for FeatureTerrain {
    fn default() -> Self {
        Self::new(TerrainFeatures::irkutsk_region())
    }
}

impl TerrainService for FeatureTerrain {
    fn is_traversable(&self, position: Position) -> TerrainResult<bool> {
        if !position.is_valid() {
            return Ok(false);
        }
        if let Some(zone) = self.features.restricted_zones.iter().find(|zone| zone.contains(position)) {
            tracing::trace!(%position, zone = %zone.name, "inside restricted zone");
            return Ok(false);
        }
        let protected = Self::area_feature(&self.features.protected_areas, position);
        if protected.present && protected.factor > 0.95 {
            return Ok(false);
        }
        let settlement = Self::area_feature(&self.features.settlements, position);
        if settlement.present && settlement.factor > 0.95 {
            return Ok(false);
        }
        Ok(true)
    }

    fn difficulty(&self, position: Position) -> TerrainResult<f64> {
        Ok(self.compute_difficulty(position))
    }

    fn accessibility(&self, position: Position) -> TerrainResult<f64> {
        let mut accessibility = 1.0 - self.compute_difficulty(position) * 0.6;
        let road = self.road(position);
        if road.present {
            accessibility += road.factor * 0.4;
        }
        Ok(accessibility.clamp(0.0, 1.0))
    }

    fn near_road(&self, position: Position) -> TerrainResult<Feature> {
        Ok(self.road(position))
    }

    fn is_water_crossing(&self, position: Position) -> TerrainResult<Feature> {
        Ok(self.water(position))
    }

    fn is_protected_area(&self, position: Position) -> TerrainResult<Feature> {
        Ok(Self::area_feature(&self.features.protected_areas, position))
    }

    fn near_settlement(&self, position: Position) -> TerrainResult<Feature> {
        Ok(Self::area_feature(&self.features.settlements, position))
    }
}
