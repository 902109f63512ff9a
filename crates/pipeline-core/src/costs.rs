//! Construction, environmental and operating cost estimates for a pipe.

use serde::{Deserialize, Serialize};

use crate::models::{PipeMaterial, PipeSpec, PipeType};

/// Pricing and impact model consulted by the edge cost model.
pub trait CostModel: Send + Sync {
    /// Construction cost per kilometre of pipe laid on terrain of the given
    /// difficulty.
    fn construction_cost(&self, spec: &PipeSpec, terrain_difficulty: f64) -> f64;

    /// Environmental impact of a stretch of pipe, in `[0, 1]`.
    fn environmental_impact(
        &self,
        pipe_type: PipeType,
        spec: &PipeSpec,
        terrain_difficulty: f64,
        accessibility: f64,
    ) -> f64;

    /// Yearly cost of running a finished pipeline, when the model knows it.
    fn annual_operating_cost(
        &self,
        _spec: &PipeSpec,
        _length_km: f64,
        _terrain_difficulty: f64,
    ) -> Option<f64> {
        None
    }
}

/// Breakdown of yearly operating costs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationalCosts {
    pub maintenance: f64,
    pub pumping: f64,
    pub inspection: f64,
    pub total: f64,
}

/// Reference pricing for steel, plastic and composite pipe.
///
/// Base cost per km grows quadratically with diameter and is scaled by the
/// material, the transported medium and a quadratic terrain factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineCostModel;

const MAINTENANCE_PER_KM: f64 = 5_000.0;
const INSPECTION_PER_KM: f64 = 1_000.0;

fn material_factor(material: PipeMaterial) -> f64 {
    match material {
        PipeMaterial::Steel => 1.0,
        PipeMaterial::Plastic => 0.8,
        PipeMaterial::Composite => 1.4,
    }
}

fn type_factor(pipe_type: PipeType) -> f64 {
    match pipe_type {
        PipeType::Oil => 1.2,
        PipeType::Gas => 1.3,
        PipeType::Water => 0.9,
    }
}

fn base_impact(pipe_type: PipeType) -> f64 {
    match pipe_type {
        PipeType::Oil => 0.7,
        PipeType::Gas => 0.5,
        PipeType::Water => 0.2,
    }
}

fn pumping_rate(pipe_type: PipeType) -> f64 {
    match pipe_type {
        PipeType::Oil => 0.05,
        PipeType::Gas => 0.08,
        PipeType::Water => 0.03,
    }
}

impl PipelineCostModel {
    /// Yearly maintenance, pumping and inspection for `length_km` of pipe.
    pub fn operational_costs(
        &self,
        spec: &PipeSpec,
        length_km: f64,
        terrain_difficulty: f64,
    ) -> OperationalCosts {
        let length_km = length_km.max(0.0);
        let maintenance = MAINTENANCE_PER_KM * length_km * (1.0 + terrain_difficulty.clamp(0.0, 1.0));
        let pumping = pumping_rate(spec.pipe_type) * spec.diameter_mm * length_km * spec.max_pressure_atm;
        let inspection = INSPECTION_PER_KM * length_km;
        OperationalCosts {
            maintenance,
            pumping,
            inspection,
            total: maintenance + pumping + inspection,
        }
    }
}

impl CostModel for PipelineCostModel {
    fn construction_cost(&self, spec: &PipeSpec, terrain_difficulty: f64) -> f64 {
        let d = spec.diameter_mm;
        let base_per_km = 0.00002 * d * d + 0.01 * d;
        let terrain = terrain_difficulty.clamp(0.0, 1.0);
        let terrain_factor = 1.0 + terrain * terrain * 2.0;
        base_per_km * material_factor(spec.material) * type_factor(spec.pipe_type) * terrain_factor
    }

    fn environmental_impact(
        &self,
        pipe_type: PipeType,
        spec: &PipeSpec,
        terrain_difficulty: f64,
        accessibility: f64,
    ) -> f64 {
        let (min_d, max_d) = PipeSpec::DIAMETER_RANGE_MM;
        let diameter_norm = ((spec.diameter_mm - min_d) / (max_d - min_d)).clamp(0.0, 1.0);
        let diameter_factor = 0.3 + 0.7 * diameter_norm;
        let terrain_factor = 0.5 + 0.5 * terrain_difficulty.clamp(0.0, 1.0);
        let remoteness = 1.0 - accessibility.clamp(0.0, 1.0);

        let impact = base_impact(pipe_type) * 0.5
            + diameter_factor * 0.2
            + terrain_factor * 0.25
            + remoteness * 0.05;
        impact.clamp(0.0, 1.0)
    }

    fn annual_operating_cost(
        &self,
        spec: &PipeSpec,
        length_km: f64,
        terrain_difficulty: f64,
    ) -> Option<f64> {
        Some(self.operational_costs(spec, length_km, terrain_difficulty).total)
    }
}
