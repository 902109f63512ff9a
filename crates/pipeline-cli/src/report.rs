//! JSON report printed by the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pipeline_core::{CriteriaWeights, PathResult, PipeSpec, Position};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteReport {
    pub generated_at: DateTime<Utc>,
    pub start: Position,
    pub goal: Position,
    pub pipe_spec: PipeSpec,
    pub weights: CriteriaWeights,
    /// Primary route first, then the alternatives that were found.
    pub routes: Vec<PathResult>,
}

impl RouteReport {
    pub fn new(
        start: Position,
        goal: Position,
        pipe_spec: PipeSpec,
        weights: CriteriaWeights,
        routes: Vec<PathResult>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            start,
            goal,
            pipe_spec,
            weights,
            routes,
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
