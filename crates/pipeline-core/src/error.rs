use thiserror::Error;

use crate::models::Criterion;
use crate::terrain::TerrainError;

/// Convenient result alias for the routing core.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors surfaced by a route search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A criterion weight was negative or not a finite number.
    #[error("invalid weight {weight} for criterion {criterion}")]
    InvalidWeights { criterion: Criterion, weight: f64 },

    /// Start or goal is outside the valid latitude/longitude range.
    #[error("invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// Pipe specification is outside the supported envelope.
    #[error("invalid pipe specification: {message}")]
    InvalidPipeSpec { message: String },

    /// The open set was exhausted or the iteration cap was hit first.
    #[error("no path found after {iterations} iterations: {reason}")]
    NoPathFound { reason: String, iterations: usize },

    /// One sub-segment of a long-range decomposition could not be routed.
    #[error("long-range segment {segment} failed: {source}")]
    SegmentFailed {
        segment: usize,
        #[source]
        source: Box<SearchError>,
    },

    /// Every terrain probe around the start failed, so the search could not
    /// make any progress.
    #[error("terrain service unavailable: {0}")]
    TerrainServiceUnavailable(#[from] TerrainError),

    /// The caller raised the cancellation flag.
    #[error("search cancelled after {iterations} iterations")]
    Cancelled { iterations: usize },
}

impl SearchError {
    /// True when the failure means "no route exists within the budget",
    /// including a failed long-range segment.
    pub fn is_no_path(&self) -> bool {
        match self {
            SearchError::NoPathFound { .. } => true,
            SearchError::SegmentFailed { source, .. } => source.is_no_path(),
            _ => false,
        }
    }
}

/// Raised when parsing names of criteria, pipe types or materials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown criterion '{0}'")]
    UnknownCriterion(String),

    #[error("unknown pipe type '{0}'")]
    UnknownPipeType(String),

    #[error("unknown pipe material '{0}'")]
    UnknownPipeMaterial(String),
}
