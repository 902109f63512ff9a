//! Terrain collaborator interface and the per-engine terrain cache.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use thiserror::Error;

use crate::models::{Position, PositionKey};

/// Failure reported by a terrain provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
    #[error("terrain lookup at {position} failed: {message}")]
    Lookup { position: Position, message: String },

    #[error("terrain provider timed out after {millis} ms")]
    Timeout { millis: u64 },
}

pub type TerrainResult<T> = std::result::Result<T, TerrainError>;

/// Presence of a terrain feature and how strongly it applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub present: bool,
    pub factor: f64,
}

impl Feature {
    pub const ABSENT: Feature = Feature {
        present: false,
        factor: 0.0,
    };

    pub fn present(factor: f64) -> Self {
        Self {
            present: true,
            factor,
        }
    }
}

/// Source of terrain facts for a position.
///
/// Difficulty and accessibility are in `[0, 1]`. The feature probes
/// default to "absent" so simple providers only answer the three core
/// questions.
pub trait TerrainService: Send + Sync {
    fn is_traversable(&self, position: Position) -> TerrainResult<bool>;

    fn difficulty(&self, position: Position) -> TerrainResult<f64>;

    fn accessibility(&self, position: Position) -> TerrainResult<f64>;

    /// Road proximity. The factor is a bonus that may be negative right on
    /// the carriageway.
    fn near_road(&self, _position: Position) -> TerrainResult<Feature> {
        Ok(Feature::ABSENT)
    }

    /// River or lake crossing. The factor is the crossing difficulty.
    fn is_water_crossing(&self, _position: Position) -> TerrainResult<Feature> {
        Ok(Feature::ABSENT)
    }

    /// Protected area. The factor is the environmental impact of building there.
    fn is_protected_area(&self, _position: Position) -> TerrainResult<Feature> {
        Ok(Feature::ABSENT)
    }

    /// Settlement proximity. The factor is the construction restriction.
    fn near_settlement(&self, _position: Position) -> TerrainResult<Feature> {
        Ok(Feature::ABSENT)
    }
}

/// Memo of terrain difficulty per quantised position.
///
/// One cache lives inside each engine; alternative searches running on
/// several threads share it.
#[derive(Debug, Default)]
pub struct TerrainCache {
    difficulty: DashMap<PositionKey, f64>,
}

impl TerrainCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, position: Position) -> Option<f64> {
        self.difficulty.get(&position.key()).map(|entry| *entry)
    }

    pub fn insert(&self, position: Position, difficulty: f64) {
        self.difficulty.insert(position.key(), difficulty);
    }

    pub fn len(&self) -> usize {
        self.difficulty.len()
    }

    pub fn is_empty(&self) -> bool {
        self.difficulty.is_empty()
    }

    pub fn clear(&self) {
        self.difficulty.clear();
    }
}

/// Fault-tolerant view over a [`TerrainService`] for a single search.
///
/// Failed probes degrade to the pessimistic answer (not traversable,
/// difficulty 1, accessibility 0, feature absent), are logged, and are
/// counted so the engine can tell "no route" from "no terrain data".
pub(crate) struct TerrainProbe<'a> {
    service: &'a dyn TerrainService,
    cache: &'a TerrainCache,
    failures: Cell<usize>,
    last_error: RefCell<Option<TerrainError>>,
}

impl<'a> TerrainProbe<'a> {
    pub(crate) fn new(service: &'a dyn TerrainService, cache: &'a TerrainCache) -> Self {
        Self {
            service,
            cache,
            failures: Cell::new(0),
            last_error: RefCell::new(None),
        }
    }

    fn record(&self, probe: &str, position: Position, err: TerrainError) {
        tracing::warn!(probe, %position, error = %err, "terrain probe failed; using pessimistic value");
        self.failures.set(self.failures.get() + 1);
        *self.last_error.borrow_mut() = Some(err);
    }

    pub(crate) fn failures(&self) -> usize {
        self.failures.get()
    }

    pub(crate) fn take_last_error(&self) -> Option<TerrainError> {
        self.last_error.borrow_mut().take()
    }

    pub(crate) fn is_traversable(&self, position: Position) -> bool {
        match self.service.is_traversable(position) {
            Ok(traversable) => traversable,
            Err(err) => {
                self.record("is_traversable", position, err);
                false
            }
        }
    }

    /// Cached difficulty. Failures are not cached so a later probe may
    /// still succeed.
    pub(crate) fn difficulty(&self, position: Position) -> f64 {
        if let Some(value) = self.cache.get(position) {
            return value;
        }
        match self.service.difficulty(position) {
            Ok(value) => {
                let value = value.clamp(0.0, 1.0);
                self.cache.insert(position, value);
                value
            }
            Err(err) => {
                self.record("difficulty", position, err);
                1.0
            }
        }
    }

    pub(crate) fn accessibility(&self, position: Position) -> f64 {
        match self.service.accessibility(position) {
            Ok(value) => value.clamp(0.0, 1.0),
            Err(err) => {
                self.record("accessibility", position, err);
                0.0
            }
        }
    }

    fn feature(&self, probe: &str, position: Position, result: TerrainResult<Feature>) -> Feature {
        result.unwrap_or_else(|err| {
            self.record(probe, position, err);
            Feature::ABSENT
        })
    }

    pub(crate) fn near_road(&self, position: Position) -> Feature {
        self.feature("near_road", position, self.service.near_road(position))
    }

    pub(crate) fn water_crossing(&self, position: Position) -> Feature {
        self.feature("is_water_crossing", position, self.service.is_water_crossing(position))
    }

    pub(crate) fn protected_area(&self, position: Position) -> Feature {
        self.feature("is_protected_area", position, self.service.is_protected_area(position))
    }

    pub(crate) fn near_settlement(&self, position: Position) -> Feature {
        self.feature("near_settlement", position, self.service.near_settlement(position))
    }
}
