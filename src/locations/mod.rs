//! Locations module - point-of-interest pool and random draws
//!
//! The game core only needs `LocationSource::random_locations`; the
//! LocationDatabase is the stock implementation backed by a GeoJSON file.

mod database;

pub use database::*;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::geo::Coordinates;

/// A place a round asks the player to find
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinates,
    /// Descriptive properties shown to the player; never used for scoring
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl PointOfInterest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinates,
            attributes: serde_json::Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

/// Supplier of round targets
pub trait LocationSource: Send + Sync {
    /// Size of the backing pool
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Draw `count` distinct locations uniformly at random.
    ///
    /// Fails with `GameError::NotEnoughLocations` when `count` exceeds the pool.
    fn random_locations(
        &self,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<PointOfInterest>, GameError>;
}
