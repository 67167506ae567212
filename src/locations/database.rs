//! Location database - GeoJSON parsing and storage

use rand::RngCore;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use tracing::{info, warn};

use super::{LocationSource, PointOfInterest};
use crate::error::GameError;
use crate::geo::Coordinates;

/// Property keys tried, in order, for a feature's display name
const NAME_KEYS: [&str; 4] = ["name", "nom", "Nom arret", "Nom commune"];

/// Property keys tried, in order, when a feature has no top-level id
const ID_KEYS: [&str; 3] = ["id", "osm_id", "insee"];

/// Finite pool of points of interest
#[derive(Debug, Clone, Default)]
pub struct LocationDatabase {
    locations: Vec<PointOfInterest>,
}

impl LocationDatabase {
    /// Build a pool, dropping points whose coordinates are out of range
    pub fn new(locations: Vec<PointOfInterest>) -> Self {
        let locations = locations
            .into_iter()
            .filter(|poi| match poi.coordinates.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!("Skipping location {}: {}", poi.id, e);
                    false
                }
            })
            .collect();
        Self { locations }
    }

    /// Load locations from file, returns the built-in pool on error
    pub fn load_from_file(path: &str) -> Self {
        match Self::try_load(path) {
            Ok(db) => db,
            Err(e) => {
                warn!("{}, using built-in locations", e);
                Self::default_locations()
            }
        }
    }

    /// Load locations from file, failing on unreadable or empty data
    pub fn try_load(path: &str) -> Result<Self, GameError> {
        let content = fs::read_to_string(path).map_err(|e| GameError::LocationData {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let db = Self::parse_geojson(&content).map_err(|reason| GameError::LocationData {
            path: path.to_string(),
            reason,
        })?;
        info!("Loaded {} locations from {}", db.len(), path);
        Ok(db)
    }

    /// Parse a GeoJSON FeatureCollection of Point features
    pub fn parse_geojson(content: &str) -> Result<Self, String> {
        let root: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;

        let features = root
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| "missing \"features\" array".to_string())?;

        let mut locations = Vec::with_capacity(features.len());
        let mut seen_ids = HashSet::new();

        for (index, feature) in features.iter().enumerate() {
            let Some(mut poi) = parse_feature(index, feature) else {
                warn!("Skipping feature {}: not a valid Point", index);
                continue;
            };
            if !seen_ids.insert(poi.id.clone()) {
                let unique = format!("{}#{}", poi.id, index);
                warn!("Duplicate location id {}, renamed to {}", poi.id, unique);
                poi.id = unique;
                seen_ids.insert(poi.id.clone());
            }
            locations.push(poi);
        }

        if locations.is_empty() {
            return Err("no usable Point features".to_string());
        }

        Ok(Self { locations })
    }

    /// Hardcoded fallback pool (Île-de-France landmarks)
    pub fn default_locations() -> Self {
        let entries: [(&str, &str, f64, f64, &str); 12] = [
            ("tour-eiffel", "Tour Eiffel", 48.8584, 2.2945, "Paris"),
            ("notre-dame", "Cathédrale Notre-Dame", 48.8530, 2.3499, "Paris"),
            ("sacre-coeur", "Basilique du Sacré-Cœur", 48.8867, 2.3431, "Paris"),
            ("versailles", "Château de Versailles", 48.8049, 2.1204, "Versailles"),
            ("saint-denis", "Basilique de Saint-Denis", 48.9356, 2.3597, "Saint-Denis"),
            ("vincennes", "Château de Vincennes", 48.8427, 2.4359, "Vincennes"),
            ("stade-de-france", "Stade de France", 48.9245, 2.3602, "Saint-Denis"),
            ("grande-arche", "Grande Arche de la Défense", 48.8926, 2.2361, "Puteaux"),
            ("fontainebleau", "Château de Fontainebleau", 48.4021, 2.6995, "Fontainebleau"),
            ("disneyland", "Disneyland Paris", 48.8722, 2.7758, "Chessy"),
            ("cdg", "Aéroport Charles-de-Gaulle", 49.0097, 2.5479, "Roissy-en-France"),
            ("provins", "Cité médiévale de Provins", 48.5600, 3.2990, "Provins"),
        ];

        Self {
            locations: entries
                .iter()
                .map(|(id, name, lat, lng, commune)| {
                    PointOfInterest::new(*id, *name, Coordinates { lat: *lat, lng: *lng })
                        .with_attribute("commune", *commune)
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PointOfInterest> {
        self.locations.get(index)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&PointOfInterest> {
        self.locations.iter().find(|poi| poi.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PointOfInterest> {
        self.locations.iter()
    }

    /// South-west and north-east corners of the pool, None if empty
    pub fn bounds(&self) -> Option<(Coordinates, Coordinates)> {
        let first = self.locations.first()?.coordinates;
        let (mut sw, mut ne) = (first, first);
        for poi in &self.locations[1..] {
            let c = poi.coordinates;
            sw.lat = sw.lat.min(c.lat);
            sw.lng = sw.lng.min(c.lng);
            ne.lat = ne.lat.max(c.lat);
            ne.lng = ne.lng.max(c.lng);
        }
        Some((sw, ne))
    }
}

impl LocationSource for LocationDatabase {
    fn len(&self) -> usize {
        self.locations.len()
    }

    fn random_locations(
        &self,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<PointOfInterest>, GameError> {
        let available = self.locations.len();
        if count > available {
            return Err(GameError::NotEnoughLocations {
                requested: count,
                available,
            });
        }

        // Uniform sample of distinct indices, in random order
        Ok(rand::seq::index::sample(rng, available, count)
            .into_iter()
            .map(|i| self.locations[i].clone())
            .collect())
    }
}

fn parse_feature(index: usize, feature: &Value) -> Option<PointOfInterest> {
    let geometry = feature.get("geometry")?;
    if geometry.get("type").and_then(Value::as_str) != Some("Point") {
        return None;
    }
    // GeoJSON order is [lng, lat]
    let coords = geometry.get("coordinates")?.as_array()?;
    let lng = coords.first()?.as_f64()?;
    let lat = coords.get(1)?.as_f64()?;
    let coordinates = Coordinates::new(lat, lng).ok()?;

    let attributes = feature
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let id = feature
        .get("id")
        .and_then(value_to_id)
        .or_else(|| ID_KEYS.iter().find_map(|key| attributes.get(*key).and_then(value_to_id)))
        .unwrap_or_else(|| format!("poi-{}", index));

    let name = NAME_KEYS
        .iter()
        .find_map(|key| attributes.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| id.clone());

    Some(PointOfInterest {
        id,
        name,
        coordinates,
        attributes,
    })
}

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 17,
                "geometry": { "type": "Point", "coordinates": [2.2945, 48.8584] },
                "properties": { "name": "Tour Eiffel", "pop2020": 2100000 }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [2.1204, 48.8049] },
                "properties": { "insee": "78646", "nom": "Versailles" }
            },
            {
                "type": "Feature",
                "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] },
                "properties": { "name": "A road" }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [2.35, 48.85] },
                "properties": {}
            }
        ]
    }"#;

    #[test]
    fn test_parse_geojson() {
        let db = LocationDatabase::parse_geojson(SAMPLE).unwrap();
        assert_eq!(db.len(), 3);

        let eiffel = db.get(0).unwrap();
        assert_eq!(eiffel.id, "17");
        assert_eq!(eiffel.name, "Tour Eiffel");
        assert_eq!(eiffel.coordinates, Coordinates { lat: 48.8584, lng: 2.2945 });
        assert_eq!(eiffel.attributes.get("pop2020").and_then(Value::as_u64), Some(2_100_000));

        let versailles = db.get_by_id("78646").unwrap();
        assert_eq!(versailles.name, "Versailles");

        let anonymous = db.get(2).unwrap();
        assert_eq!(anonymous.id, "poi-3");
        assert_eq!(anonymous.name, "poi-3");
    }

    #[test]
    fn test_new_drops_invalid_coordinates() {
        let db = LocationDatabase::new(vec![
            PointOfInterest::new("ok", "Fine", Coordinates { lat: 48.0, lng: 2.0 }),
            PointOfInterest::new("north", "Too far north", Coordinates { lat: 200.0, lng: 2.0 }),
            PointOfInterest::new("nan", "Nowhere", Coordinates { lat: f64::NAN, lng: 2.0 }),
        ]);
        assert_eq!(db.len(), 1);
        assert!(db.get_by_id("ok").is_some());
        assert!(db.get_by_id("north").is_none());
    }

    #[test]
    fn test_parse_rejects_empty_collection() {
        assert!(LocationDatabase::parse_geojson(r#"{"features": []}"#).is_err());
        assert!(LocationDatabase::parse_geojson(r#"{"type": "Feature"}"#).is_err());
        assert!(LocationDatabase::parse_geojson("not json").is_err());
    }

    #[test]
    fn test_duplicate_ids_are_made_unique() {
        let content = r#"{"features": [
            {"id": "x", "geometry": {"type": "Point", "coordinates": [1, 1]}},
            {"id": "x", "geometry": {"type": "Point", "coordinates": [2, 2]}}
        ]}"#;
        let db = LocationDatabase::parse_geojson(content).unwrap();
        assert_eq!(db.get(0).unwrap().id, "x");
        assert_eq!(db.get(1).unwrap().id, "x#1");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let db = LocationDatabase::load_from_file("does/not/exist.geojson");
        assert_eq!(db.len(), LocationDatabase::default_locations().len());
        assert!(LocationDatabase::try_load("does/not/exist.geojson").is_err());
    }

    #[test]
    fn test_random_locations_are_distinct() {
        let db = LocationDatabase::default_locations();
        let mut rng = StdRng::seed_from_u64(7);

        for count in 0..=db.len() {
            let picked = db.random_locations(count, &mut rng).unwrap();
            assert_eq!(picked.len(), count);
            let ids: HashSet<_> = picked.iter().map(|p| p.id.clone()).collect();
            assert_eq!(ids.len(), count);
        }
    }

    #[test]
    fn test_random_locations_too_many() {
        let db = LocationDatabase::default_locations();
        let mut rng = StdRng::seed_from_u64(7);
        let err = db.random_locations(db.len() + 1, &mut rng).unwrap_err();
        assert_eq!(
            err,
            GameError::NotEnoughLocations {
                requested: db.len() + 1,
                available: db.len(),
            }
        );
    }

    #[test]
    fn test_random_locations_roughly_uniform() {
        let db = LocationDatabase::new(
            (0..4)
                .map(|i| PointOfInterest::new(i.to_string(), "p", Coordinates { lat: i as f64, lng: 0.0 }))
                .collect(),
        );
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0u32; 4];
        for _ in 0..8000 {
            let pick = db.random_locations(1, &mut rng).unwrap();
            let index: usize = pick[0].id.parse().unwrap();
            counts[index] += 1;
        }
        // Expect ~2000 each
        for count in counts {
            assert!((1700..=2300).contains(&count), "skewed draw: {:?}", counts);
        }
    }

    #[test]
    fn test_bounds() {
        let db = LocationDatabase::default_locations();
        let (sw, ne) = db.bounds().unwrap();
        assert!(sw.lat < ne.lat && sw.lng < ne.lng);
        for poi in db.iter() {
            assert!(poi.coordinates.lat >= sw.lat && poi.coordinates.lat <= ne.lat);
        }
        assert!(LocationDatabase::default().bounds().is_none());
    }

    #[test]
    fn test_shipped_pool_loads() {
        let db = LocationDatabase::try_load(crate::constants::LOCATIONS_FILE).unwrap();
        assert!(db.len() >= crate::constants::DEFAULT_ROUND_COUNT);

        // Towns are keyed by INSEE code and named from "Nom commune"
        let paris = db.get_by_id("75056").unwrap();
        assert_eq!(paris.name, "Paris");
        // Stations carry their id in properties and their name in "Nom arret"
        assert_eq!(db.get_by_id("gare-du-nord").unwrap().name, "Gare du Nord");
        assert!(db.get_by_id("tour-eiffel").is_some());
    }
}
