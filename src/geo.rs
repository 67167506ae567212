//! Coordinates and great-circle distance on a spherical Earth

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::GameError;

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting non-finite or out-of-range values
    pub fn new(lat: f64, lng: f64) -> Result<Self, GameError> {
        let coords = Self { lat, lng };
        coords.validate()?;
        Ok(coords)
    }

    /// Check latitude is in [-90, 90] and longitude in [-180, 180]
    pub fn validate(&self) -> Result<(), GameError> {
        let lat_ok = self.lat.is_finite() && (MIN_LATITUDE..=MAX_LATITUDE).contains(&self.lat);
        let lng_ok = self.lng.is_finite() && (MIN_LONGITUDE..=MAX_LONGITUDE).contains(&self.lng);
        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(GameError::InvalidCoordinates {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Distance to another point in whole metres
    pub fn distance_to(&self, other: &Coordinates) -> u32 {
        haversine_distance(self.lat, self.lng, other.lat, other.lng)
    }

    /// Point `meters` due north of this one (clamped at the pole)
    pub fn offset_north(&self, meters: f64) -> Coordinates {
        let lat = (self.lat + meters / METERS_PER_DEGREE_LAT).clamp(MIN_LATITUDE, MAX_LATITUDE);
        Coordinates { lat, lng: self.lng }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// Great-circle distance between two points in degrees, rounded to whole metres.
///
/// Haversine formula on a sphere of radius EARTH_RADIUS_METERS.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> u32 {
    let lat1_rad = deg_to_rad(lat1);
    let lat2_rad = deg_to_rad(lat2);
    let lat_diff = deg_to_rad(lat2 - lat1);
    let lng_diff = deg_to_rad(lng2 - lng1);

    // Square of half the chord length between the points
    let half_chord = (lat_diff / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (lng_diff / 2.0).sin().powi(2);
    // Rounding can push this a hair outside [0, 1] for antipodal points
    let half_chord = half_chord.clamp(0.0, 1.0);

    let central_angle = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());

    (EARTH_RADIUS_METERS * central_angle).round() as u32
}
