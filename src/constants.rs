//! Tunable constants for geoguess
//!
//! All gameplay values are defined here for easy tweaking.

// =============================================================================
// GEODESY
// =============================================================================

/// Mean Earth radius used by the haversine distance
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// Metres per degree of latitude on the scoring sphere (2πR / 360)
pub const METERS_PER_DEGREE_LAT: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

// =============================================================================
// GAME
// =============================================================================

/// Rounds per game unless configured otherwise
pub const DEFAULT_ROUND_COUNT: usize = 6;

/// Upper bound on events dispatched by a single outermost emit
pub const MAX_DISPATCH_CHAIN: usize = 10_000;

// =============================================================================
// SCORING
// =============================================================================

/// Highest score a single round can award
pub const MAX_SCORE: u32 = 5000;

/// Threshold table: (distance limit in metres, score). First limit >= distance wins.
pub const SCORE_THRESHOLDS: [(u32, u32); 6] = [
    (100, 5000),
    (2_000, 4000),
    (10_000, 2500),
    (30_000, 1200),
    (60_000, 500),
    (100_000, 250),
];

/// Exponential decay: guesses closer than this always score MAX_SCORE
pub const MAX_SCORE_RADIUS_METERS: f64 = 25.0;
/// Exponential decay: distance at which the score falls to MAX_SCORE / e
pub const SCORE_SCALE_METERS: f64 = 10_000.0;

// =============================================================================
// FILES
// =============================================================================

/// Point-of-interest dataset (GeoJSON FeatureCollection of points)
pub const LOCATIONS_FILE: &str = "assets/locations.geojson";
