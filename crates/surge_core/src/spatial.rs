//! Spatial operations: H3-based geographic indexing and distance calculations.
//!
//! This module provides:
//!
//! - **Coordinates**: validated latitude/longitude pairs from quote requests
//!   and override scopes
//! - **GeoIndex**: resolution configuration and point → cell resolution
//! - **Distance calculations**: Haversine distance between cells and points
//!
//! Default resolution is 9 (~240m cell size), which buckets pickups finely
//! enough for per-neighborhood surge without fragmenting demand counts.

use std::num::NonZeroUsize;
use std::sync::{Mutex, OnceLock};

use h3o::{CellIndex, LatLng, Resolution};
use lru::LruCache;
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite and within valid ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance to another point in kilometers.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// H3 resolution configuration for the deployment.
#[derive(Debug, Clone, Copy)]
pub struct GeoIndex {
    resolution: Resolution,
}

impl GeoIndex {
    pub fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Resolve a validated point to its cell. Returns `None` for coordinates
    /// outside valid lat/lng ranges.
    pub fn cell_for_point(&self, point: Coordinates) -> Option<CellIndex> {
        if !point.is_valid() {
            return None;
        }
        LatLng::new(point.lat, point.lng)
            .ok()
            .map(|ll| ll.to_cell(self.resolution))
    }

    pub fn grid_disk(&self, origin: CellIndex, k: u32) -> Vec<CellIndex> {
        debug_assert_eq!(
            origin.resolution(),
            self.resolution,
            "origin resolution must match GeoIndex resolution"
        );
        origin.grid_disk::<Vec<_>>(k)
    }
}

impl Default for GeoIndex {
    fn default() -> Self {
        Self {
            resolution: Resolution::Nine,
        }
    }
}

fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (lat1, lon1) = (lat1.to_radians(), lng1.to_radians());
    let (lat2, lon2) = (lat2.to_radians(), lng2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Uncached distance calculation (internal use).
fn distance_km_between_cells_uncached(a: CellIndex, b: CellIndex) -> f64 {
    let a: LatLng = a.into();
    let b: LatLng = b.into();
    haversine_km(a.lat(), a.lng(), b.lat(), b.lng())
}

/// Global distance cache (50,000 entries, ~800KB memory).
fn get_distance_cache() -> &'static Mutex<LruCache<(CellIndex, CellIndex), f64>> {
    static CACHE: OnceLock<Mutex<LruCache<(CellIndex, CellIndex), f64>>> = OnceLock::new();
    CACHE.get_or_init(|| {
        Mutex::new(LruCache::new(
            NonZeroUsize::new(50_000).expect("cache size must be non-zero"),
        ))
    })
}

/// Calculate distance between two H3 cells with LRU caching.
///
/// Override scope matching evaluates the same cell pairs for every quote in
/// an area, so cell → LatLng conversion and the Haversine term are cached.
pub fn distance_km_between_cells(a: CellIndex, b: CellIndex) -> f64 {
    // Symmetric key (smaller cell first) to maximize cache hits
    let key = if a < b { (a, b) } else { (b, a) };

    let mut cache = match get_distance_cache().lock() {
        Ok(guard) => guard,
        Err(_) => return distance_km_between_cells_uncached(key.0, key.1),
    };

    *cache.get_or_insert(key, || distance_km_between_cells_uncached(key.0, key.1))
}

/// Distance from a cell's center to an arbitrary point in kilometers.
pub fn distance_km_cell_to_point(cell: CellIndex, point: Coordinates) -> f64 {
    let center: LatLng = cell.into();
    haversine_km(center.lat(), center.lng(), point.lat, point.lng)
}
