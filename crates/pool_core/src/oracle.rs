//! Pluggable distance oracles: trait abstraction for travel-distance backends.
//!
//! Two backends plus a caching wrapper:
//!
//! - **`MatrixOracle`**: skim-matrix lookups from an in-memory table. The
//!   production backend; the host supplies the entries.
//! - **`HaversineOracle`**: interprets location ids as raw H3 cell indices
//!   and returns great-circle distance scaled by a detour factor. Zero-setup
//!   backend for synthetic batches.
//! - **`CachedOracle`**: LRU wrapper around any oracle.
//!
//! Lookups are directional; no symmetry is assumed anywhere.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use h3o::CellIndex;
use lru::LruCache;

use crate::requests::LocationId;

/// Mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Street-network detour relative to the great-circle line.
const DEFAULT_DETOUR_FACTOR: f64 = 1.3;

/// Trait for distance backends. Implementations must be `Send + Sync` so a
/// degree pass can query them from parallel workers.
pub trait DistanceOracle: Send + Sync {
    /// Travel distance in metres from `from` to `to`.
    /// `None` is a lookup miss, not a zero-length leg.
    fn distance_m(&self, from: LocationId, to: LocationId) -> Option<f64>;
}

/// Total distance along a multi-stop path. `None` if any leg is missing.
/// Consecutive identical stops contribute nothing.
pub fn path_distance_m(oracle: &dyn DistanceOracle, points: &[LocationId]) -> Option<f64> {
    let mut total = 0.0;
    for leg in points.windows(2) {
        total += oracle.distance_m(leg[0], leg[1])?;
    }
    Some(total)
}

// ---------------------------------------------------------------------------
// Matrix (skim) backend
// ---------------------------------------------------------------------------

/// Skim-matrix oracle: a directional `(from, to) → metres` table.
#[derive(Debug, Clone, Default)]
pub struct MatrixOracle {
    entries: HashMap<(LocationId, LocationId), f64>,
}

impl MatrixOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(from, to, distance_m)` triples.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (LocationId, LocationId, f64)>,
    {
        let mut oracle = Self::new();
        for (from, to, distance_m) in entries {
            oracle.insert(from, to, distance_m);
        }
        oracle
    }

    pub fn insert(&mut self, from: LocationId, to: LocationId, distance_m: f64) {
        self.entries.insert((from, to), distance_m);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DistanceOracle for MatrixOracle {
    fn distance_m(&self, from: LocationId, to: LocationId) -> Option<f64> {
        if let Some(distance) = self.entries.get(&(from, to)) {
            return Some(*distance);
        }
        // The diagonal need not be materialized.
        if from == to {
            return Some(0.0);
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Haversine (H3) backend
// ---------------------------------------------------------------------------

/// Reads location ids as raw H3 cell indices and measures the great-circle
/// distance between cell centres, scaled by a detour factor.
#[derive(Debug, Clone, Copy)]
pub struct HaversineOracle {
    detour_factor: f64,
}

impl HaversineOracle {
    pub fn new(detour_factor: f64) -> Self {
        Self { detour_factor }
    }

    fn cell(location: LocationId) -> Option<CellIndex> {
        CellIndex::try_from(location.0).ok()
    }
}

impl Default for HaversineOracle {
    fn default() -> Self {
        Self::new(DEFAULT_DETOUR_FACTOR)
    }
}

impl DistanceOracle for HaversineOracle {
    fn distance_m(&self, from: LocationId, to: LocationId) -> Option<f64> {
        let from = Self::cell(from)?;
        let to = Self::cell(to)?;
        Some(haversine_m(from.into(), to.into()) * self.detour_factor)
    }
}

/// Great-circle distance in metres between two points.
fn haversine_m(a: h3o::LatLng, b: h3o::LatLng) -> f64 {
    let (lat1, lon1) = (a.lat().to_radians(), a.lng().to_radians());
    let (lat2, lon2) = (b.lat().to_radians(), b.lng().to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

// ---------------------------------------------------------------------------
// Caching wrapper
// ---------------------------------------------------------------------------

/// LRU-cached wrapper around any [`DistanceOracle`].
///
/// Cache keys are directional. Only successful lookups are cached; misses
/// are retried against the inner oracle.
pub struct CachedOracle {
    inner: Box<dyn DistanceOracle>,
    cache: Mutex<LruCache<(LocationId, LocationId), f64>>,
}

impl CachedOracle {
    /// Wrap `inner` with a cache of the given capacity (at least 1).
    pub fn new(inner: Box<dyn DistanceOracle>, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity.max(1)).expect("cache capacity must be > 0"),
            )),
        }
    }
}

impl DistanceOracle for CachedOracle {
    fn distance_m(&self, from: LocationId, to: LocationId) -> Option<f64> {
        let key = (from, to);

        {
            let mut cache = match self.cache.lock() {
                Ok(guard) => guard,
                // Fall back to the inner oracle if the mutex is poisoned.
                Err(_) => return self.inner.distance_m(from, to),
            };
            if let Some(cached) = cache.get(&key) {
                return Some(*cached);
            }
        }

        let result = self.inner.distance_m(from, to);

        if let Some(distance) = result {
            if let Ok(mut cache) = self.cache.lock() {
                cache.put(key, distance);
            }
        }

        result
    }
}
