//! Core identifiers and the raw request contract handed over by ingestion.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one traveller across the whole batch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TravellerId(pub u64);

impl fmt::Display for TravellerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle for a pickup or drop-off location.
///
/// The core never interprets the value; oracle backends may (the Haversine
/// backend reads it as a raw H3 cell index).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LocationId(pub u64);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// One raw trip request. Per-traveller fields override the run defaults
/// when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelRequest {
    pub traveller: TravellerId,
    pub origin: LocationId,
    pub destination: LocationId,
    /// Desired departure time in seconds. Any epoch works; only gaps between
    /// requests matter, the batch is re-anchored to its earliest request.
    pub request_time_s: f64,
    /// Value of time override (currency per second).
    pub vot: Option<f64>,
    /// Willingness-to-share override, in (0, 1].
    pub wts: Option<f64>,
    /// Pooling alternative-specific constant override.
    pub asc_pool: Option<f64>,
}

impl TravelRequest {
    /// Request with all per-traveller overrides left to the run defaults.
    pub fn new(
        traveller: TravellerId,
        origin: LocationId,
        destination: LocationId,
        request_time_s: f64,
    ) -> Self {
        Self {
            traveller,
            origin,
            destination,
            request_time_s,
            vot: None,
            wts: None,
            asc_pool: None,
        }
    }
}
