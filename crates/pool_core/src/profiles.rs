//! Traveller profiles: cost-ready normalization of the raw requests.
//!
//! Validation happens here, before any combination is examined: broken
//! request fields abort the run, while a missing distance entry for a
//! traveller's own trip only drops that traveller with a warning (their
//! solo ride is itself a candidate).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::PoolingError;
use crate::observer::{PoolingEvent, PoolingObserver};
use crate::oracle::DistanceOracle;
use crate::params::PoolingParams;
use crate::requests::{LocationId, TravelRequest, TravellerId};
use crate::utility::UtilityEvaluator;

/// One traveller, normalized and costed. Created once per batch, read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravellerProfile {
    pub traveller: TravellerId,
    pub origin: LocationId,
    pub destination: LocationId,
    /// Seconds since the batch's earliest request.
    pub request_time_s: f64,
    /// Value of time (currency per second), positive.
    pub vot: f64,
    /// Willingness-to-share multiplier in (0, 1].
    pub wts: f64,
    /// Pooling alternative-specific constant.
    pub asc_pool: f64,
    /// Solo trip distance.
    pub distance_m: f64,
    /// Solo travel time at the run speed.
    pub solo_time_s: f64,
    /// Generalized cost of the solo alternative.
    pub solo_cost: f64,
    /// Largest departure delay this traveller tolerates.
    pub max_delay_s: f64,
}

/// Derive profiles from raw requests. Output is sorted by normalized
/// request time (ties broken by traveller id).
pub fn build_profiles(
    requests: &[TravelRequest],
    params: &PoolingParams,
    oracle: &dyn DistanceOracle,
    observer: &dyn PoolingObserver,
) -> Result<Vec<TravellerProfile>, PoolingError> {
    let mut seen = HashSet::with_capacity(requests.len());
    for request in requests {
        if !seen.insert(request.traveller) {
            return Err(PoolingError::DuplicateTraveller(request.traveller));
        }
        if !request.request_time_s.is_finite() {
            return Err(PoolingError::InvalidRequest {
                traveller: request.traveller,
                reason: "request_time_s must be finite",
            });
        }
        let vot = request.vot.unwrap_or(params.default_vot);
        if !(vot > 0.0 && vot.is_finite()) {
            return Err(PoolingError::InvalidRequest {
                traveller: request.traveller,
                reason: "vot must be positive",
            });
        }
        let wts = request.wts.unwrap_or(params.default_wts);
        if !(wts > 0.0 && wts <= 1.0) {
            return Err(PoolingError::InvalidRequest {
                traveller: request.traveller,
                reason: "wts must lie in (0, 1]",
            });
        }
        let asc_pool = request.asc_pool.unwrap_or(params.default_asc_pool);
        if !asc_pool.is_finite() {
            return Err(PoolingError::InvalidRequest {
                traveller: request.traveller,
                reason: "asc_pool must be finite",
            });
        }
    }

    let batch_start = requests
        .iter()
        .map(|r| r.request_time_s)
        .fold(f64::INFINITY, f64::min);
    let evaluator = UtilityEvaluator::new(params);

    let mut profiles = Vec::with_capacity(requests.len());
    let mut dropped = 0usize;
    for request in requests {
        let Some(distance_m) = oracle.distance_m(request.origin, request.destination) else {
            observer.on_event(PoolingEvent::OracleMiss {
                from: request.origin,
                to: request.destination,
            });
            observer.on_event(PoolingEvent::ProfileDropped {
                traveller: request.traveller,
            });
            dropped += 1;
            continue;
        };

        let vot = request.vot.unwrap_or(params.default_vot);
        let wts = request.wts.unwrap_or(params.default_wts);
        let asc_pool = request.asc_pool.unwrap_or(params.default_asc_pool);
        let solo_time_s = distance_m / params.speed_mps;

        profiles.push(TravellerProfile {
            traveller: request.traveller,
            origin: request.origin,
            destination: request.destination,
            request_time_s: request.request_time_s - batch_start,
            vot,
            wts,
            asc_pool,
            distance_m,
            solo_time_s,
            solo_cost: evaluator.solo_cost(distance_m, vot),
            max_delay_s: evaluator.max_delay(distance_m, solo_time_s, vot, wts),
        });
    }

    profiles.sort_by(|a, b| {
        a.request_time_s
            .partial_cmp(&b.request_time_s)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.traveller.cmp(&b.traveller))
    });

    observer.on_event(PoolingEvent::ProfilesBuilt {
        total: profiles.len(),
        dropped,
    });

    Ok(profiles)
}
