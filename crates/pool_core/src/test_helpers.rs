//! Test helpers for common fixtures and synthetic batches.
//!
//! This module provides shared utilities to reduce duplication across test
//! files and benches.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::oracle::MatrixOracle;
use crate::requests::{LocationId, TravelRequest, TravellerId};

/// A line city: `locations` stops spaced `spacing_m` apart, distances
/// symmetric and additive in both directions.
pub fn line_city_oracle(locations: u64, spacing_m: f64) -> MatrixOracle {
    let mut oracle = MatrixOracle::new();
    for a in 0..locations {
        for b in 0..locations {
            oracle.insert(
                LocationId(a),
                LocationId(b),
                (a as f64 - b as f64).abs() * spacing_m,
            );
        }
    }
    oracle
}

/// Request with default traveller traits.
pub fn request(id: u64, origin: u64, destination: u64, request_time_s: f64) -> TravelRequest {
    TravelRequest::new(
        TravellerId(id),
        LocationId(origin),
        LocationId(destination),
        request_time_s,
    )
}

/// Seeded batch of random requests across a line city. Origins and
/// destinations always differ; request times are uniform over the window.
pub fn random_batch(count: usize, locations: u64, window_s: f64, seed: u64) -> Vec<TravelRequest> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let origin = rng.gen_range(0..locations);
            let mut destination = rng.gen_range(0..locations);
            if destination == origin {
                destination = (destination + 1) % locations;
            }
            request(i as u64 + 1, origin, destination, rng.gen_range(0.0..window_s))
        })
        .collect()
}
