#![allow(dead_code)]

use pool_core::requests::{TravelRequest, TravellerId};
use pool_core::rides::Ride;
use pool_core::test_helpers::request;

/// Identity of a ride for set comparisons across runs.
pub type RideKey = (Vec<TravellerId>, Vec<TravellerId>);

pub fn ride_key(ride: &Ride) -> RideKey {
    (ride.origin_order.clone(), ride.destination_order.clone())
}

/// Travellers sharing one origin and destination, one request per entry in
/// `times`. Ids count up from 1.
pub fn identical_trip_batch(origin: u64, destination: u64, times: &[f64]) -> Vec<TravelRequest> {
    times
        .iter()
        .enumerate()
        .map(|(i, &t)| request(i as u64 + 1, origin, destination, t))
        .collect()
}
