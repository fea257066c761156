//! Degree-1 seeding: one solo ride per traveller.

use crate::profiles::TravellerProfile;
use crate::rides::{PoolKind, Ride};

/// Every solo ride is feasible by construction; there is no failure mode.
pub fn seed_single_rides(profiles: &[TravellerProfile]) -> Vec<Ride> {
    profiles
        .iter()
        .map(|profile| Ride {
            origin_order: vec![profile.traveller],
            destination_order: vec![profile.traveller],
            delays_s: vec![0.0],
            utilities: vec![profile.solo_cost],
            total_utility: profile.solo_cost,
            vehicle_distance_m: profile.distance_m,
            vehicle_time_s: profile.solo_time_s,
            kind: PoolKind::Single,
        })
        .collect()
}
