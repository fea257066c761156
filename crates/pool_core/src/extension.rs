//! Degree extension: grow accepted rides of degree d into rides of degree
//! d+1.
//!
//! One pass runs four stages:
//!
//! - **candidate generation**: two degree-d rides are compatible when they
//!   share exactly d-1 members in the same relative order in both the
//!   pickup and the drop-off sequence; the leftover traveller is inserted
//!   at every position of the base ride's orders, each position pair an
//!   independent candidate (deduplicated as generated),
//! - **sub-combination pruning**: every single-member deletion of a
//!   candidate must exactly match an already accepted degree-d ordering,
//!   so lower-degree infeasibility blocks all supersets,
//! - **schedule centering**: pickup offsets are mean-centred; a delay above
//!   any member's tolerance kills the candidate,
//! - **cost re-evaluation**: the vehicle path is walked pickup sequence
//!   then drop-off sequence; each member pays for their own stretch of it,
//!   under individual rationality.
//!
//! Candidates are independent of each other and evaluated on parallel
//! workers; only the previous degrees' frozen accepted set is read.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::graph::ShareabilityGraph;
use crate::observer::{PoolingEvent, PoolingObserver};
use crate::oracle::DistanceOracle;
use crate::profiles::TravellerProfile;
use crate::requests::{LocationId, TravellerId};
use crate::rides::{DegreePass, PoolKind, Ride};
use crate::utility::UtilityEvaluator;

/// Candidate orders for one degree-(d+1) combination.
type OrderPair = (Vec<TravellerId>, Vec<TravellerId>);

/// One extension pass: consume the accepted rides of `degree` and produce
/// accepted rides of `degree + 1`. An empty result terminates the loop.
pub fn extend_rides(
    graph: &ShareabilityGraph,
    degree: usize,
    profiles: &[TravellerProfile],
    oracle: &dyn DistanceOracle,
    evaluator: &UtilityEvaluator,
    observer: &dyn PoolingObserver,
) -> DegreePass {
    let base = graph.rides_of_degree(degree);
    let by_id: HashMap<TravellerId, &TravellerProfile> =
        profiles.iter().map(|p| (p.traveller, p)).collect();

    let candidates = generate_candidates(&base, degree);

    let rides: Vec<Ride> = candidates
        .par_iter()
        .filter_map(|(origin_order, destination_order)| {
            evaluate_candidate(
                origin_order,
                destination_order,
                graph,
                &by_id,
                oracle,
                evaluator,
                observer,
            )
        })
        .collect();

    DegreePass {
        rides,
        candidates: candidates.len(),
    }
}

/// Enumerate every order-pair obtained by inserting a compatible ride's
/// leftover traveller into a base ride, deduplicated.
fn generate_candidates(base: &[&Ride], degree: usize) -> Vec<OrderPair> {
    let mut seen: HashSet<OrderPair> = HashSet::new();
    let mut candidates = Vec::new();

    for ride in base {
        for other in base {
            let Some(newcomer) = compatible_newcomer(ride, other) else {
                continue;
            };
            for origin_position in 0..=degree {
                for destination_position in 0..=degree {
                    let candidate = (
                        insert_at(&ride.origin_order, origin_position, newcomer),
                        insert_at(&ride.destination_order, destination_position, newcomer),
                    );
                    if seen.insert(candidate.clone()) {
                        candidates.push(candidate);
                    }
                }
            }
        }
    }

    candidates
}

/// The traveller `other` would contribute to `base`, if the two rides are
/// compatible: exactly d-1 shared members whose relative order agrees in
/// both rides' pickup and drop-off sequences.
fn compatible_newcomer(base: &Ride, other: &Ride) -> Option<TravellerId> {
    let base_members: HashSet<TravellerId> = base.origin_order.iter().copied().collect();
    let common: HashSet<TravellerId> = other
        .origin_order
        .iter()
        .copied()
        .filter(|t| base_members.contains(t))
        .collect();
    if common.len() != base.degree() - 1 {
        return None;
    }

    let newcomer = other
        .origin_order
        .iter()
        .copied()
        .find(|t| !common.contains(t))?;

    if restricted(&base.origin_order, &common) != restricted(&other.origin_order, &common) {
        return None;
    }
    if restricted(&base.destination_order, &common) != restricted(&other.destination_order, &common)
    {
        return None;
    }

    Some(newcomer)
}

/// The order restricted to a member subset, preserving relative positions.
fn restricted(order: &[TravellerId], keep: &HashSet<TravellerId>) -> Vec<TravellerId> {
    order.iter().copied().filter(|t| keep.contains(t)).collect()
}

fn insert_at(order: &[TravellerId], position: usize, traveller: TravellerId) -> Vec<TravellerId> {
    let mut extended = order.to_vec();
    extended.insert(position, traveller);
    extended
}

/// Prune, schedule and cost one candidate.
fn evaluate_candidate(
    origin_order: &[TravellerId],
    destination_order: &[TravellerId],
    graph: &ShareabilityGraph,
    profiles: &HashMap<TravellerId, &TravellerProfile>,
    oracle: &dyn DistanceOracle,
    evaluator: &UtilityEvaluator,
    observer: &dyn PoolingObserver,
) -> Option<Ride> {
    // Every single-member deletion must already be accepted.
    for member in origin_order {
        let sub_origins: Vec<TravellerId> = origin_order
            .iter()
            .copied()
            .filter(|t| t != member)
            .collect();
        let sub_destinations: Vec<TravellerId> = destination_order
            .iter()
            .copied()
            .filter(|t| t != member)
            .collect();
        if !graph.contains_ordering(&sub_origins, &sub_destinations) {
            return None;
        }
    }

    let members: Vec<&TravellerProfile> = origin_order
        .iter()
        .map(|t| profiles.get(t).copied())
        .collect::<Option<Vec<_>>>()?;

    // Centre the desired pickup offsets around their mean.
    let first_request_s = members[0].request_time_s;
    let offsets: Vec<f64> = members
        .iter()
        .map(|p| p.request_time_s - first_request_s)
        .collect();
    let mean_offset = offsets.iter().sum::<f64>() / offsets.len() as f64;
    let delays_s: Vec<f64> = offsets.iter().map(|o| (o - mean_offset).abs()).collect();
    for (profile, delay_s) in members.iter().zip(&delays_s) {
        if *delay_s > profile.max_delay_s {
            return None;
        }
    }

    // Walk the vehicle path: all pickups in order, then all drop-offs.
    let path: Vec<LocationId> = origin_order
        .iter()
        .map(|t| profiles[t].origin)
        .chain(destination_order.iter().map(|t| profiles[t].destination))
        .collect();
    let mut leg_distances_m = Vec::with_capacity(path.len() - 1);
    for leg in path.windows(2) {
        match oracle.distance_m(leg[0], leg[1]) {
            Some(distance) => leg_distances_m.push(distance),
            None => {
                observer.on_event(PoolingEvent::OracleMiss {
                    from: leg[0],
                    to: leg[1],
                });
                return None;
            }
        }
    }
    let vehicle_distance_m: f64 = leg_distances_m.iter().sum();

    // Each member rides a contiguous stretch: from their pickup position
    // through their drop-off position.
    let degree = origin_order.len();
    let mut utilities = Vec::with_capacity(degree);
    for (pickup_position, (profile, delay_s)) in members.iter().zip(&delays_s).enumerate() {
        let drop_position = destination_order
            .iter()
            .position(|t| *t == profile.traveller)?;
        let member_distance_m: f64 = leg_distances_m[pickup_position..degree + drop_position]
            .iter()
            .sum();
        let cost = evaluator.shared_cost(
            member_distance_m,
            profile.vot,
            profile.wts,
            *delay_s,
            profile.asc_pool,
        );
        if cost > profile.solo_cost {
            return None;
        }
        utilities.push(cost);
    }

    let total_utility = utilities.iter().sum();
    Some(Ride {
        origin_order: origin_order.to_vec(),
        destination_order: destination_order.to_vec(),
        delays_s,
        utilities,
        total_utility,
        vehicle_distance_m,
        vehicle_time_s: vehicle_distance_m / evaluator.speed_mps(),
        kind: PoolKind::classify(origin_order, destination_order),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<TravellerId> {
        raw.iter().map(|&id| TravellerId(id)).collect()
    }

    fn ride(origin_order: &[u64], destination_order: &[u64]) -> Ride {
        let origins = ids(origin_order);
        let destinations = ids(destination_order);
        let degree = origins.len();
        Ride {
            kind: PoolKind::classify(&origins, &destinations),
            origin_order: origins,
            destination_order: destinations,
            delays_s: vec![0.0; degree],
            utilities: vec![1.0; degree],
            total_utility: degree as f64,
            vehicle_distance_m: 1000.0,
            vehicle_time_s: 100.0,
        }
    }

    #[test]
    fn newcomer_found_when_orders_agree() {
        let base = ride(&[1, 2], &[1, 2]);
        let other = ride(&[2, 3], &[2, 3]);
        assert_eq!(compatible_newcomer(&base, &other), Some(TravellerId(3)));
    }

    #[test]
    fn same_member_set_is_not_compatible() {
        let fifo = ride(&[1, 2], &[1, 2]);
        let lifo = ride(&[1, 2], &[2, 1]);
        assert_eq!(compatible_newcomer(&fifo, &lifo), None);
        assert_eq!(compatible_newcomer(&fifo, &fifo), None);
    }

    #[test]
    fn conflicting_drop_order_is_not_compatible() {
        // The shared pair (2, 3) is dropped in opposite orders.
        let base = ride(&[1, 2, 3], &[1, 2, 3]);
        let other = ride(&[2, 3, 4], &[3, 2, 4]);
        assert_eq!(compatible_newcomer(&base, &other), None);
    }

    #[test]
    fn disjoint_rides_are_not_compatible() {
        let base = ride(&[1, 2], &[1, 2]);
        let other = ride(&[3, 4], &[3, 4]);
        assert_eq!(compatible_newcomer(&base, &other), None);
    }

    #[test]
    fn candidates_cover_every_insertion_once() {
        let base = vec![
            ride(&[1, 2], &[1, 2]),
            ride(&[2, 3], &[2, 3]),
            ride(&[1, 3], &[1, 3]),
        ];
        let refs: Vec<&Ride> = base.iter().collect();
        let candidates = generate_candidates(&refs, 2);

        // No duplicates even though several compatible pairs produce the
        // same insertion.
        let unique: HashSet<&OrderPair> = candidates.iter().collect();
        assert_eq!(unique.len(), candidates.len());
        assert!(candidates.contains(&(ids(&[1, 2, 3]), ids(&[1, 2, 3]))));
    }
}
