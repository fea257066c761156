//! Degree-2 feasibility: FIFO and LIFO route shapes for traveller pairs.
//!
//! For each unordered pair the engine applies, in order:
//!
//! 1. the optional horizon pre-filter on request-time gaps,
//! 2. a hard departure-window overlap check,
//! 3. a hard reachability check once the pickup-to-pickup leg is known,
//! 4. an even split of the schedule deviation, bounded by each member's
//!    delay tolerance,
//! 5. per-shape cost evaluation under individual rationality.
//!
//! The earlier-requesting traveller is always picked up first, so a pair
//! yields at most one FIFO and one LIFO ride. Pair evaluations are
//! independent and run on parallel workers.

use rayon::prelude::*;

use crate::observer::{PoolingEvent, PoolingObserver};
use crate::oracle::DistanceOracle;
use crate::params::PoolingParams;
use crate::profiles::TravellerProfile;
use crate::requests::TravellerId;
use crate::rides::{DegreePass, PoolKind, Ride};
use crate::utility::UtilityEvaluator;

/// Directed distance legs shared by both route shapes, in metres.
struct PairLegs {
    /// First pickup → second pickup.
    oo_m: f64,
    /// Second pickup → first member's drop-off.
    od_m: f64,
    /// First member's drop-off → second member's drop-off.
    dd_m: f64,
    /// Second member's drop-off → first member's drop-off.
    dd_rev_m: f64,
}

/// Evaluate every unordered pair of profiles and return the accepted
/// degree-2 rides. Profiles must already be sorted by request time, as
/// [`crate::profiles::build_profiles`] returns them.
pub fn build_pair_rides(
    profiles: &[TravellerProfile],
    params: &PoolingParams,
    oracle: &dyn DistanceOracle,
    evaluator: &UtilityEvaluator,
    observer: &dyn PoolingObserver,
) -> DegreePass {
    let mut pairs = Vec::new();
    for first in 0..profiles.len() {
        for second in first + 1..profiles.len() {
            pairs.push((first, second));
        }
    }

    let candidates = pairs.len();
    let rides: Vec<Ride> = pairs
        .par_iter()
        .flat_map_iter(|&(first, second)| {
            evaluate_pair(
                &profiles[first],
                &profiles[second],
                params,
                oracle,
                evaluator,
                observer,
            )
        })
        .collect();

    DegreePass { rides, candidates }
}

/// Both shapes for one pair; `first` requested no later than `second`.
fn evaluate_pair(
    first: &TravellerProfile,
    second: &TravellerProfile,
    params: &PoolingParams,
    oracle: &dyn DistanceOracle,
    evaluator: &UtilityEvaluator,
    observer: &dyn PoolingObserver,
) -> Vec<Ride> {
    let gap_s = (second.request_time_s - first.request_time_s).abs();
    if params.horizon_s > 0.0 && gap_s >= params.horizon_s {
        return Vec::new();
    }

    // Departure windows must overlap before any distance is queried.
    let windows_overlap = second.request_time_s + second.max_delay_s
        >= first.request_time_s - first.max_delay_s
        && second.request_time_s - second.max_delay_s
            <= first.request_time_s + first.solo_time_s + first.max_delay_s;
    if !windows_overlap {
        return Vec::new();
    }

    let Some(legs) = fetch_legs(first, second, oracle, observer) else {
        return Vec::new();
    };

    let speed = evaluator.speed_mps();
    let oo_s = legs.oo_m / speed;

    // The second pickup must be reachable within both windows.
    let arrival_s = first.request_time_s + oo_s;
    let reachable = arrival_s + first.max_delay_s >= second.request_time_s - second.max_delay_s
        && arrival_s - first.max_delay_s <= second.request_time_s + second.max_delay_s;
    if !reachable {
        return Vec::new();
    }

    // Centre the schedule deviation: each member bears half of it.
    let deviation_s = arrival_s - second.request_time_s;
    let delay_s = deviation_s.abs() / 2.0;
    if delay_s > first.max_delay_s || delay_s > second.max_delay_s {
        return Vec::new();
    }

    let mut rides = Vec::with_capacity(2);

    // FIFO: pick up first, pick up second, drop first, drop second.
    let fifo = accept_shape(
        first,
        second,
        delay_s,
        (legs.oo_m + legs.od_m) / speed,
        (legs.od_m + legs.dd_m) / speed,
        legs.oo_m + legs.od_m + legs.dd_m,
        vec![first.traveller, second.traveller],
        evaluator,
    );

    // LIFO: the second member rides nested inside the first member's trip.
    let lifo = accept_shape(
        first,
        second,
        delay_s,
        oo_s + second.solo_time_s + legs.dd_rev_m / speed,
        second.solo_time_s,
        legs.oo_m + second.distance_m + legs.dd_rev_m,
        vec![second.traveller, first.traveller],
        evaluator,
    );

    if let Some(fifo) = fifo {
        // When drop-offs coincide the two shapes describe the same route;
        // keep only one ride for it.
        let coincide = lifo.as_ref().is_some_and(|l| {
            l.vehicle_distance_m == fifo.vehicle_distance_m && l.utilities == fifo.utilities
        });
        rides.push(fifo);
        if !coincide {
            if let Some(lifo) = lifo {
                rides.push(lifo);
            }
        }
    } else if let Some(lifo) = lifo {
        rides.push(lifo);
    }

    rides
}

fn fetch_legs(
    first: &TravellerProfile,
    second: &TravellerProfile,
    oracle: &dyn DistanceOracle,
    observer: &dyn PoolingObserver,
) -> Option<PairLegs> {
    let lookup = |from, to| {
        let distance = oracle.distance_m(from, to);
        if distance.is_none() {
            observer.on_event(PoolingEvent::OracleMiss { from, to });
        }
        distance
    };

    Some(PairLegs {
        oo_m: lookup(first.origin, second.origin)?,
        od_m: lookup(second.origin, first.destination)?,
        dd_m: lookup(first.destination, second.destination)?,
        dd_rev_m: lookup(second.destination, first.destination)?,
    })
}

/// Cost one shape for both members; `None` unless both come out at or below
/// their solo cost.
#[allow(clippy::too_many_arguments)]
fn accept_shape(
    first: &TravellerProfile,
    second: &TravellerProfile,
    delay_s: f64,
    first_time_s: f64,
    second_time_s: f64,
    vehicle_distance_m: f64,
    destination_order: Vec<TravellerId>,
    evaluator: &UtilityEvaluator,
) -> Option<Ride> {
    let first_cost =
        evaluator.shared_cost_for_time(first_time_s, first.vot, first.wts, delay_s, first.asc_pool);
    if first_cost > first.solo_cost {
        return None;
    }
    let second_cost = evaluator.shared_cost_for_time(
        second_time_s,
        second.vot,
        second.wts,
        delay_s,
        second.asc_pool,
    );
    if second_cost > second.solo_cost {
        return None;
    }

    let origin_order = vec![first.traveller, second.traveller];
    let kind = PoolKind::classify(&origin_order, &destination_order);
    Some(Ride {
        origin_order,
        destination_order,
        delays_s: vec![delay_s, delay_s],
        utilities: vec![first_cost, second_cost],
        total_utility: first_cost + second_cost,
        vehicle_distance_m,
        vehicle_time_s: vehicle_distance_m / evaluator.speed_mps(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{CollectingObserver, NoopObserver};
    use crate::oracle::MatrixOracle;
    use crate::profiles::build_profiles;
    use crate::requests::{LocationId, TravelRequest, TravellerId};

    /// Locations 0..count spaced evenly on a line, both directions.
    fn line_oracle(count: u64, spacing_m: f64) -> MatrixOracle {
        let mut oracle = MatrixOracle::new();
        for a in 0..count {
            for b in 0..count {
                oracle.insert(
                    LocationId(a),
                    LocationId(b),
                    (a as f64 - b as f64).abs() * spacing_m,
                );
            }
        }
        oracle
    }

    fn request(id: u64, origin: u64, destination: u64, time_s: f64) -> TravelRequest {
        TravelRequest::new(
            TravellerId(id),
            LocationId(origin),
            LocationId(destination),
            time_s,
        )
    }

    fn pass_for(requests: &[TravelRequest], params: &PoolingParams) -> DegreePass {
        let oracle = line_oracle(12, 500.0);
        let evaluator = UtilityEvaluator::new(params);
        let profiles =
            build_profiles(requests, params, &oracle, &NoopObserver).expect("profiles");
        build_pair_rides(&profiles, params, &oracle, &evaluator, &NoopObserver)
    }

    #[test]
    fn nested_trip_accepts_both_shapes() {
        // Second traveller's whole trip lies inside the first's.
        let params = PoolingParams::default();
        let pass = pass_for(
            &[request(1, 0, 10, 0.0), request(2, 1, 9, 0.0)],
            &params,
        );

        assert_eq!(pass.candidates, 1);
        assert_eq!(pass.rides.len(), 2);
        let kinds: Vec<PoolKind> = pass.rides.iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&PoolKind::Fifo(2)));
        assert!(kinds.contains(&PoolKind::Lifo(2)));
        for ride in &pass.rides {
            assert!(ride.is_order_consistent());
            assert_eq!(ride.origin_order, vec![TravellerId(1), TravellerId(2)]);
        }
    }

    #[test]
    fn unreachable_second_pickup_rejects_the_pair() {
        // Short trips at opposite ends of the line: the dead-head to the
        // second pickup blows both travellers' windows.
        let params = PoolingParams::default();
        let pass = pass_for(
            &[request(1, 0, 4, 0.0), request(2, 10, 6, 0.0)],
            &params,
        );
        assert!(pass.rides.is_empty());
    }

    #[test]
    fn horizon_rejects_wide_request_gaps() {
        let params = PoolingParams::default().with_horizon_s(60.0);
        let pass = pass_for(
            &[request(1, 0, 10, 0.0), request(2, 1, 9, 300.0)],
            &params,
        );
        assert!(pass.rides.is_empty());
    }

    #[test]
    fn delay_split_exceeding_a_tolerance_rejects_the_pair() {
        // Identical trips 120 s apart. The impatient variant tolerates far
        // less than the 60 s half-deviation it would have to absorb.
        let params = PoolingParams::default();
        let mut impatient = request(1, 0, 6, 0.0);
        impatient.vot = Some(0.135);
        impatient.wts = Some(1.0);
        let mut patient = request(2, 0, 6, 120.0);
        patient.vot = Some(0.0035);
        patient.wts = Some(1.0);

        let pass = pass_for(&[impatient.clone(), patient.clone()], &params);
        assert!(pass.rides.is_empty());

        // With a relaxed first traveller the same geometry pools fine.
        impatient.vot = Some(0.0035);
        let pass = pass_for(&[impatient, patient], &params);
        assert_eq!(pass.rides.len(), 1);
        assert_eq!(pass.rides[0].delays_s, vec![60.0, 60.0]);
    }

    #[test]
    fn coinciding_shapes_emit_one_ride() {
        // Same origin, same destination, same time: FIFO and LIFO describe
        // the identical route.
        let params = PoolingParams::default();
        let pass = pass_for(&[request(1, 0, 6, 0.0), request(2, 0, 6, 0.0)], &params);

        assert_eq!(pass.rides.len(), 1);
        let ride = &pass.rides[0];
        assert_eq!(ride.kind, PoolKind::Fifo(2));
        assert_eq!(ride.delays_s, vec![0.0, 0.0]);
        assert_eq!(ride.vehicle_distance_m, 3000.0);
    }

    #[test]
    fn missing_leg_drops_the_pair_with_a_warning() {
        // Both solo trips resolve, but the drop-off to drop-off leg between
        // the two destinations is absent from the matrix.
        let mut oracle = MatrixOracle::new();
        oracle.insert(LocationId(0), LocationId(1), 500.0);
        oracle.insert(LocationId(0), LocationId(5), 2500.0);
        oracle.insert(LocationId(1), LocationId(5), 2000.0);
        oracle.insert(LocationId(1), LocationId(7), 3000.0);

        let params = PoolingParams::default();
        let observer = CollectingObserver::new();
        let requests = [request(1, 0, 5, 0.0), request(2, 1, 7, 0.0)];
        let profiles =
            build_profiles(&requests, &params, &oracle, &observer).expect("profiles");
        assert_eq!(profiles.len(), 2);

        let evaluator = UtilityEvaluator::new(&params);
        let pass = build_pair_rides(&profiles, &params, &oracle, &evaluator, &observer);

        assert!(pass.rides.is_empty());
        assert!(observer
            .warnings()
            .iter()
            .any(|e| matches!(e, PoolingEvent::OracleMiss { .. })));
    }
}
