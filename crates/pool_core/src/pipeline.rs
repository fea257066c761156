//! Batch orchestration: profiles, singles, pairs, then extension passes
//! until a degree yields nothing.
//!
//! The batch is static and fully known. Within one degree everything is
//! evaluated independently; the only sequential dependency is the barrier
//! between degrees, where the previous degree's accepted set is frozen
//! before the next pass reads it.

use crate::error::PoolingError;
use crate::extension::extend_rides;
use crate::graph::ShareabilityGraph;
use crate::observer::{PoolingEvent, PoolingObserver};
use crate::oracle::DistanceOracle;
use crate::pairs::build_pair_rides;
use crate::params::PoolingParams;
use crate::profiles::build_profiles;
use crate::requests::TravelRequest;
use crate::singles::seed_single_rides;
use crate::utility::UtilityEvaluator;

/// Build the full shareability graph for one batch of requests.
///
/// Identical inputs always reproduce an identical graph; there are no
/// retries and no hidden state.
pub fn build_shareability_graph(
    requests: &[TravelRequest],
    params: &PoolingParams,
    oracle: &dyn DistanceOracle,
    observer: &dyn PoolingObserver,
) -> Result<ShareabilityGraph, PoolingError> {
    params.validate()?;

    let profiles = build_profiles(requests, params, oracle, observer)?;
    let evaluator = UtilityEvaluator::new(params);

    let mut graph = ShareabilityGraph::new();
    let singles = seed_single_rides(&profiles);
    observer.on_event(PoolingEvent::SinglesSeeded {
        count: singles.len(),
    });
    graph.append(singles);

    let degree_allowed = |degree: usize| params.max_degree.map_or(true, |limit| degree <= limit);

    if profiles.len() >= 2 && degree_allowed(2) {
        observer.on_event(PoolingEvent::DegreeStarted { degree: 2 });
        let pass = build_pair_rides(&profiles, params, oracle, &evaluator, observer);
        observer.on_event(PoolingEvent::DegreeCompleted {
            degree: 2,
            candidates: pass.candidates,
            accepted: pass.rides.len(),
        });
        let produced = !pass.rides.is_empty();
        graph.append(pass.rides);

        if produced {
            let mut degree = 2;
            // The loop is bounded by the batch size: a ride cannot carry
            // more members than there are travellers.
            while degree < profiles.len() && degree_allowed(degree + 1) {
                observer.on_event(PoolingEvent::DegreeStarted { degree: degree + 1 });
                let pass = extend_rides(&graph, degree, &profiles, oracle, &evaluator, observer);
                observer.on_event(PoolingEvent::DegreeCompleted {
                    degree: degree + 1,
                    candidates: pass.candidates,
                    accepted: pass.rides.len(),
                });
                if pass.rides.is_empty() {
                    break;
                }
                graph.append(pass.rides);
                degree += 1;
            }
        }
    }

    observer.on_event(PoolingEvent::GraphCompleted {
        rides: graph.len(),
        max_degree: graph.max_degree(),
    });

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;
    use crate::oracle::MatrixOracle;
    use crate::requests::{LocationId, TravellerId};

    #[test]
    fn empty_batch_yields_an_empty_graph() {
        let oracle = MatrixOracle::new();
        let params = PoolingParams::default();
        let graph =
            build_shareability_graph(&[], &params, &oracle, &NoopObserver).expect("graph");
        assert!(graph.is_empty());
        assert_eq!(graph.max_degree(), 0);
    }

    #[test]
    fn invalid_params_abort_before_computation() {
        let oracle = MatrixOracle::new();
        let params = PoolingParams::default().with_speed_mps(-1.0);
        let request = TravelRequest::new(TravellerId(1), LocationId(1), LocationId(2), 0.0);
        assert!(matches!(
            build_shareability_graph(&[request], &params, &oracle, &NoopObserver),
            Err(PoolingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn degree_budget_stops_the_loop() {
        let mut oracle = MatrixOracle::new();
        for a in 0..4u64 {
            for b in 0..4u64 {
                oracle.insert(LocationId(a), LocationId(b), 0.0);
            }
        }
        oracle.insert(LocationId(0), LocationId(1), 3000.0);
        oracle.insert(LocationId(1), LocationId(0), 3000.0);

        let params = PoolingParams::default().with_max_degree(2);
        let requests: Vec<TravelRequest> = (1..=3)
            .map(|id| TravelRequest::new(TravellerId(id), LocationId(0), LocationId(1), 0.0))
            .collect();
        let graph =
            build_shareability_graph(&requests, &params, &oracle, &NoopObserver).expect("graph");

        assert_eq!(graph.max_degree(), 2);
    }
}
