//! Ride records: the nodes of the shareability graph.

use serde::{Deserialize, Serialize};

use crate::requests::TravellerId;

/// Ordering pattern of a ride, tagged with its degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolKind {
    /// One traveller alone.
    Single,
    /// Drop-offs in pickup order.
    Fifo(usize),
    /// Drop-offs in reverse pickup order.
    Lifo(usize),
    /// Any other drop-off permutation.
    Mixed(usize),
}

impl PoolKind {
    /// Classify a ride from its two orders. Degree 1 is always `Single`.
    pub fn classify(origin_order: &[TravellerId], destination_order: &[TravellerId]) -> Self {
        let degree = origin_order.len();
        if degree <= 1 {
            return PoolKind::Single;
        }
        if origin_order == destination_order {
            return PoolKind::Fifo(degree);
        }
        let reversed: Vec<TravellerId> = origin_order.iter().rev().copied().collect();
        if reversed == destination_order {
            PoolKind::Lifo(degree)
        } else {
            PoolKind::Mixed(degree)
        }
    }

    pub fn degree(&self) -> usize {
        match *self {
            PoolKind::Single => 1,
            PoolKind::Fifo(degree) | PoolKind::Lifo(degree) | PoolKind::Mixed(degree) => degree,
        }
    }

    /// Numeric tag packing degree and pattern for export; degrees above 5
    /// collapse to a single bucket.
    pub fn code(&self) -> u32 {
        match *self {
            PoolKind::Single => 1,
            PoolKind::Fifo(degree) | PoolKind::Lifo(degree) | PoolKind::Mixed(degree)
                if degree > 5 =>
            {
                100
            }
            PoolKind::Fifo(degree) => degree as u32 * 10,
            PoolKind::Lifo(degree) => degree as u32 * 10 + 1,
            PoolKind::Mixed(degree) => degree as u32 * 10 + 2,
        }
    }
}

/// One feasible, attractive ride of any degree. Never mutated after its
/// producing degree pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    /// Pickup sequence; also the canonical member listing.
    pub origin_order: Vec<TravellerId>,
    /// Drop-off sequence; a permutation of the same members.
    pub destination_order: Vec<TravellerId>,
    /// Departure delay per member, aligned with `origin_order`.
    pub delays_s: Vec<f64>,
    /// Generalized cost per member, aligned with `origin_order`.
    pub utilities: Vec<f64>,
    /// Sum of the per-member costs.
    pub total_utility: f64,
    /// Distance the vehicle drives to serve every member.
    pub vehicle_distance_m: f64,
    /// Time the vehicle is occupied by this ride.
    pub vehicle_time_s: f64,
    pub kind: PoolKind,
}

impl Ride {
    /// Number of travellers sharing the vehicle.
    pub fn degree(&self) -> usize {
        self.origin_order.len()
    }

    /// Member set in ascending id order, the graph's index key.
    pub fn members_sorted(&self) -> Vec<TravellerId> {
        let mut members = self.origin_order.clone();
        members.sort_unstable();
        members
    }

    pub fn contains(&self, traveller: TravellerId) -> bool {
        self.origin_order.contains(&traveller)
    }

    /// Generalized cost borne by one member, if present.
    pub fn utility_of(&self, traveller: TravellerId) -> Option<f64> {
        self.origin_order
            .iter()
            .position(|t| *t == traveller)
            .map(|i| self.utilities[i])
    }

    /// Departure delay borne by one member, if present.
    pub fn delay_of(&self, traveller: TravellerId) -> Option<f64> {
        self.origin_order
            .iter()
            .position(|t| *t == traveller)
            .map(|i| self.delays_s[i])
    }

    /// Both orders list exactly the same members, each exactly once.
    pub fn is_order_consistent(&self) -> bool {
        let mut origins = self.origin_order.clone();
        let mut destinations = self.destination_order.clone();
        origins.sort_unstable();
        destinations.sort_unstable();
        origins == destinations && origins.windows(2).all(|w| w[0] != w[1])
    }
}

/// Output of one degree pass: the accepted rides plus how many candidates
/// were examined to find them.
#[derive(Debug, Clone, Default)]
pub struct DegreePass {
    pub rides: Vec<Ride>,
    pub candidates: usize,
}
