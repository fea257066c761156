//! Append-only accumulator of accepted rides across degrees.

use std::collections::HashMap;

use crate::requests::TravellerId;
use crate::rides::Ride;

/// The shareability graph: every accepted ride of every degree, plus an
/// index from sorted member set to ride positions so sub-combination checks
/// during degree extension avoid linear scans.
///
/// Rides are only ever appended; a degree's accepted set is frozen before
/// the next degree pass reads it.
#[derive(Debug, Default)]
pub struct ShareabilityGraph {
    rides: Vec<Ride>,
    by_members: HashMap<Vec<TravellerId>, Vec<usize>>,
    max_degree: usize,
}

impl ShareabilityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one completed degree pass.
    pub fn append(&mut self, rides: Vec<Ride>) {
        for ride in rides {
            self.max_degree = self.max_degree.max(ride.degree());
            let key = ride.members_sorted();
            let index = self.rides.len();
            self.by_members.entry(key).or_default().push(index);
            self.rides.push(ride);
        }
    }

    pub fn rides(&self) -> &[Ride] {
        &self.rides
    }

    pub fn len(&self) -> usize {
        self.rides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rides.is_empty()
    }

    /// Highest degree with at least one accepted ride (0 when empty).
    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    pub fn rides_of_degree(&self, degree: usize) -> Vec<&Ride> {
        self.rides.iter().filter(|r| r.degree() == degree).collect()
    }

    /// All accepted rides over exactly this member set (ascending ids).
    pub fn rides_with_members(&self, members_sorted: &[TravellerId]) -> Vec<&Ride> {
        self.by_members
            .get(members_sorted)
            .map(|indices| indices.iter().map(|&i| &self.rides[i]).collect())
            .unwrap_or_default()
    }

    /// Is this exact (origin_order, destination_order) pair accepted?
    pub fn contains_ordering(
        &self,
        origin_order: &[TravellerId],
        destination_order: &[TravellerId],
    ) -> bool {
        let mut key = origin_order.to_vec();
        key.sort_unstable();
        self.by_members.get(&key).is_some_and(|indices| {
            indices.iter().any(|&i| {
                let ride = &self.rides[i];
                ride.origin_order == origin_order && ride.destination_order == destination_order
            })
        })
    }
}
