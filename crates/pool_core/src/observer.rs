//! Observer interface for leveled progress and data-quality events.
//!
//! The pipeline and its engines report through an injected
//! [`PoolingObserver`]; the computation itself never branches on whether
//! anything is listening. [`NoopObserver`] discards everything,
//! [`CollectingObserver`] buffers events for inspection in tests.

use std::sync::Mutex;

use crate::requests::{LocationId, TravellerId};

/// Severity of a [`PoolingEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
}

/// Events emitted while a shareability graph is built.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolingEvent {
    /// Profiles derived from the raw requests; `dropped` counts travellers
    /// lost to missing distance entries.
    ProfilesBuilt { total: usize, dropped: usize },
    /// A traveller's own origin→destination distance was missing.
    ProfileDropped { traveller: TravellerId },
    /// Degree-1 rides seeded, one per profile.
    SinglesSeeded { count: usize },
    /// No distance entry for a leg a candidate needed; the candidate was
    /// dropped.
    OracleMiss { from: LocationId, to: LocationId },
    /// A degree pass is starting.
    DegreeStarted { degree: usize },
    /// A degree pass finished: `candidates` examined, `accepted` kept.
    DegreeCompleted {
        degree: usize,
        candidates: usize,
        accepted: usize,
    },
    /// The whole batch is done.
    GraphCompleted { rides: usize, max_degree: usize },
}

impl PoolingEvent {
    pub fn level(&self) -> EventLevel {
        match self {
            PoolingEvent::ProfileDropped { .. } | PoolingEvent::OracleMiss { .. } => {
                EventLevel::Warn
            }
            PoolingEvent::DegreeStarted { .. } => EventLevel::Debug,
            _ => EventLevel::Info,
        }
    }
}

/// Sink for pooling events. Implementations must be `Send + Sync`: within a
/// degree pass, candidate evaluations run on parallel workers and may emit
/// concurrently.
pub trait PoolingObserver: Send + Sync {
    fn on_event(&self, event: PoolingEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PoolingObserver for NoopObserver {
    fn on_event(&self, _event: PoolingEvent) {}
}

/// Buffers events for later inspection. A poisoned lock drops the event
/// rather than panicking a worker.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    events: Mutex<Vec<PoolingEvent>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything observed so far.
    pub fn events(&self) -> Vec<PoolingEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Only the `Warn`-level events.
    pub fn warnings(&self) -> Vec<PoolingEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.level() == EventLevel::Warn)
            .collect()
    }
}

impl PoolingObserver for CollectingObserver {
    fn on_event(&self, event: PoolingEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_observer_keeps_order() {
        let observer = CollectingObserver::new();
        observer.on_event(PoolingEvent::DegreeStarted { degree: 2 });
        observer.on_event(PoolingEvent::DegreeCompleted {
            degree: 2,
            candidates: 10,
            accepted: 3,
        });
        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], PoolingEvent::DegreeStarted { degree: 2 });
    }

    #[test]
    fn oracle_miss_is_a_warning() {
        let event = PoolingEvent::OracleMiss {
            from: LocationId(1),
            to: LocationId(2),
        };
        assert_eq!(event.level(), EventLevel::Warn);
    }
}
