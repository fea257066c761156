//! Generalized-cost evaluation for solo and pooled rides.
//!
//! One convention throughout: costs, lower is better. A pooled ride is
//! attractive to a member iff their shared cost does not exceed their solo
//! cost. The same evaluator is reused at every degree.

use crate::params::PoolingParams;

/// Pure cost function over the run parameters. No internal state.
#[derive(Debug, Clone, Copy)]
pub struct UtilityEvaluator {
    price_per_km: f64,
    share_discount: f64,
    delay_value: f64,
    speed_mps: f64,
}

impl UtilityEvaluator {
    pub fn new(params: &PoolingParams) -> Self {
        Self {
            price_per_km: params.price_per_km,
            share_discount: params.share_discount,
            delay_value: params.delay_value,
            speed_mps: params.speed_mps,
        }
    }

    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    /// Generalized cost of travelling alone: full fare plus time cost.
    pub fn solo_cost(&self, distance_m: f64, vot: f64) -> f64 {
        self.price_per_km * distance_m / 1000.0 + vot * (distance_m / self.speed_mps)
    }

    /// Generalized cost of one member's pooled trip, from that member's
    /// in-vehicle distance.
    pub fn shared_cost(
        &self,
        distance_m: f64,
        vot: f64,
        wts: f64,
        delay_s: f64,
        asc_pool: f64,
    ) -> f64 {
        self.shared_cost_for_time(distance_m / self.speed_mps, vot, wts, delay_s, asc_pool)
    }

    /// Same cost computed from the member's actual in-vehicle time.
    pub fn shared_cost_for_time(
        &self,
        time_s: f64,
        vot: f64,
        wts: f64,
        delay_s: f64,
        asc_pool: f64,
    ) -> f64 {
        let distance_m = time_s * self.speed_mps;
        self.price_per_km * distance_m / 1000.0 * (1.0 - self.share_discount)
            + vot * time_s * wts
            + vot * delay_s * self.delay_value
            + asc_pool
    }

    /// Largest departure delay a traveller tolerates before pooling stops
    /// paying off, from their solo trip and cost-model traits.
    pub fn max_delay(&self, distance_m: f64, solo_time_s: f64, vot: f64, wts: f64) -> f64 {
        let tolerance = (1.0 / wts - 1.0) * solo_time_s
            + self.price_per_km * self.share_discount * (distance_m / 1000.0) / (vot * wts);
        tolerance.max(0.0)
    }
}
