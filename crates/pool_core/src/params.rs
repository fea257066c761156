//! Run parameters for one pooling batch.

use serde::{Deserialize, Serialize};

use crate::error::PoolingError;

/// Default average network speed in metres per second (~21.6 km/h).
pub const DEFAULT_SPEED_MPS: f64 = 6.0;

/// Default fare per kilometre.
pub const DEFAULT_PRICE_PER_KM: f64 = 1.5;

/// Default fare discount applied to pooled rides.
pub const DEFAULT_SHARE_DISCOUNT: f64 = 0.3;

/// Default weight of departure delay relative to in-vehicle time.
pub const DEFAULT_DELAY_VALUE: f64 = 1.2;

/// Default value of time in currency per second (~12.6 per hour).
pub const DEFAULT_VOT: f64 = 0.0035;

/// Default willingness-to-share multiplier.
pub const DEFAULT_WTS: f64 = 0.85;

/// Parameters for building a shareability graph. All times are seconds,
/// all distances metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolingParams {
    /// Average network speed used to convert distances to travel times (m/s).
    pub speed_mps: f64,
    /// Fare per kilometre before any pooling discount.
    pub price_per_km: f64,
    /// Fare discount granted on pooled rides, in [0, 1).
    pub share_discount: f64,
    /// Weight of departure delay relative to in-vehicle time (non-negative).
    pub delay_value: f64,
    /// Maximum request-time gap for pooling consideration (seconds).
    /// 0 = unbounded.
    pub horizon_s: f64,
    /// Optional degree budget: the extension loop stops after this degree
    /// even if further extensions would be feasible.
    pub max_degree: Option<usize>,
    /// Value of time for travellers without an individual override.
    pub default_vot: f64,
    /// Willingness-to-share for travellers without an individual override.
    pub default_wts: f64,
    /// Pooling constant for travellers without an individual override.
    pub default_asc_pool: f64,
}

impl Default for PoolingParams {
    fn default() -> Self {
        Self {
            speed_mps: DEFAULT_SPEED_MPS,
            price_per_km: DEFAULT_PRICE_PER_KM,
            share_discount: DEFAULT_SHARE_DISCOUNT,
            delay_value: DEFAULT_DELAY_VALUE,
            horizon_s: 0.0,
            max_degree: None,
            default_vot: DEFAULT_VOT,
            default_wts: DEFAULT_WTS,
            default_asc_pool: 0.0,
        }
    }
}

impl PoolingParams {
    pub fn with_speed_mps(mut self, speed_mps: f64) -> Self {
        self.speed_mps = speed_mps;
        self
    }

    pub fn with_price_per_km(mut self, price_per_km: f64) -> Self {
        self.price_per_km = price_per_km;
        self
    }

    pub fn with_share_discount(mut self, share_discount: f64) -> Self {
        self.share_discount = share_discount;
        self
    }

    pub fn with_delay_value(mut self, delay_value: f64) -> Self {
        self.delay_value = delay_value;
        self
    }

    /// Set the pooling horizon in seconds (0 disables the filter).
    pub fn with_horizon_s(mut self, horizon_s: f64) -> Self {
        self.horizon_s = horizon_s;
        self
    }

    /// Stop extending once rides of this degree have been computed.
    pub fn with_max_degree(mut self, max_degree: usize) -> Self {
        self.max_degree = Some(max_degree);
        self
    }

    /// Set the traveller defaults used when a request carries no overrides.
    pub fn with_traveller_defaults(mut self, vot: f64, wts: f64, asc_pool: f64) -> Self {
        self.default_vot = vot;
        self.default_wts = wts;
        self.default_asc_pool = asc_pool;
        self
    }

    /// Check the parameter ranges before any computation starts.
    pub fn validate(&self) -> Result<(), PoolingError> {
        if !(self.speed_mps > 0.0 && self.speed_mps.is_finite()) {
            return Err(PoolingError::InvalidConfig("speed_mps must be positive"));
        }
        if !(self.price_per_km >= 0.0 && self.price_per_km.is_finite()) {
            return Err(PoolingError::InvalidConfig(
                "price_per_km must be non-negative",
            ));
        }
        if !(0.0..1.0).contains(&self.share_discount) {
            return Err(PoolingError::InvalidConfig(
                "share_discount must lie in [0, 1)",
            ));
        }
        if !(self.delay_value >= 0.0 && self.delay_value.is_finite()) {
            return Err(PoolingError::InvalidConfig(
                "delay_value must be non-negative",
            ));
        }
        if !(self.horizon_s >= 0.0 && self.horizon_s.is_finite()) {
            return Err(PoolingError::InvalidConfig(
                "horizon_s must be non-negative",
            ));
        }
        if !(self.default_vot > 0.0 && self.default_vot.is_finite()) {
            return Err(PoolingError::InvalidConfig("default_vot must be positive"));
        }
        if !(self.default_wts > 0.0 && self.default_wts <= 1.0) {
            return Err(PoolingError::InvalidConfig(
                "default_wts must lie in (0, 1]",
            ));
        }
        if !self.default_asc_pool.is_finite() {
            return Err(PoolingError::InvalidConfig(
                "default_asc_pool must be finite",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_validate() {
        assert!(PoolingParams::default().validate().is_ok());
    }

    #[test]
    fn zero_speed_is_rejected() {
        let params = PoolingParams::default().with_speed_mps(0.0);
        assert_eq!(
            params.validate(),
            Err(PoolingError::InvalidConfig("speed_mps must be positive"))
        );
    }

    #[test]
    fn wts_outside_unit_interval_is_rejected() {
        let params = PoolingParams::default().with_traveller_defaults(0.0035, 1.2, 0.0);
        assert!(params.validate().is_err());
    }

    #[test]
    fn builders_set_fields() {
        let params = PoolingParams::default()
            .with_horizon_s(600.0)
            .with_max_degree(3);
        assert_eq!(params.horizon_s, 600.0);
        assert_eq!(params.max_degree, Some(3));
    }
}
