//! Simulation request parameters, bounds validation, and the calendar
//! factor tables shared by sampling and the daily projection.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use surge_core::rules::ServiceType;

use crate::error::SimulationError;

pub const MIN_HORIZON_DAYS: u32 = 1;
pub const MAX_HORIZON_DAYS: u32 = 365;
pub const MIN_ITERATIONS: u32 = 1_000;
pub const MAX_ITERATIONS: u32 = 100_000;
pub const CONFIDENCE_LEVELS: [f64; 3] = [0.90, 0.95, 0.99];

/// Historical baseline the projection scales from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineMetrics {
    pub daily_revenue: f64,
    pub daily_trips: f64,
    /// Share of trips per service type. Empty means a single-service fleet.
    pub service_mix: Vec<(ServiceType, f64)>,
}

impl BaselineMetrics {
    pub fn new(daily_revenue: f64, daily_trips: f64) -> Self {
        Self {
            daily_revenue,
            daily_trips,
            service_mix: Vec::new(),
        }
    }

    fn validate(&self) -> Result<(), SimulationError> {
        if !(self.daily_revenue.is_finite() && self.daily_revenue >= 0.0) {
            return Err(SimulationError::InvalidRequest(
                "baseline daily_revenue must be non-negative".to_string(),
            ));
        }
        if !(self.daily_trips.is_finite() && self.daily_trips >= 0.0) {
            return Err(SimulationError::InvalidRequest(
                "baseline daily_trips must be non-negative".to_string(),
            ));
        }
        let mut total_share = 0.0;
        for (service_type, share) in &self.service_mix {
            if !(share.is_finite() && *share > 0.0 && *share <= 1.0) {
                return Err(SimulationError::InvalidRequest(format!(
                    "service mix share for {service_type} must be in (0, 1]"
                )));
            }
            total_share += share;
        }
        if total_share > 1.0 + 1e-6 {
            return Err(SimulationError::InvalidRequest(
                "service mix shares sum above 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Optional weather/event multipliers folded into every trial.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExternalAssumptions {
    pub weather_multiplier: f64,
    pub event_multiplier: f64,
}

impl Default for ExternalAssumptions {
    fn default() -> Self {
        Self {
            weather_multiplier: 1.0,
            event_multiplier: 1.0,
        }
    }
}

/// A proposed pricing change to project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub name: String,
    /// Proposed change to the approved fare, in percent.
    pub base_fare_change_pct: f64,
    /// Proposed replacement surge cap, if the change includes one.
    pub proposed_surge_cap: Option<f64>,
    /// Cap in force today, for the uplift comparison.
    pub current_surge_cap: f64,
    /// Demand change per percent of price change. Negative for normal goods.
    pub price_elasticity: f64,
    pub time_horizon_days: u32,
    pub iterations: u32,
    pub confidence_level: f64,
    /// Probability a competitor reacts with their own price move.
    pub competitor_response_probability: f64,
    /// Standard deviation of the per-trial demand variation (mean 1.0).
    pub demand_volatility: f64,
    pub external: Option<ExternalAssumptions>,
    /// Calendar month the horizon starts in (1-12). Defaults to the
    /// engine clock's month.
    pub start_month: Option<u32>,
    pub baseline: BaselineMetrics,
    /// Fixed seed for reproducible projections.
    pub seed: Option<u64>,
}

impl SimulationRequest {
    pub fn new(
        name: impl Into<String>,
        base_fare_change_pct: f64,
        baseline: BaselineMetrics,
    ) -> Self {
        Self {
            name: name.into(),
            base_fare_change_pct,
            proposed_surge_cap: None,
            current_surge_cap: 2.0,
            price_elasticity: -1.2,
            time_horizon_days: 30,
            iterations: 10_000,
            confidence_level: 0.95,
            competitor_response_probability: 0.3,
            demand_volatility: 0.08,
            external: None,
            start_month: None,
            baseline,
            seed: None,
        }
    }

    pub fn with_horizon_days(mut self, days: u32) -> Self {
        self.time_horizon_days = days;
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    pub fn with_elasticity(mut self, elasticity: f64) -> Self {
        self.price_elasticity = elasticity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_proposed_surge_cap(mut self, cap: f64) -> Self {
        self.proposed_surge_cap = Some(cap);
        self
    }

    pub fn with_start_month(mut self, month: u32) -> Self {
        self.start_month = Some(month);
        self
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.name.trim().is_empty() {
            return Err(SimulationError::InvalidRequest(
                "name is empty".to_string(),
            ));
        }
        if !(self.base_fare_change_pct.is_finite() && self.base_fare_change_pct.abs() <= 100.0) {
            return Err(SimulationError::InvalidRequest(
                "base_fare_change_pct must be within [-100, 100]".to_string(),
            ));
        }
        if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&self.time_horizon_days) {
            return Err(SimulationError::InvalidRequest(format!(
                "time_horizon_days must be in [{MIN_HORIZON_DAYS}, {MAX_HORIZON_DAYS}]"
            )));
        }
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(SimulationError::InvalidRequest(format!(
                "iterations must be in [{MIN_ITERATIONS}, {MAX_ITERATIONS}]"
            )));
        }
        if !CONFIDENCE_LEVELS
            .iter()
            .any(|level| (level - self.confidence_level).abs() < 1e-9)
        {
            return Err(SimulationError::InvalidRequest(
                "confidence_level must be one of 0.90, 0.95, 0.99".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.competitor_response_probability) {
            return Err(SimulationError::InvalidRequest(
                "competitor_response_probability must be in [0, 1]".to_string(),
            ));
        }
        if !(self.demand_volatility > 0.0 && self.demand_volatility <= 0.5) {
            return Err(SimulationError::InvalidRequest(
                "demand_volatility must be in (0, 0.5]".to_string(),
            ));
        }
        if !(self.price_elasticity.is_finite() && (-5.0..=0.0).contains(&self.price_elasticity)) {
            return Err(SimulationError::InvalidRequest(
                "price_elasticity must be in [-5, 0]".to_string(),
            ));
        }
        if let Some(month) = self.start_month {
            if !(1..=12).contains(&month) {
                return Err(SimulationError::InvalidRequest(
                    "start_month must be in [1, 12]".to_string(),
                ));
            }
        }
        for cap in [Some(self.current_surge_cap), self.proposed_surge_cap]
            .into_iter()
            .flatten()
        {
            if !(1.0..=10.0).contains(&cap) {
                return Err(SimulationError::InvalidRequest(
                    "surge caps must be in [1.0, 10.0]".to_string(),
                ));
            }
        }
        if let Some(external) = &self.external {
            if external.weather_multiplier < 0.0 || external.event_multiplier < 0.0 {
                return Err(SimulationError::InvalidRequest(
                    "external multipliers must be non-negative".to_string(),
                ));
            }
        }
        self.baseline.validate()
    }

    /// Deterministic demand response to the price change:
    /// `1 + elasticity * price_change_pct / 100`, floored at zero.
    pub fn demand_multiplier(&self) -> f64 {
        (1.0 + self.price_elasticity * self.base_fare_change_pct / 100.0).max(0.0)
    }

    pub fn price_multiplier(&self) -> f64 {
        1.0 + self.base_fare_change_pct / 100.0
    }
}

/// Seasonal demand by calendar month: school-break and holiday peaks,
/// post-holiday and typhoon-season troughs.
pub fn seasonal_factor(month: u32) -> f64 {
    match month {
        6 | 7 | 12 => 1.15,
        2 | 9 => 0.90,
        _ => 1.0,
    }
}

/// Weekly demand shape for the day-by-day projection.
pub fn weekday_factor(weekday: Weekday) -> f64 {
    match weekday {
        Weekday::Fri | Weekday::Sat => 1.15,
        Weekday::Sun => 0.95,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SimulationRequest {
        SimulationRequest::new("plus10", 10.0, BaselineMetrics::new(1_000_000.0, 20_000.0))
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn bounds_are_enforced() {
        assert!(request().with_horizon_days(0).validate().is_err());
        assert!(request().with_horizon_days(366).validate().is_err());
        assert!(request().with_iterations(999).validate().is_err());
        assert!(request().with_iterations(100_001).validate().is_err());
        assert!(request().with_confidence_level(0.85).validate().is_err());
        assert!(request().with_elasticity(0.5).validate().is_err());
        assert!(request().with_start_month(13).validate().is_err());
        assert!(request().with_proposed_surge_cap(11.0).validate().is_err());
    }

    #[test]
    fn demand_multiplier_follows_elasticity() {
        let req = request().with_elasticity(-1.2);
        // 1 + (-1.2 * 10 / 100)
        assert!((req.demand_multiplier() - 0.88).abs() < 1e-12);
        assert!((req.price_multiplier() - 1.10).abs() < 1e-12);
    }

    #[test]
    fn seasonal_table_marks_peaks_and_troughs() {
        assert_eq!(seasonal_factor(12), 1.15);
        assert_eq!(seasonal_factor(2), 0.90);
        assert_eq!(seasonal_factor(4), 1.0);
    }
}
