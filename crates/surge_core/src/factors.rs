//! External demand factors: weather, traffic, events, points of interest,
//! and the time-of-day profile.
//!
//! The factor aggregator is an external collaborator; this module models it
//! as a [`FactorProvider`] seam with a deterministic in-process
//! implementation for tests and local runs, and (feature `http`) a blocking
//! HTTP client for the production aggregator. Randomness never stands in for
//! a provider, so the surge formula stays unit-testable.

#[cfg(feature = "http")]
pub mod http;

use chrono::{DateTime, Timelike, Utc};
use h3o::CellIndex;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

/// Multiplicative demand-impact factors for one cell. Each factor is >= 0;
/// 1.0 means no effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExternalFactors {
    pub weather: f64,
    pub traffic: f64,
    pub event: f64,
    pub poi: f64,
}

impl ExternalFactors {
    /// Clamp each factor to >= 0, guarding against malformed upstream data.
    pub fn clamped(self) -> Self {
        Self {
            weather: self.weather.max(0.0),
            traffic: self.traffic.max(0.0),
            event: self.event.max(0.0),
            poi: self.poi.max(0.0),
        }
    }
}

impl Default for ExternalFactors {
    fn default() -> Self {
        Self {
            weather: 1.0,
            traffic: 1.0,
            event: 1.0,
            poi: 1.0,
        }
    }
}

/// Read access to the external factor aggregator for a cell at an instant.
pub trait FactorProvider: Send + Sync + std::fmt::Debug {
    fn get_factors(
        &self,
        cell: CellIndex,
        at: DateTime<Utc>,
    ) -> Result<ExternalFactors, CollaboratorError>;
}

/// Deterministic provider returning the same factors for every cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedFactorProvider {
    pub factors: ExternalFactors,
}

impl FixedFactorProvider {
    pub fn new(factors: ExternalFactors) -> Self {
        Self { factors }
    }

    /// All factors 1.0.
    pub fn neutral() -> Self {
        Self::default()
    }
}

impl FactorProvider for FixedFactorProvider {
    fn get_factors(
        &self,
        _cell: CellIndex,
        _at: DateTime<Utc>,
    ) -> Result<ExternalFactors, CollaboratorError> {
        Ok(self.factors.clamped())
    }
}

/// Provider that always fails, for exercising the degraded-quote path.
#[derive(Debug, Clone, Default)]
pub struct UnavailableFactorProvider;

impl FactorProvider for UnavailableFactorProvider {
    fn get_factors(
        &self,
        _cell: CellIndex,
        _at: DateTime<Utc>,
    ) -> Result<ExternalFactors, CollaboratorError> {
        Err(CollaboratorError::Unavailable(
            "factor aggregator offline".to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Time-of-day profile
// ---------------------------------------------------------------------------

/// Pre-defined time-of-day demand profiles.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub enum TimeOfDayProfileKind {
    /// No time-of-day effect; all hourly factors are 1.0.
    #[default]
    None,
    /// Metro Manila commuter pattern with rush-hour demand peaks.
    MetroManila,
    /// Custom per-hour factors (index 0 = midnight, index 23 = 11 PM).
    Custom([f64; 24]),
}

/// Hourly demand multipliers. Factor 1.0 = baseline demand.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeOfDayProfile {
    /// Demand multiplier for each hour of the day (0–23).
    pub hourly_factors: [f64; 24],
}

impl TimeOfDayProfile {
    /// All factors 1.0 (no time-of-day effect).
    pub fn none() -> Self {
        Self {
            hourly_factors: [1.0; 24],
        }
    }

    /// Metro Manila commuter pattern.
    ///
    /// - 00–05: 1.0  (overnight baseline)
    /// - 06–08: 1.25 (morning rush)
    /// - 09–16: 1.0  (midday)
    /// - 17–20: 1.35 (evening rush)
    /// - 21–23: 1.1  (night life)
    pub fn metro_manila() -> Self {
        let mut f = [1.0_f64; 24];
        // Morning rush
        for slot in &mut f[6..9] {
            *slot = 1.25;
        }
        // Evening rush
        for slot in &mut f[17..21] {
            *slot = 1.35;
        }
        // Night
        for slot in &mut f[21..24] {
            *slot = 1.1;
        }
        Self { hourly_factors: f }
    }

    /// Build from a [`TimeOfDayProfileKind`] descriptor.
    pub fn from_kind(kind: &TimeOfDayProfileKind) -> Self {
        match kind {
            TimeOfDayProfileKind::None => Self::none(),
            TimeOfDayProfileKind::MetroManila => Self::metro_manila(),
            TimeOfDayProfileKind::Custom(factors) => Self {
                hourly_factors: factors.map(|f| f.max(0.0)),
            },
        }
    }

    /// Look up the demand multiplier for an instant (UTC hour of day).
    pub fn factor_at(&self, at: DateTime<Utc>) -> f64 {
        self.hourly_factors[at.hour() as usize]
    }
}

impl Default for TimeOfDayProfile {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn clamped_floors_negative_factors_at_zero() {
        let factors = ExternalFactors {
            weather: -0.5,
            traffic: 1.2,
            event: 0.0,
            poi: 1.0,
        }
        .clamped();
        assert_eq!(factors.weather, 0.0);
        assert_eq!(factors.traffic, 1.2);
    }

    #[test]
    fn metro_manila_profile_peaks_at_rush_hour() {
        let profile = TimeOfDayProfile::metro_manila();
        let morning = Utc.with_ymd_and_hms(2025, 6, 2, 7, 30, 0).unwrap();
        let midday = Utc.with_ymd_and_hms(2025, 6, 2, 13, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2025, 6, 2, 18, 0, 0).unwrap();

        assert_eq!(profile.factor_at(morning), 1.25);
        assert_eq!(profile.factor_at(midday), 1.0);
        assert_eq!(profile.factor_at(evening), 1.35);
    }

    #[test]
    fn custom_profile_floors_negative_entries() {
        let mut factors = [1.0; 24];
        factors[3] = -2.0;
        let profile = TimeOfDayProfile::from_kind(&TimeOfDayProfileKind::Custom(factors));
        assert_eq!(profile.hourly_factors[3], 0.0);
    }
}
