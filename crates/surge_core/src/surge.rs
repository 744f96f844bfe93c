//! Surge state: the per-(cell, service type) multiplier and the formula
//! that produces it.
//!
//! The quote path and the recompute sweep both price through the free
//! functions here ([`supply_demand_ratio`], [`raw_multiplier`],
//! [`clamp_multiplier`]); keeping a single implementation is a correctness
//! invariant, not a style choice — a quote must never disagree with the
//! sweep about the same inputs.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use h3o::CellIndex;
use serde::{Deserialize, Serialize};

use crate::factors::ExternalFactors;
use crate::rules::ServiceType;

/// Surge never discounts below the approved fare.
pub const MIN_MULTIPLIER: f64 = 1.0;

/// Round a monetary or multiplier value to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Demand pressure: `demand / max(supply, 1)`.
pub fn supply_demand_ratio(supply: u32, demand: u32) -> f64 {
    f64::from(demand) / f64::from(supply.max(1))
}

/// Bucketed demand-tier factor.
pub fn demand_tier_multiplier(ratio: f64) -> f64 {
    if ratio >= 3.0 {
        2.5
    } else if ratio >= 2.0 {
        2.0
    } else if ratio >= 1.5 {
        1.5
    } else if ratio >= 1.2 {
        1.2
    } else {
        1.0
    }
}

/// The multiplicative factor snapshot a multiplier was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurgeFactors {
    pub weather: f64,
    pub traffic: f64,
    pub event: f64,
    pub poi: f64,
    pub time_of_day: f64,
}

impl SurgeFactors {
    pub fn from_external(external: ExternalFactors, time_of_day: f64) -> Self {
        let external = external.clamped();
        Self {
            weather: external.weather,
            traffic: external.traffic,
            event: external.event,
            poi: external.poi,
            time_of_day: time_of_day.max(0.0),
        }
    }

    /// All factors 1.0 (no external effect).
    pub fn neutral() -> Self {
        Self {
            weather: 1.0,
            traffic: 1.0,
            event: 1.0,
            poi: 1.0,
            time_of_day: 1.0,
        }
    }

    pub fn product(&self) -> f64 {
        self.weather * self.traffic * self.event * self.poi * self.time_of_day
    }
}

impl Default for SurgeFactors {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Unclamped multiplier: demand tier composed with the factor product.
pub fn raw_multiplier(ratio: f64, factors: &SurgeFactors) -> f64 {
    demand_tier_multiplier(ratio) * factors.product()
}

/// Clamp a raw multiplier to `[1.0, cap]` and round to 2 decimal places.
pub fn clamp_multiplier(raw: f64, cap: f64) -> f64 {
    let cap = cap.max(MIN_MULTIPLIER);
    round2(raw.clamp(MIN_MULTIPLIER, cap))
}

/// One computed surge snapshot for a (cell, service type) key.
///
/// A reader must treat an expired record as multiplier 1.0, never as stale
/// data: use [`SurgeState::effective_multiplier_at`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurgeState {
    pub cell: CellIndex,
    pub service_type: ServiceType,
    pub current_multiplier: f64,
    pub supply_count: u32,
    pub demand_count: u32,
    pub supply_demand_ratio: f64,
    pub active_trip_count: u32,
    pub factors: SurgeFactors,
    pub computed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SurgeState {
    /// Build a snapshot, enforcing `expires_at > computed_at`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cell: CellIndex,
        service_type: ServiceType,
        current_multiplier: f64,
        supply_count: u32,
        demand_count: u32,
        active_trip_count: u32,
        factors: SurgeFactors,
        computed_at: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        debug_assert!(ttl > chrono::Duration::zero(), "surge ttl must be positive");
        Self {
            cell,
            service_type,
            current_multiplier,
            supply_count,
            demand_count,
            supply_demand_ratio: supply_demand_ratio(supply_count, demand_count),
            active_trip_count,
            factors,
            computed_at,
            expires_at: computed_at + ttl.max(chrono::Duration::seconds(1)),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The multiplier a consumer may act on: the stored value while fresh,
    /// 1.0 once expired.
    pub fn effective_multiplier_at(&self, now: DateTime<Utc>) -> f64 {
        if self.is_expired_at(now) {
            MIN_MULTIPLIER
        } else {
            self.current_multiplier
        }
    }
}

/// A stored snapshot with its store version, for compare-and-swap writers.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedSurgeState {
    pub version: u64,
    pub state: SurgeState,
}

type SurgeKey = (CellIndex, ServiceType);

/// Keyed surge-state store behind a narrow `get`/`put`/`compare_and_swap`
/// interface, so a distributed cache can replace it without touching
/// callers. Writes are complete snapshots; last-write-wins per key.
#[derive(Debug, Default)]
pub struct SurgeStore {
    inner: RwLock<HashMap<SurgeKey, VersionedSurgeState>>,
}

impl SurgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: CellIndex, service_type: &ServiceType) -> Option<VersionedSurgeState> {
        let map = match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.get(&(cell, service_type.clone())).cloned()
    }

    /// Unconditional write. Returns the new version.
    pub fn put(&self, state: SurgeState) -> u64 {
        let mut map = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let key = (state.cell, state.service_type.clone());
        let version = map.get(&key).map(|v| v.version + 1).unwrap_or(1);
        map.insert(key, VersionedSurgeState { version, state });
        version
    }

    /// Write only if the stored version still matches `expected_version`
    /// (0 = key absent). Returns the new version, or `None` when the
    /// snapshot lost the race and was discarded.
    pub fn compare_and_swap(&self, state: SurgeState, expected_version: u64) -> Option<u64> {
        let mut map = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let key = (state.cell, state.service_type.clone());
        let current = map.get(&key).map(|v| v.version).unwrap_or(0);
        if current != expected_version {
            return None;
        }
        let version = current + 1;
        map.insert(key, VersionedSurgeState { version, state });
        Some(version)
    }

    pub fn remove(&self, cell: CellIndex, service_type: &ServiceType) -> bool {
        let mut map = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.remove(&(cell, service_type.clone())).is_some()
    }

    pub fn keys(&self) -> Vec<SurgeKey> {
        let map = match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let map = match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{Coordinates, GeoIndex};
    use chrono::TimeZone;

    fn test_cell() -> CellIndex {
        GeoIndex::default()
            .cell_for_point(Coordinates::new(14.5995, 120.9842))
            .unwrap()
    }

    #[test]
    fn demand_tiers_match_bucket_boundaries() {
        assert_eq!(demand_tier_multiplier(0.0), 1.0);
        assert_eq!(demand_tier_multiplier(1.19), 1.0);
        assert_eq!(demand_tier_multiplier(1.2), 1.2);
        assert_eq!(demand_tier_multiplier(1.5), 1.5);
        assert_eq!(demand_tier_multiplier(2.0), 2.0);
        assert_eq!(demand_tier_multiplier(2.99), 2.0);
        assert_eq!(demand_tier_multiplier(3.0), 2.5);
        assert_eq!(demand_tier_multiplier(10.0), 2.5);
    }

    #[test]
    fn ratio_guards_against_zero_supply() {
        assert_eq!(supply_demand_ratio(0, 6), 6.0);
        assert_eq!(supply_demand_ratio(4, 6), 1.5);
    }

    #[test]
    fn clamp_rounds_and_bounds() {
        assert_eq!(clamp_multiplier(2.5, 3.0), 2.5);
        assert_eq!(clamp_multiplier(2.5, 1.3), 1.3);
        assert_eq!(clamp_multiplier(0.7, 3.0), 1.0);
        assert_eq!(clamp_multiplier(1.23456, 3.0), 1.23);
    }

    #[test]
    fn raw_multiplier_composes_tier_and_factors() {
        let factors = SurgeFactors {
            weather: 1.1,
            traffic: 1.2,
            event: 1.0,
            poi: 1.0,
            time_of_day: 1.25,
        };
        let raw = raw_multiplier(3.2, &factors);
        assert!((raw - 2.5 * 1.1 * 1.2 * 1.25).abs() < 1e-9);
    }

    #[test]
    fn expired_state_reads_as_no_surge() {
        let computed_at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let state = SurgeState::new(
            test_cell(),
            ServiceType::new("tnvs_standard"),
            2.0,
            3,
            9,
            1,
            SurgeFactors::neutral(),
            computed_at,
            chrono::Duration::seconds(90),
        );

        let fresh = computed_at + chrono::Duration::seconds(30);
        assert_eq!(state.effective_multiplier_at(fresh), 2.0);

        let stale = computed_at + chrono::Duration::seconds(91);
        assert!(state.is_expired_at(stale));
        assert_eq!(state.effective_multiplier_at(stale), 1.0);
    }

    #[test]
    fn compare_and_swap_rejects_stale_writers() {
        let store = SurgeStore::new();
        let computed_at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let state = SurgeState::new(
            test_cell(),
            ServiceType::new("tnvs_standard"),
            1.5,
            4,
            6,
            0,
            SurgeFactors::neutral(),
            computed_at,
            chrono::Duration::seconds(90),
        );

        assert_eq!(store.compare_and_swap(state.clone(), 0), Some(1));
        // A writer that read version 0 is now stale.
        assert_eq!(store.compare_and_swap(state.clone(), 0), None);
        assert_eq!(store.compare_and_swap(state.clone(), 1), Some(2));

        let stored = store
            .get(state.cell, &ServiceType::new("tnvs_standard"))
            .unwrap();
        assert_eq!(stored.version, 2);
    }
}
