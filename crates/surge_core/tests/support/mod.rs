#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use h3o::CellIndex;
use surge_core::audit::NullAuditSink;
use surge_core::clock::{ManualTimeSource, TimeSource};
use surge_core::factors::{FactorProvider, FixedFactorProvider, TimeOfDayProfile};
use surge_core::overrides::{LoggingCrisisNotifier, OverrideRegistry};
use surge_core::quote::{QuoteConfig, QuoteEngine, QuoteRequest};
use surge_core::rules::{InMemoryRuleStore, PricingRule, ServiceType};
use surge_core::spatial::{Coordinates, GeoIndex};
use surge_core::supply::{InMemorySupplyDemand, SupplyDemandCounts};
use surge_core::surge::{SurgeFactors, SurgeState, SurgeStore};
use surge_core::sweep::{SurgeSweepService, SweepConfig};

/// Ermita, Manila — the standard pickup for tests.
pub const PICKUP: Coordinates = Coordinates {
    lat: 14.5995,
    lng: 120.9842,
};
/// Quezon City — the standard dropoff.
pub const DROPOFF: Coordinates = Coordinates {
    lat: 14.6760,
    lng: 121.0437,
};

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub fn standard_service() -> ServiceType {
    ServiceType::new("tnvs_standard")
}

pub fn standard_rule() -> PricingRule {
    PricingRule {
        service_type: standard_service(),
        base_fare: 50.0,
        per_distance_rate: 12.0,
        per_time_rate: 2.0,
        surge_cap: 3.0,
        regulator_approved: true,
        geographic_scope: "metro_manila".to_string(),
        effective_from: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        effective_until: None,
    }
}

pub fn standard_request(at: DateTime<Utc>) -> QuoteRequest {
    QuoteRequest {
        service_type: standard_service(),
        pickup: PICKUP,
        dropoff: DROPOFF,
        estimated_distance_km: 10.0,
        estimated_duration_min: 20.0,
        timestamp: at,
    }
}

pub struct TestHarness {
    pub geo: GeoIndex,
    pub rules: Arc<InMemoryRuleStore>,
    pub supply: Arc<InMemorySupplyDemand>,
    pub surge: Arc<SurgeStore>,
    pub overrides: Arc<OverrideRegistry>,
    pub clock: Arc<ManualTimeSource>,
    pub engine: QuoteEngine,
}

impl TestHarness {
    pub fn pickup_cell(&self) -> CellIndex {
        self.geo.cell_for_point(PICKUP).expect("valid pickup")
    }

    /// Write a fresh surge record whose ratio comes from the given counts,
    /// multiplier already clamped to the standard rule's cap.
    pub fn seed_surge(&self, supply: u32, demand: u32) {
        let cell = self.pickup_cell();
        let ratio = surge_core::surge::supply_demand_ratio(supply, demand);
        let multiplier = surge_core::surge::clamp_multiplier(
            surge_core::surge::raw_multiplier(ratio, &SurgeFactors::neutral()),
            standard_rule().surge_cap,
        );
        self.surge.put(SurgeState::new(
            cell,
            standard_service(),
            multiplier,
            supply,
            demand,
            0,
            SurgeFactors::neutral(),
            self.clock.now(),
            chrono::Duration::seconds(90),
        ));
    }

    pub fn set_counts(&self, supply: u32, demand: u32, active_trips: u32) {
        self.supply.set_counts(
            self.pickup_cell(),
            standard_service(),
            SupplyDemandCounts::new(supply, demand, active_trips),
        );
    }

    pub fn sweep(&self) -> SurgeSweepService {
        SurgeSweepService::new(
            self.surge.clone(),
            self.supply.clone(),
            Arc::new(FixedFactorProvider::neutral()),
            self.rules.clone(),
            self.overrides.clone(),
            self.clock.clone(),
            SweepConfig::default(),
        )
    }
}

/// Wire a quote engine with neutral factors and the standard rule.
pub fn harness() -> TestHarness {
    harness_with_factors(Arc::new(FixedFactorProvider::neutral()))
}

pub fn harness_with_factors(factors: Arc<dyn FactorProvider>) -> TestHarness {
    let geo = GeoIndex::default();
    let rules = Arc::new(InMemoryRuleStore::new());
    rules.publish(standard_rule());
    let supply = Arc::new(InMemorySupplyDemand::new());
    let surge = Arc::new(SurgeStore::new());
    let clock = Arc::new(ManualTimeSource::new(epoch()));
    let overrides = Arc::new(OverrideRegistry::new(
        clock.clone(),
        Arc::new(LoggingCrisisNotifier),
        Arc::new(NullAuditSink),
    ));

    let engine = QuoteEngine::new(
        geo,
        rules.clone(),
        factors,
        surge.clone(),
        overrides.clone(),
        Arc::new(NullAuditSink),
        clock.clone(),
        QuoteConfig {
            time_of_day: TimeOfDayProfile::none(),
            ..QuoteConfig::default()
        },
    );

    TestHarness {
        geo,
        rules,
        supply,
        surge,
        overrides,
        clock,
        engine,
    }
}
