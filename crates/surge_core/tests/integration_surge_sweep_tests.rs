mod support;

use std::sync::Arc;

use h3o::CellIndex;
use support::{epoch, harness, standard_service};
use surge_core::clock::TimeSource;
use surge_core::error::CollaboratorError;
use surge_core::rules::ServiceType;
use surge_core::spatial::{Coordinates, GeoIndex};
use surge_core::supply::{SupplyDemandCounts, SupplyDemandSource};

fn cell_at(lat: f64, lng: f64) -> CellIndex {
    GeoIndex::default()
        .cell_for_point(Coordinates::new(lat, lng))
        .unwrap()
}

#[test]
fn tick_recomputes_active_keys_and_stamps_expiry() {
    let h = harness();
    h.set_counts(4, 6, 1); // ratio 1.5

    let outcome = h.sweep().tick();
    assert_eq!(outcome.recomputed, 1);
    assert_eq!(outcome.failed, 0);

    let stored = h.surge.get(h.pickup_cell(), &standard_service()).unwrap();
    assert_eq!(stored.state.current_multiplier, 1.5);
    assert_eq!(stored.state.supply_demand_ratio, 1.5);
    assert!(stored.state.expires_at > stored.state.computed_at);
    assert!(!stored.state.is_expired_at(h.clock.now()));
}

#[test]
fn idle_keys_are_dropped_from_the_store() {
    let h = harness();
    h.set_counts(4, 6, 1);
    h.sweep().tick();
    assert_eq!(h.surge.len(), 1);

    // Activity dies out; the key leaves the active set on the next tick.
    h.set_counts(0, 0, 0);
    let outcome = h.sweep().tick();
    assert_eq!(outcome.dropped, 1);
    assert!(h.surge.get(h.pickup_cell(), &standard_service()).is_none());
}

#[test]
fn repeated_ticks_bump_the_store_version() {
    let h = harness();
    h.set_counts(4, 6, 1);
    let sweep = h.sweep();
    sweep.tick();
    sweep.tick();

    let stored = h.surge.get(h.pickup_cell(), &standard_service()).unwrap();
    assert_eq!(stored.version, 2);
}

/// Source where one cell always errors, to prove per-cell failure isolation.
#[derive(Debug)]
struct PartiallyFailingSource {
    healthy: CellIndex,
    broken: CellIndex,
    service: ServiceType,
}

impl SupplyDemandSource for PartiallyFailingSource {
    fn get_counts(
        &self,
        cell: CellIndex,
        _service_type: &ServiceType,
    ) -> Result<SupplyDemandCounts, CollaboratorError> {
        if cell == self.broken {
            Err(CollaboratorError::Timeout("telemetry shard down".to_string()))
        } else {
            Ok(SupplyDemandCounts::new(2, 5, 0))
        }
    }

    fn active_keys(&self) -> Vec<(CellIndex, ServiceType)> {
        vec![
            (self.healthy, self.service.clone()),
            (self.broken, self.service.clone()),
        ]
    }
}

#[test]
fn one_failing_cell_does_not_abort_the_batch() {
    let h = harness();
    let healthy = cell_at(14.5995, 120.9842);
    let broken = cell_at(14.6760, 121.0437);
    let source = Arc::new(PartiallyFailingSource {
        healthy,
        broken,
        service: standard_service(),
    });

    let sweep = surge_core::sweep::SurgeSweepService::new(
        h.surge.clone(),
        source,
        Arc::new(surge_core::factors::FixedFactorProvider::neutral()),
        h.rules.clone(),
        h.overrides.clone(),
        h.clock.clone(),
        surge_core::sweep::SweepConfig::default(),
    );

    let outcome = sweep.tick();
    assert_eq!(outcome.recomputed, 1);
    assert_eq!(outcome.failed, 1);
    assert!(h.surge.get(healthy, &standard_service()).is_some());
    assert!(h.surge.get(broken, &standard_service()).is_none());
}

#[test]
fn sweep_respects_disable_and_cap_overrides() {
    use surge_core::overrides::{
        ApprovalLevel, GeographicScope, Issuer, OverrideParameters, OverrideRequest, OverrideType,
        ServiceScope,
    };

    let h = harness();
    h.set_counts(5, 16, 0); // raw tier 2.5

    h.overrides
        .create(OverrideRequest {
            override_type: OverrideType::CapSurge,
            geographic_scope: GeographicScope::Region {
                name: "metro_manila".to_string(),
            },
            service_types: ServiceScope::All,
            parameters: OverrideParameters::cap(1.2),
            reason: "regulator directive 2025-118".to_string(),
            issued_by: Issuer {
                operator_id: "ops-2".to_string(),
                approval_level: ApprovalLevel::Level3,
            },
            start_time: epoch() - chrono::Duration::hours(1),
            end_time: None,
        })
        .unwrap();

    h.sweep().tick();
    let stored = h.surge.get(h.pickup_cell(), &standard_service()).unwrap();
    assert_eq!(stored.state.current_multiplier, 1.2);
}

#[test]
fn run_loop_stops_on_shutdown() {
    use std::sync::atomic::{AtomicBool, Ordering};

    let h = harness();
    h.set_counts(3, 3, 0);
    let sweep = Arc::new(surge_core::sweep::SurgeSweepService::new(
        h.surge.clone(),
        h.supply.clone(),
        Arc::new(surge_core::factors::FixedFactorProvider::neutral()),
        h.rules.clone(),
        h.overrides.clone(),
        h.clock.clone(),
        surge_core::sweep::SweepConfig {
            interval: std::time::Duration::from_millis(5),
            ..surge_core::sweep::SweepConfig::default()
        },
    ));

    let shutdown = Arc::new(AtomicBool::new(false));
    let handle = {
        let sweep = sweep.clone();
        let shutdown = shutdown.clone();
        std::thread::spawn(move || sweep.run_loop(&shutdown))
    };

    // Give the loop a moment to run at least one tick, then stop it.
    std::thread::sleep(std::time::Duration::from_millis(50));
    shutdown.store(true, Ordering::Relaxed);
    handle.join().expect("sweep thread joins");

    assert!(h.surge.get(h.pickup_cell(), &standard_service()).is_some());
}
