//! Performance benchmarks for surge_core using Criterion.rs.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use surge_core::audit::NullAuditSink;
use surge_core::clock::ManualTimeSource;
use surge_core::factors::FixedFactorProvider;
use surge_core::overrides::{LoggingCrisisNotifier, OverrideRegistry};
use surge_core::quote::{QuoteConfig, QuoteEngine, QuoteRequest};
use surge_core::rules::{InMemoryRuleStore, PricingRule, ServiceType};
use surge_core::spatial::{Coordinates, GeoIndex};
use surge_core::supply::{InMemorySupplyDemand, SupplyDemandCounts};
use surge_core::surge::SurgeStore;
use surge_core::sweep::{SurgeSweepService, SweepConfig};

struct BenchWorld {
    engine: QuoteEngine,
    sweep: SurgeSweepService,
    supply: Arc<InMemorySupplyDemand>,
    geo: GeoIndex,
}

fn bench_world() -> BenchWorld {
    let geo = GeoIndex::default();
    let rules = Arc::new(InMemoryRuleStore::new());
    rules.publish(PricingRule {
        service_type: ServiceType::new("tnvs_standard"),
        base_fare: 50.0,
        per_distance_rate: 12.0,
        per_time_rate: 2.0,
        surge_cap: 3.0,
        regulator_approved: true,
        geographic_scope: "metro_manila".to_string(),
        effective_from: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        effective_until: None,
    });
    let supply = Arc::new(InMemorySupplyDemand::new());
    let surge = Arc::new(SurgeStore::new());
    let clock = Arc::new(ManualTimeSource::new(
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    ));
    let overrides = Arc::new(OverrideRegistry::new(
        clock.clone(),
        Arc::new(LoggingCrisisNotifier),
        Arc::new(NullAuditSink),
    ));
    let factors = Arc::new(FixedFactorProvider::neutral());

    let engine = QuoteEngine::new(
        geo,
        rules.clone(),
        factors.clone(),
        surge.clone(),
        overrides.clone(),
        Arc::new(NullAuditSink),
        clock.clone(),
        QuoteConfig::default(),
    );
    let sweep = SurgeSweepService::new(
        surge,
        supply.clone(),
        factors,
        rules,
        overrides,
        clock,
        SweepConfig::default(),
    );

    BenchWorld {
        engine,
        sweep,
        supply,
        geo,
    }
}

fn seed_cells(world: &BenchWorld, cell_count: usize) {
    let service = ServiceType::new("tnvs_standard");
    for i in 0..cell_count {
        let lat = 14.40 + (i as f64 % 40.0) * 0.005;
        let lng = 120.90 + (i as f64 / 40.0).floor() * 0.005;
        let cell = world
            .geo
            .cell_for_point(Coordinates::new(lat, lng))
            .expect("bench cell");
        world.supply.set_counts(
            cell,
            service.clone(),
            SupplyDemandCounts::new((i % 10 + 1) as u32, (i % 25) as u32, (i % 3) as u32),
        );
    }
}

fn bench_quote(c: &mut Criterion) {
    let world = bench_world();
    seed_cells(&world, 100);
    world.sweep.tick();

    let request = QuoteRequest {
        service_type: ServiceType::new("tnvs_standard"),
        pickup: Coordinates::new(14.41, 120.905),
        dropoff: Coordinates::new(14.676, 121.0437),
        estimated_distance_km: 10.0,
        estimated_duration_min: 20.0,
        timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    };

    c.bench_function("quote_hot_path", |b| {
        b.iter(|| black_box(world.engine.quote(black_box(&request))).unwrap());
    });
}

fn bench_sweep_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_tick");
    for cells in [100usize, 500, 1000] {
        let world = bench_world();
        seed_cells(&world, cells);
        group.bench_with_input(BenchmarkId::from_parameter(cells), &cells, |b, _| {
            b.iter(|| black_box(world.sweep.tick()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_quote, bench_sweep_tick);
criterion_main!(benches);
