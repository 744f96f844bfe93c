//! Wire the quote engine end to end, apply an operator override, and print
//! the resulting fares.
//!
//! Run with: cargo run -p surge_core --example quote_flow

use std::sync::Arc;

use chrono::Utc;
use surge_core::audit::ChannelAuditSink;
use surge_core::clock::SystemTimeSource;
use surge_core::factors::{FixedFactorProvider, TimeOfDayProfile};
use surge_core::overrides::{
    ApprovalLevel, GeographicScope, Issuer, LoggingCrisisNotifier, OverrideParameters,
    OverrideRegistry, OverrideRequest, OverrideType, ServiceScope,
};
use surge_core::quote::{QuoteConfig, QuoteEngine, QuoteRequest};
use surge_core::rules::{InMemoryRuleStore, PricingRule, ServiceType};
use surge_core::spatial::{Coordinates, GeoIndex};
use surge_core::supply::{InMemorySupplyDemand, SupplyDemandCounts};
use surge_core::surge::SurgeStore;
use surge_core::sweep::{SurgeSweepService, SweepConfig};

fn main() {
    env_logger::init();

    let geo = GeoIndex::default();
    let service = ServiceType::new("tnvs_standard");
    let clock = Arc::new(SystemTimeSource);

    let rules = Arc::new(InMemoryRuleStore::new());
    rules.publish(PricingRule {
        service_type: service.clone(),
        base_fare: 50.0,
        per_distance_rate: 12.0,
        per_time_rate: 2.0,
        surge_cap: 3.0,
        regulator_approved: true,
        geographic_scope: "metro_manila".to_string(),
        effective_from: Utc::now() - chrono::Duration::days(30),
        effective_until: None,
    });

    let supply = Arc::new(InMemorySupplyDemand::new());
    let pickup = Coordinates::new(14.5995, 120.9842);
    let pickup_cell = geo.cell_for_point(pickup).expect("pickup cell");
    supply.set_counts(pickup_cell, service.clone(), SupplyDemandCounts::new(5, 16, 3));

    let surge = Arc::new(SurgeStore::new());
    let (audit, audit_rx) = ChannelAuditSink::bounded(64);
    let audit: Arc<dyn surge_core::audit::AuditSink> = Arc::new(audit);
    let overrides = Arc::new(OverrideRegistry::new(
        clock.clone(),
        Arc::new(LoggingCrisisNotifier),
        audit.clone(),
    ));

    let factors = Arc::new(FixedFactorProvider::neutral());
    let sweep = SurgeSweepService::new(
        surge.clone(),
        supply,
        factors.clone(),
        rules.clone(),
        overrides.clone(),
        clock.clone(),
        SweepConfig {
            time_of_day: TimeOfDayProfile::metro_manila(),
            ..SweepConfig::default()
        },
    );
    let outcome = sweep.tick();
    println!(
        "sweep: {} recomputed, {} dropped, {} failed",
        outcome.recomputed, outcome.dropped, outcome.failed
    );

    let engine = QuoteEngine::new(
        geo,
        rules,
        factors,
        surge,
        overrides.clone(),
        audit,
        clock,
        QuoteConfig {
            time_of_day: TimeOfDayProfile::metro_manila(),
            ..QuoteConfig::default()
        },
    );

    let request = QuoteRequest {
        service_type: service,
        pickup,
        dropoff: Coordinates::new(14.6760, 121.0437),
        estimated_distance_km: 10.0,
        estimated_duration_min: 20.0,
        timestamp: Utc::now(),
    };

    let surged = engine.quote(&request).expect("quote");
    println!(
        "surged quote: {} {} (x{} on subtotal {})",
        surged.total_fare, surged.currency, surged.surge_multiplier, surged.subtotal
    );

    let created = overrides
        .create(OverrideRequest {
            override_type: OverrideType::CapSurge,
            geographic_scope: GeographicScope::PointRadius {
                center: pickup,
                radius_km: 5.0,
            },
            service_types: ServiceScope::All,
            parameters: OverrideParameters::cap(1.3),
            reason: "city fiesta pricing guardrail".to_string(),
            issued_by: Issuer {
                operator_id: "ops-demo".to_string(),
                approval_level: ApprovalLevel::Level3,
            },
            start_time: Utc::now() - chrono::Duration::minutes(1),
            end_time: Some(Utc::now() + chrono::Duration::hours(4)),
        })
        .expect("override");
    for warning in &created.warnings {
        println!("warning: {warning}");
    }

    let capped = engine.quote(&request).expect("capped quote");
    println!(
        "capped quote: {} {} (x{})",
        capped.total_fare, capped.currency, capped.surge_multiplier
    );

    println!("audit events:");
    while let Ok(event) = audit_rx.try_recv() {
        println!("  {}", serde_json::to_string(&event).expect("serialize"));
    }
}
