//! Randomized fuzzing of the regulatory fare ceiling.
//!
//! Whatever the demand ratio, external factors, and override mix, a quote
//! must satisfy `0 <= total_fare <= max_allowed_fare` and report a
//! multiplier >= 1.0.

mod support;

use std::sync::Arc;

use proptest::prelude::*;
use support::{epoch, harness_with_factors, standard_request, standard_service};
use surge_core::clock::TimeSource;
use surge_core::factors::{ExternalFactors, FixedFactorProvider};
use surge_core::overrides::{
    ApprovalLevel, GeographicScope, Issuer, OverrideParameters, OverrideRequest, OverrideType,
    ServiceScope,
};
use surge_core::surge::{SurgeFactors, SurgeState};

#[derive(Debug, Clone)]
struct OverrideMix {
    cap: Option<f64>,
    adjustment_pct: Option<f64>,
    flat: Option<f64>,
    emergency: Option<f64>,
    disable: bool,
}

fn override_mix() -> impl Strategy<Value = OverrideMix> {
    (
        proptest::option::of(1.0..10.0f64),
        proptest::option::of(-50.0..50.0f64),
        proptest::option::of(-100.0..200.0f64),
        proptest::option::of(0.0..10.0f64),
        any::<bool>(),
    )
        .prop_map(|(cap, adjustment_pct, flat, emergency, disable)| OverrideMix {
            cap,
            adjustment_pct,
            flat,
            emergency,
            disable,
        })
}

fn region_request(override_type: OverrideType, parameters: OverrideParameters) -> OverrideRequest {
    OverrideRequest {
        override_type,
        geographic_scope: GeographicScope::Region {
            name: "metro_manila".to_string(),
        },
        service_types: ServiceScope::All,
        parameters,
        reason: "fuzzed operator intervention".to_string(),
        issued_by: Issuer {
            operator_id: "ops-fuzz".to_string(),
            approval_level: ApprovalLevel::Level4,
        },
        start_time: epoch() - chrono::Duration::hours(1),
        end_time: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn total_fare_never_exceeds_the_ceiling(
        supply in 0u32..50,
        demand in 0u32..200,
        weather in 0.0..3.0f64,
        traffic in 0.0..3.0f64,
        event in 0.0..3.0f64,
        poi in 0.0..3.0f64,
        mix in override_mix(),
    ) {
        let factors = ExternalFactors { weather, traffic, event, poi };
        let h = harness_with_factors(Arc::new(FixedFactorProvider::new(factors)));

        let ratio = surge_core::surge::supply_demand_ratio(supply, demand);
        h.surge.put(SurgeState::new(
            h.pickup_cell(),
            standard_service(),
            1.0,
            supply,
            demand,
            0,
            SurgeFactors::from_external(factors, 1.0),
            h.clock.now(),
            chrono::Duration::seconds(90),
        ));
        prop_assert!(ratio >= 0.0);

        if mix.disable {
            h.overrides
                .create(region_request(OverrideType::DisableSurge, OverrideParameters::default()))
                .unwrap();
        }
        if let Some(cap) = mix.cap {
            h.overrides
                .create(region_request(OverrideType::CapSurge, OverrideParameters::cap(cap)))
                .unwrap();
        }
        if mix.adjustment_pct.is_some() || mix.flat.is_some() {
            let parameters = OverrideParameters {
                adjustment_pct: mix.adjustment_pct,
                flat_amount: mix.flat,
                ..OverrideParameters::default()
            };
            h.overrides
                .create(region_request(OverrideType::FareAdjustment, parameters))
                .unwrap();
        }
        if let Some(emergency) = mix.emergency {
            h.overrides
                .create(region_request(
                    OverrideType::EmergencyControl,
                    OverrideParameters::emergency(emergency),
                ))
                .unwrap();
        }

        let quote = h.engine.quote(&standard_request(h.clock.now())).unwrap();
        let ceiling = quote.regulatory_compliance.max_allowed_fare;

        prop_assert!(quote.total_fare >= 0.0, "negative fare {}", quote.total_fare);
        prop_assert!(
            quote.total_fare <= ceiling + 1e-9,
            "fare {} exceeds ceiling {}",
            quote.total_fare,
            ceiling
        );
        prop_assert!(quote.surge_multiplier >= 1.0);

        if mix.disable && mix.emergency.is_none() && mix.adjustment_pct.is_none() && mix.flat.is_none() {
            prop_assert_eq!(quote.surge_multiplier, 1.0);
        }
    }

    #[test]
    fn disable_surge_always_forces_multiplier_one(
        supply in 0u32..50,
        demand in 0u32..200,
        weather in 0.0..3.0f64,
        traffic in 0.0..3.0f64,
    ) {
        let factors = ExternalFactors { weather, traffic, event: 1.0, poi: 1.0 };
        let h = harness_with_factors(Arc::new(FixedFactorProvider::new(factors)));
        h.surge.put(SurgeState::new(
            h.pickup_cell(),
            standard_service(),
            1.0,
            supply,
            demand,
            0,
            SurgeFactors::from_external(factors, 1.0),
            h.clock.now(),
            chrono::Duration::seconds(90),
        ));
        h.overrides
            .create(region_request(OverrideType::DisableSurge, OverrideParameters::default()))
            .unwrap();

        let quote = h.engine.quote(&standard_request(h.clock.now())).unwrap();
        prop_assert_eq!(quote.surge_multiplier, 1.0);
        prop_assert_eq!(quote.total_fare, quote.subtotal);
    }
}
