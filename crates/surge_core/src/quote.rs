//! Quote engine: turns a trip request into a bounded, regulator-compliant
//! price.
//!
//! The engine owns no state. It reads the surge store, the override
//! registry, and the external collaborators through the seams injected at
//! construction, and emits one audit event per quote. Collaborator failures
//! degrade the quote instead of failing it; only a missing pricing rule is
//! fatal.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use h3o::CellIndex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::{AuditEvent, AuditSink};
use crate::clock::TimeSource;
use crate::error::QuoteError;
use crate::factors::{FactorProvider, TimeOfDayProfile};
use crate::overrides::{EffectiveOverrides, OverrideRegistry};
use crate::rules::{PricingRule, RuleStore, ServiceType};
use crate::spatial::{Coordinates, GeoIndex};
use crate::surge::{self, SurgeFactors, SurgeStore, MIN_MULTIPLIER};

/// Incoming trip request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub service_type: ServiceType,
    pub pickup: Coordinates,
    pub dropoff: Coordinates,
    pub estimated_distance_km: f64,
    pub estimated_duration_min: f64,
    pub timestamp: DateTime<Utc>,
}

/// Regulatory check result attached to every quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryCompliance {
    /// False when the unclamped computation exceeded the ceiling and the
    /// fare was corrected down.
    pub ltfrb_compliant: bool,
    pub max_allowed_fare: f64,
    pub violations: Vec<String>,
}

impl RegulatoryCompliance {
    fn compliant(max_allowed_fare: f64) -> Self {
        Self {
            ltfrb_compliant: true,
            max_allowed_fare,
            violations: Vec::new(),
        }
    }
}

/// A time-limited, immutable priced offer for one trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub quote_id: Uuid,
    pub service_type: ServiceType,
    pub pickup_cell: CellIndex,
    pub base_fare: f64,
    pub distance_fare: f64,
    pub time_fare: f64,
    pub subtotal: f64,
    pub surge_multiplier: f64,
    pub surge_amount: f64,
    pub total_fare: f64,
    pub currency: String,
    pub expires_at: DateTime<Utc>,
    pub regulatory_compliance: RegulatoryCompliance,
    /// Factor snapshot the multiplier was computed from.
    pub factors: SurgeFactors,
    pub requested_at: DateTime<Utc>,
}

/// Quote engine configuration.
#[derive(Debug, Clone)]
pub struct QuoteConfig {
    /// ISO currency code; one fixed currency per deployment.
    pub currency: String,
    /// How long an issued quote stays valid.
    pub quote_ttl: chrono::Duration,
    pub time_of_day: TimeOfDayProfile,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            currency: "PHP".to_string(),
            quote_ttl: chrono::Duration::minutes(5),
            time_of_day: TimeOfDayProfile::none(),
        }
    }
}

pub struct QuoteEngine {
    geo: GeoIndex,
    rules: Arc<dyn RuleStore>,
    factors: Arc<dyn FactorProvider>,
    surge: Arc<SurgeStore>,
    overrides: Arc<OverrideRegistry>,
    audit: Arc<dyn AuditSink>,
    clock: Arc<dyn TimeSource>,
    config: QuoteConfig,
}

impl QuoteEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        geo: GeoIndex,
        rules: Arc<dyn RuleStore>,
        factors: Arc<dyn FactorProvider>,
        surge: Arc<SurgeStore>,
        overrides: Arc<OverrideRegistry>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn TimeSource>,
        config: QuoteConfig,
    ) -> Self {
        Self {
            geo,
            rules,
            factors,
            surge,
            overrides,
            audit,
            clock,
            config,
        }
    }

    /// Price a trip request.
    ///
    /// Fails only on validation errors, an unknown service type, or an
    /// operator suspension in scope; every collaborator failure falls back
    /// to a degraded quote (subtotal only, multiplier 1.0) so pricing stays
    /// available within the caller's timeout.
    pub fn quote(&self, request: &QuoteRequest) -> Result<Quote, QuoteError> {
        let started = Instant::now();
        let cell = self.validate(request)?;

        // Fatal path: without a rule there is no safe default fare.
        let rule = self
            .rules
            .get_rule(&request.service_type, request.timestamp)
            .ok_or_else(|| QuoteError::UnknownServiceType(request.service_type.to_string()))?;

        // The three remaining reads are independent; issue them
        // concurrently. None holds a lock across another.
        let (factors_result, (surge_state, effective)) = rayon::join(
            || self.factors.get_factors(cell, request.timestamp),
            || {
                (
                    self.surge.get(cell, &request.service_type),
                    self.overrides
                        .effective_for(cell, &request.service_type, request.timestamp),
                )
            },
        );

        if let Some(suspension) = &effective.suspend_service {
            return Err(QuoteError::ServiceSuspended {
                service_type: request.service_type.to_string(),
                reason: suspension
                    .parameters
                    .suspension_reason
                    .clone()
                    .unwrap_or_else(|| suspension.reason.clone()),
            });
        }

        match factors_result {
            Ok(external) => {
                let time_of_day = self.config.time_of_day.factor_at(request.timestamp);
                let factors = SurgeFactors::from_external(external, time_of_day);
                self.priced_quote(request, cell, &rule, factors, surge_state, &effective, started)
            }
            Err(err) => {
                log::warn!(
                    "degrading quote for {} at {cell}: {err}",
                    request.service_type
                );
                self.degraded_quote(request, cell, &rule, Some(err.to_string()), started)
            }
        }
    }

    fn validate(&self, request: &QuoteRequest) -> Result<CellIndex, QuoteError> {
        if !request.pickup.is_valid() {
            return Err(QuoteError::InvalidRequest(format!(
                "pickup coordinates out of range: ({}, {})",
                request.pickup.lat, request.pickup.lng
            )));
        }
        if !request.dropoff.is_valid() {
            return Err(QuoteError::InvalidRequest(format!(
                "dropoff coordinates out of range: ({}, {})",
                request.dropoff.lat, request.dropoff.lng
            )));
        }
        if !(request.estimated_distance_km.is_finite() && request.estimated_distance_km >= 0.0) {
            return Err(QuoteError::InvalidRequest(
                "estimated distance must be non-negative".to_string(),
            ));
        }
        if !(request.estimated_duration_min.is_finite() && request.estimated_duration_min >= 0.0) {
            return Err(QuoteError::InvalidRequest(
                "estimated duration must be non-negative".to_string(),
            ));
        }
        self.geo
            .cell_for_point(request.pickup)
            .ok_or_else(|| QuoteError::InvalidRequest("pickup cell resolution failed".to_string()))
    }

    #[allow(clippy::too_many_arguments)]
    fn priced_quote(
        &self,
        request: &QuoteRequest,
        cell: CellIndex,
        rule: &PricingRule,
        factors: SurgeFactors,
        surge_state: Option<crate::surge::VersionedSurgeState>,
        effective: &EffectiveOverrides,
        started: Instant,
    ) -> Result<Quote, QuoteError> {
        let base_fare = rule.base_fare;
        let distance_fare = request.estimated_distance_km * rule.per_distance_rate;
        let time_fare = request.estimated_duration_min * rule.per_time_rate;
        let subtotal = surge::round2(base_fare + distance_fare + time_fare);

        // An expired surge record degrades to no-surge rather than pricing
        // off stale demand.
        let ratio = surge_state
            .as_ref()
            .filter(|vs| !vs.state.is_expired_at(request.timestamp))
            .map(|vs| vs.state.supply_demand_ratio)
            .unwrap_or(0.0);

        let mut multiplier = if effective.disable_surge.is_some() {
            MIN_MULTIPLIER
        } else {
            // Cap from the rule unless a cap_surge override substitutes its
            // own for this computation.
            let cap = effective
                .cap_surge
                .as_ref()
                .and_then(|o| o.parameters.cap_value)
                .unwrap_or(rule.surge_cap);
            surge::clamp_multiplier(surge::raw_multiplier(ratio, &factors), cap)
        };

        let mut total = subtotal * multiplier;

        // Policy decision pending product sign-off: the cap is applied to
        // the multiplier before adjustment overrides touch the total.
        if let Some(adjustment) = &effective.fare_adjustment {
            if let Some(pct) = adjustment.parameters.adjustment_pct {
                total *= 1.0 + pct / 100.0;
            }
            if let Some(flat) = adjustment.parameters.flat_amount {
                total += flat;
            }
        }
        if let Some(emergency) = &effective.emergency_control {
            if let Some(mult) = emergency.parameters.emergency_multiplier {
                total *= mult;
            }
        }
        total = surge::round2(total.max(0.0));

        let max_allowed_fare = surge::round2(rule.max_allowed_fare(subtotal));
        let mut compliance = RegulatoryCompliance::compliant(max_allowed_fare);
        if total > max_allowed_fare {
            compliance.ltfrb_compliant = false;
            compliance.violations.push(format!(
                "computed fare {total:.2} exceeds max allowed {max_allowed_fare:.2}; clamped"
            ));
            total = max_allowed_fare;
            // Report the multiplier the clamped total implies.
            if subtotal > 0.0 {
                multiplier = surge::round2(total / subtotal);
            }
        }

        let now = self.clock.now();
        let quote = Quote {
            quote_id: Uuid::new_v4(),
            service_type: request.service_type.clone(),
            pickup_cell: cell,
            base_fare: surge::round2(base_fare),
            distance_fare: surge::round2(distance_fare),
            time_fare: surge::round2(time_fare),
            subtotal,
            surge_multiplier: multiplier,
            surge_amount: surge::round2(total - subtotal),
            total_fare: total,
            currency: self.config.currency.clone(),
            expires_at: now + self.config.quote_ttl,
            regulatory_compliance: compliance,
            factors,
            requested_at: request.timestamp,
        };

        self.audit.record(AuditEvent::QuoteIssued {
            quote_id: quote.quote_id,
            service_type: quote.service_type.to_string(),
            cell,
            total_fare: quote.total_fare,
            surge_multiplier: quote.surge_multiplier,
            degraded: false,
            degradation_reason: None,
            regulatory_clamped: !quote.regulatory_compliance.ltfrb_compliant,
            processing_micros: started.elapsed().as_micros() as u64,
            at: request.timestamp,
        });
        Ok(quote)
    }

    /// Fallback quote: subtotal only, no surge, trivially compliant. The
    /// degradation is visible to operators through the audit stream, not to
    /// the caller.
    fn degraded_quote(
        &self,
        request: &QuoteRequest,
        cell: CellIndex,
        rule: &PricingRule,
        reason: Option<String>,
        started: Instant,
    ) -> Result<Quote, QuoteError> {
        let base_fare = rule.base_fare;
        let distance_fare = request.estimated_distance_km * rule.per_distance_rate;
        let time_fare = request.estimated_duration_min * rule.per_time_rate;
        let subtotal = surge::round2(base_fare + distance_fare + time_fare);
        let max_allowed_fare = surge::round2(rule.max_allowed_fare(subtotal));
        let now = self.clock.now();

        let quote = Quote {
            quote_id: Uuid::new_v4(),
            service_type: request.service_type.clone(),
            pickup_cell: cell,
            base_fare: surge::round2(base_fare),
            distance_fare: surge::round2(distance_fare),
            time_fare: surge::round2(time_fare),
            subtotal,
            surge_multiplier: MIN_MULTIPLIER,
            surge_amount: 0.0,
            total_fare: subtotal,
            currency: self.config.currency.clone(),
            expires_at: now + self.config.quote_ttl,
            regulatory_compliance: RegulatoryCompliance::compliant(max_allowed_fare),
            factors: SurgeFactors::neutral(),
            requested_at: request.timestamp,
        };

        self.audit.record(AuditEvent::QuoteIssued {
            quote_id: quote.quote_id,
            service_type: quote.service_type.to_string(),
            cell,
            total_fare: quote.total_fare,
            surge_multiplier: quote.surge_multiplier,
            degraded: true,
            degradation_reason: reason,
            regulatory_clamped: false,
            processing_micros: started.elapsed().as_micros() as u64,
            at: request.timestamp,
        });
        Ok(quote)
    }
}

impl std::fmt::Debug for QuoteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteEngine")
            .field("geo", &self.geo)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
