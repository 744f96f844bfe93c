//! Pricing rules: the regulator-approved fare components per service type.
//!
//! Rules are immutable once published; a new rule supersedes rather than
//! mutates an old one, and superseded versions are kept so a quote at a past
//! timestamp resolves against the rule that was effective then.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A ride service category, e.g. `tnvs_standard` or `tnvs_premium`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceType(String);

impl ServiceType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Approved fare components for one service type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRule {
    pub service_type: ServiceType,
    /// Flag-down amount charged on every trip.
    pub base_fare: f64,
    /// Rate per kilometer.
    pub per_distance_rate: f64,
    /// Rate per minute.
    pub per_time_rate: f64,
    /// Maximum surge multiplier the regulator allows for this service (>= 1.0).
    pub surge_cap: f64,
    pub regulator_approved: bool,
    /// Region the rule applies to. A deployment serves one region.
    pub geographic_scope: String,
    pub effective_from: DateTime<Utc>,
    pub effective_until: Option<DateTime<Utc>>,
}

impl PricingRule {
    /// Pre-surge fare: `base + distance * per_km + duration * per_min`.
    pub fn subtotal(&self, distance_km: f64, duration_min: f64) -> f64 {
        self.base_fare + distance_km * self.per_distance_rate + duration_min * self.per_time_rate
    }

    /// Regulator ceiling for a trip: the subtotal at the full approved cap.
    /// Post-clamp adjustments may push a fare past this; the quote engine
    /// clamps back down and records the violation.
    pub fn max_allowed_fare(&self, subtotal: f64) -> f64 {
        subtotal * self.surge_cap.max(1.0)
    }

    pub fn is_effective_at(&self, at: DateTime<Utc>) -> bool {
        if at < self.effective_from {
            return false;
        }
        match self.effective_until {
            Some(until) => at < until,
            None => true,
        }
    }
}

/// Read access to the rule store collaborator.
///
/// Returns `None` when no rule is effective for the service type at the
/// given instant; the quote path treats that as fatal (there is no safe
/// default fare).
pub trait RuleStore: Send + Sync + std::fmt::Debug {
    fn get_rule(&self, service_type: &ServiceType, at: DateTime<Utc>) -> Option<PricingRule>;
}

/// In-memory rule store. Keeps every published version per service type and
/// resolves the latest approved rule effective at the requested instant.
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    rules: RwLock<HashMap<ServiceType, Vec<PricingRule>>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a rule version. Existing versions are never mutated.
    pub fn publish(&self, rule: PricingRule) {
        let mut rules = match self.rules.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rules
            .entry(rule.service_type.clone())
            .or_default()
            .push(rule);
    }

    pub fn service_types(&self) -> Vec<ServiceType> {
        let rules = match self.rules.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rules.keys().cloned().collect()
    }
}

impl RuleStore for InMemoryRuleStore {
    fn get_rule(&self, service_type: &ServiceType, at: DateTime<Utc>) -> Option<PricingRule> {
        let rules = match self.rules.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rules
            .get(service_type)?
            .iter()
            .filter(|rule| rule.regulator_approved && rule.is_effective_at(at))
            .max_by_key(|rule| rule.effective_from)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rule_at(effective_from: DateTime<Utc>, base_fare: f64) -> PricingRule {
        PricingRule {
            service_type: ServiceType::new("tnvs_standard"),
            base_fare,
            per_distance_rate: 12.0,
            per_time_rate: 2.0,
            surge_cap: 3.0,
            regulator_approved: true,
            geographic_scope: "metro_manila".to_string(),
            effective_from,
            effective_until: None,
        }
    }

    #[test]
    fn subtotal_combines_three_components() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let rule = rule_at(t0, 50.0);
        assert_eq!(rule.subtotal(10.0, 20.0), 50.0 + 120.0 + 40.0);
    }

    #[test]
    fn newer_rule_supersedes_without_mutating_old_one() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let store = InMemoryRuleStore::new();
        store.publish(rule_at(t0, 50.0));
        store.publish(rule_at(t1, 55.0));

        let service = ServiceType::new("tnvs_standard");
        let old = store
            .get_rule(&service, t0 + chrono::Duration::days(1))
            .unwrap();
        assert_eq!(old.base_fare, 50.0);

        let new = store
            .get_rule(&service, t1 + chrono::Duration::days(1))
            .unwrap();
        assert_eq!(new.base_fare, 55.0);
    }

    #[test]
    fn unapproved_and_expired_rules_do_not_resolve() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let store = InMemoryRuleStore::new();

        let mut unapproved = rule_at(t0, 50.0);
        unapproved.regulator_approved = false;
        store.publish(unapproved);
        let service = ServiceType::new("tnvs_standard");
        assert!(store
            .get_rule(&service, t0 + chrono::Duration::days(1))
            .is_none());

        let mut expiring = rule_at(t0, 50.0);
        expiring.effective_until = Some(t0 + chrono::Duration::days(30));
        store.publish(expiring);
        assert!(store
            .get_rule(&service, t0 + chrono::Duration::days(31))
            .is_none());
    }

    #[test]
    fn unknown_service_type_resolves_to_none() {
        let store = InMemoryRuleStore::new();
        assert!(store
            .get_rule(&ServiceType::new("hovercraft"), Utc::now())
            .is_none());
    }
}
