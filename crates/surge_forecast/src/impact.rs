//! Derived market, customer, and driver impact, risk flags, ranked
//! recommendations, and the day-by-day projection.
//!
//! These are planning heuristics, linear or monotonic in the size of the
//! price change; the Monte Carlo samples carry the uncertainty, not these.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::parameters::{weekday_factor, SimulationRequest};

/// Market share moves against the direction of the price change.
const MARKET_SHARE_SENSITIVITY: f64 = -0.25;
/// Drivers keep roughly this share of a fare change.
const DRIVER_EARNINGS_PASSTHROUGH: f64 = 0.7;
const SUPPLY_RESPONSE_SENSITIVITY: f64 = 0.3;
const COMPLAINT_RATE_PER_TRIP: f64 = 0.001;

pub const REGULATORY_RISK_THRESHOLD_PCT: f64 = 25.0;
pub const COMPETITIVE_RISK_THRESHOLD_PCT: f64 = 15.0;
pub const SATISFACTION_RISK_THRESHOLD_PCT: f64 = 10.0;

/// Days covered by the day-by-day projection, regardless of horizon.
pub const MAX_PROJECTION_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MarketImpact {
    /// Projected market share change in percentage points.
    pub market_share_change_pp: f64,
    /// True when competitors are likely to answer the move.
    pub competitor_response_expected: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CustomerImpact {
    /// Satisfaction index delta, negative for any sizable change.
    pub satisfaction_delta: f64,
    /// Churn probability delta in percentage points.
    pub churn_probability_delta_pp: f64,
    pub projected_monthly_complaints: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DriverImpact {
    pub earnings_change_pct: f64,
    /// Expected supply change; sign matches the fare change.
    pub supply_response_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Regulatory,
    Competitive,
    CustomerSatisfaction,
    Operational,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Regulatory => "regulatory",
            RiskCategory::Competitive => "competitive",
            RiskCategory::CustomerSatisfaction => "customer_satisfaction",
            RiskCategory::Operational => "operational",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskFactor {
    pub category: RiskCategory,
    pub severity: RiskSeverity,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// 1 = act first.
    pub priority: u8,
    pub action: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyProjection {
    pub day: u32,
    pub date: NaiveDate,
    pub expected_revenue: f64,
    pub expected_trips: f64,
}

pub fn assess_market_impact(request: &SimulationRequest) -> MarketImpact {
    let pct = request.base_fare_change_pct;
    MarketImpact {
        market_share_change_pp: (MARKET_SHARE_SENSITIVITY * pct).clamp(-15.0, 15.0),
        competitor_response_expected: request.competitor_response_probability >= 0.5
            || pct > COMPETITIVE_RISK_THRESHOLD_PCT,
    }
}

pub fn assess_customer_impact(request: &SimulationRequest) -> CustomerImpact {
    let magnitude = request.base_fare_change_pct.abs();
    CustomerImpact {
        satisfaction_delta: -0.15 * magnitude,
        churn_probability_delta_pp: (0.25 * magnitude).min(25.0),
        projected_monthly_complaints: request.baseline.daily_trips
            * 30.0
            * COMPLAINT_RATE_PER_TRIP
            * (1.0 + magnitude / 10.0),
    }
}

pub fn assess_driver_impact(request: &SimulationRequest) -> DriverImpact {
    let pct = request.base_fare_change_pct;
    DriverImpact {
        earnings_change_pct: DRIVER_EARNINGS_PASSTHROUGH * pct,
        supply_response_pct: SUPPLY_RESPONSE_SENSITIVITY * pct,
    }
}

pub fn risk_factors(request: &SimulationRequest) -> Vec<RiskFactor> {
    let pct = request.base_fare_change_pct;
    let mut risks = Vec::new();

    if pct.abs() > REGULATORY_RISK_THRESHOLD_PCT {
        risks.push(RiskFactor {
            category: RiskCategory::Regulatory,
            severity: RiskSeverity::High,
            description: format!(
                "{pct:+.0}% exceeds the {REGULATORY_RISK_THRESHOLD_PCT:.0}% fare adjustment \
                 guidance and will draw regulator review"
            ),
        });
    }
    if let Some(cap) = request.proposed_surge_cap {
        if cap > 5.0 {
            risks.push(RiskFactor {
                category: RiskCategory::Regulatory,
                severity: RiskSeverity::Medium,
                description: format!("proposed surge cap {cap:.1} sits above typical approvals"),
            });
        }
    }
    if pct > COMPETITIVE_RISK_THRESHOLD_PCT {
        risks.push(RiskFactor {
            category: RiskCategory::Competitive,
            severity: RiskSeverity::Medium,
            description: format!(
                "a {pct:+.0}% increase leaves room for competitors to undercut"
            ),
        });
    }
    if pct.abs() > SATISFACTION_RISK_THRESHOLD_PCT {
        risks.push(RiskFactor {
            category: RiskCategory::CustomerSatisfaction,
            severity: RiskSeverity::Medium,
            description: format!("riders notice changes beyond ±{SATISFACTION_RISK_THRESHOLD_PCT:.0}%"),
        });
    }
    if request.demand_multiplier() <= 0.5 {
        risks.push(RiskFactor {
            category: RiskCategory::Operational,
            severity: RiskSeverity::High,
            description: "projected demand drops below half of baseline".to_string(),
        });
    }
    risks
}

/// Ranked, advisory next steps derived from the change size and risk list.
pub fn recommendations(request: &SimulationRequest, risks: &[RiskFactor]) -> Vec<Recommendation> {
    let pct = request.base_fare_change_pct;
    let mut out = Vec::new();
    let mut priority = 1u8;

    if pct.abs() >= 20.0 {
        out.push(Recommendation {
            priority,
            action: "Phase the change in two or three steps over several weeks".to_string(),
            rationale: format!("{pct:+.0}% at once concentrates churn and regulator attention"),
        });
        priority += 1;
    }
    if risks.iter().any(|r| r.category == RiskCategory::Competitive) {
        out.push(Recommendation {
            priority,
            action: "Prepare a competitive response plan before rollout".to_string(),
            rationale: "price-sensitive riders compare against competitor fares within days"
                .to_string(),
        });
        priority += 1;
    }
    if pct < 0.0 {
        out.push(Recommendation {
            priority,
            action: "Confirm driver earnings protections for the transition".to_string(),
            rationale: format!(
                "drivers absorb roughly {:.0}% of the fare decrease",
                DRIVER_EARNINGS_PASSTHROUGH * 100.0
            ),
        });
        priority += 1;
    }
    out.push(Recommendation {
        priority,
        action: "Monitor realized revenue against the p10–p90 band for the first week".to_string(),
        rationale: "early drift outside the projected band invalidates the elasticity assumption"
            .to_string(),
    });
    out
}

/// Expected revenue/trips for the first `MAX_PROJECTION_DAYS` days of the
/// horizon, shaped by the weekly demand pattern.
pub fn daily_projection(
    request: &SimulationRequest,
    mean_total_revenue: f64,
    mean_total_trips: f64,
    start_date: NaiveDate,
) -> Vec<DailyProjection> {
    let horizon = request.time_horizon_days;
    let days = horizon.min(MAX_PROJECTION_DAYS);
    let daily_revenue = mean_total_revenue / f64::from(horizon);
    let daily_trips = mean_total_trips / f64::from(horizon);

    (0..days)
        .map(|offset| {
            let date = start_date + Duration::days(i64::from(offset));
            let factor = weekday_factor(date.weekday());
            DailyProjection {
                day: offset + 1,
                date,
                expected_revenue: daily_revenue * factor,
                expected_trips: daily_trips * factor,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::BaselineMetrics;

    fn request(pct: f64) -> SimulationRequest {
        SimulationRequest::new("change", pct, BaselineMetrics::new(1_000_000.0, 20_000.0))
    }

    #[test]
    fn thirty_percent_increase_flags_regulatory_and_competitive_risk() {
        let risks = risk_factors(&request(30.0));
        assert!(risks.iter().any(|r| r.category == RiskCategory::Regulatory));
        assert!(risks.iter().any(|r| r.category == RiskCategory::Competitive));
        assert!(risks
            .iter()
            .any(|r| r.category == RiskCategory::CustomerSatisfaction));
    }

    #[test]
    fn small_change_carries_no_risk_flags() {
        assert!(risk_factors(&request(5.0)).is_empty());
    }

    #[test]
    fn customer_impact_is_monotonic_in_magnitude() {
        let small = assess_customer_impact(&request(5.0));
        let large = assess_customer_impact(&request(-40.0));
        assert!(large.satisfaction_delta < small.satisfaction_delta);
        assert!(large.churn_probability_delta_pp > small.churn_probability_delta_pp);
        assert!(large.projected_monthly_complaints > small.projected_monthly_complaints);
    }

    #[test]
    fn driver_impact_sign_matches_the_change() {
        let cut = assess_driver_impact(&request(-10.0));
        assert!((cut.earnings_change_pct - -7.0).abs() < 1e-12);
        assert!(cut.supply_response_pct < 0.0);

        let raise = assess_driver_impact(&request(10.0));
        assert!(raise.earnings_change_pct > 0.0);
        assert!(raise.supply_response_pct > 0.0);
    }

    #[test]
    fn daily_projection_is_capped_at_thirty_days() {
        let req = request(10.0).with_horizon_days(90);
        let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(); // a Monday
        let projection = daily_projection(&req, 9_000_000.0, 180_000.0, start);

        assert_eq!(projection.len(), 30);
        assert_eq!(projection[0].day, 1);
        // Friday of the first week carries the weekend factor.
        assert!(projection[4].expected_revenue > projection[0].expected_revenue);
    }

    #[test]
    fn recommendations_are_ranked_and_always_include_monitoring() {
        let req = request(30.0);
        let risks = risk_factors(&req);
        let recs = recommendations(&req, &risks);
        assert!(recs.len() >= 3);
        for (i, rec) in recs.iter().enumerate() {
            assert_eq!(rec.priority as usize, i + 1);
        }
        assert!(recs.iter().any(|r| r.action.contains("Monitor")));
    }
}
