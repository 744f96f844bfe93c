//! Project a +12% fare change over 60 days and print the projection.
//!
//! Run with: cargo run -p surge_forecast --example forecast_run

use std::sync::Arc;

use surge_core::clock::SystemTimeSource;
use surge_forecast::engine::{EngineConfig, SimulationEngine};
use surge_forecast::parameters::{BaselineMetrics, SimulationRequest};

fn main() {
    env_logger::init();

    let mut baseline = BaselineMetrics::new(4_800_000.0, 36_000.0);
    baseline.service_mix = vec![
        (surge_core::rules::ServiceType::new("tnvs_standard"), 0.7),
        (surge_core::rules::ServiceType::new("tnvs_premium"), 0.3),
    ];

    let request = SimulationRequest::new("plus12_rainy_season", 12.0, baseline)
        .with_horizon_days(60)
        .with_iterations(50_000)
        .with_confidence_level(0.95)
        .with_start_month(8)
        .with_seed(20250601);

    let engine = SimulationEngine::new(Arc::new(SystemTimeSource), EngineConfig::default());
    let run = engine.start_simulation(request).expect("start run");
    println!("run {} started ({})", run.id, run.request.name);

    let finished = engine
        .wait_for_terminal(run.id, std::time::Duration::from_secs(60))
        .expect("run still registered");
    println!("status: {} ({}%)", finished.status, finished.progress_pct);

    let result = finished.result.expect("completed result");
    let revenue = &result.revenue;
    println!(
        "revenue: mean {:.0} (baseline {:.0}, {:+.1}%)",
        revenue.projected.mean, revenue.baseline_total, revenue.change_vs_baseline_pct
    );
    println!(
        "  p10 {:.0}  p25 {:.0}  p75 {:.0}  p90 {:.0}  p95 {:.0}  p99 {:.0}",
        revenue.percentiles.p10,
        revenue.percentiles.p25,
        revenue.percentiles.p75,
        revenue.percentiles.p90,
        revenue.percentiles.p95,
        revenue.percentiles.p99,
    );
    println!(
        "trips: mean {:.0} (baseline {:.0})",
        result.trips.projected.mean, result.trips.baseline_total
    );
    for split in &result.trips.by_service_type {
        println!("  {}: {:.0}", split.service_type, split.mean_trips);
    }

    println!("risks:");
    for risk in &result.risk_factors {
        println!("  [{:?}] {}: {}", risk.severity, risk.category.as_str(), risk.description);
    }
    println!("recommendations:");
    for rec in &result.recommendations {
        println!("  {}. {} — {}", rec.priority, rec.action, rec.rationale);
    }
    println!(
        "daily projection covers {} days, day 1 revenue {:.0}",
        result.daily_projection.len(),
        result.daily_projection[0].expected_revenue
    );
}
