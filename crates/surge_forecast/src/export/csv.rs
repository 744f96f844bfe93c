use crate::engine::SimulationResult;
use crate::parameters::SimulationRequest;

pub(crate) fn export_to_csv_impl(
    results: &[SimulationResult],
    requests: &[SimulationRequest],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    if results.len() != requests.len() {
        return Err(format!(
            "Results length ({}) doesn't match requests length ({})",
            results.len(),
            requests.len()
        )
        .into());
    }

    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "name",
        "base_fare_change_pct",
        "proposed_surge_cap",
        "price_elasticity",
        "time_horizon_days",
        "iterations",
        "confidence_level",
        "competitor_response_probability",
        "demand_volatility",
        "seed",
        "revenue_mean",
        "revenue_median",
        "revenue_std_dev",
        "revenue_p10",
        "revenue_p25",
        "revenue_p75",
        "revenue_p90",
        "revenue_p95",
        "revenue_p99",
        "revenue_change_vs_baseline_pct",
        "trips_mean",
        "trips_median",
        "trips_std_dev",
        "market_share_change_pp",
        "driver_earnings_change_pct",
        "churn_probability_delta_pp",
        "risk_count",
        "recommendation_count",
    ])?;

    for (result, request) in results.iter().zip(requests.iter()) {
        wtr.write_record([
            request.name.clone(),
            request.base_fare_change_pct.to_string(),
            request
                .proposed_surge_cap
                .map(|cap| cap.to_string())
                .unwrap_or_default(),
            request.price_elasticity.to_string(),
            request.time_horizon_days.to_string(),
            request.iterations.to_string(),
            request.confidence_level.to_string(),
            request.competitor_response_probability.to_string(),
            request.demand_volatility.to_string(),
            request
                .seed
                .map(|seed| seed.to_string())
                .unwrap_or_default(),
            result.revenue.projected.mean.to_string(),
            result.revenue.projected.median.to_string(),
            result.revenue.projected.std_dev.to_string(),
            result.revenue.percentiles.p10.to_string(),
            result.revenue.percentiles.p25.to_string(),
            result.revenue.percentiles.p75.to_string(),
            result.revenue.percentiles.p90.to_string(),
            result.revenue.percentiles.p95.to_string(),
            result.revenue.percentiles.p99.to_string(),
            result.revenue.change_vs_baseline_pct.to_string(),
            result.trips.projected.mean.to_string(),
            result.trips.projected.median.to_string(),
            result.trips.projected.std_dev.to_string(),
            result.market.market_share_change_pp.to_string(),
            result.driver.earnings_change_pct.to_string(),
            result.customer.churn_probability_delta_pp.to_string(),
            result.risk_factors.len().to_string(),
            result.recommendations.len().to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
