use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::engine::SimulationResult;

pub(crate) fn export_to_parquet_impl(
    results: &[SimulationResult],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = build_record_batch(results)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

fn build_record_batch(
    results: &[SimulationResult],
) -> Result<RecordBatch, arrow::error::ArrowError> {
    let schema = Arc::new(parquet_schema());
    let arrays = build_arrays(results);

    RecordBatch::try_new(schema, arrays)
}

fn parquet_schema() -> Schema {
    Schema::new(vec![
        Field::new("revenue_mean", DataType::Float64, false),
        Field::new("revenue_median", DataType::Float64, false),
        Field::new("revenue_std_dev", DataType::Float64, false),
        Field::new("revenue_p10", DataType::Float64, false),
        Field::new("revenue_p25", DataType::Float64, false),
        Field::new("revenue_p75", DataType::Float64, false),
        Field::new("revenue_p90", DataType::Float64, false),
        Field::new("revenue_p95", DataType::Float64, false),
        Field::new("revenue_p99", DataType::Float64, false),
        Field::new("revenue_baseline_total", DataType::Float64, false),
        Field::new("revenue_change_vs_baseline_pct", DataType::Float64, false),
        Field::new("trips_mean", DataType::Float64, false),
        Field::new("trips_median", DataType::Float64, false),
        Field::new("trips_std_dev", DataType::Float64, false),
        Field::new("market_share_change_pp", DataType::Float64, false),
        Field::new("driver_earnings_change_pct", DataType::Float64, false),
        Field::new("churn_probability_delta_pp", DataType::Float64, false),
        Field::new("risk_count", DataType::UInt64, false),
        Field::new("recommendation_count", DataType::UInt64, false),
    ])
}

fn build_arrays(results: &[SimulationResult]) -> Vec<ArrayRef> {
    vec![
        float_array(results, |r| r.revenue.projected.mean),
        float_array(results, |r| r.revenue.projected.median),
        float_array(results, |r| r.revenue.projected.std_dev),
        float_array(results, |r| r.revenue.percentiles.p10),
        float_array(results, |r| r.revenue.percentiles.p25),
        float_array(results, |r| r.revenue.percentiles.p75),
        float_array(results, |r| r.revenue.percentiles.p90),
        float_array(results, |r| r.revenue.percentiles.p95),
        float_array(results, |r| r.revenue.percentiles.p99),
        float_array(results, |r| r.revenue.baseline_total),
        float_array(results, |r| r.revenue.change_vs_baseline_pct),
        float_array(results, |r| r.trips.projected.mean),
        float_array(results, |r| r.trips.projected.median),
        float_array(results, |r| r.trips.projected.std_dev),
        float_array(results, |r| r.market.market_share_change_pp),
        float_array(results, |r| r.driver.earnings_change_pct),
        float_array(results, |r| r.customer.churn_probability_delta_pp),
        count_array(results, |r| r.risk_factors.len()),
        count_array(results, |r| r.recommendations.len()),
    ]
}

fn float_array(results: &[SimulationResult], f: impl Fn(&SimulationResult) -> f64) -> ArrayRef {
    Arc::new(Float64Array::from(
        results.iter().map(f).collect::<Vec<f64>>(),
    ))
}

fn count_array(results: &[SimulationResult], f: impl Fn(&SimulationResult) -> usize) -> ArrayRef {
    Arc::new(UInt64Array::from(
        results.iter().map(|r| f(r) as u64).collect::<Vec<u64>>(),
    ))
}
