//! Result export for offline analysis.
//!
//! Completed projections can be written to Parquet (columnar metrics),
//! JSON (full payload including risks and recommendations), or CSV
//! (request parameters paired with headline metrics).

use std::path::Path;

use crate::engine::SimulationResult;
use crate::parameters::SimulationRequest;

#[path = "export/csv.rs"]
mod csv;
#[path = "export/json.rs"]
mod json;
#[path = "export/parquet.rs"]
mod parquet;
#[path = "export/writer_utils.rs"]
mod writer_utils;

/// Export headline metrics to Parquet, one row per completed run.
///
/// # Errors
///
/// Returns an error if file creation or Parquet writing fails, or if
/// `results` is empty.
pub fn export_to_parquet(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    parquet::export_to_parquet_impl(results, file)
}

/// Export the full result payloads as a JSON array.
///
/// # Errors
///
/// Returns an error if file creation or serialization fails.
pub fn export_to_json(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(results, file)
}

/// Export request parameters and headline metrics to CSV. Requests and
/// results are paired by index (`results[i]` belongs to `requests[i]`).
///
/// # Errors
///
/// Returns an error if the lengths differ or writing fails.
pub fn export_to_csv(
    results: &[SimulationResult],
    requests: &[SimulationRequest],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = writer_utils::create_output_file(path)?;
    csv::export_to_csv_impl(results, requests, file)
}
