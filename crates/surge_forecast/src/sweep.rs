//! Parallel scenario sweep: project many candidate pricing changes at once.
//!
//! Bypasses the run registry (and its concurrency cap, which protects the
//! online API, not offline batch analysis) and executes each request
//! synchronously across the rayon pool with a progress bar.

use std::sync::atomic::AtomicBool;

use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::engine::{execute_request, SimulationResult};
use crate::error::SimulationError;
use crate::parameters::SimulationRequest;

/// Run every scenario to completion, in parallel. Results are returned in
/// input order; a scenario that fails validation yields its error without
/// affecting the others.
pub fn run_scenario_sweep(
    requests: &[SimulationRequest],
    start_date: NaiveDate,
    show_progress: bool,
) -> Vec<Result<SimulationResult, SimulationError>> {
    let bar = if show_progress {
        let bar = ProgressBar::new(requests.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(bar)
    } else {
        None
    };

    let results: Vec<Result<SimulationResult, SimulationError>> = requests
        .par_iter()
        .enumerate()
        .map(|(index, request)| {
            let result = request.validate().and_then(|()| {
                let seed = request.seed.unwrap_or(index as u64 + 1);
                let cancel = AtomicBool::new(false);
                execute_request(request, seed, start_date, &cancel, &mut |_pct| {})
            });
            if let Some(bar) = &bar {
                bar.inc(1);
            }
            result
        })
        .collect();

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    results
}
