//! Monte Carlo trial execution.
//!
//! Trials are embarrassingly parallel: the sample loop runs in fixed-size
//! chunks across the rayon pool, and every chunk checks the cancellation
//! flag before it starts so a cancelled run stops promptly instead of
//! burning through the remaining iterations.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::parameters::SimulationRequest;
use crate::sampling::PerturbationModel;

const TRIAL_CHUNK: u64 = 1_000;

/// Revenue per unit of surge-cap headroom, applied to revenue only.
/// Assumes roughly the peak-hour trip share of fares is surge-priced.
const CAP_HEADROOM_REVENUE_SENSITIVITY: f64 = 0.03;

/// Accumulated per-trial samples for the full horizon.
#[derive(Debug, Clone, Default)]
pub struct TrialSamples {
    pub revenue: Vec<f64>,
    pub trips: Vec<f64>,
}

/// Trials were stopped by the cancellation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialsAborted;

/// Deterministic revenue uplift from raising (or lowering) the surge cap.
pub fn surge_cap_uplift(current_cap: f64, proposed_cap: Option<f64>) -> f64 {
    match proposed_cap {
        Some(proposed) => {
            (1.0 + (proposed - current_cap) * CAP_HEADROOM_REVENUE_SENSITIVITY).max(0.0)
        }
        None => 1.0,
    }
}

/// Run every trial, combining the deterministic elasticity effect with the
/// model's random perturbations against the baseline horizon totals.
pub fn run_trials(
    request: &SimulationRequest,
    model: &dyn PerturbationModel,
    cancel: &AtomicBool,
) -> Result<TrialSamples, TrialsAborted> {
    let horizon = f64::from(request.time_horizon_days);
    let demand_multiplier = request.demand_multiplier();
    let price_multiplier = request.price_multiplier();
    let cap_uplift = surge_cap_uplift(request.current_surge_cap, request.proposed_surge_cap);
    let baseline_revenue = request.baseline.daily_revenue * horizon;
    let baseline_trips = request.baseline.daily_trips * horizon;

    let iterations = u64::from(request.iterations);
    let chunks: Vec<(u64, u64)> = (0..iterations)
        .step_by(TRIAL_CHUNK as usize)
        .map(|start| (start, (start + TRIAL_CHUNK).min(iterations)))
        .collect();

    let chunk_samples: Result<Vec<TrialSamples>, TrialsAborted> = chunks
        .par_iter()
        .map(|&(start, end)| {
            if cancel.load(Ordering::Relaxed) {
                return Err(TrialsAborted);
            }
            let mut samples = TrialSamples {
                revenue: Vec::with_capacity((end - start) as usize),
                trips: Vec::with_capacity((end - start) as usize),
            };
            for trial in start..end {
                let perturbation = model.sample(trial).product();
                samples.revenue.push(
                    baseline_revenue * demand_multiplier * price_multiplier * perturbation
                        * cap_uplift,
                );
                samples
                    .trips
                    .push(baseline_trips * demand_multiplier * perturbation);
            }
            Ok(samples)
        })
        .collect();

    let mut all = TrialSamples {
        revenue: Vec::with_capacity(iterations as usize),
        trips: Vec::with_capacity(iterations as usize),
    };
    for chunk in chunk_samples? {
        all.revenue.extend(chunk.revenue);
        all.trips.extend(chunk.trips);
    }
    Ok(all)
}
