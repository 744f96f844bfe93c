//! Simulation run lifecycle: registration under the concurrency cap,
//! background execution, progress reporting, cancellation, and retention.
//!
//! The cap check and run registration happen under one lock so the global
//! limit can never be raced past. A run transitions running → completed or
//! running → failed exactly once; worker panics are caught and recorded as
//! failures so no run is ever left stuck in `running`.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use surge_core::clock::TimeSource;
use uuid::Uuid;

use crate::error::SimulationError;
use crate::impact::{
    assess_customer_impact, assess_driver_impact, assess_market_impact, daily_projection,
    recommendations, risk_factors, CustomerImpact, DailyProjection, DriverImpact, MarketImpact,
    Recommendation, RiskFactor,
};
use crate::metrics::{
    confidence_interval, revenue_percentiles, sorted_summary, RevenueProjection, ServiceSplit,
    TripProjection,
};
use crate::montecarlo::{run_trials, TrialsAborted};
use crate::parameters::SimulationRequest;
use crate::sampling::MonteCarloPerturbations;

/// Progress checkpoints a poller can observe.
pub const PROGRESS_BASELINE: u8 = 10;
pub const PROGRESS_TRIALS: u8 = 60;
pub const PROGRESS_IMPACT: u8 = 85;
pub const PROGRESS_COMPLETE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The full projection payload of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub revenue: RevenueProjection,
    pub trips: TripProjection,
    pub market: MarketImpact,
    pub customer: CustomerImpact,
    pub driver: DriverImpact,
    pub risk_factors: Vec<RiskFactor>,
    pub recommendations: Vec<Recommendation>,
    pub daily_projection: Vec<DailyProjection>,
}

/// A registered run, as returned to pollers. `result` is populated only on
/// completion.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationRun {
    pub id: Uuid,
    pub request: SimulationRequest,
    pub status: RunStatus,
    pub progress_pct: u8,
    pub result: Option<SimulationResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SimulationRun {
    pub fn is_terminal(&self) -> bool {
        self.status != RunStatus::Running
    }
}

#[derive(Debug)]
struct RunSlot {
    run: SimulationRun,
    cancel: Arc<AtomicBool>,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// System-wide cap on concurrently running simulations. Requests past
    /// the cap are rejected, never queued.
    pub max_concurrent_runs: usize,
    /// How long a terminal run stays pollable before garbage collection.
    pub retention: chrono::Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: 5,
            retention: chrono::Duration::hours(1),
        }
    }
}

#[derive(Debug)]
pub struct SimulationEngine {
    slots: Arc<Mutex<HashMap<Uuid, RunSlot>>>,
    clock: Arc<dyn TimeSource>,
    config: EngineConfig,
}

impl SimulationEngine {
    pub fn new(clock: Arc<dyn TimeSource>, config: EngineConfig) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            clock,
            config,
        }
    }

    /// Validate, register under the cap, and start the worker thread.
    /// Returns the freshly-registered run snapshot.
    pub fn start_simulation(
        &self,
        request: SimulationRequest,
    ) -> Result<SimulationRun, SimulationError> {
        request.validate()?;

        let now = self.clock.now();
        let mut slots = lock_slots(&self.slots);
        gc_locked(&mut slots, now, self.config.retention);
        let running = slots
            .values()
            .filter(|slot| slot.run.status == RunStatus::Running)
            .count();
        if running >= self.config.max_concurrent_runs {
            return Err(SimulationError::CapacityExceeded {
                running,
                cap: self.config.max_concurrent_runs,
            });
        }

        let id = Uuid::new_v4();
        let run = SimulationRun {
            id,
            request: request.clone(),
            status: RunStatus::Running,
            progress_pct: 0,
            result: None,
            error: None,
            created_at: now,
            finished_at: None,
        };
        let cancel = Arc::new(AtomicBool::new(false));
        slots.insert(
            id,
            RunSlot {
                run: run.clone(),
                cancel: cancel.clone(),
            },
        );
        drop(slots);
        log::info!("simulation run {id} ('{}') started", run.request.name);

        let slots_arc = self.slots.clone();
        let clock = self.clock.clone();
        std::thread::spawn(move || {
            let start_date = clock.now().date_naive();
            let seed = request.seed.unwrap_or(id.as_u128() as u64);
            let mut progress = |pct: u8| set_progress(&slots_arc, id, pct);
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                execute_request(&request, seed, start_date, cancel.as_ref(), &mut progress)
            }));

            let finished = clock.now();
            let mut slots = lock_slots(&slots_arc);
            let Some(slot) = slots.get_mut(&id) else {
                return;
            };
            // A cancellation may have already finalized the run.
            if slot.run.status != RunStatus::Running {
                return;
            }
            match outcome {
                Ok(Ok(result)) => {
                    slot.run.status = RunStatus::Completed;
                    slot.run.progress_pct = PROGRESS_COMPLETE;
                    slot.run.result = Some(result);
                    log::info!("simulation run {id} completed");
                }
                Ok(Err(err)) => {
                    slot.run.status = RunStatus::Failed;
                    slot.run.error = Some(err.to_string());
                    log::warn!("simulation run {id} failed: {err}");
                }
                Err(_) => {
                    slot.run.status = RunStatus::Failed;
                    slot.run.error = Some("simulation worker panicked".to_string());
                    log::warn!("simulation run {id} failed: worker panicked");
                }
            }
            slot.run.finished_at = Some(finished);
        });

        Ok(run)
    }

    pub fn get_run(&self, id: Uuid) -> Option<SimulationRun> {
        let now = self.clock.now();
        let mut slots = lock_slots(&self.slots);
        gc_locked(&mut slots, now, self.config.retention);
        slots.get(&id).map(|slot| slot.run.clone())
    }

    pub fn list_runs(&self) -> Vec<SimulationRun> {
        let now = self.clock.now();
        let mut slots = lock_slots(&self.slots);
        gc_locked(&mut slots, now, self.config.retention);
        let mut runs: Vec<SimulationRun> = slots.values().map(|slot| slot.run.clone()).collect();
        runs.sort_by_key(|run| run.created_at);
        runs
    }

    /// Cancel a running simulation: flag the workers to stop and finalize
    /// the run as failed with the cancellation reason.
    pub fn cancel(&self, id: Uuid, reason: &str) -> Result<SimulationRun, SimulationError> {
        let now = self.clock.now();
        let mut slots = lock_slots(&self.slots);
        let slot = slots.get_mut(&id).ok_or(SimulationError::RunNotFound(id))?;
        if slot.run.is_terminal() {
            return Err(SimulationError::AlreadyTerminal {
                id,
                status: slot.run.status.to_string(),
            });
        }
        slot.cancel.store(true, Ordering::Relaxed);
        slot.run.status = RunStatus::Failed;
        slot.run.error = Some(format!("cancelled: {reason}"));
        slot.run.finished_at = Some(now);
        log::info!("simulation run {id} cancelled: {reason}");
        Ok(slot.run.clone())
    }

    /// Poll until the run is terminal or the timeout elapses. Test and CLI
    /// convenience; production callers poll `get_run` themselves.
    pub fn wait_for_terminal(
        &self,
        id: Uuid,
        timeout: std::time::Duration,
    ) -> Option<SimulationRun> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let run = self.get_run(id)?;
            if run.is_terminal() {
                return Some(run);
            }
            if std::time::Instant::now() >= deadline {
                return Some(run);
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }
}

fn lock_slots(slots: &Arc<Mutex<HashMap<Uuid, RunSlot>>>) -> MutexGuard<'_, HashMap<Uuid, RunSlot>> {
    match slots.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn set_progress(slots: &Arc<Mutex<HashMap<Uuid, RunSlot>>>, id: Uuid, pct: u8) {
    let mut slots = lock_slots(slots);
    if let Some(slot) = slots.get_mut(&id) {
        if slot.run.status == RunStatus::Running {
            slot.run.progress_pct = pct;
        }
    }
}

fn gc_locked(
    slots: &mut HashMap<Uuid, RunSlot>,
    now: DateTime<Utc>,
    retention: chrono::Duration,
) {
    slots.retain(|_, slot| match (slot.run.is_terminal(), slot.run.finished_at) {
        (true, Some(finished)) => now - finished < retention,
        _ => true,
    });
}

/// The full projection pipeline, synchronous. Shared by the engine worker
/// and the scenario sweep.
pub fn execute_request(
    request: &SimulationRequest,
    seed: u64,
    start_date: NaiveDate,
    cancel: &AtomicBool,
    progress: &mut dyn FnMut(u8),
) -> Result<SimulationResult, SimulationError> {
    let horizon = f64::from(request.time_horizon_days);
    let baseline_revenue = request.baseline.daily_revenue * horizon;
    let baseline_trips = request.baseline.daily_trips * horizon;
    progress(PROGRESS_BASELINE);

    let external = request.external.unwrap_or_default();
    let model = MonteCarloPerturbations {
        seed,
        demand_volatility: request.demand_volatility,
        month: request.start_month.unwrap_or_else(|| start_date.month()),
        competitor_response_probability: request.competitor_response_probability,
        external_multiplier: external.weather_multiplier * external.event_multiplier,
    };
    let samples =
        run_trials(request, &model, cancel).map_err(|TrialsAborted| SimulationError::Cancelled)?;
    progress(PROGRESS_TRIALS);

    let (sorted_revenue, revenue_stats) = sorted_summary(samples.revenue);
    let (_sorted_trips, trip_stats) = sorted_summary(samples.trips);
    let change_vs_baseline_pct = if baseline_revenue > 0.0 {
        (revenue_stats.mean - baseline_revenue) / baseline_revenue * 100.0
    } else {
        0.0
    };
    let revenue = RevenueProjection {
        projected: revenue_stats,
        percentiles: revenue_percentiles(&sorted_revenue),
        confidence_interval: confidence_interval(
            &revenue_stats,
            request.confidence_level,
            sorted_revenue.len(),
        ),
        baseline_total: baseline_revenue,
        change_vs_baseline_pct,
    };
    let trips = TripProjection {
        projected: trip_stats,
        baseline_total: baseline_trips,
        by_service_type: request
            .baseline
            .service_mix
            .iter()
            .map(|(service_type, share)| ServiceSplit {
                service_type: service_type.clone(),
                mean_trips: trip_stats.mean * share,
            })
            .collect(),
    };

    let market = assess_market_impact(request);
    let customer = assess_customer_impact(request);
    let driver = assess_driver_impact(request);
    let risks = risk_factors(request);
    progress(PROGRESS_IMPACT);

    let recommendations = recommendations(request, &risks);
    let daily_projection = daily_projection(
        request,
        revenue.projected.mean,
        trips.projected.mean,
        start_date,
    );
    progress(PROGRESS_COMPLETE);

    Ok(SimulationResult {
        revenue,
        trips,
        market,
        customer,
        driver,
        risk_factors: risks,
        recommendations,
        daily_projection,
    })
}
