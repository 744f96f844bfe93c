//! Surge recompute sweep: keeps every active (cell, service type) record
//! fresh on a fixed interval, independent of request traffic.
//!
//! Cells recompute independently across a rayon pool; each write is a
//! complete snapshot, so last-write-wins per key is safe. A failure in one
//! cell is logged and skipped — the previous record stays in place and
//! readers degrade through its expiry, never through stale data.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;

use crate::clock::TimeSource;
use crate::error::CollaboratorError;
use crate::factors::{FactorProvider, TimeOfDayProfile};
use crate::overrides::OverrideRegistry;
use crate::rules::{RuleStore, ServiceType};
use crate::supply::SupplyDemandSource;
use crate::surge::{self, SurgeFactors, SurgeState, SurgeStore, MIN_MULTIPLIER};

#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Interval between ticks when driven by [`SurgeSweepService::run_loop`].
    pub interval: Duration,
    /// Validity window written on each snapshot. Must comfortably exceed the
    /// interval so one skipped tick does not expire the whole grid.
    pub state_ttl: chrono::Duration,
    pub time_of_day: TimeOfDayProfile,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            state_ttl: chrono::Duration::seconds(90),
            time_of_day: TimeOfDayProfile::none(),
        }
    }
}

/// Counters from one tick, for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub recomputed: usize,
    pub dropped: usize,
    pub failed: usize,
}

enum CellAction {
    Updated,
    Dropped,
}

pub struct SurgeSweepService {
    store: Arc<SurgeStore>,
    supply: Arc<dyn SupplyDemandSource>,
    factors: Arc<dyn FactorProvider>,
    rules: Arc<dyn RuleStore>,
    overrides: Arc<OverrideRegistry>,
    clock: Arc<dyn TimeSource>,
    config: SweepConfig,
}

impl SurgeSweepService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<SurgeStore>,
        supply: Arc<dyn SupplyDemandSource>,
        factors: Arc<dyn FactorProvider>,
        rules: Arc<dyn RuleStore>,
        overrides: Arc<OverrideRegistry>,
        clock: Arc<dyn TimeSource>,
        config: SweepConfig,
    ) -> Self {
        Self {
            store,
            supply,
            factors,
            rules,
            overrides,
            clock,
            config,
        }
    }

    /// Recompute every active key once. Keys with no activity are dropped
    /// from the store instead of recomputed.
    pub fn tick(&self) -> SweepOutcome {
        let keys = self.supply.active_keys();
        let results: Vec<Result<CellAction, CollaboratorError>> = keys
            .par_iter()
            .map(|(cell, service_type)| self.recompute_one(*cell, service_type))
            .collect();

        let mut outcome = SweepOutcome::default();
        for (result, (cell, service_type)) in results.into_iter().zip(keys.iter()) {
            match result {
                Ok(CellAction::Updated) => outcome.recomputed += 1,
                Ok(CellAction::Dropped) => outcome.dropped += 1,
                Err(err) => {
                    outcome.failed += 1;
                    log::warn!("surge recompute skipped for {service_type} at {cell}: {err}");
                }
            }
        }
        log::debug!(
            "surge sweep: {} recomputed, {} dropped, {} failed",
            outcome.recomputed,
            outcome.dropped,
            outcome.failed
        );
        outcome
    }

    /// Drive ticks on the configured interval until `shutdown` is set.
    pub fn run_loop(&self, shutdown: &AtomicBool) {
        while !shutdown.load(Ordering::Relaxed) {
            self.tick();
            std::thread::sleep(self.config.interval);
        }
    }

    fn recompute_one(
        &self,
        cell: h3o::CellIndex,
        service_type: &ServiceType,
    ) -> Result<CellAction, CollaboratorError> {
        let counts = self.supply.get_counts(cell, service_type)?;
        if counts.is_idle() {
            self.store.remove(cell, service_type);
            return Ok(CellAction::Dropped);
        }

        let now = self.clock.now();
        let rule = self.rules.get_rule(service_type, now).ok_or_else(|| {
            CollaboratorError::Unavailable(format!("no pricing rule for {service_type}"))
        })?;
        let external = self.factors.get_factors(cell, now)?;
        let factors = SurgeFactors::from_external(external, self.config.time_of_day.factor_at(now));

        // Overrides are visible to the sweep the instant they are created:
        // the stored multiplier must agree with what a quote would compute.
        let effective = self.overrides.effective_for(cell, service_type, now);
        let multiplier = if effective.disable_surge.is_some() {
            MIN_MULTIPLIER
        } else {
            let cap = effective
                .cap_surge
                .as_ref()
                .and_then(|o| o.parameters.cap_value)
                .unwrap_or(rule.surge_cap);
            let ratio = surge::supply_demand_ratio(counts.supply, counts.demand);
            surge::clamp_multiplier(surge::raw_multiplier(ratio, &factors), cap)
        };

        let state = SurgeState::new(
            cell,
            service_type.clone(),
            multiplier,
            counts.supply,
            counts.demand,
            counts.active_trips,
            factors,
            now,
            self.config.state_ttl,
        );
        self.store.put(state);
        Ok(CellAction::Updated)
    }
}

impl std::fmt::Debug for SurgeSweepService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurgeSweepService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
