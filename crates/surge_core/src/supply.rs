//! Supply/demand counts per (cell, service type).
//!
//! The matching/dispatch layer owns the real counts; this module is the
//! narrow read interface the surge sweep and quote path consume, plus an
//! in-memory implementation that doubles as the test double and the local
//! deployment source.

use std::collections::HashMap;
use std::sync::RwLock;

use h3o::CellIndex;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::rules::ServiceType;

/// Instantaneous counts for one (cell, service type) key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyDemandCounts {
    /// Available (idle, on-shift) drivers.
    pub supply: u32,
    /// Open or queued ride requests.
    pub demand: u32,
    /// Trips currently in progress.
    pub active_trips: u32,
}

impl SupplyDemandCounts {
    pub fn new(supply: u32, demand: u32, active_trips: u32) -> Self {
        Self {
            supply,
            demand,
            active_trips,
        }
    }

    /// True when the key has no driver or rider activity and should leave
    /// the active set.
    pub fn is_idle(&self) -> bool {
        self.supply == 0 && self.demand == 0 && self.active_trips == 0
    }
}

/// Read access to the supply/demand collaborator.
pub trait SupplyDemandSource: Send + Sync + std::fmt::Debug {
    fn get_counts(
        &self,
        cell: CellIndex,
        service_type: &ServiceType,
    ) -> Result<SupplyDemandCounts, CollaboratorError>;

    /// The (cell, service type) keys with any recent activity. The sweep
    /// recomputes exactly this set each tick.
    fn active_keys(&self) -> Vec<(CellIndex, ServiceType)>;
}

/// In-memory supply/demand source.
#[derive(Debug, Default)]
pub struct InMemorySupplyDemand {
    counts: RwLock<HashMap<(CellIndex, ServiceType), SupplyDemandCounts>>,
}

impl InMemorySupplyDemand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_counts(
        &self,
        cell: CellIndex,
        service_type: ServiceType,
        counts: SupplyDemandCounts,
    ) {
        let mut map = match self.counts.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.insert((cell, service_type), counts);
    }

    pub fn remove(&self, cell: CellIndex, service_type: &ServiceType) {
        let mut map = match self.counts.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.remove(&(cell, service_type.clone()));
    }
}

impl SupplyDemandSource for InMemorySupplyDemand {
    fn get_counts(
        &self,
        cell: CellIndex,
        service_type: &ServiceType,
    ) -> Result<SupplyDemandCounts, CollaboratorError> {
        let map = match self.counts.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(map
            .get(&(cell, service_type.clone()))
            .copied()
            .unwrap_or_default())
    }

    fn active_keys(&self) -> Vec<(CellIndex, ServiceType)> {
        let map = match self.counts.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{Coordinates, GeoIndex};

    #[test]
    fn missing_key_reads_as_zero_counts() {
        let source = InMemorySupplyDemand::new();
        let cell = GeoIndex::default()
            .cell_for_point(Coordinates::new(14.5995, 120.9842))
            .unwrap();
        let counts = source
            .get_counts(cell, &ServiceType::new("tnvs_standard"))
            .unwrap();
        assert!(counts.is_idle());
    }

    #[test]
    fn active_keys_reflect_writes() {
        let source = InMemorySupplyDemand::new();
        let cell = GeoIndex::default()
            .cell_for_point(Coordinates::new(14.5995, 120.9842))
            .unwrap();
        let service = ServiceType::new("tnvs_standard");
        source.set_counts(cell, service.clone(), SupplyDemandCounts::new(4, 9, 2));

        assert_eq!(source.active_keys(), vec![(cell, service.clone())]);
        let counts = source.get_counts(cell, &service).unwrap();
        assert_eq!(counts.demand, 9);
        assert!(!counts.is_idle());
    }
}
