//! Operator overrides: time-bounded, geographically-scoped rules that
//! supersede the default surge computation.
//!
//! Creation validates permissions and parameters before any state change;
//! emergency overrides notify the crisis channel synchronously as part of
//! creation. Overrides are never hard-deleted — revoked and expired records
//! stay in the registry for audit.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use h3o::CellIndex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::{AuditEvent, AuditSink};
use crate::clock::TimeSource;
use crate::error::OverrideError;
use crate::rules::ServiceType;
use crate::spatial::{distance_km_cell_to_point, Coordinates};

const MIN_REASON_LEN: usize = 10;
const MAX_POINT_RADIUS_KM: f64 = 100.0;
const MAX_ROUTE_CORRIDOR_KM: f64 = 50.0;
const CAP_SURGE_MIN: f64 = 1.0;
const CAP_SURGE_MAX: f64 = 10.0;
const EMERGENCY_MULTIPLIER_MIN: f64 = 0.0;
const EMERGENCY_MULTIPLIER_MAX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideType {
    DisableSurge,
    CapSurge,
    FareAdjustment,
    SuspendService,
    EmergencyControl,
}

impl OverrideType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideType::DisableSurge => "disable_surge",
            OverrideType::CapSurge => "cap_surge",
            OverrideType::FareAdjustment => "fare_adjustment",
            OverrideType::SuspendService => "suspend_service",
            OverrideType::EmergencyControl => "emergency_control",
        }
    }
}

impl fmt::Display for OverrideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideStatus {
    Active,
    Expired,
    Revoked,
}

impl fmt::Display for OverrideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OverrideStatus::Active => "active",
            OverrideStatus::Expired => "expired",
            OverrideStatus::Revoked => "revoked",
        };
        f.write_str(s)
    }
}

/// Where an override applies. Matching is evaluated against the pickup
/// cell; when several overrides of one type match, the most specific scope
/// wins (highest [`GeographicScope::specificity`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum GeographicScope {
    /// The whole deployment region.
    Region { name: String },
    /// A named city bounded by a lat/lng box.
    City {
        name: String,
        lat_min: f64,
        lat_max: f64,
        lng_min: f64,
        lng_max: f64,
    },
    /// An explicit set of cells.
    Zone { cells: Vec<CellIndex> },
    /// A corridor around an ordered list of waypoints.
    Route {
        waypoints: Vec<Coordinates>,
        corridor_km: f64,
    },
    /// A disc around a point.
    PointRadius {
        center: Coordinates,
        radius_km: f64,
    },
}

impl GeographicScope {
    /// Precedence rank; higher is more specific.
    pub fn specificity(&self) -> u8 {
        match self {
            GeographicScope::Region { .. } => 0,
            GeographicScope::City { .. } => 1,
            GeographicScope::Zone { .. } => 2,
            GeographicScope::Route { .. } => 3,
            GeographicScope::PointRadius { .. } => 4,
        }
    }

    pub fn contains_cell(&self, cell: CellIndex) -> bool {
        match self {
            GeographicScope::Region { .. } => true,
            GeographicScope::City {
                lat_min,
                lat_max,
                lng_min,
                lng_max,
                ..
            } => {
                let center: h3o::LatLng = cell.into();
                (*lat_min..=*lat_max).contains(&center.lat())
                    && (*lng_min..=*lng_max).contains(&center.lng())
            }
            GeographicScope::Zone { cells } => cells.contains(&cell),
            GeographicScope::Route {
                waypoints,
                corridor_km,
            } => waypoints
                .iter()
                .any(|wp| distance_km_cell_to_point(cell, *wp) <= *corridor_km),
            GeographicScope::PointRadius { center, radius_km } => {
                distance_km_cell_to_point(cell, *center) <= *radius_km
            }
        }
    }

    fn validate(&self) -> Result<(), OverrideError> {
        match self {
            GeographicScope::Region { name } => {
                if name.trim().is_empty() {
                    return Err(OverrideError::Invalid("region name is empty".to_string()));
                }
            }
            GeographicScope::City {
                name,
                lat_min,
                lat_max,
                lng_min,
                lng_max,
            } => {
                if name.trim().is_empty() {
                    return Err(OverrideError::Invalid("city name is empty".to_string()));
                }
                let corners_valid = Coordinates::new(*lat_min, *lng_min).is_valid()
                    && Coordinates::new(*lat_max, *lng_max).is_valid();
                if !corners_valid || lat_min >= lat_max || lng_min >= lng_max {
                    return Err(OverrideError::Invalid(format!(
                        "malformed bounding box for city '{name}'"
                    )));
                }
            }
            GeographicScope::Zone { cells } => {
                if cells.is_empty() {
                    return Err(OverrideError::Invalid("zone has no cells".to_string()));
                }
            }
            GeographicScope::Route {
                waypoints,
                corridor_km,
            } => {
                if waypoints.len() < 2 {
                    return Err(OverrideError::Invalid(
                        "route needs at least two waypoints".to_string(),
                    ));
                }
                if waypoints.iter().any(|wp| !wp.is_valid()) {
                    return Err(OverrideError::Invalid(
                        "route waypoint out of range".to_string(),
                    ));
                }
                if !(*corridor_km > 0.0 && *corridor_km <= MAX_ROUTE_CORRIDOR_KM) {
                    return Err(OverrideError::Invalid(format!(
                        "route corridor must be in (0, {MAX_ROUTE_CORRIDOR_KM}] km"
                    )));
                }
            }
            GeographicScope::PointRadius { center, radius_km } => {
                if !center.is_valid() {
                    return Err(OverrideError::Invalid(
                        "point-radius center out of range".to_string(),
                    ));
                }
                if !(*radius_km > 0.0 && *radius_km <= MAX_POINT_RADIUS_KM) {
                    return Err(OverrideError::Invalid(format!(
                        "radius must be in (0, {MAX_POINT_RADIUS_KM}] km"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Which service types an override covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceScope {
    All,
    Listed(Vec<ServiceType>),
}

impl ServiceScope {
    pub fn applies_to(&self, service_type: &ServiceType) -> bool {
        match self {
            ServiceScope::All => true,
            ServiceScope::Listed(types) => types.contains(service_type),
        }
    }

    fn validate(&self) -> Result<(), OverrideError> {
        if let ServiceScope::Listed(types) = self {
            if types.is_empty() {
                return Err(OverrideError::Invalid(
                    "service type list is empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Per-type parameters. Exactly the fields the type needs are populated;
/// creation rejects incoherent combinations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideParameters {
    /// Percentage applied to the quoted total (`fare_adjustment`).
    pub adjustment_pct: Option<f64>,
    /// Flat amount added to the quoted total (`fare_adjustment`).
    pub flat_amount: Option<f64>,
    /// Replacement surge cap (`cap_surge`).
    pub cap_value: Option<f64>,
    /// Post-clamp multiplier (`emergency_control`).
    pub emergency_multiplier: Option<f64>,
    /// Operator-facing reason shown to riders (`suspend_service`).
    pub suspension_reason: Option<String>,
}

impl OverrideParameters {
    pub fn cap(cap_value: f64) -> Self {
        Self {
            cap_value: Some(cap_value),
            ..Default::default()
        }
    }

    pub fn adjustment(adjustment_pct: f64) -> Self {
        Self {
            adjustment_pct: Some(adjustment_pct),
            ..Default::default()
        }
    }

    pub fn emergency(emergency_multiplier: f64) -> Self {
        Self {
            emergency_multiplier: Some(emergency_multiplier),
            ..Default::default()
        }
    }

    pub fn suspension(reason: impl Into<String>) -> Self {
        Self {
            suspension_reason: Some(reason.into()),
            ..Default::default()
        }
    }
}

/// Operator approval levels. Limits are enforced server-side from the
/// issuer record, never trusted from request fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApprovalLevel {
    Level1,
    Level2,
    Level3,
    Level4,
}

impl ApprovalLevel {
    pub fn as_u8(&self) -> u8 {
        match self {
            ApprovalLevel::Level1 => 1,
            ApprovalLevel::Level2 => 2,
            ApprovalLevel::Level3 => 3,
            ApprovalLevel::Level4 => 4,
        }
    }

    /// Largest |fare adjustment| percentage this level may issue.
    pub fn max_adjustment_pct(&self) -> f64 {
        match self {
            ApprovalLevel::Level1 => 5.0,
            ApprovalLevel::Level2 => 15.0,
            ApprovalLevel::Level3 => 30.0,
            ApprovalLevel::Level4 => 50.0,
        }
    }

    /// Override types this level may issue.
    pub fn may_issue(&self, override_type: OverrideType) -> bool {
        match self {
            ApprovalLevel::Level1 => matches!(override_type, OverrideType::FareAdjustment),
            ApprovalLevel::Level2 => matches!(
                override_type,
                OverrideType::FareAdjustment | OverrideType::CapSurge | OverrideType::DisableSurge
            ),
            ApprovalLevel::Level3 | ApprovalLevel::Level4 => true,
        }
    }
}

/// The authenticated operator issuing an override. Authentication itself is
/// an upstream concern; the registry trusts this record as already verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    pub operator_id: String,
    pub approval_level: ApprovalLevel,
}

/// Input to [`OverrideRegistry::create`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRequest {
    pub override_type: OverrideType,
    pub geographic_scope: GeographicScope,
    pub service_types: ServiceScope,
    pub parameters: OverrideParameters,
    pub reason: String,
    pub issued_by: Issuer,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// A stored override. Immutable except for the revocation fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Override {
    pub id: Uuid,
    pub override_type: OverrideType,
    pub geographic_scope: GeographicScope,
    pub service_types: ServiceScope,
    pub parameters: OverrideParameters,
    pub reason: String,
    pub issued_by: Issuer,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_reason: Option<String>,
}

impl Override {
    pub fn status_at(&self, now: DateTime<Utc>) -> OverrideStatus {
        if self.revoked_at.is_some() {
            return OverrideStatus::Revoked;
        }
        match self.end_time {
            Some(end) if now >= end => OverrideStatus::Expired,
            _ => OverrideStatus::Active,
        }
    }

    /// Active, started, and matching the (cell, service type) key.
    pub fn applies_to(&self, cell: CellIndex, service_type: &ServiceType, at: DateTime<Utc>) -> bool {
        self.status_at(at) == OverrideStatus::Active
            && at >= self.start_time
            && self.service_types.applies_to(service_type)
            && self.geographic_scope.contains_cell(cell)
    }
}

/// Creation response: the stored record plus advisory text for the
/// operator. Warnings are informational, never machine-enforced.
#[derive(Debug, Clone)]
pub struct CreatedOverride {
    pub record: Override,
    pub warnings: Vec<String>,
    pub suggested_next_steps: Vec<String>,
}

/// The winning override per type for one (cell, service type) key at one
/// instant. At most one override of each type is effective at a time.
#[derive(Debug, Clone, Default)]
pub struct EffectiveOverrides {
    pub disable_surge: Option<Override>,
    pub cap_surge: Option<Override>,
    pub fare_adjustment: Option<Override>,
    pub suspend_service: Option<Override>,
    pub emergency_control: Option<Override>,
}

impl EffectiveOverrides {
    pub fn is_empty(&self) -> bool {
        self.disable_surge.is_none()
            && self.cap_surge.is_none()
            && self.fare_adjustment.is_none()
            && self.suspend_service.is_none()
            && self.emergency_control.is_none()
    }

    fn slot(&mut self, override_type: OverrideType) -> &mut Option<Override> {
        match override_type {
            OverrideType::DisableSurge => &mut self.disable_surge,
            OverrideType::CapSurge => &mut self.cap_surge,
            OverrideType::FareAdjustment => &mut self.fare_adjustment,
            OverrideType::SuspendService => &mut self.suspend_service,
            OverrideType::EmergencyControl => &mut self.emergency_control,
        }
    }
}

/// Synchronous crisis-management notification for emergency overrides.
/// Failure fails the creation: an emergency control that nobody was told
/// about must not exist.
pub trait CrisisNotifier: Send + Sync + std::fmt::Debug {
    fn notify(&self, record: &Override) -> Result<(), String>;
}

/// Default notifier: writes to the `crisis` log target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingCrisisNotifier;

impl CrisisNotifier for LoggingCrisisNotifier {
    fn notify(&self, record: &Override) -> Result<(), String> {
        log::error!(
            target: "crisis",
            "emergency override {} issued by {} (level {}): {}",
            record.id,
            record.issued_by.operator_id,
            record.issued_by.approval_level.as_u8(),
            record.reason
        );
        Ok(())
    }
}

/// Counts for the operator dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    pub revoked: usize,
    pub active_by_type: HashMap<String, usize>,
    /// Active overrides ending within the next hour.
    pub expiring_soon: Vec<Uuid>,
}

/// The override registry. A single lock serializes mutations, which keeps
/// create/revoke linearizable per key without cross-key coordination.
#[derive(Debug)]
pub struct OverrideRegistry {
    inner: Mutex<HashMap<Uuid, Override>>,
    clock: Arc<dyn TimeSource>,
    crisis: Arc<dyn CrisisNotifier>,
    audit: Arc<dyn AuditSink>,
}

impl OverrideRegistry {
    pub fn new(
        clock: Arc<dyn TimeSource>,
        crisis: Arc<dyn CrisisNotifier>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            clock,
            crisis,
            audit,
        }
    }

    /// Validate and store an override. Permission and parameter checks run
    /// before any state change; for `emergency_control` the crisis
    /// notification fires synchronously and its failure aborts creation.
    pub fn create(&self, request: OverrideRequest) -> Result<CreatedOverride, OverrideError> {
        let issuer = &request.issued_by;
        if !issuer.approval_level.may_issue(request.override_type) {
            return Err(OverrideError::NotPermitted {
                level: issuer.approval_level.as_u8(),
                override_type: request.override_type.to_string(),
            });
        }

        validate_request(&request)?;

        let now = self.clock.now();
        let record = Override {
            id: Uuid::new_v4(),
            override_type: request.override_type,
            geographic_scope: request.geographic_scope,
            service_types: request.service_types,
            parameters: request.parameters,
            reason: request.reason,
            issued_by: request.issued_by,
            start_time: request.start_time,
            end_time: request.end_time,
            created_at: now,
            revoked_at: None,
            revoked_reason: None,
        };

        let emergency = record.override_type == OverrideType::EmergencyControl;
        if emergency {
            self.crisis
                .notify(&record)
                .map_err(OverrideError::CrisisNotification)?;
            log::error!(
                target: "crisis_audit",
                "emergency override {} created by {}",
                record.id,
                record.issued_by.operator_id
            );
        }

        let mut map = self.lock();
        map.insert(record.id, record.clone());
        drop(map);

        log::info!(
            "override {} ({}) created by {} for {:?}",
            record.id,
            record.override_type,
            record.issued_by.operator_id,
            record.service_types
        );
        self.audit.record(AuditEvent::OverrideCreated {
            override_id: record.id,
            override_type: record.override_type.to_string(),
            operator_id: record.issued_by.operator_id.clone(),
            approval_level: record.issued_by.approval_level.as_u8(),
            emergency,
            at: now,
        });

        let warnings = creation_warnings(&record);
        let suggested_next_steps = next_steps(&record);
        Ok(CreatedOverride {
            record,
            warnings,
            suggested_next_steps,
        })
    }

    /// Revoke an active override. Revoking an expired or already-revoked
    /// override is an error with no state change; already-issued quotes are
    /// unaffected either way.
    pub fn revoke(&self, id: Uuid, reason: impl Into<String>) -> Result<Override, OverrideError> {
        let now = self.clock.now();
        let reason = reason.into();
        let mut map = self.lock();
        let record = map.get_mut(&id).ok_or(OverrideError::NotFound(id))?;

        let status = record.status_at(now);
        if status != OverrideStatus::Active {
            return Err(OverrideError::NotActive {
                id,
                status: status.to_string(),
            });
        }

        record.revoked_at = Some(now);
        record.revoked_reason = Some(reason.clone());
        let revoked = record.clone();
        drop(map);

        log::info!("override {id} revoked: {reason}");
        self.audit.record(AuditEvent::OverrideRevoked {
            override_id: id,
            operator_reason: reason,
            at: now,
        });
        Ok(revoked)
    }

    pub fn get(&self, id: Uuid) -> Option<Override> {
        self.lock().get(&id).cloned()
    }

    pub fn list_active(&self) -> Vec<Override> {
        let now = self.clock.now();
        let mut active: Vec<Override> = self
            .lock()
            .values()
            .filter(|o| o.status_at(now) == OverrideStatus::Active)
            .cloned()
            .collect();
        active.sort_by_key(|o| o.start_time);
        active
    }

    /// Resolve the winning override per type for a key: most specific
    /// geographic scope first, most recent `start_time` on ties.
    pub fn effective_for(
        &self,
        cell: CellIndex,
        service_type: &ServiceType,
        at: DateTime<Utc>,
    ) -> EffectiveOverrides {
        let map = self.lock();
        let mut effective = EffectiveOverrides::default();
        for candidate in map.values() {
            if !candidate.applies_to(cell, service_type, at) {
                continue;
            }
            let slot = effective.slot(candidate.override_type);
            let wins = match slot {
                None => true,
                Some(current) => {
                    let candidate_rank =
                        (candidate.geographic_scope.specificity(), candidate.start_time);
                    let current_rank =
                        (current.geographic_scope.specificity(), current.start_time);
                    candidate_rank > current_rank
                }
            };
            if wins {
                *slot = Some(candidate.clone());
            }
        }
        effective
    }

    pub fn get_dashboard(&self) -> DashboardSummary {
        let now = self.clock.now();
        let map = self.lock();
        let mut summary = DashboardSummary {
            total: map.len(),
            ..Default::default()
        };
        for record in map.values() {
            match record.status_at(now) {
                OverrideStatus::Active => {
                    summary.active += 1;
                    *summary
                        .active_by_type
                        .entry(record.override_type.to_string())
                        .or_insert(0) += 1;
                    if let Some(end) = record.end_time {
                        if end - now <= chrono::Duration::hours(1) {
                            summary.expiring_soon.push(record.id);
                        }
                    }
                }
                OverrideStatus::Expired => summary.expired += 1,
                OverrideStatus::Revoked => summary.revoked += 1,
            }
        }
        summary
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Override>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn validate_request(request: &OverrideRequest) -> Result<(), OverrideError> {
    if request.reason.trim().len() < MIN_REASON_LEN {
        return Err(OverrideError::Invalid(format!(
            "reason must be at least {MIN_REASON_LEN} characters"
        )));
    }
    request.geographic_scope.validate()?;
    request.service_types.validate()?;
    if let Some(end) = request.end_time {
        if end <= request.start_time {
            return Err(OverrideError::Invalid(
                "end_time must be after start_time".to_string(),
            ));
        }
    }

    let p = &request.parameters;
    match request.override_type {
        OverrideType::DisableSurge => {}
        OverrideType::CapSurge => {
            let cap = p.cap_value.ok_or_else(|| {
                OverrideError::Invalid("cap_surge requires cap_value".to_string())
            })?;
            if !(CAP_SURGE_MIN..=CAP_SURGE_MAX).contains(&cap) {
                return Err(OverrideError::Invalid(format!(
                    "cap_value must be in [{CAP_SURGE_MIN}, {CAP_SURGE_MAX}]"
                )));
            }
        }
        OverrideType::FareAdjustment => {
            if p.adjustment_pct.is_none() && p.flat_amount.is_none() {
                return Err(OverrideError::Invalid(
                    "fare_adjustment requires adjustment_pct or flat_amount".to_string(),
                ));
            }
            if let Some(pct) = p.adjustment_pct {
                if !pct.is_finite() {
                    return Err(OverrideError::Invalid(
                        "adjustment_pct must be finite".to_string(),
                    ));
                }
                let max = request.issued_by.approval_level.max_adjustment_pct();
                if pct.abs() > max {
                    return Err(OverrideError::AdjustmentTooLarge {
                        requested_pct: pct,
                        max_pct: max,
                        level: request.issued_by.approval_level.as_u8(),
                    });
                }
            }
            if let Some(flat) = p.flat_amount {
                if !flat.is_finite() {
                    return Err(OverrideError::Invalid(
                        "flat_amount must be finite".to_string(),
                    ));
                }
            }
        }
        OverrideType::SuspendService => {
            let reason_ok = p
                .suspension_reason
                .as_deref()
                .is_some_and(|r| !r.trim().is_empty());
            if !reason_ok {
                return Err(OverrideError::Invalid(
                    "suspend_service requires suspension_reason".to_string(),
                ));
            }
        }
        OverrideType::EmergencyControl => {
            let mult = p.emergency_multiplier.ok_or_else(|| {
                OverrideError::Invalid("emergency_control requires emergency_multiplier".to_string())
            })?;
            if !(EMERGENCY_MULTIPLIER_MIN..=EMERGENCY_MULTIPLIER_MAX).contains(&mult) {
                return Err(OverrideError::Invalid(format!(
                    "emergency_multiplier must be in [{EMERGENCY_MULTIPLIER_MIN}, {EMERGENCY_MULTIPLIER_MAX}]"
                )));
            }
        }
    }
    Ok(())
}

fn creation_warnings(record: &Override) -> Vec<String> {
    let mut warnings = Vec::new();
    match record.override_type {
        OverrideType::DisableSurge => warnings.push(
            "Disabling surge removes the supply incentive and may cause driver shortages in high-demand areas".to_string(),
        ),
        OverrideType::SuspendService => warnings.push(
            "Suspending service rejects all quote requests in scope until the override ends".to_string(),
        ),
        OverrideType::EmergencyControl => warnings.push(
            "Emergency control bypasses the approved surge cap; crisis management has been notified".to_string(),
        ),
        OverrideType::FareAdjustment => {
            if record.parameters.adjustment_pct.unwrap_or(0.0).abs() >= 20.0 {
                warnings.push(
                    "Large fare adjustments can trigger regulator review; consider phasing".to_string(),
                );
            }
        }
        OverrideType::CapSurge => {}
    }
    if record.end_time.is_none() {
        warnings.push("Override has no end time and stays active until revoked".to_string());
    }
    warnings
}

fn next_steps(record: &Override) -> Vec<String> {
    let mut steps = vec![
        "Monitor supply and completion rates in the affected area".to_string(),
    ];
    if record.end_time.is_none() {
        steps.push("Set a revocation reminder for the issuing operator".to_string());
    }
    if record.override_type == OverrideType::EmergencyControl {
        steps.push("File the incident report referenced by the crisis channel".to_string());
    }
    steps
}
