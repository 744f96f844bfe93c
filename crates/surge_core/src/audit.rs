//! Audit events: fire-and-forget records of quotes and override actions.
//!
//! Delivery is an explicit asynchronous message send over a bounded channel
//! with an **at-most-once** contract: when the channel is full the event is
//! dropped, a drop counter is bumped, and the caller is never blocked or
//! failed. Emergency override events are additionally mirrored to the
//! high-priority `crisis_audit` log target at the call site.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError};

use chrono::{DateTime, Utc};
use h3o::CellIndex;
use serde::Serialize;
use uuid::Uuid;

/// One audit record. Serializable so a sink can ship it to the audit
/// collaborator as JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEvent {
    QuoteIssued {
        quote_id: Uuid,
        service_type: String,
        cell: CellIndex,
        total_fare: f64,
        surge_multiplier: f64,
        degraded: bool,
        degradation_reason: Option<String>,
        regulatory_clamped: bool,
        processing_micros: u64,
        at: DateTime<Utc>,
    },
    OverrideCreated {
        override_id: Uuid,
        override_type: String,
        operator_id: String,
        approval_level: u8,
        emergency: bool,
        at: DateTime<Utc>,
    },
    OverrideRevoked {
        override_id: Uuid,
        operator_reason: String,
        at: DateTime<Utc>,
    },
}

/// Audit sink seam. `record` must never block or fail the caller.
pub trait AuditSink: Send + Sync + std::fmt::Debug {
    fn record(&self, event: AuditEvent);
}

/// Sink that discards everything, for tests and benchmarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

/// Bounded-channel sink. The receiving half belongs to whatever ships
/// events to the audit collaborator; a slow or dead receiver costs events,
/// never latency.
#[derive(Debug)]
pub struct ChannelAuditSink {
    tx: SyncSender<AuditEvent>,
    dropped: AtomicU64,
}

impl ChannelAuditSink {
    /// Create a sink and its receiver with the given channel capacity.
    pub fn bounded(capacity: usize) -> (Self, Receiver<AuditEvent>) {
        let (tx, rx) = std::sync::mpsc::sync_channel(capacity);
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Events dropped so far because the channel was full or disconnected.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl AuditSink for ChannelAuditSink {
    fn record(&self, event: AuditEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::debug!("audit channel saturated; event dropped");
            }
        }
    }
}
