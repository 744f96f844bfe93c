//! Error taxonomy for the pricing core.
//!
//! Three families matter to callers:
//!
//! - Validation and fatal errors ([`QuoteError`], [`OverrideError`]) are
//!   rejected at the boundary with a descriptive reason and no state change.
//! - Collaborator failures ([`CollaboratorError`]) are absorbed into a
//!   degraded quote by the quote path and into a skipped cell by the sweep;
//!   they never propagate past those boundaries.

use thiserror::Error;
use uuid::Uuid;

/// Errors returned by the quote path. Anything not listed here degrades
/// instead of failing: pricing stays available when enrichment data is not.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("invalid quote request: {0}")]
    InvalidRequest(String),

    /// No pricing rule exists for the requested service type. There is no
    /// safe default fare, so this is the one fatal path in quoting.
    #[error("no pricing rule for service type '{0}'")]
    UnknownServiceType(String),

    /// An operator suspended the service in the pickup area.
    #[error("service '{service_type}' suspended: {reason}")]
    ServiceSuspended {
        service_type: String,
        reason: String,
    },
}

/// Errors returned by override registry mutations. All are rejected before
/// any state change.
#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("invalid override: {0}")]
    Invalid(String),

    #[error("approval level {level} may not issue {override_type} overrides")]
    NotPermitted { level: u8, override_type: String },

    #[error(
        "adjustment of {requested_pct}% exceeds the {max_pct}% limit for approval level {level}"
    )]
    AdjustmentTooLarge {
        requested_pct: f64,
        max_pct: f64,
        level: u8,
    },

    #[error("override {0} not found")]
    NotFound(Uuid),

    #[error("override {id} is {status}; only active overrides can be revoked")]
    NotActive { id: Uuid, status: String },

    #[error("crisis notification failed: {0}")]
    CrisisNotification(String),
}

/// Failures talking to an external collaborator (rule store, factor
/// aggregator, supply/demand source). Consumers degrade, they do not fail.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    #[error("collaborator timed out: {0}")]
    Timeout(String),

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("malformed collaborator response: {0}")]
    Malformed(String),
}
