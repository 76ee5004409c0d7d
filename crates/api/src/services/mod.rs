//! Application services: multi-step units of work over the repositories.
//!
//! Services own transaction boundaries. Each correctness-critical sequence
//! runs on one `sqlx::Transaction` that is committed at the end and rolled
//! back on drop along every early return.

pub mod auth;
pub mod ledger;
pub mod membership;

pub use auth::{AuthError, AuthService};
pub use ledger::LedgerService;
pub use membership::MembershipService;

use domain::DomainError;
use thiserror::Error;
use uuid::Uuid;

use crate::middleware::metrics::record_denial;

/// Failure of a membership or ledger operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Enforces an access policy decision. Denials are logged at `warn` with
/// the action and reason.
pub(crate) fn ensure(
    allowed: bool,
    action: &'static str,
    actor: Uuid,
    reason: &str,
) -> ServiceResult<()> {
    if !allowed {
        tracing::warn!(action, actor = %actor, reason, "Access denied");
        record_denial(action);
    }
    domain::services::require(allowed, reason).map_err(ServiceError::from)
}

/// Reports a hidden ledger object as missing. The real reason is logged so
/// the denial stays visible to operators.
pub(crate) fn hide(action: &'static str, actor: Uuid, what: &'static str) -> ServiceError {
    tracing::warn!(action, actor = %actor, reason = "not a member of the owning group", "Access denied");
    record_denial(action);
    DomainError::NotFound(what).into()
}

/// Name of the unique constraint a failed statement violated, if that is
/// why it failed.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            db_err.constraint()
        }
        _ => None,
    }
}
