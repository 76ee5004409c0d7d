//! Domain error taxonomy shared by every ledger and membership operation.

use thiserror::Error;

/// Failures of a domain operation, independent of transport.
///
/// `Forbidden` and `NotFound` stay distinct: the first means the caller may
/// see the object but not act on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidTarget(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),
}

impl DomainError {
    pub fn already_member() -> Self {
        Self::Conflict("User is already a member of this group".to_string())
    }

    pub fn duplicate_request() -> Self {
        Self::Conflict("A join request for this group is already pending".to_string())
    }

    /// The group creator cannot be promoted, demoted or removed.
    pub fn creator_target() -> Self {
        Self::InvalidTarget("The group creator cannot be the target of this action".to_string())
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }
}
