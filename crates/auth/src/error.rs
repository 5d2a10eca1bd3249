use thiserror::Error;

use crate::{CacheError, PolicyError};

/// "Could not determine" failures.
///
/// Deliberately separate from [`crate::FailureCode`]: none of these may be
/// reported to a caller as a policy denial.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InfraError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The token itself is never included; it is a bearer credential.
    #[error("malformed session record: {0}")]
    MalformedRecord(String),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("no route policy registered for '{0}'")]
    UnknownRoute(String),
}

impl InfraError {
    /// True when retrying later may succeed (backend trouble rather than bad data/config).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Cache(CacheError::Unavailable(_)))
    }
}
