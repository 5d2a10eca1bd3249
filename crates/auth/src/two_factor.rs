//! Step-up (2FA) gate.
//!
//! Presence of `2fa:{session_id}` is the whole proof: there is no stored
//! "verified" flag with its own expiry, so the marker's TTL alone decides how
//! often a user repeats step-up verification.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::cache::two_factor_key;
use crate::{CacheError, FailureCode, SessionCache, SessionId};

/// Delivery channel of the one-time code a route demands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TwoFactorChannel {
    #[default]
    Email,
    Phone,
}

impl TwoFactorChannel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }

    pub const fn required_code(self) -> FailureCode {
        match self {
            Self::Email => FailureCode::TwoFactorEmailRequired,
            Self::Phone => FailureCode::TwoFactorPhoneRequired,
        }
    }
}

impl core::fmt::Display for TwoFactorChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TwoFactorChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            other => Err(other.to_string()),
        }
    }
}

/// Value written by the OTP-verification flow. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoFactorMarker {
    pub channel: TwoFactorChannel,
    pub verified_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TwoFactorGate {
    cache: Arc<dyn SessionCache>,
}

impl TwoFactorGate {
    pub fn new(cache: Arc<dyn SessionCache>) -> Self {
        Self { cache }
    }

    /// One cache round-trip. The marker's contents are not inspected: a
    /// marker from either channel satisfies the gate.
    #[instrument(skip_all)]
    pub async fn is_verified(&self, session_id: &SessionId) -> Result<bool, CacheError> {
        let present = self.cache.get(&two_factor_key(session_id)).await?.is_some();
        debug!(present, "step-up marker lookup");
        Ok(present)
    }
}

impl core::fmt::Debug for TwoFactorGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TwoFactorGate").finish_non_exhaustive()
    }
}
