//! Cache contract the pipeline needs from its session store.
//!
//! Keys:
//! - `session:{id}` → JSON [`SessionRecord`]
//! - `2fa:{id}`     → JSON [`TwoFactorMarker`]
//!
//! TTLs and writes are owned by collaborators (login, logout, workspace
//! switch, OTP verification). The pipeline only ever holds a [`SessionCache`].

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::{SessionId, SessionRecord, TwoFactorMarker};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache command failed: {0}")]
    Command(String),

    #[error("cache value could not be encoded: {0}")]
    Encode(String),
}

/// Read side. A miss is `Ok(None)`; `Err` always means "could not determine".
#[async_trait]
pub trait SessionCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
}

/// Write side, for the collaborators that own session lifecycle.
#[async_trait]
pub trait SessionCacheWriter: Send + Sync {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

pub fn session_key(session_id: &SessionId) -> String {
    format!("session:{session_id}")
}

pub fn two_factor_key(session_id: &SessionId) -> String {
    format!("2fa:{session_id}")
}

/// Write (or replace) a session record. Used at login and workspace switch.
pub async fn store_session<W>(
    writer: &W,
    session_id: &SessionId,
    record: &SessionRecord,
    ttl: Duration,
) -> Result<(), CacheError>
where
    W: SessionCacheWriter + ?Sized,
{
    let value = serde_json::to_string(record).map_err(|e| CacheError::Encode(e.to_string()))?;
    writer.set(&session_key(session_id), value, ttl).await
}

/// Record a completed step-up verification. Re-authentication granularity
/// equals `ttl`.
pub async fn mark_two_factor<W>(
    writer: &W,
    session_id: &SessionId,
    marker: &TwoFactorMarker,
    ttl: Duration,
) -> Result<(), CacheError>
where
    W: SessionCacheWriter + ?Sized,
{
    let value = serde_json::to_string(marker).map_err(|e| CacheError::Encode(e.to_string()))?;
    writer.set(&two_factor_key(session_id), value, ttl).await
}

/// Logout / forced invalidation: drops both the session and its step-up marker.
pub async fn invalidate_session<W>(writer: &W, session_id: &SessionId) -> Result<(), CacheError>
where
    W: SessionCacheWriter + ?Sized,
{
    writer.delete(&session_key(session_id)).await?;
    writer.delete(&two_factor_key(session_id)).await
}
