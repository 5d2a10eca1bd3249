//! Cache backends for the session store contract.
//!
//! The contract itself (and the in-memory implementation used in tests)
//! lives in `edugate-auth`; this module only adds networked backends.

#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "redis")]
pub use self::redis::RedisSessionCache;
