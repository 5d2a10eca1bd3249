//! `edugate-core` — identifiers and the shared error model.
//!
//! Nothing in here knows about caches, HTTP or sessions; the auth pipeline and
//! its adapters build on these types.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{AccountId, UserId, WorkspaceId};
