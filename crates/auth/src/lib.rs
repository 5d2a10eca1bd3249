//! `edugate-auth` — request authorization pipeline.
//!
//! Decoupled from HTTP and from any particular cache backend: callers inject
//! a [`SessionCache`] and a [`RoutePolicyRegistry`], hand in the raw session
//! token, and get back an [`AuthorizationVerdict`].

pub mod cache;
pub mod capabilities;
pub mod clock;
pub mod context;
pub mod error;
pub mod memory;
pub mod permissions;
pub mod pipeline;
pub mod policy;
pub mod registry;
pub mod resolver;
pub mod roles;
pub mod session;
pub mod steps;
pub mod two_factor;
pub mod workspace;

pub use cache::{CacheError, SessionCache, SessionCacheWriter};
pub use capabilities::CapabilitySet;
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{AuthorizationContext, Subject};
pub use error::InfraError;
pub use memory::InMemorySessionCache;
pub use permissions::Permission;
pub use pipeline::{AccessRequest, AuthorizationVerdict, Authorizer};
pub use policy::{PolicyError, RoutePolicy, RoutePolicySpec};
pub use registry::RoutePolicyRegistry;
pub use resolver::SessionResolver;
pub use roles::{Role, RoleGrant, RoleTable};
pub use session::{AccountStatus, ResolvedSession, SessionId, SessionRecord, WorkspaceMembership};
pub use steps::{FailureCode, Stage, StepResult};
pub use two_factor::{TwoFactorChannel, TwoFactorGate, TwoFactorMarker};
pub use workspace::WorkspaceType;
