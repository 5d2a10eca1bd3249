use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role identifier carried by a session (e.g. `"member"`, `"operator"`).
///
/// Roles are opaque strings at this layer; what a role grants is decided by
/// the [`RoleTable`] the resolver is built with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a single role grants on top of a session's explicit permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleGrant {
    pub permissions: Vec<Permission>,
    /// Waives the workspace-type match. This is the only exception to strict
    /// workspace isolation and is never derived from anything else.
    pub cross_workspace: bool,
}

impl RoleGrant {
    pub fn permissions(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            permissions: permissions.into_iter().collect(),
            cross_workspace: false,
        }
    }

    pub fn cross_workspace(mut self) -> Self {
        self.cross_workspace = true;
        self
    }
}

/// Explicit role → capability table, consulted once per session resolution.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    grants: HashMap<Role, RoleGrant>,
}

impl RoleTable {
    /// Empty table: roles grant nothing and never override workspace checks.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: Role, grant: RoleGrant) -> Self {
        self.grants.insert(role, grant);
        self
    }

    pub fn grant_for(&self, role: &Role) -> Option<&RoleGrant> {
        self.grants.get(role)
    }

    pub fn permissions_for(&self, role: &Role) -> &[Permission] {
        self.grant_for(role)
            .map(|g| g.permissions.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_cross_workspace_override(&self, role: &Role) -> bool {
        self.grant_for(role).is_some_and(|g| g.cross_workspace)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.grants.keys()
    }

    /// Table used by the server when nothing else is configured: platform
    /// operators may act across workspace types.
    pub fn standard() -> Self {
        Self::empty().with_role(Role::new("operator"), RoleGrant::default().cross_workspace())
    }
}
