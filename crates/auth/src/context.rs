use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use edugate_core::{AccountId, UserId, WorkspaceId};

use crate::{CapabilitySet, Permission, ResolvedSession, Role, WorkspaceType};

/// Who the request acts as. Serializes as the user id, or `"guest"`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    Guest,
    User(UserId),
}

impl Subject {
    pub const GUEST: &'static str = "guest";

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Guest => None,
            Self::User(id) => Some(*id),
        }
    }
}

impl core::fmt::Display for Subject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Guest => f.write_str(Self::GUEST),
            Self::User(id) => core::fmt::Display::fmt(id, f),
        }
    }
}

impl Serialize for Subject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Handler-facing projection of the resolved session.
///
/// Guests get the same shape with every identity field empty, so downstream
/// code has one type to handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationContext {
    pub user_id: Subject,
    pub account_id: Option<AccountId>,
    pub permissions: Vec<Permission>,
    pub active_workspace_id: Option<WorkspaceId>,
    pub workspace_type: Option<WorkspaceType>,
    pub role: Option<Role>,
    pub subscription_active: bool,
    #[serde(skip)]
    capabilities: Option<CapabilitySet>,
}

impl AuthorizationContext {
    pub fn guest() -> Self {
        Self {
            user_id: Subject::Guest,
            account_id: None,
            permissions: Vec::new(),
            active_workspace_id: None,
            workspace_type: None,
            role: None,
            subscription_active: false,
            capabilities: None,
        }
    }

    pub fn from_session(session: &ResolvedSession, now: DateTime<Utc>) -> Self {
        Self {
            user_id: Subject::User(session.user_id),
            account_id: Some(session.account_id),
            permissions: session.permissions.granted().cloned().collect(),
            active_workspace_id: Some(session.workspace_id),
            workspace_type: Some(session.workspace_type),
            role: Some(session.role.clone()),
            subscription_active: session.subscription_active(now),
            capabilities: Some(session.permissions.clone()),
        }
    }

    pub fn is_guest(&self) -> bool {
        self.user_id == Subject::Guest
    }

    /// Same rule the permission stage applies, for handler-level checks.
    pub fn can(&self, permission: &Permission) -> bool {
        self.capabilities
            .as_ref()
            .is_some_and(|caps| caps.satisfies(permission))
    }
}

impl Default for AuthorizationContext {
    fn default() -> Self {
        Self::guest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::fixtures::session;

    #[test]
    fn guest_context_is_empty() {
        let ctx = AuthorizationContext::guest();
        assert!(ctx.is_guest());
        assert_eq!(ctx.user_id.to_string(), "guest");
        assert!(ctx.permissions.is_empty());
        assert!(!ctx.can(&Permission::new("STUDENT_ENROLL")));
        assert_eq!(serde_json::to_value(&ctx).unwrap()["user_id"], "guest");
    }

    #[test]
    fn session_context_mirrors_snapshot() {
        let s = session(WorkspaceType::Provider, &["CARD_PUBLISH"]);
        let ctx = AuthorizationContext::from_session(&s, Utc::now());

        assert_eq!(ctx.user_id, Subject::User(s.user_id));
        assert_eq!(ctx.account_id, Some(s.account_id));
        assert_eq!(ctx.active_workspace_id, Some(s.workspace_id));
        assert_eq!(ctx.permissions, vec![Permission::new("CARD_PUBLISH")]);
        assert!(ctx.subscription_active);
        assert!(ctx.can(&Permission::new("PROVIDER_PAYOUTS")));
        assert!(!ctx.can(&Permission::new("STAFF_PAYOUTS")));
    }
}
