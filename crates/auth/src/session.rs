//! Session records (what the cache holds) and resolved sessions (what one
//! request evaluation sees).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edugate_core::{AccountId, UserId, WorkspaceId};

use crate::{CapabilitySet, Permission, Role, WorkspaceType};

/// Opaque session token, as carried by cookie/header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Returns `None` for blank tokens; an empty cookie is not a session.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        (!raw.is_empty()).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
}

/// One workspace a session may act in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceMembership {
    pub workspace_id: WorkspaceId,
    pub workspace_type: WorkspaceType,
    /// Replaces the session-level role while this membership is active.
    #[serde(default)]
    pub role: Option<Role>,
    /// Added to the session-level permissions while this membership is active.
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// Value stored under `session:{id}`. Written by login, rollover and
/// workspace-switch flows; never by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub account_id: AccountId,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub phone_verified: bool,
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub subscription_tier: Option<String>,
    #[serde(default)]
    pub subscribed_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub workspaces: Vec<WorkspaceMembership>,
    #[serde(default)]
    pub default_workspace_id: Option<WorkspaceId>,
}

impl SessionRecord {
    /// Pick the single active membership.
    ///
    /// Precedence: the hinted workspace (if the session is a member of it),
    /// then the first membership of the filtered type, then the default
    /// membership, then the first membership listed.
    pub fn select_workspace(
        &self,
        hint: Option<WorkspaceId>,
        type_filter: Option<WorkspaceType>,
    ) -> Option<&WorkspaceMembership> {
        let by_id = |id: WorkspaceId| self.workspaces.iter().find(|m| m.workspace_id == id);

        hint.and_then(by_id)
            .or_else(|| {
                type_filter.and_then(|ty| self.workspaces.iter().find(|m| m.workspace_type == ty))
            })
            .or_else(|| self.default_workspace_id.and_then(by_id))
            .or_else(|| self.workspaces.first())
    }
}

/// Identity snapshot for one request evaluation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSession {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub account_id: AccountId,
    pub email: String,
    pub phone: Option<String>,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub role: Role,
    pub permissions: CapabilitySet,
    pub cross_workspace: bool,
    pub status: AccountStatus,
    pub workspace_id: WorkspaceId,
    pub workspace_type: WorkspaceType,
    pub subscription_tier: Option<String>,
    pub subscribed_until: Option<DateTime<Utc>>,
    pub first_name: String,
    pub last_name: String,
}

impl ResolvedSession {
    pub fn is_suspended(&self) -> bool {
        self.status == AccountStatus::Suspended
    }

    /// Strictly-after comparison: a subscription ending exactly now is over.
    pub fn subscription_active(&self, now: DateTime<Utc>) -> bool {
        self.subscribed_until.is_some_and(|until| until > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(ty: WorkspaceType) -> WorkspaceMembership {
        WorkspaceMembership {
            workspace_id: WorkspaceId::new(),
            workspace_type: ty,
            role: None,
            permissions: vec![],
        }
    }

    fn record(workspaces: Vec<WorkspaceMembership>) -> SessionRecord {
        SessionRecord {
            user_id: UserId::new(),
            account_id: AccountId::new(),
            email: "ada@example.com".to_string(),
            phone: None,
            email_verified: true,
            phone_verified: false,
            role: Role::new("member"),
            permissions: vec![],
            status: AccountStatus::Active,
            subscription_tier: None,
            subscribed_until: None,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            workspaces,
            default_workspace_id: None,
        }
    }

    #[test]
    fn blank_tokens_are_not_sessions() {
        assert_eq!(SessionId::parse("   "), None);
        assert_eq!(SessionId::parse(" abc ").unwrap().as_str(), "abc");
    }

    #[test]
    fn selection_prefers_hint_then_type_then_default() {
        let student = membership(WorkspaceType::Student);
        let provider = membership(WorkspaceType::Provider);
        let staff = membership(WorkspaceType::Staff);
        let mut rec = record(vec![student.clone(), provider.clone(), staff.clone()]);
        rec.default_workspace_id = Some(staff.workspace_id);

        let pick = |hint, ty| rec.select_workspace(hint, ty).map(|m| m.workspace_id);

        assert_eq!(pick(Some(student.workspace_id), Some(WorkspaceType::Provider)), Some(student.workspace_id));
        assert_eq!(pick(None, Some(WorkspaceType::Provider)), Some(provider.workspace_id));
        assert_eq!(pick(None, None), Some(staff.workspace_id));
    }

    #[test]
    fn hint_for_foreign_workspace_is_ignored() {
        let student = membership(WorkspaceType::Student);
        let rec = record(vec![student.clone()]);

        let picked = rec.select_workspace(Some(WorkspaceId::new()), None).unwrap();
        assert_eq!(picked.workspace_id, student.workspace_id);
    }

    #[test]
    fn unmatched_type_filter_falls_back_to_default() {
        let student = membership(WorkspaceType::Student);
        let rec = record(vec![student.clone()]);

        let picked = rec.select_workspace(None, Some(WorkspaceType::Provider)).unwrap();
        assert_eq!(picked.workspace_type, WorkspaceType::Student);
    }

    #[test]
    fn no_memberships_selects_nothing() {
        assert!(record(vec![]).select_workspace(None, None).is_none());
    }

    #[test]
    fn record_decodes_with_defaults() {
        let json = serde_json::json!({
            "user_id": UserId::new(),
            "account_id": AccountId::new(),
            "email": "x@example.com",
            "role": "member",
            "workspaces": [{ "workspace_id": WorkspaceId::new(), "workspace_type": "student" }],
        });
        let rec: SessionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(rec.status, AccountStatus::Active);
        assert!(!rec.email_verified);
        assert!(rec.subscribed_until.is_none());
    }
}
