//! Session resolution: `session:{id}` → one [`ResolvedSession`].

use std::sync::Arc;

use tracing::{debug, instrument};

use edugate_core::WorkspaceId;

use crate::cache::session_key;
use crate::{
    CapabilitySet, InfraError, ResolvedSession, RoleTable, SessionCache, SessionId, SessionRecord,
    WorkspaceType,
};

/// Read-only view over the session cache.
///
/// A miss is final: there is no fallback to a durable store. Keeping cache
/// population on the login/switch path means the fast and slow
/// representations can never disagree mid-request.
#[derive(Clone)]
pub struct SessionResolver {
    cache: Arc<dyn SessionCache>,
    roles: Arc<RoleTable>,
}

impl SessionResolver {
    pub fn new(cache: Arc<dyn SessionCache>, roles: Arc<RoleTable>) -> Self {
        Self { cache, roles }
    }

    /// `Ok(None)` means "no such session" (unauthenticated). `Err` means the
    /// cache could not answer or returned something undecodable.
    #[instrument(skip_all, fields(hint = ?workspace_hint, filter = ?workspace_type))]
    pub async fn resolve(
        &self,
        session_id: &SessionId,
        workspace_hint: Option<WorkspaceId>,
        workspace_type: Option<WorkspaceType>,
    ) -> Result<Option<ResolvedSession>, InfraError> {
        let Some(raw) = self.cache.get(&session_key(session_id)).await? else {
            debug!("session cache miss");
            return Ok(None);
        };

        let record: SessionRecord = serde_json::from_str(&raw)
            .map_err(|e| InfraError::MalformedRecord(e.to_string()))?;

        self.project(session_id, &record, workspace_hint, workspace_type)
            .map(Some)
    }

    fn project(
        &self,
        session_id: &SessionId,
        record: &SessionRecord,
        workspace_hint: Option<WorkspaceId>,
        workspace_type: Option<WorkspaceType>,
    ) -> Result<ResolvedSession, InfraError> {
        let membership = record
            .select_workspace(workspace_hint, workspace_type)
            .ok_or_else(|| InfraError::MalformedRecord("session has no workspace memberships".to_string()))?;

        let role = membership.role.clone().unwrap_or_else(|| record.role.clone());

        let grants = record
            .permissions
            .iter()
            .chain(&membership.permissions)
            .chain(self.roles.permissions_for(&role))
            .cloned();
        let permissions = CapabilitySet::for_workspace(membership.workspace_type, grants);

        debug!(
            account_id = %record.account_id,
            workspace_id = %membership.workspace_id,
            workspace_type = %membership.workspace_type,
            role = %role,
            "session resolved"
        );

        Ok(ResolvedSession {
            session_id: session_id.clone(),
            user_id: record.user_id,
            account_id: record.account_id,
            email: record.email.clone(),
            phone: record.phone.clone(),
            email_verified: record.email_verified,
            phone_verified: record.phone_verified,
            cross_workspace: self.roles.has_cross_workspace_override(&role),
            role,
            permissions,
            status: record.status,
            workspace_id: membership.workspace_id,
            workspace_type: membership.workspace_type,
            subscription_tier: record.subscription_tier.clone(),
            subscribed_until: record.subscribed_until,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
        })
    }
}

impl core::fmt::Debug for SessionResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionResolver").finish_non_exhaustive()
    }
}
