//! Declarative per-route security requirements.

use serde::Deserialize;
use thiserror::Error;

use crate::{Permission, TwoFactorChannel, WorkspaceType};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("unknown workspace type '{0}'")]
    UnknownWorkspace(String),

    #[error("unknown two-factor channel '{0}'")]
    UnknownTwoFactorChannel(String),

    #[error("permission token must not be empty")]
    EmptyPermission,

    #[error("twoFactorAuthType is set but twoFactorAuth is false")]
    ChannelWithoutTwoFactor,

    #[error("route '{0}' is registered twice")]
    DuplicateRoute(String),

    #[error("policy document could not be parsed: {0}")]
    Parse(String),
}

/// Security requirements for one route. Built once at registration time and
/// immutable afterwards.
///
/// ```
/// use edugate_auth::{Permission, RoutePolicy, TwoFactorChannel, WorkspaceType};
///
/// let policy = RoutePolicy::authenticated()
///     .workspace(WorkspaceType::Provider)
///     .permission(Permission::new("PROVIDER_PAYOUT_UPDATE"))
///     .require_two_factor(TwoFactorChannel::Phone);
/// assert!(policy.two_factor_auth());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RoutePolicySpec")]
pub struct RoutePolicy {
    auth_required: bool,
    workspace: Option<WorkspaceType>,
    permission: Option<Permission>,
    need_email_verification: bool,
    need_phone_verification: bool,
    check_subscription_status: bool,
    two_factor_auth: bool,
    two_factor_auth_type: TwoFactorChannel,
}

impl RoutePolicy {
    /// Route that requires a session and nothing else.
    pub fn authenticated() -> Self {
        Self {
            auth_required: true,
            workspace: None,
            permission: None,
            need_email_verification: false,
            need_phone_verification: false,
            check_subscription_status: false,
            two_factor_auth: false,
            two_factor_auth_type: TwoFactorChannel::default(),
        }
    }

    /// Route open to guests; a session, if present, is still evaluated.
    pub fn public() -> Self {
        Self {
            auth_required: false,
            ..Self::authenticated()
        }
    }

    pub fn workspace(mut self, workspace: WorkspaceType) -> Self {
        self.workspace = Some(workspace);
        self
    }

    pub fn permission(mut self, permission: impl Into<Permission>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn require_email_verification(mut self) -> Self {
        self.need_email_verification = true;
        self
    }

    pub fn require_phone_verification(mut self) -> Self {
        self.need_phone_verification = true;
        self
    }

    pub fn require_subscription(mut self) -> Self {
        self.check_subscription_status = true;
        self
    }

    pub fn require_two_factor(mut self, channel: TwoFactorChannel) -> Self {
        self.two_factor_auth = true;
        self.two_factor_auth_type = channel;
        self
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        match &self.permission {
            Some(p) if p.is_empty() => Err(PolicyError::EmptyPermission),
            _ => Ok(()),
        }
    }

    pub fn auth_required(&self) -> bool {
        self.auth_required
    }

    pub fn required_workspace(&self) -> Option<WorkspaceType> {
        self.workspace
    }

    pub fn required_permission(&self) -> Option<&Permission> {
        self.permission.as_ref()
    }

    pub fn need_email_verification(&self) -> bool {
        self.need_email_verification
    }

    pub fn need_phone_verification(&self) -> bool {
        self.need_phone_verification
    }

    pub fn check_subscription_status(&self) -> bool {
        self.check_subscription_status
    }

    pub fn two_factor_auth(&self) -> bool {
        self.two_factor_auth
    }

    pub fn two_factor_channel(&self) -> TwoFactorChannel {
        self.two_factor_auth_type
    }
}

/// Wire form of a policy as route owners write it (camelCase JSON). Every
/// field is optional; `authRequired` defaults to `true`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RoutePolicySpec {
    #[serde(default = "default_auth_required")]
    pub auth_required: bool,
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub need_email_verification: bool,
    #[serde(default)]
    pub need_phone_verification: bool,
    #[serde(default)]
    pub check_subscription_status: bool,
    #[serde(default)]
    pub two_factor_auth: bool,
    #[serde(default)]
    pub two_factor_auth_type: Option<String>,
}

fn default_auth_required() -> bool {
    true
}

impl TryFrom<RoutePolicySpec> for RoutePolicy {
    type Error = PolicyError;

    fn try_from(spec: RoutePolicySpec) -> Result<Self, Self::Error> {
        let workspace = spec
            .workspace
            .map(|w| w.parse::<WorkspaceType>().map_err(|_| PolicyError::UnknownWorkspace(w)))
            .transpose()?;

        let two_factor_auth_type = match spec.two_factor_auth_type {
            Some(_) if !spec.two_factor_auth => return Err(PolicyError::ChannelWithoutTwoFactor),
            Some(raw) => raw
                .parse::<TwoFactorChannel>()
                .map_err(PolicyError::UnknownTwoFactorChannel)?,
            None => TwoFactorChannel::default(),
        };

        let policy = RoutePolicy {
            auth_required: spec.auth_required,
            workspace,
            permission: spec.permission.map(Permission::new),
            need_email_verification: spec.need_email_verification,
            need_phone_verification: spec.need_phone_verification,
            check_subscription_status: spec.check_subscription_status,
            two_factor_auth: spec.two_factor_auth,
            two_factor_auth_type,
        };
        policy.validate()?;
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Result<RoutePolicy, String> {
        serde_json::from_value::<RoutePolicy>(json).map_err(|e| e.to_string())
    }

    #[test]
    fn empty_document_is_an_authenticated_route() {
        assert_eq!(parse(serde_json::json!({})).unwrap(), RoutePolicy::authenticated());
    }

    #[test]
    fn full_document_maps_every_field() {
        let policy = parse(serde_json::json!({
            "authRequired": true,
            "workspace": "provider",
            "permission": "PROVIDER_CARD_CREATE",
            "needEmailVerification": true,
            "needPhoneVerification": true,
            "checkSubscriptionStatus": true,
            "twoFactorAuth": true,
            "twoFactorAuthType": "phone",
        }))
        .unwrap();

        let expected = RoutePolicy::authenticated()
            .workspace(WorkspaceType::Provider)
            .permission("PROVIDER_CARD_CREATE")
            .require_email_verification()
            .require_phone_verification()
            .require_subscription()
            .require_two_factor(TwoFactorChannel::Phone);
        assert_eq!(policy, expected);
    }

    #[test]
    fn malformed_documents_are_rejected() {
        let cases = [
            (serde_json::json!({ "workspace": "admin" }), "unknown workspace type"),
            (serde_json::json!({ "twoFactorAuth": true, "twoFactorAuthType": "sms" }), "unknown two-factor channel"),
            (serde_json::json!({ "twoFactorAuthType": "email" }), "twoFactorAuth is false"),
            (serde_json::json!({ "permission": "  " }), "must not be empty"),
            (serde_json::json!({ "permision": "X" }), "unknown field"),
        ];

        for (doc, needle) in cases {
            let err = parse(doc.clone()).unwrap_err();
            assert!(err.contains(needle), "{doc}: {err}");
        }
    }

    #[test]
    fn builder_policies_validate_permission() {
        assert_eq!(
            RoutePolicy::authenticated().permission("").validate(),
            Err(PolicyError::EmptyPermission)
        );
        assert!(RoutePolicy::public().validate().is_ok());
    }
}
