//! Validation steps: one pure predicate per stage.
//!
//! Each step sees the resolved session (already known to exist, except for
//! [`check_session`]) and the route policy, and answers with a
//! [`StepResult`]. The only step that touches the cache, two-factor, is
//! driven by the orchestrator through [`crate::TwoFactorGate`] and reduced to
//! [`check_two_factor`] here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Permission, ResolvedSession, RoutePolicy};

/// Stable denial vocabulary surfaced to callers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCode {
    #[serde(rename = "UNAUTHORIZED")]
    Unauthorized,
    #[serde(rename = "ACCOUNT_SUSPENDED")]
    AccountSuspended,
    #[serde(rename = "EMAIL_NOT_VERIFIED")]
    EmailNotVerified,
    #[serde(rename = "PHONE_NOT_VERIFIED")]
    PhoneNotVerified,
    #[serde(rename = "PERMISSION_DENIED")]
    PermissionDenied,
    #[serde(rename = "WORKSPACE_MISMATCH")]
    WorkspaceMismatch,
    #[serde(rename = "2FA_EMAIL_REQUIRED")]
    TwoFactorEmailRequired,
    #[serde(rename = "2FA_PHONE_REQUIRED")]
    TwoFactorPhoneRequired,
    /// Part of the published vocabulary. Channels are a closed enum checked
    /// when policies are loaded, so evaluation itself never produces it.
    #[serde(rename = "2FA_TYPE_UNKNOWN")]
    TwoFactorTypeUnknown,
    #[serde(rename = "SUBSCRIPTION_REQUIRED")]
    SubscriptionRequired,
}

impl FailureCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::AccountSuspended => "ACCOUNT_SUSPENDED",
            Self::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            Self::PhoneNotVerified => "PHONE_NOT_VERIFIED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::WorkspaceMismatch => "WORKSPACE_MISMATCH",
            Self::TwoFactorEmailRequired => "2FA_EMAIL_REQUIRED",
            Self::TwoFactorPhoneRequired => "2FA_PHONE_REQUIRED",
            Self::TwoFactorTypeUnknown => "2FA_TYPE_UNKNOWN",
            Self::SubscriptionRequired => "SUBSCRIPTION_REQUIRED",
        }
    }
}

impl core::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stages, in evaluation order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Session,
    Status,
    Workspace,
    Permission,
    TwoFactor,
    Subscription,
}

impl Stage {
    pub const ORDER: [Stage; 6] = [
        Self::Session,
        Self::Status,
        Self::Workspace,
        Self::Permission,
        Self::TwoFactor,
        Self::Subscription,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Status => "status",
            Self::Workspace => "workspace",
            Self::Permission => "permission",
            Self::TwoFactor => "two_factor",
            Self::Subscription => "subscription",
        }
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one stage. A failure always carries its code; the only way to
/// build one is [`StepResult::fail`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StepResult {
    success: bool,
    code: Option<FailureCode>,
}

impl StepResult {
    pub const fn pass() -> Self {
        Self {
            success: true,
            code: None,
        }
    }

    pub const fn fail(code: FailureCode) -> Self {
        Self {
            success: false,
            code: Some(code),
        }
    }

    pub const fn is_success(self) -> bool {
        self.success
    }

    pub const fn code(self) -> Option<FailureCode> {
        self.code
    }

    /// The refusal code, if this stage refused.
    pub const fn failure(self) -> Option<FailureCode> {
        if self.success { None } else { self.code }
    }

    const fn require(ok: bool, code: FailureCode) -> Self {
        if ok { Self::pass() } else { Self::fail(code) }
    }
}

/// Outcome of the session stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A session exists; later stages run.
    Authenticated,
    /// No session on a route that allows it; evaluation ends successfully.
    Guest,
    Rejected(FailureCode),
}

pub fn check_session(session: Option<&ResolvedSession>, policy: &RoutePolicy) -> SessionOutcome {
    match session {
        Some(_) => SessionOutcome::Authenticated,
        None if policy.auth_required() => SessionOutcome::Rejected(FailureCode::Unauthorized),
        None => SessionOutcome::Guest,
    }
}

pub fn check_status(session: &ResolvedSession, policy: &RoutePolicy) -> StepResult {
    if session.is_suspended() {
        return StepResult::fail(FailureCode::AccountSuspended);
    }
    if policy.need_email_verification() && !session.email_verified {
        return StepResult::fail(FailureCode::EmailNotVerified);
    }
    if policy.need_phone_verification() && !session.phone_verified {
        return StepResult::fail(FailureCode::PhoneNotVerified);
    }
    StepResult::pass()
}

pub fn check_workspace(session: &ResolvedSession, policy: &RoutePolicy) -> StepResult {
    match policy.required_workspace() {
        Some(required) if required != session.workspace_type && !session.cross_workspace => {
            StepResult::fail(FailureCode::WorkspaceMismatch)
        }
        _ => StepResult::pass(),
    }
}

/// The route's permission plus any caller-supplied extras must all hold.
pub fn check_permissions(
    session: &ResolvedSession,
    policy: &RoutePolicy,
    extra: &[Permission],
) -> StepResult {
    let missing = session
        .permissions
        .first_missing(policy.required_permission().into_iter().chain(extra));
    StepResult::require(missing.is_none(), FailureCode::PermissionDenied)
}

/// `verified` is the gate's answer; `None` when the policy does not ask for
/// step-up (the gate is then never consulted).
pub fn check_two_factor(policy: &RoutePolicy, verified: Option<bool>) -> StepResult {
    if !policy.two_factor_auth() {
        return StepResult::pass();
    }
    StepResult::require(
        verified.unwrap_or(false),
        policy.two_factor_channel().required_code(),
    )
}

pub fn check_subscription(
    session: &ResolvedSession,
    policy: &RoutePolicy,
    now: DateTime<Utc>,
) -> StepResult {
    if !policy.check_subscription_status() {
        return StepResult::pass();
    }
    StepResult::require(session.subscription_active(now), FailureCode::SubscriptionRequired)
}
