//! Pipeline orchestrator.
//!
//! Runs [`Stage::ORDER`] over one resolved session and stops at the first
//! failing stage. Stages after the failure never run, and neither do their
//! cache reads, so `step` on the verdict is authoritative for why a request
//! was refused.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};

use edugate_core::WorkspaceId;

use crate::steps::{self, SessionOutcome};
use crate::{
    AuthorizationContext, Clock, FailureCode, InfraError, Permission, ResolvedSession, RoleTable,
    RoutePolicy, RoutePolicyRegistry, SessionCache, SessionId, SessionResolver, Stage, StepResult,
    TwoFactorGate,
};

/// Final answer for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationVerdict {
    pub is_valid: bool,
    pub code: Option<FailureCode>,
    /// Identity known when evaluation stopped (present on most denials too,
    /// for audit logging).
    pub identity: Option<ResolvedSession>,
    pub context: AuthorizationContext,
    /// Stage that produced the final state.
    pub step: Stage,
    /// Stages evaluated, in order.
    pub trace: Vec<Stage>,
}

/// One inbound request, as seen by the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    pub route: &'a str,
    pub session_id: Option<&'a SessionId>,
    pub workspace_hint: Option<WorkspaceId>,
    pub extra_permissions: &'a [Permission],
}

impl<'a> AccessRequest<'a> {
    pub fn new(route: &'a str) -> Self {
        Self {
            route,
            session_id: None,
            workspace_hint: None,
            extra_permissions: &[],
        }
    }

    pub fn session(mut self, session_id: Option<&'a SessionId>) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn workspace_hint(mut self, workspace_id: Option<WorkspaceId>) -> Self {
        self.workspace_hint = workspace_id;
        self
    }

    pub fn extra_permissions(mut self, permissions: &'a [Permission]) -> Self {
        self.extra_permissions = permissions;
        self
    }
}

/// Per-request scratch state; dropped with the verdict.
struct Evaluation {
    now: DateTime<Utc>,
    trace: Vec<Stage>,
}

impl Evaluation {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            trace: Vec::with_capacity(Stage::ORDER.len()),
        }
    }

    fn enter(&mut self, stage: Stage) {
        self.trace.push(stage);
    }

    fn current(&self) -> Stage {
        self.trace.last().copied().unwrap_or(Stage::Session)
    }

    fn guest(self) -> AuthorizationVerdict {
        AuthorizationVerdict {
            is_valid: true,
            code: None,
            identity: None,
            context: AuthorizationContext::guest(),
            step: self.current(),
            trace: self.trace,
        }
    }

    fn reject(self, identity: Option<ResolvedSession>, code: FailureCode) -> AuthorizationVerdict {
        let context = identity
            .as_ref()
            .map(|s| AuthorizationContext::from_session(s, self.now))
            .unwrap_or_default();
        AuthorizationVerdict {
            is_valid: false,
            code: Some(code),
            identity,
            context,
            step: self.current(),
            trace: self.trace,
        }
    }

    fn allow(self, identity: ResolvedSession) -> AuthorizationVerdict {
        AuthorizationVerdict {
            is_valid: true,
            code: None,
            context: AuthorizationContext::from_session(&identity, self.now),
            identity: Some(identity),
            step: self.current(),
            trace: self.trace,
        }
    }
}

/// The request authorization pipeline.
///
/// Holds only injected collaborators; every evaluation is independent, so one
/// instance can be shared behind an `Arc` by all request handlers.
#[derive(Debug, Clone)]
pub struct Authorizer {
    resolver: SessionResolver,
    gate: TwoFactorGate,
    registry: Arc<RoutePolicyRegistry>,
    clock: Arc<dyn Clock>,
}

impl Authorizer {
    pub fn new(
        cache: Arc<dyn SessionCache>,
        registry: Arc<RoutePolicyRegistry>,
        roles: Arc<RoleTable>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            resolver: SessionResolver::new(cache.clone(), roles),
            gate: TwoFactorGate::new(cache),
            registry,
            clock,
        }
    }

    pub fn registry(&self) -> &RoutePolicyRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &SessionResolver {
        &self.resolver
    }

    /// Look up the route's policy, resolve the session scoped to the route's
    /// workspace type, and evaluate.
    #[instrument(skip_all, fields(route = request.route))]
    pub async fn authorize(
        &self,
        request: &AccessRequest<'_>,
    ) -> Result<AuthorizationVerdict, InfraError> {
        let result = self.authorize_inner(request).await;

        match &result {
            Ok(v) if v.is_valid => info!(
                step = %v.step,
                account_id = ?v.context.account_id,
                guest = v.context.is_guest(),
                "request authorized"
            ),
            Ok(v) => warn!(
                step = %v.step,
                code = ?v.code,
                account_id = ?v.context.account_id,
                "request denied"
            ),
            Err(e) => error!(error = %e, "authorization could not be determined"),
        }

        result
    }

    async fn authorize_inner(
        &self,
        request: &AccessRequest<'_>,
    ) -> Result<AuthorizationVerdict, InfraError> {
        let policy = self
            .registry
            .get(request.route)
            .ok_or_else(|| InfraError::UnknownRoute(request.route.to_string()))?;

        let session = match request.session_id {
            Some(id) => {
                self.resolver
                    .resolve(id, request.workspace_hint, policy.required_workspace())
                    .await?
            }
            None => None,
        };

        self.evaluate(session, &policy, request.extra_permissions).await
    }

    /// Run every stage against an already-resolved (or absent) session.
    pub async fn evaluate(
        &self,
        session: Option<ResolvedSession>,
        policy: &RoutePolicy,
        extra_permissions: &[Permission],
    ) -> Result<AuthorizationVerdict, InfraError> {
        policy.validate()?;

        let now = self.clock.now();
        let mut eval = Evaluation::new(now);

        eval.enter(Stage::Session);
        let outcome = steps::check_session(session.as_ref(), policy);
        let session = match (outcome, session) {
            (SessionOutcome::Authenticated, Some(session)) => session,
            (SessionOutcome::Rejected(code), _) => return Ok(eval.reject(None, code)),
            _ => return Ok(eval.guest()),
        };

        for stage in &Stage::ORDER[1..] {
            eval.enter(*stage);
            let result = match stage {
                Stage::Status => steps::check_status(&session, policy),
                Stage::Workspace => steps::check_workspace(&session, policy),
                Stage::Permission => steps::check_permissions(&session, policy, extra_permissions),
                Stage::TwoFactor => {
                    let verified = if policy.two_factor_auth() {
                        Some(self.gate.is_verified(&session.session_id).await?)
                    } else {
                        None
                    };
                    steps::check_two_factor(policy, verified)
                }
                Stage::Subscription => steps::check_subscription(&session, policy, now),
                Stage::Session => StepResult::pass(),
            };

            if let Some(code) = result.failure() {
                return Ok(eval.reject(Some(session), code));
            }
        }

        Ok(eval.allow(session))
    }
}
