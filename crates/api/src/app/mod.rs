//! HTTP application wiring (Axum router + policy registry).
//!
//! - `routes.rs`: handlers, which only ever see an `AuthorizationContext`
//! - `services.rs`: cache/registry/pipeline construction from config
//! - `errors.rs`: verdict and infrastructure-failure responses

use std::sync::Arc;

use axum::{Router, routing::get};

use edugate_auth::{
    Authorizer, PolicyError, RoutePolicy, RoutePolicyRegistry, TwoFactorChannel, WorkspaceType,
};

use crate::middleware;

pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(authorizer: Arc<Authorizer>, session_cookie: impl Into<Arc<str>>) -> Router {
    let auth_state = middleware::AuthState {
        authorizer,
        session_cookie: session_cookie.into(),
    };

    let guarded = routes::router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::authorization_middleware,
    ));

    Router::new()
        .route("/health", get(routes::health))
        .merge(guarded)
}

/// Policies for [`routes::GUARDED_ROUTES`] when no policy file is configured.
pub fn default_registry() -> Result<RoutePolicyRegistry, PolicyError> {
    RoutePolicyRegistry::new()
        .register("/catalog", RoutePolicy::public())?
        .register("/me", RoutePolicy::authenticated())?
        .register(
            "/provider/cards",
            RoutePolicy::authenticated()
                .workspace(WorkspaceType::Provider)
                .permission("PROVIDER_CARD_CREATE")
                .require_email_verification(),
        )?
        .register(
            "/staff/reports",
            RoutePolicy::authenticated()
                .workspace(WorkspaceType::Staff)
                .permission("REPORT_VIEW"),
        )?
        .register(
            "/account/security",
            RoutePolicy::authenticated().require_two_factor(TwoFactorChannel::Email),
        )?
        .register(
            "/premium/lessons",
            RoutePolicy::authenticated()
                .workspace(WorkspaceType::Student)
                .require_subscription(),
        )
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use edugate_auth::{InMemorySessionCache, RoleTable, SystemClock};

    use super::*;

    fn app(cache: Arc<InMemorySessionCache>) -> Router {
        let authorizer = Authorizer::new(
            cache,
            Arc::new(default_registry().unwrap()),
            Arc::new(RoleTable::standard()),
            Arc::new(SystemClock),
        );
        build_app(Arc::new(authorizer), "session_id")
    }

    #[test]
    fn default_registry_covers_every_guarded_route() {
        let registry = default_registry().unwrap();
        services::ensure_guarded_routes_covered(&registry).unwrap();
    }

    #[test]
    fn missing_policy_is_reported() {
        let registry = RoutePolicyRegistry::new().register("/me", RoutePolicy::authenticated()).unwrap();
        let err = services::ensure_guarded_routes_covered(&registry).unwrap_err();
        assert!(err.to_string().contains("/catalog"));
    }

    #[tokio::test]
    async fn health_is_unguarded() {
        let cache = Arc::new(InMemorySessionCache::default());
        cache.set_offline(true);
        let res = app(cache)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn guest_sees_public_catalog() {
        let res = app(Arc::new(InMemorySessionCache::default()))
            .oneshot(Request::get("/catalog").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["viewer"], "guest");
        assert_eq!(body["personalized"], false);
    }

    #[tokio::test]
    async fn cache_outage_maps_to_503() {
        let cache = Arc::new(InMemorySessionCache::default());
        cache.set_offline(true);
        let res = app(cache)
            .oneshot(
                Request::get("/me")
                    .header("x-session-id", "anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
