use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use edugate_auth::{AuthorizationContext, Permission};

/// Routes served behind the authorization guard. Every entry must have a
/// registered policy (checked at startup).
pub const GUARDED_ROUTES: [&str; 6] = [
    "/catalog",
    "/me",
    "/provider/cards",
    "/staff/reports",
    "/account/security",
    "/premium/lessons",
];

pub fn router() -> Router {
    Router::new()
        .route("/catalog", get(catalog))
        .route("/me", get(whoami))
        .route("/provider/cards", post(create_card))
        .route("/staff/reports", get(reports))
        .route("/account/security", post(update_security))
        .route("/premium/lessons", get(premium_lessons))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn catalog(Extension(ctx): Extension<AuthorizationContext>) -> impl IntoResponse {
    Json(json!({
        "viewer": ctx.user_id,
        "personalized": !ctx.is_guest(),
    }))
}

pub async fn whoami(Extension(ctx): Extension<AuthorizationContext>) -> impl IntoResponse {
    Json(ctx)
}

pub async fn create_card(Extension(ctx): Extension<AuthorizationContext>) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(json!({
            "workspace_id": ctx.active_workspace_id,
            "created_by": ctx.account_id,
        })),
    )
}

pub async fn reports(Extension(ctx): Extension<AuthorizationContext>) -> impl IntoResponse {
    Json(json!({
        "workspace_id": ctx.active_workspace_id,
        "can_export": ctx.can(&Permission::new("REPORT_EXPORT")),
    }))
}

pub async fn update_security(Extension(ctx): Extension<AuthorizationContext>) -> impl IntoResponse {
    Json(json!({ "account_id": ctx.account_id, "updated": true }))
}

pub async fn premium_lessons(Extension(ctx): Extension<AuthorizationContext>) -> impl IntoResponse {
    Json(json!({ "account_id": ctx.account_id, "lessons": [] }))
}
