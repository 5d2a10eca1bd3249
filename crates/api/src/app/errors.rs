use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use edugate_auth::{AuthorizationVerdict, FailureCode, InfraError};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Transport mapping of the denial vocabulary.
pub fn status_for(code: FailureCode) -> StatusCode {
    match code {
        FailureCode::Unauthorized => StatusCode::UNAUTHORIZED,
        FailureCode::SubscriptionRequired => StatusCode::PAYMENT_REQUIRED,
        FailureCode::AccountSuspended
        | FailureCode::EmailNotVerified
        | FailureCode::PhoneNotVerified
        | FailureCode::PermissionDenied
        | FailureCode::WorkspaceMismatch
        | FailureCode::TwoFactorEmailRequired
        | FailureCode::TwoFactorPhoneRequired
        | FailureCode::TwoFactorTypeUnknown => StatusCode::FORBIDDEN,
    }
}

/// Body carries the stable code and the stage that refused, so clients can
/// pick the follow-up (login, verify email, step-up, upgrade).
pub fn denied_response(verdict: &AuthorizationVerdict) -> axum::response::Response {
    let code = verdict.code.unwrap_or(FailureCode::Unauthorized);
    (
        status_for(code),
        axum::Json(json!({
            "error": code.as_str(),
            "step": verdict.step.as_str(),
        })),
    )
        .into_response()
}

/// "Could not determine" is never reported as 401/403.
pub fn infra_error_response(err: &InfraError) -> axum::response::Response {
    if err.is_transient() {
        json_error(StatusCode::SERVICE_UNAVAILABLE, "auth_unavailable", err.to_string())
    } else {
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "auth_misconfigured", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use edugate_auth::CacheError;

    use super::*;

    #[test]
    fn only_missing_session_maps_to_401() {
        assert_eq!(status_for(FailureCode::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(FailureCode::SubscriptionRequired), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(status_for(FailureCode::WorkspaceMismatch), StatusCode::FORBIDDEN);
        assert_eq!(status_for(FailureCode::TwoFactorPhoneRequired), StatusCode::FORBIDDEN);
    }

    #[test]
    fn infra_errors_map_to_5xx() {
        let outage = InfraError::Cache(CacheError::Unavailable("down".to_string()));
        assert_eq!(infra_error_response(&outage).status(), StatusCode::SERVICE_UNAVAILABLE);

        let unknown = InfraError::UnknownRoute("/x".to_string());
        assert_eq!(infra_error_response(&unknown).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
