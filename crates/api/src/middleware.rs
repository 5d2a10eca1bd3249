use std::sync::Arc;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use edugate_auth::{AccessRequest, Authorizer, SessionId};
use edugate_core::WorkspaceId;

use crate::app::errors;

pub const SESSION_HEADER: &str = "x-session-id";
pub const WORKSPACE_HEADER: &str = "x-workspace-id";

#[derive(Clone)]
pub struct AuthState {
    pub authorizer: Arc<Authorizer>,
    pub session_cookie: Arc<str>,
}

/// Route guard: evaluates the matched route's policy and, on success, makes
/// the [`edugate_auth::AuthorizationContext`] available as an extension.
pub async fn authorization_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let session_id = extract_session_token(req.headers(), &state.session_cookie).and_then(SessionId::parse);
    let workspace_hint = extract_workspace_hint(req.headers());

    let request = AccessRequest::new(&route)
        .session(session_id.as_ref())
        .workspace_hint(workspace_hint);

    match state.authorizer.authorize(&request).await {
        Ok(verdict) if verdict.is_valid => {
            req.extensions_mut().insert(verdict.context);
            next.run(req).await
        }
        Ok(verdict) => errors::denied_response(&verdict),
        Err(e) => errors::infra_error_response(&e),
    }
}

/// Session token from, in order: the session cookie, an
/// `Authorization: Session|Bearer <token>` header, or `X-Session-Id`.
pub fn extract_session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim())
        .find(|t| !t.is_empty());

    // Empty values fall through to the next source.
    let from_authorization = || {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        value
            .strip_prefix("Session ")
            .or_else(|| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    };

    let from_header = || {
        headers
            .get(SESSION_HEADER)?
            .to_str()
            .ok()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    };

    from_cookie.or_else(from_authorization).or_else(from_header)
}

/// Optional workspace selection hint. Unparseable values are ignored.
pub fn extract_workspace_hint(headers: &HeaderMap) -> Option<WorkspaceId> {
    let raw = headers.get(WORKSPACE_HEADER)?.to_str().ok()?;
    match raw.parse::<WorkspaceId>() {
        Ok(id) => Some(id),
        Err(e) => {
            debug!(error = %e, "ignoring workspace hint");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(*k, HeaderValue::from_static(*v));
        }
        map
    }

    #[test]
    fn cookie_wins_over_headers() {
        let h = headers(&[
            ("cookie", "theme=dark; session_id=from-cookie"),
            ("authorization", "Bearer from-auth"),
            ("x-session-id", "from-header"),
        ]);
        assert_eq!(extract_session_token(&h, "session_id"), Some("from-cookie"));
    }

    #[test]
    fn authorization_schemes_then_custom_header() {
        let h = headers(&[("authorization", "Session abc")]);
        assert_eq!(extract_session_token(&h, "session_id"), Some("abc"));

        let h = headers(&[("authorization", "Basic Zm9vOmJhcg=="), ("x-session-id", "xyz")]);
        assert_eq!(extract_session_token(&h, "session_id"), Some("xyz"));
    }

    #[test]
    fn cookie_name_must_match_exactly() {
        let h = headers(&[("cookie", "old_session_id=nope")]);
        assert_eq!(extract_session_token(&h, "session_id"), None);
    }

    #[test]
    fn empty_tokens_are_absent() {
        let h = headers(&[("cookie", "session_id="), ("authorization", "Bearer "), ("x-session-id", "")]);
        assert_eq!(extract_session_token(&h, "session_id"), None);
    }

    #[test]
    fn empty_cookie_falls_back_to_headers() {
        let h = headers(&[("cookie", "session_id="), ("authorization", "Bearer live-token")]);
        assert_eq!(extract_session_token(&h, "session_id"), Some("live-token"));

        let h = headers(&[("cookie", "session_id="), ("authorization", "Session "), ("x-session-id", "from-header")]);
        assert_eq!(extract_session_token(&h, "session_id"), Some("from-header"));
    }

    #[test]
    fn workspace_hint_parses_or_is_ignored() {
        let id = WorkspaceId::new();
        let mut h = HeaderMap::new();
        h.insert(WORKSPACE_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(extract_workspace_hint(&h), Some(id));

        let h = headers(&[("x-workspace-id", "nope")]);
        assert_eq!(extract_workspace_hint(&h), None);
    }
}
