use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::AppState;

/// Route classification the guard decides over. The sets are static
/// policy, not request state.
#[derive(Debug, Clone)]
pub struct RouteTable {
    /// Paths reachable without a session.
    pub public_routes: &'static [&'static str],
    /// Login/register/reset pages: pass anonymous callers through,
    /// bounce already-authenticated ones to the default destination.
    pub auth_routes: &'static [&'static str],
    /// Everything under this prefix is the auth machinery itself and is
    /// never redirected.
    pub api_auth_prefix: &'static str,
    pub login_route: &'static str,
    pub default_login_redirect: &'static str,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            public_routes: &["/", "/auth/new-verification"],
            auth_routes: &[
                "/auth/login",
                "/auth/register",
                "/auth/error",
                "/auth/reset",
                "/auth/new-password",
            ],
            api_auth_prefix: "/api/auth",
            login_route: "/auth/login",
            default_login_redirect: "/settings",
        }
    }
}

impl RouteTable {
    /// Table the API server runs with: its whole surface lives under the
    /// auth prefix, and only the root and health probe are public pages.
    pub fn for_api_server() -> Self {
        Self {
            public_routes: &["/", "/health"],
            auth_routes: &[],
            api_auth_prefix: "/auth",
            login_route: "/auth/login",
            default_login_redirect: "/settings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    Redirect(String),
}

/// Pure per-request policy. Evaluation order matters: the API-auth prefix
/// must win over everything, and the auth-route check must precede the
/// public check or a logged-in user on the login page would loop between
/// the two redirects.
pub fn decide(
    table: &RouteTable,
    path: &str,
    query: Option<&str>,
    is_logged_in: bool,
) -> GuardDecision {
    if path.starts_with(table.api_auth_prefix) {
        return GuardDecision::Pass;
    }

    if table.auth_routes.contains(&path) {
        if is_logged_in {
            return GuardDecision::Redirect(table.default_login_redirect.to_string());
        }
        return GuardDecision::Pass;
    }

    if !is_logged_in && !table.public_routes.contains(&path) {
        // Carry the original target so the login flow can return there.
        let mut callback = path.to_string();
        if let Some(query) = query {
            callback.push('?');
            callback.push_str(query);
        }

        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("callbackUrl", &callback)
            .finish();

        return GuardDecision::Redirect(format!("{}?{}", table.login_route, encoded));
    }

    GuardDecision::Pass
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Guard applied to the whole router. "Logged in" means the request
/// carries a bearer token the session issuer still accepts.
pub async fn route_guard(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let is_logged_in = bearer_token(request.headers())
        .map(|token| state.sessions.verify(token).is_ok())
        .unwrap_or(false);

    let decision = decide(
        &state.routes,
        request.uri().path(),
        request.uri().query(),
        is_logged_in,
    );

    match decision {
        GuardDecision::Pass => next.run(request).await,
        GuardDecision::Redirect(to) => Redirect::temporary(&to).into_response(),
    }
}
