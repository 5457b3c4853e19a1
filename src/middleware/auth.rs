//! Session gate: resolves the caller's identity from the session cookies (or
//! a bearer token) and decides whether the request may proceed.

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, SET_COOKIE},
        HeaderMap,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::auth::cookies::{append_set_cookies, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::auth::{Identity, IdentityProvider, Session};
use crate::error::ApiError;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

const PROTECTED_PAGES: &[&str] = &[
    "/dashboard",
    "/clients",
    "/suppliers",
    "/services",
    "/job-positions",
    "/products",
    "/equipment",
    "/personnel",
    "/budgets",
    "/invoices",
    "/settings",
];

const AUTH_PAGES: &[&str] = &["/login", "/signup"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// `/api/*` except the health probe
    Api,
    ProtectedPage,
    /// Pages only meaningful without a session
    AuthPage,
    Public,
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

pub fn classify(path: &str) -> PathKind {
    if path.starts_with("/api/") && path != "/api/health" {
        PathKind::Api
    } else if PROTECTED_PAGES.iter().any(|p| under(path, p)) {
        PathKind::ProtectedPage
    } else if AUTH_PAGES.iter().any(|p| under(path, p)) {
        PathKind::AuthPage
    } else {
        PathKind::Public
    }
}

/// Tokens presented with a request
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// The bearer header wins over the access cookie.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let jar = CookieJar::from_headers(headers);
        let cookie = |name: &str| {
            jar.get(name)
                .map(Cookie::value)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Self {
            access_token: bearer.or_else(|| cookie(ACCESS_TOKEN_COOKIE)),
            refresh_token: cookie(REFRESH_TOKEN_COOKIE),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// What the gate must do to the session cookies on the way out
#[derive(Debug)]
pub enum CookieUpdate {
    Keep,
    Refreshed(Session),
    Clear,
}

/// Resolve credentials to an identity, refreshing once if the access token
/// is rejected. Any failure yields no identity.
pub async fn resolve(provider: &dyn IdentityProvider, credentials: &Credentials) -> (Option<Identity>, CookieUpdate) {
    if credentials.is_empty() {
        return (None, CookieUpdate::Keep);
    }

    if let Some(token) = credentials.access_token.as_deref() {
        match provider.get_user(token).await {
            Ok(identity) => return (Some(identity), CookieUpdate::Keep),
            Err(e) => tracing::debug!("Access token rejected: {}", e),
        }
    }

    if let Some(refresh_token) = credentials.refresh_token.as_deref() {
        match provider.refresh(refresh_token).await {
            Ok(session) => {
                tracing::debug!("Refreshed session for {}", session.user.id);
                return (Some(session.user.clone()), CookieUpdate::Refreshed(session));
            }
            Err(e) => tracing::info!("Session refresh failed: {}", e),
        }
    }

    (None, CookieUpdate::Clear)
}

fn login_redirect(path: &str) -> Response {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect_to", path)
        .finish();
    Redirect::temporary(&format!("{}?{}", LOGIN_PATH, query)).into_response()
}

/// Whether a handler already wrote the session cookies (login, signup,
/// callback, logout); its cookies win over the gate's.
fn sets_session_cookie(headers: &HeaderMap) -> bool {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split_once('=').map(|(name, _)| name.trim()))
        .any(|name| name == ACCESS_TOKEN_COOKIE || name == REFRESH_TOKEN_COOKIE)
}

fn with_cookies(mut response: Response, state: &AppState, update: &CookieUpdate) -> Response {
    if sets_session_cookie(response.headers()) {
        return response;
    }

    let cookies = state.cookies();
    match update {
        CookieUpdate::Keep => {}
        CookieUpdate::Refreshed(session) => append_set_cookies(response.headers_mut(), &cookies.for_session(session)),
        CookieUpdate::Clear => append_set_cookies(response.headers_mut(), &cookies.cleared()),
    }
    response
}

/// Runs before every route. Places the resolved [`Identity`] in the request
/// extensions; handlers read it through [`super::CurrentUser`].
pub async fn session_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let kind = classify(&path);

    let credentials = Credentials::from_headers(request.headers());
    let (identity, update) = resolve(state.identity.as_ref(), &credentials).await;

    if !state.config.auth_bypass() {
        let decision = match (kind, &identity) {
            (PathKind::Api, None) => Some(ApiError::unauthorized("Unauthorized").into_response()),
            (PathKind::ProtectedPage, None) => Some(login_redirect(&path)),
            (PathKind::AuthPage, Some(_)) => Some(Redirect::temporary(DASHBOARD_PATH).into_response()),
            _ => None,
        };
        if let Some(response) = decision {
            return with_cookies(response, &state, &update);
        }
    }

    if let Some(identity) = identity {
        request.extensions_mut().insert(identity);
    }

    let response = next.run(request).await;
    with_cookies(response, &state, &update)
}
