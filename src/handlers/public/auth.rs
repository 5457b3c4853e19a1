use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::auth::cookies::CODE_VERIFIER_COOKIE;
use crate::auth::{Identity, SignUp};
use crate::error::ApiError;
use crate::middleware::auth::{Credentials, DASHBOARD_PATH, LOGIN_PATH};
use crate::middleware::{ApiResponse, Payload};
use crate::models::schema::parse;
use crate::models::Schema;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl Schema for LoginRequest {}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[serde(default)]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(max = 100, message = "full_name cannot exceed 100 characters"))]
    pub full_name: Option<String>,
}

impl Schema for SignupRequest {}

/// POST /auth/login - Password grant; sets the session cookies
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Payload(body): Payload,
) -> Result<(CookieJar, ApiResponse<Identity>), ApiError> {
    let input: LoginRequest = parse(body)?;
    let session = state
        .identity
        .sign_in_with_password(&input.email, &input.password)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Unauthorized(_) => ApiError::unauthorized("Invalid email or password"),
            other => other,
        })?;

    tracing::info!(user = %session.user.id, "User logged in");
    let jar = state.cookies().store(jar, &session);
    Ok((jar, ApiResponse::success("user", session.user)))
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Payload(body): Payload,
) -> Result<Response, ApiError> {
    let input: SignupRequest = parse(body)?;
    let outcome = state
        .identity
        .sign_up(&input.email, &input.password, input.full_name.as_deref())
        .await?;

    let (jar, user, confirmation_required) = match outcome {
        SignUp::Session(session) => (state.cookies().store(jar, &session), session.user, false),
        SignUp::ConfirmationRequired(user) => (jar, user, true),
    };

    tracing::info!(user = %user.id, confirmation_required, "User signed up");
    let body = json!({ "user": user, "confirmation_required": confirmation_required });
    Ok((StatusCode::CREATED, jar, Json(body)).into_response())
}

/// POST /auth/logout - Best-effort sign-out; cookies are cleared regardless
pub async fn logout(State(state): State<AppState>, headers: HeaderMap, jar: CookieJar) -> impl IntoResponse {
    if let Some(token) = Credentials::from_headers(&headers).access_token {
        if let Err(e) = state.identity.sign_out(&token).await {
            tracing::warn!("Sign-out at identity service failed: {}", e);
        }
    }
    (state.cookies().clear(jar), StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
}

/// Only same-site relative paths are followed after a callback
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => DASHBOARD_PATH,
    }
}

/// GET /auth/callback?code=..&next=..
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Response {
    let failed = || Redirect::temporary(&format!("{}?error=auth_callback_failed", LOGIN_PATH)).into_response();

    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        tracing::info!("Auth callback without code");
        return failed();
    };

    let verifier = jar.get(CODE_VERIFIER_COOKIE).map(|c| c.value().to_string());
    match state.identity.exchange_code(code, verifier.as_deref()).await {
        Ok(session) => {
            let cookies = state.cookies();
            let jar = cookies.drop_verifier(cookies.store(jar, &session));
            tracing::info!(user = %session.user.id, "Auth callback completed");
            (jar, Redirect::temporary(safe_next(query.next.as_deref()))).into_response()
        }
        Err(e) => {
            tracing::warn!("Code exchange failed: {}", e);
            failed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_be_relative() {
        assert_eq!(safe_next(Some("/clients")), "/clients");
        assert_eq!(safe_next(Some("//evil.example")), "/dashboard");
        assert_eq!(safe_next(Some("https://evil.example")), "/dashboard");
        assert_eq!(safe_next(Some("/\\evil.example")), "/dashboard");
        assert_eq!(safe_next(None), "/dashboard");
    }

    #[test]
    fn signup_password_length() {
        let err = parse::<SignupRequest>(json!({ "email": "a@b.co", "password": "123" })).unwrap_err();
        assert_eq!(err.to_json()["details"][0]["field"], "password");
    }
}
