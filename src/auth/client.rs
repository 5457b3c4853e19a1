use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

use super::{AuthError, Identity, IdentityProvider, JwtVerifier, Session, SignUp};
use crate::config::BackendConfig;

/// HTTP client for the hosted backend's GoTrue-compatible auth API (`/auth/v1`).
///
/// Calls carry the project's public key in the `apikey` header. When a JWT
/// secret is configured, [`IdentityProvider::get_user`] verifies tokens
/// locally and only asks the backend when local verification fails.
pub struct AuthServiceClient {
    http: Client,
    base_url: String,
    public_key: String,
    verifier: Option<JwtVerifier>,
}

impl AuthServiceClient {
    pub fn new(config: &BackendConfig) -> Result<Self, AuthError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: format!("{}/auth/v1", config.url.trim_end_matches('/')),
            public_key: config.public_key.clone(),
            verifier: config.jwt_secret.as_deref().map(JwtVerifier::new),
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .header("apikey", &self.public_key)
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<Session, AuthError> {
        let response = self
            .post("/token")
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;

        let response = check(response).await.map_err(|err| match err {
            // invalid_grant and friends come back as 400
            AuthError::Rejected { status, message } if status == 400 || status == 401 => {
                AuthError::InvalidCredentials(message)
            }
            other => other,
        })?;

        response
            .json::<Session>()
            .await
            .map_err(|e| AuthError::Protocol(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for AuthServiceClient {
    async fn get_user(&self, access_token: &str) -> Result<Identity, AuthError> {
        if let Some(verifier) = &self.verifier {
            match verifier.verify(access_token) {
                Ok(identity) => return Ok(identity),
                Err(e) => tracing::debug!("Local token verification failed, asking identity service: {}", e),
            }
        }

        let response = self
            .http
            .get(format!("{}/user", self.base_url))
            .header("apikey", &self.public_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED || response.status() == StatusCode::FORBIDDEN {
            return Err(AuthError::InvalidToken("token rejected by identity service".to_string()));
        }

        check(response)
            .await?
            .json::<Identity>()
            .await
            .map_err(|e| AuthError::Protocol(e.to_string()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn exchange_code(&self, code: &str, code_verifier: Option<&str>) -> Result<Session, AuthError> {
        self.token_grant(
            "pkce",
            json!({ "auth_code": code, "code_verifier": code_verifier.unwrap_or_default() }),
        )
        .await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn sign_up(&self, email: &str, password: &str, full_name: Option<&str>) -> Result<SignUp, AuthError> {
        let response = self
            .post("/signup")
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }))
            .send()
            .await?;

        let body: Value = check(response)
            .await?
            .json()
            .await
            .map_err(|e| AuthError::Protocol(e.to_string()))?;

        parse_sign_up(body)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self.post("/logout").bearer_auth(access_token).send().await?;
        check(response).await?;
        Ok(())
    }
}

/// Autoconfirm projects answer signup with a session; others with the bare user.
fn parse_sign_up(body: Value) -> Result<SignUp, AuthError> {
    if body.get("access_token").is_some() {
        let session = serde_json::from_value::<Session>(body).map_err(|e| AuthError::Protocol(e.to_string()))?;
        return Ok(SignUp::Session(session));
    }

    let user = body.get("user").cloned().unwrap_or(body);
    let identity = serde_json::from_value::<Identity>(user).map_err(|e| AuthError::Protocol(e.to_string()))?;
    Ok(SignUp::ConfirmationRequired(identity))
}

/// Turn non-2xx answers into [`AuthError::Rejected`] carrying the service's message
async fn check(response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    Err(AuthError::Rejected {
        status: status.as_u16(),
        message: error_message(&body).unwrap_or_else(|| status.to_string()),
    })
}

fn error_message(body: &Value) -> Option<String> {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn sign_up_with_session() {
        let id = Uuid::new_v4();
        let body = json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": { "id": id, "email": "new@example.com", "aud": "authenticated" }
        });
        match parse_sign_up(body).unwrap() {
            SignUp::Session(session) => {
                assert_eq!(session.user.id, id);
                assert_eq!(session.refresh_token, "r");
            }
            other => panic!("expected session, got {:?}", other),
        }
    }

    #[test]
    fn sign_up_pending_confirmation() {
        let id = Uuid::new_v4();
        let body = json!({ "id": id, "email": "new@example.com", "confirmation_sent_at": "2024-01-01T00:00:00Z" });
        match parse_sign_up(body).unwrap() {
            SignUp::ConfirmationRequired(identity) => assert_eq!(identity.id, id),
            other => panic!("expected confirmation, got {:?}", other),
        }
    }

    #[test]
    fn error_message_prefers_service_text() {
        assert_eq!(
            error_message(&json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
            Some("Invalid login credentials".to_string())
        );
        assert_eq!(
            error_message(&json!({ "code": 422, "msg": "User already registered" })),
            Some("User already registered".to_string())
        );
        assert_eq!(error_message(&Value::Null), None);
    }
}
