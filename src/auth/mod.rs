pub mod client;
pub mod cookies;
pub mod jwt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use client::AuthServiceClient;
pub use cookies::SessionCookies;
pub use jwt::JwtVerifier;

/// Authenticated user as reported by the identity service.
/// `id` is the owner identifier attached to every business record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token pair handed out by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: Identity,
}

/// Outcome of a signup: either a live session, or an account waiting for email confirmation.
#[derive(Debug, Clone)]
pub enum SignUp {
    Session(Session),
    ConfirmationRequired(Identity),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("identity service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("identity service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected identity service response: {0}")]
    Protocol(String),
}

/// The external identity service.
///
/// Every method is a single round trip; callers treat any error on the
/// session path as "no identity".
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve an access token to the user it belongs to.
    async fn get_user(&self, access_token: &str) -> Result<Identity, AuthError>;

    /// Trade a refresh token for a new session.
    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError>;

    /// Authorization-code exchange performed at the callback route.
    async fn exchange_code(&self, code: &str, code_verifier: Option<&str>) -> Result<Session, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_up(&self, email: &str, password: &str, full_name: Option<&str>) -> Result<SignUp, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}
