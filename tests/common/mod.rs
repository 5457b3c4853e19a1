#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use uuid::Uuid;

use presux::auth::{AuthError, Identity, IdentityProvider, Session, SignUp};
use presux::config::{AppConfig, StoreBackend};
use presux::database::{MemoryStore, Store};
use presux::{app, AppState};

/// Identity service double: tokens, refresh tokens, codes and passwords are
/// registered up front and answered from memory.
#[derive(Default)]
pub struct ScriptedIdentity {
    tokens: Mutex<HashMap<String, Identity>>,
    refresh_tokens: Mutex<HashMap<String, Identity>>,
    codes: Mutex<HashMap<String, Identity>>,
    passwords: Mutex<HashMap<String, (String, Identity)>>,
    pub confirm_signups: Mutex<bool>,
    pub signed_out: Mutex<Vec<String>>,
}

impl ScriptedIdentity {
    /// A user with a valid access token
    pub fn user(&self, email: &str) -> (Identity, String) {
        let identity = Identity {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        let token = format!("access-{}", Uuid::new_v4());
        self.tokens.lock().unwrap().insert(token.clone(), identity.clone());
        (identity, token)
    }

    pub fn refresh_token_for(&self, identity: &Identity) -> String {
        let token = format!("refresh-{}", Uuid::new_v4());
        self.refresh_tokens.lock().unwrap().insert(token.clone(), identity.clone());
        token
    }

    pub fn code_for(&self, identity: &Identity) -> String {
        let code = format!("code-{}", Uuid::new_v4());
        self.codes.lock().unwrap().insert(code.clone(), identity.clone());
        code
    }

    pub fn password(&self, email: &str, password: &str) -> Identity {
        let (identity, _) = self.user(email);
        self.passwords
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), identity.clone()));
        identity
    }

    fn session(&self, identity: Identity) -> Session {
        let access_token = format!("access-{}", Uuid::new_v4());
        let refresh_token = format!("refresh-{}", Uuid::new_v4());
        self.tokens.lock().unwrap().insert(access_token.clone(), identity.clone());
        self.refresh_tokens.lock().unwrap().insert(refresh_token.clone(), identity.clone());
        Session {
            access_token,
            refresh_token,
            expires_in: Some(3600),
            user: identity,
        }
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentity {
    async fn get_user(&self, access_token: &str) -> Result<Identity, AuthError> {
        self.tokens
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken("unknown token".to_string()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let identity = self.refresh_tokens.lock().unwrap().remove(refresh_token);
        match identity {
            Some(identity) => Ok(self.session(identity)),
            None => Err(AuthError::InvalidToken("unknown refresh token".to_string())),
        }
    }

    async fn exchange_code(&self, code: &str, _code_verifier: Option<&str>) -> Result<Session, AuthError> {
        let identity = self.codes.lock().unwrap().remove(code);
        match identity {
            Some(identity) => Ok(self.session(identity)),
            None => Err(AuthError::InvalidCredentials("invalid code".to_string())),
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let known = self.passwords.lock().unwrap().get(email).cloned();
        match known {
            Some((expected, identity)) if expected == password => Ok(self.session(identity)),
            _ => Err(AuthError::InvalidCredentials("Invalid login credentials".to_string())),
        }
    }

    async fn sign_up(&self, email: &str, password: &str, _full_name: Option<&str>) -> Result<SignUp, AuthError> {
        if self.passwords.lock().unwrap().contains_key(email) {
            return Err(AuthError::Rejected {
                status: 422,
                message: "User already registered".to_string(),
            });
        }
        let identity = self.password(email, password);
        if *self.confirm_signups.lock().unwrap() {
            Ok(SignUp::ConfirmationRequired(identity))
        } else {
            Ok(SignUp::Session(self.session(identity)))
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.tokens.lock().unwrap().remove(access_token);
        self.signed_out.lock().unwrap().push(access_token.to_string());
        Ok(())
    }
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub identity: Arc<ScriptedIdentity>,
    pub store: Arc<dyn Store>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.backend = StoreBackend::Memory;
    config.security.disable_auth = false;
    config
}

/// Serve the real router on a free port with the memory store
pub async fn spawn_app() -> Result<TestApp> {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: AppConfig) -> Result<TestApp> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;

    let identity = Arc::new(ScriptedIdentity::default());
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let state = AppState::new(config, store.clone(), identity.clone());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(10))
        .build()?;

    Ok(TestApp {
        base_url: format!("http://127.0.0.1:{}", port),
        client,
        identity,
        store,
    })
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str, body: &Value) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token).json(body)
    }

    pub fn patch(&self, path: &str, token: &str, body: &Value) -> RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(token).json(body)
    }

    pub fn delete(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }

    /// POST and return the created record under `key`, asserting 201
    pub async fn create(&self, path: &str, token: &str, key: &str, body: Value) -> Result<Value> {
        let res = self.post(path, token, &body).send().await?;
        let status = res.status();
        let body = res.json::<Value>().await?;
        anyhow::ensure!(status == StatusCode::CREATED, "expected 201 from {}, got {}: {}", path, status, body);
        Ok(body[key].clone())
    }
}

/// `Set-Cookie` header values of a response
pub fn set_cookies(res: &Response) -> Vec<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

/// Value of a cookie set by the response, if any
pub fn cookie_value(res: &Response, name: &str) -> Option<String> {
    set_cookies(res).into_iter().find_map(|c| {
        let (pair, _) = c.split_once(';').unwrap_or((c.as_str(), ""));
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
