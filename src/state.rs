use std::sync::Arc;

use crate::auth::{IdentityProvider, SessionCookies};
use crate::config::AppConfig;
use crate::database::Store;

/// Shared, immutable application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            identity,
        }
    }

    pub fn cookies(&self) -> SessionCookies {
        SessionCookies::new(self.config.security.cookie_secure)
    }
}
