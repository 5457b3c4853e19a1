use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::Session;

pub const ACCESS_TOKEN_COOKIE: &str = "presux_access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "presux_refresh_token";
/// Set by whichever client started an authorization-code flow
pub const CODE_VERIFIER_COOKIE: &str = "presux_code_verifier";

/// Builds and clears the session cookie pair.
#[derive(Debug, Clone, Copy)]
pub struct SessionCookies {
    pub secure: bool,
}

impl SessionCookies {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    fn cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(name, value);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(SameSite::Lax);
        cookie
    }

    fn removal(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = self.cookie(name, String::new());
        cookie.make_removal();
        cookie
    }

    pub fn for_session(&self, session: &Session) -> Vec<Cookie<'static>> {
        vec![
            self.cookie(ACCESS_TOKEN_COOKIE, session.access_token.clone()),
            self.cookie(REFRESH_TOKEN_COOKIE, session.refresh_token.clone()),
        ]
    }

    /// Removals for the session pair only; an in-flight code verifier survives
    pub fn cleared(&self) -> Vec<Cookie<'static>> {
        vec![self.removal(ACCESS_TOKEN_COOKIE), self.removal(REFRESH_TOKEN_COOKIE)]
    }

    /// Add the session cookies to a handler's jar
    pub fn store(&self, jar: CookieJar, session: &Session) -> CookieJar {
        self.for_session(session).into_iter().fold(jar, |jar, c| jar.add(c))
    }

    /// Sign-out: the session pair and any code verifier
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        self.drop_verifier(self.cleared().into_iter().fold(jar, |jar, c| jar.add(c)))
    }

    /// The verifier is single-use once a code has been exchanged
    pub fn drop_verifier(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.removal(CODE_VERIFIER_COOKIE))
    }
}

/// Append `Set-Cookie` headers to a response built outside the jar extractor
pub fn append_set_cookies(headers: &mut HeaderMap, cookies: &[Cookie<'static>]) {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("Dropping unencodable cookie {}: {}", cookie.name(), e),
        }
    }
}
