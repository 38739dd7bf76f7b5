//! Token cookies: set on login/refresh, expired on logout.
//!
//! Both cookies are http-only with path `/`; `Secure` and `SameSite` come from
//! [`CookieConfig`].

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use clipstream_common::config::{CookieConfig, SameSitePolicy};
use time::Duration;

use crate::auth::TokenPair;

/// Cookie name for the access token.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

#[derive(Debug, Clone)]
pub struct CookiePolicy {
    secure: bool,
    same_site: SameSite,
    access_max_age: Duration,
    refresh_max_age: Duration,
}

fn max_age(ttl_secs: u64) -> Duration {
    Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX))
}

impl CookiePolicy {
    pub fn new(config: &CookieConfig, access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        Self {
            secure: config.secure,
            same_site: match config.same_site {
                SameSitePolicy::Strict => SameSite::Strict,
                SameSitePolicy::Lax => SameSite::Lax,
                SameSitePolicy::None => SameSite::None,
            },
            access_max_age: max_age(access_ttl_secs),
            refresh_max_age: max_age(refresh_ttl_secs),
        }
    }

    fn build(&self, name: &str, value: &str, max_age: Duration) -> Cookie<'static> {
        Cookie::build((name.to_string(), value.to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .path("/")
            .max_age(max_age)
            .build()
    }

    /// Build a httpOnly cookie for the access token.
    pub fn access_cookie(&self, token: &str) -> Cookie<'static> {
        self.build(ACCESS_COOKIE, token, self.access_max_age)
    }

    /// Build a httpOnly cookie for the refresh token.
    pub fn refresh_cookie(&self, token: &str) -> Cookie<'static> {
        self.build(REFRESH_COOKIE, token, self.refresh_max_age)
    }

    /// Add both token cookies to the jar.
    pub fn set_session(&self, jar: CookieJar, tokens: &TokenPair) -> CookieJar {
        jar.add(self.access_cookie(&tokens.access_token))
            .add(self.refresh_cookie(&tokens.refresh_token))
    }

    /// Replace both token cookies with expired, empty ones.
    pub fn clear_session(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.build(ACCESS_COOKIE, "", Duration::ZERO))
            .add(self.build(REFRESH_COOKIE, "", Duration::ZERO))
    }
}

/// Read a non-empty cookie value.
pub fn read(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}
