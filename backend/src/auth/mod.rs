//! Bearer-token authentication and the OAuth sign-in helpers.
//!
//! Session tokens are verified on every request and the user row is reloaded,
//! so admin changes and deletions take effect immediately.

mod provider;
mod token;

pub use provider::*;
pub use token::*;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use subtle::ConstantTimeEq;

use crate::errors::{AppError, AppErrorWithRevision};
use crate::models::User;
use crate::AppState;

/// Cookie holding the anti-forgery state between login and callback.
pub const STATE_COOKIE: &str = "hub_oauth_state";

/// Only the sign-in routes need to see the state cookie.
const STATE_COOKIE_PATH: &str = "/api/auth";

/// Lifetime of the state cookie in seconds.
const STATE_COOKIE_MAX_AGE: i64 = 600;

/// The signed-in user behind a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// A signed-in user with admin rights.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppErrorWithRevision;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(&parts.headers, state).await {
            Ok(user) => Ok(AuthUser(user)),
            Err(e) => {
                let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
                Err(e.with_revision(revision_id))
            }
        }
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppErrorWithRevision;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
            return Err(AppError::Forbidden("Admin access required".to_string())
                .with_revision(revision_id));
        }
        Ok(AdminUser(user))
    }
}

async fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<User, AppError> {
    let token = bearer_token(headers)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
    let claims = state.tokens.verify(token)?;

    state
        .repo
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Generate a fresh anti-forgery state value.
pub fn new_oauth_state() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Cookie storing the OAuth state until the callback.
pub fn state_cookie(state: String) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, state))
        .path(STATE_COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(STATE_COOKIE_MAX_AGE))
        .build()
}

/// Drop the OAuth state cookie from the browser.
pub fn clear_state_cookie(jar: CookieJar) -> CookieJar {
    let cookie = Cookie::build((STATE_COOKIE, ""))
        .path(STATE_COOKIE_PATH)
        .removal()
        .build();
    jar.remove(cookie)
}

/// The state issued at login, if the browser sent it back.
pub fn issued_state(jar: &CookieJar) -> Option<&str> {
    jar.get(STATE_COOKIE).map(|cookie| cookie.value())
}

/// Whether the state returned by the provider matches the one we issued.
pub fn state_matches(returned: &str, issued: &str) -> bool {
    constant_time_compare(returned, issued)
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
