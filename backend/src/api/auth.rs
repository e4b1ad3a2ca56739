//! Sign-in API endpoints.

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::{success, ApiResult};
use crate::auth::{
    clear_state_cookie, issued_state, new_oauth_state, state_cookie, state_matches, AuthUser,
};
use crate::errors::AppError;
use crate::models::{MessageResponse, User};
use crate::AppState;

/// Query parameters the provider appends to the callback URL.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// GET /api/auth/google - Send the browser to the provider's consent screen.
pub async fn google_login(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let oauth_state = new_oauth_state();
    let url = state.identity.authorize_url(&oauth_state);

    (jar.add(state_cookie(oauth_state)), Redirect::to(&url))
}

/// GET /api/auth/google/callback - Finish sign-in and hand a session token to the frontend.
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<OAuthCallbackQuery>,
) -> (CookieJar, Redirect) {
    let target = match complete_sign_in(&state, &jar, params).await {
        Ok(token) => format!(
            "{}/?token={}",
            state.config.frontend_url,
            urlencoding::encode(&token)
        ),
        Err(e) => {
            tracing::warn!("Sign-in failed: {}", e);
            format!("{}/login?error=auth_failed", state.config.frontend_url)
        }
    };

    (clear_state_cookie(jar), Redirect::to(&target))
}

async fn complete_sign_in(
    state: &AppState,
    jar: &CookieJar,
    params: OAuthCallbackQuery,
) -> Result<String, AppError> {
    if let Some(provider_error) = params.error {
        return Err(AppError::Auth(format!(
            "Provider returned error: {}",
            provider_error
        )));
    }

    let returned_state = params
        .state
        .ok_or_else(|| AppError::BadRequest("Missing state".to_string()))?;
    let issued = issued_state(jar)
        .ok_or_else(|| AppError::BadRequest("Missing state cookie".to_string()))?;
    if !state_matches(&returned_state, issued) {
        return Err(AppError::BadRequest("State mismatch".to_string()));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let profile = state.identity.exchange(&code).await?;
    let promote = state.config.is_admin_email(&profile.email);
    let user = state.repo.upsert_provider_user(&profile, promote).await?;

    tracing::info!(user_id = %user.id, "User signed in");
    state.tokens.issue(&user)
}

/// GET /api/auth/me - The signed-in user's profile.
pub async fn current_user(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<User> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    success(user, revision_id)
}

/// POST /api/auth/logout - Sessions are stateless; the client discards its token.
pub async fn logout(State(state): State<AppState>) -> ApiResult<MessageResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    success(MessageResponse::new("Logged out successfully"), revision_id)
}
