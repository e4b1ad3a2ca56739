//! Identity providers used for sign-in.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::GoogleConfig;
use crate::errors::AppError;
use crate::models::ProviderProfile;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// An external OAuth identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to, carrying the anti-forgery `state`.
    fn authorize_url(&self, state: &str) -> String;

    /// Trade an authorization code for the signed-in account's profile.
    async fn exchange(&self, code: &str) -> Result<ProviderProfile, AppError>;
}

/// Google OAuth 2.0 authorization-code flow.
pub struct GoogleProvider {
    config: GoogleConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&prompt=select_account",
            GOOGLE_AUTH_URL,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode("openid email profile"),
            urlencoding::encode(state),
        )
    }

    async fn exchange(&self, code: &str) -> Result<ProviderProfile, AppError> {
        let token: TokenResponse = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let info: GoogleUserInfo = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(info.into_profile())
    }
}

impl GoogleUserInfo {
    fn into_profile(self) -> ProviderProfile {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.clone());
        ProviderProfile {
            provider_id: self.sub,
            name,
            email: self.email,
            picture: self.picture.unwrap_or_default(),
            given_name: self.given_name,
            family_name: self.family_name,
        }
    }
}
