//! Google OAuth提供商实现
//!
//! Authorization code flow:
//! 1. redirect the browser to Google's consent page
//! 2. exchange the returned code for an access token
//! 3. read the profile from the userinfo endpoint

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};
use zeroize::Zeroizing;

use super::r#trait::OAuthProvider;
use crate::auth::{config::OAuthConfig, errors::AuthError, types::ExternalProfile};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

struct Credentials {
    client_id: String,
    client_secret: Zeroizing<String>,
}

/// Google OAuth提供商
pub struct GoogleProvider {
    credentials: Option<Credentials>,
    redirect_uri: String,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google userinfo payload
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleProvider {
    /// Build from config; without both client id and secret the provider reports unconfigured.
    pub fn new(config: &OAuthConfig) -> Self {
        let credentials = match (&config.google_client_id, &config.google_client_secret) {
            (Some(id), Some(secret)) => Some(Credentials {
                client_id: id.clone(),
                client_secret: Zeroizing::new(secret.clone()),
            }),
            _ => {
                warn!("GOOGLE_CLIENT_ID or GOOGLE_CLIENT_SECRET not set; Google sign-in disabled");
                None
            }
        };

        Self {
            credentials,
            redirect_uri: config.google_callback_url.clone(),
            http_client: reqwest::Client::new(),
        }
    }

    fn credentials(&self) -> Result<&Credentials, AuthError> {
        self.credentials
            .as_ref()
            .ok_or_else(|| AuthError::NotConfigured("Google OAuth not configured on server".into()))
    }
}

#[async_trait]
impl OAuthProvider for GoogleProvider {
    fn name(&self) -> &str {
        "Google"
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
        let creds = self.credentials()?;
        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            GOOGLE_AUTH_URL,
            urlencoding::encode(&creds.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode("profile email"),
            urlencoding::encode(state),
        ))
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AuthError> {
        let creds = self.credentials()?;

        let token_response = self
            .http_client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::OAuth(format!("Google token request failed: {}", e)))?;

        if !token_response.status().is_success() {
            return Err(AuthError::OAuth(format!(
                "Google token exchange failed: {}",
                token_response.status()
            )));
        }

        let token: TokenResponse = token_response
            .json()
            .await
            .map_err(|e| AuthError::OAuth(format!("invalid Google token response: {}", e)))?;

        let userinfo_response = self
            .http_client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AuthError::OAuth(format!("Google userinfo request failed: {}", e)))?;

        if !userinfo_response.status().is_success() {
            return Err(AuthError::OAuth(format!(
                "Google userinfo fetch failed: {}",
                userinfo_response.status()
            )));
        }

        let info: GoogleUserInfo = userinfo_response
            .json()
            .await
            .map_err(|e| AuthError::OAuth(format!("invalid Google userinfo response: {}", e)))?;

        let profile = profile_from_userinfo(info)?;
        info!("Google OAuth profile fetched");
        Ok(profile)
    }
}

fn profile_from_userinfo(info: GoogleUserInfo) -> Result<ExternalProfile, AuthError> {
    let email = info
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AuthError::OAuth("Google profile has no email".to_string()))?;

    Ok(ExternalProfile {
        external_id: info.sub,
        email,
        display_name: info.name,
        picture_url: info.picture,
    })
}
