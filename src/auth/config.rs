//! 认证配置管理

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::auth::errors::AuthError;

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Session cookie name
    pub cookie_name: String,

    /// Session lifetime (seconds); also the cookie Max-Age
    pub token_max_age_secs: u64,

    /// Mark cookies `Secure` (production only)
    pub secure_cookies: bool,

    /// Where the OAuth callback sends the browser afterwards
    pub frontend_url: String,

    /// Reset token validity window (seconds)
    pub reset_token_ttl_secs: u64,

    /// Minimum length for reset / changed passwords
    pub password_min_length: usize,

    /// Return the reset token in the forgot-password body (development only)
    pub expose_reset_token: bool,

    /// Interval of the background expiry sweep; 0 disables it
    pub sweep_interval_secs: u64,

    /// Password配置
    pub password: PasswordConfig,

    /// OAuth配置
    pub oauth: OAuthConfig,
}

/// scrypt cost parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PasswordConfig {
    pub log_n: u8,
    pub r: u32,
    pub p: u32,
}

/// OAuth配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Google Client ID
    pub google_client_id: Option<String>,

    /// Google Client secret
    pub google_client_secret: Option<String>,

    /// Redirect URI registered with Google
    pub google_callback_url: String,
}

const DEFAULT_TOKEN_MAX_AGE: u64 = 60 * 60 * 24 * 7;
const DEFAULT_RESET_TTL: u64 = 60 * 60;
/// Upper bound for session and reset token lifetimes (ten years)
pub const MAX_LIFETIME_SECS: u64 = 60 * 60 * 24 * 365 * 10;

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "auth_token".to_string(),
            token_max_age_secs: DEFAULT_TOKEN_MAX_AGE,
            secure_cookies: false,
            frontend_url: "http://localhost:5173".to_string(),
            reset_token_ttl_secs: DEFAULT_RESET_TTL,
            password_min_length: 6,
            expose_reset_token: false,
            sweep_interval_secs: 300,
            password: PasswordConfig::default(),
            oauth: OAuthConfig::default(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // N = 16384, r = 8, p = 1
        Self { log_n: 14, r: 8, p: 1 }
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            google_client_id: None,
            google_client_secret: None,
            google_callback_url: "http://localhost:3000/api/auth/google/callback".to_string(),
        }
    }
}

impl AuthConfig {
    /// from环境变量加载配置
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields whose environment variable is set.
    ///
    /// `RUST_ENV=production` turns on Secure cookies, `RUST_ENV=development` exposes
    /// reset tokens in responses.
    pub fn apply_env(&mut self) {
        if let Ok(run_env) = std::env::var("RUST_ENV") {
            self.secure_cookies = run_env == "production";
            self.expose_reset_token = run_env == "development";
        }
        if let Ok(name) = std::env::var("AUTH_TOKEN_NAME") {
            self.cookie_name = name;
        }
        if let Ok(url) = std::env::var("FRONTEND_URL") {
            self.frontend_url = url;
        }
        self.token_max_age_secs = env_or("AUTH_TOKEN_MAX_AGE_SECS", self.token_max_age_secs);
        self.reset_token_ttl_secs = env_or("RESET_TOKEN_TTL_SECS", self.reset_token_ttl_secs);
        self.password_min_length = env_or("PASSWORD_MIN_LENGTH", self.password_min_length);
        self.sweep_interval_secs = env_or("SESSION_SWEEP_INTERVAL_SECS", self.sweep_interval_secs);
        self.oauth.apply_env();
    }

    /// Reject lifetimes the token stores and cookie Max-Age cannot represent.
    pub fn validate(&self) -> Result<(), AuthError> {
        for (key, secs) in [
            ("token_max_age_secs", self.token_max_age_secs),
            ("reset_token_ttl_secs", self.reset_token_ttl_secs),
        ] {
            if secs > MAX_LIFETIME_SECS {
                return Err(AuthError::Internal(format!(
                    "{} = {} exceeds the {}s limit",
                    key, secs, MAX_LIFETIME_SECS
                )));
            }
        }
        Ok(())
    }

    pub fn token_max_age(&self) -> Duration {
        Duration::from_secs(self.token_max_age_secs)
    }

    pub fn reset_token_ttl(&self) -> Duration {
        Duration::from_secs(self.reset_token_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

impl OAuthConfig {
    fn apply_env(&mut self) {
        if let Some(id) = std::env::var("GOOGLE_CLIENT_ID").ok().filter(|s| !s.is_empty()) {
            self.google_client_id = Some(id);
        }
        if let Some(secret) = std::env::var("GOOGLE_CLIENT_SECRET").ok().filter(|s| !s.is_empty()) {
            self.google_client_secret = Some(secret);
        }
        if let Ok(url) = std::env::var("GOOGLE_CALLBACK_URL") {
            self.google_callback_url = url;
        }
    }

    /// Both the client id and secret are present.
    pub fn google_configured(&self) -> bool {
        self.google_client_id.is_some() && self.google_client_secret.is_some()
    }
}

pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.cookie_name, "auth_token");
        assert_eq!(config.token_max_age(), Duration::from_secs(604_800));
        assert_eq!(config.reset_token_ttl(), Duration::from_secs(3600));
        assert_eq!(config.password_min_length, 6);
        assert!(!config.oauth.google_configured());
    }

    #[test]
    fn test_validate_lifetimes() {
        assert!(AuthConfig::default().validate().is_ok());

        let at_limit = AuthConfig { token_max_age_secs: MAX_LIFETIME_SECS, ..Default::default() };
        assert!(at_limit.validate().is_ok());

        let session = AuthConfig { token_max_age_secs: u64::MAX, ..Default::default() };
        assert!(session.validate().is_err());

        let reset = AuthConfig { reset_token_ttl_secs: MAX_LIFETIME_SECS + 1, ..Default::default() };
        assert!(reset.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_production() {
        std::env::set_var("RUST_ENV", "production");
        std::env::set_var("AUTH_TOKEN_MAX_AGE_SECS", "1209600");
        std::env::set_var("GOOGLE_CLIENT_ID", "id");
        std::env::remove_var("GOOGLE_CLIENT_SECRET");

        let config = AuthConfig::from_env();
        assert!(config.secure_cookies);
        assert!(!config.expose_reset_token);
        assert_eq!(config.token_max_age_secs, 1_209_600);
        assert!(!config.oauth.google_configured());

        std::env::remove_var("RUST_ENV");
        std::env::remove_var("AUTH_TOKEN_MAX_AGE_SECS");
        std::env::remove_var("GOOGLE_CLIENT_ID");
    }

    #[test]
    #[serial]
    fn test_unparsable_env_falls_back() {
        std::env::set_var("PASSWORD_MIN_LENGTH", "six");
        assert_eq!(AuthConfig::from_env().password_min_length, 6);
        std::env::remove_var("PASSWORD_MIN_LENGTH");
    }

    #[test]
    #[serial]
    fn test_development_exposes_reset_token() {
        std::env::remove_var("RUST_ENV");
        assert!(!AuthConfig::from_env().expose_reset_token);

        std::env::set_var("RUST_ENV", "development");
        let config = AuthConfig::from_env();
        assert!(config.expose_reset_token);
        assert!(!config.secure_cookies);
        std::env::remove_var("RUST_ENV");
    }

    #[test]
    #[serial]
    fn test_env_overrides_existing_values() {
        std::env::remove_var("RUST_ENV");
        std::env::set_var("FRONTEND_URL", "https://dash.example.com");

        let mut config = AuthConfig {
            cookie_name: "dash_session".to_string(),
            expose_reset_token: true,
            ..Default::default()
        };
        config.apply_env();

        assert_eq!(config.frontend_url, "https://dash.example.com");
        assert_eq!(config.cookie_name, "dash_session");
        assert!(config.expose_reset_token);
        std::env::remove_var("FRONTEND_URL");
    }

    #[test]
    fn test_sweep_disabled_with_zero() {
        let config = AuthConfig { sweep_interval_secs: 0, ..Default::default() };
        assert!(config.sweep_interval().is_none());
    }
}
