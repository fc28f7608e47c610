//! Cookie安全配置
//!
//! Building `Set-Cookie` values for the session and OAuth state cookies, and
//! reading them back from a request.

use axum::http::header::{HeaderValue, COOKIE, SET_COOKIE};
use axum::http::HeaderMap;
use cookie::Cookie;

use crate::auth::config::AuthConfig;

/// Name of the short-lived cookie carrying the OAuth `state` value
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
/// Lifetime of the OAuth state cookie (seconds)
pub const OAUTH_STATE_MAX_AGE: i64 = 600;

/// Cookie安全属性
#[derive(Debug, Clone)]
pub struct SecureCookieConfig {
    pub name: String,
    pub value: String,
    pub path: String,
    /// 最大年龄（秒）
    pub max_age: Option<i64>,
    pub http_only: bool,
    /// Secure标志（HTTPS only）
    pub secure: bool,
}

impl Default for SecureCookieConfig {
    fn default() -> Self {
        Self {
            name: "auth_token".to_string(),
            value: String::new(),
            path: "/".to_string(),
            max_age: None,
            http_only: true,
            secure: false,
        }
    }
}

impl SecureCookieConfig {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_max_age(mut self, max_age: i64) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// 构建Cookie字符串
    ///
    /// `SameSite` is always `Lax`.
    pub fn build(&self) -> String {
        let mut cookie = format!("{}={}; Path={}", self.name, self.value, self.path);

        if let Some(max_age) = self.max_age {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=Lax");

        cookie
    }

    /// Append as a `Set-Cookie` header; several cookies may be set on one response.
    pub fn append_to_headers(&self, headers: &mut HeaderMap) -> Result<(), String> {
        let header_value = HeaderValue::from_str(&self.build())
            .map_err(|e| format!("Invalid cookie value: {}", e))?;
        headers.append(SET_COOKIE, header_value);
        Ok(())
    }
}

/// Session cookie carrying `token`, valid for the configured session lifetime.
pub fn session_cookie(config: &AuthConfig, token: &str) -> SecureCookieConfig {
    SecureCookieConfig::new(config.cookie_name.as_str(), token)
        .with_max_age(i64::try_from(config.token_max_age_secs).unwrap_or(i64::MAX))
        .with_secure(config.secure_cookies)
}

/// 创建CookieDelete指令（用于登出）
pub fn clear_cookie(name: &str, secure: bool) -> SecureCookieConfig {
    SecureCookieConfig::new(name, "")
        .with_max_age(0)
        .with_secure(secure)
}

pub fn oauth_state_cookie(state: &str, secure: bool) -> SecureCookieConfig {
    SecureCookieConfig::new(OAUTH_STATE_COOKIE, state)
        .with_max_age(OAUTH_STATE_MAX_AGE)
        .with_secure(secure)
}

/// Value of the named cookie in the request's `Cookie` header(s).
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| Cookie::split_parse(raw.to_owned()))
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
