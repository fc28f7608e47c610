//! 认证模块类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an account's identity was established
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Email + password
    Local,
    /// Linked to an external identity provider (Google)
    External,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::External => "external",
        }
    }
}

/// Account record owned by the credential store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// User ID
    pub id: String,
    /// Email, lowercased and trimmed
    pub email: String,
    /// Display name
    pub name: Option<String>,
    /// Encoded password hash
    pub password_hash: Option<String>,
    /// Identifier at the external provider
    pub external_id: Option<String>,
    pub provider: Provider,
    pub picture_url: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Whether password sign-in is currently allowed for this account.
    pub fn accepts_password_login(&self) -> bool {
        self.provider == Provider::Local && self.password_hash.is_some()
    }
}

/// Fields supplied when creating an account; the store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub external_id: Option<String>,
    pub provider: Provider,
    pub picture_url: Option<String>,
}

/// The user shape sent to clients; never carries hashes or provider ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&UserAccount> for PublicUser {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
            created_at: account.created_at,
        }
    }
}

/// Profile returned by an external identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    pub external_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub picture_url: Option<String>,
}

/// A credential presented for sign-in.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Email and password checked against the stored hash
    LocalCredential { email: String, password: String },
    /// Identity already proven by an external provider
    ExternalIdentity(ExternalProfile),
}

/// Registration request
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Login request
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// 修改Password请求
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// Body for register / login / me
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Forgot-password body; `reset_token` is only present when exposure is enabled for development.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResetTokenResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A freshly minted session together with its account.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub user: UserAccount,
    pub token: String,
}

/// Lowercase and trim an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Treat empty strings the way absent fields are treated.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
