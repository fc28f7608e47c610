//! 认证error类型定义

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 认证error
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    #[error("Email already in use")]
    EmailExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No usable session (missing, unknown or expired token)
    #[error("Unauthorized")]
    Unauthorized,

    /// Password login attempted on an account that signs in elsewhere
    #[error("This account uses {provider} sign-in. Please use \"Continue with Google\".")]
    ProviderMismatch { provider: String },

    #[error("User not found")]
    UserNotFound,

    #[error("Current password is incorrect")]
    IncorrectPassword,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Reset token has expired")]
    ResetTokenExpired,

    /// Reset token was valid but its account no longer exists
    #[error("Invalid reset token")]
    ResetTargetMissing,

    #[error("{0}")]
    NotConfigured(String),

    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// fetchHTTP状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::IncorrectPassword
            | Self::InvalidResetToken
            | Self::ResetTokenExpired
            | Self::ResetTargetMissing => StatusCode::BAD_REQUEST,

            Self::EmailExists => StatusCode::CONFLICT,

            Self::InvalidCredentials | Self::Unauthorized | Self::ProviderMismatch { .. } => {
                StatusCode::UNAUTHORIZED
            }

            Self::UserNotFound => StatusCode::NOT_FOUND,

            Self::NotConfigured(_) | Self::OAuth(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable code for the frontend
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::EmailExists => "email_exists",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Unauthorized => "unauthorized",
            Self::ProviderMismatch { .. } => "provider_mismatch",
            Self::UserNotFound => "not_found",
            Self::IncorrectPassword => "incorrect_password",
            Self::InvalidResetToken | Self::ResetTargetMissing => "invalid_reset_token",
            Self::ResetTokenExpired => "reset_token_expired",
            Self::NotConfigured(_) => "not_configured",
            Self::OAuth(_) => "oauth_error",
            Self::Storage(_) => "storage_error",
            Self::Internal(_) => "server_error",
        }
    }

    /// Server-class failures whose detail must not reach the client.
    pub fn is_server_fault(&self) -> bool {
        matches!(self, Self::OAuth(_) | Self::Storage(_) | Self::Internal(_))
    }

    /// Message safe to show to the client
    pub fn user_message(&self) -> String {
        if self.is_server_fault() {
            "Server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if self.is_server_fault() {
            tracing::error!(error = %self, "request failed with server error");
        }

        let body = Json(json!({
            "error": self.user_message(),
            "code": self.error_code(),
        }));

        (self.status_code(), body).into_response()
    }
}
