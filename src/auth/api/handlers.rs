//! API请求处理器（轻量）

use axum::{
    extract::{Json, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use super::routes::AuthState;
use crate::auth::{
    cookie::{
        clear_cookie, oauth_state_cookie, read_cookie, session_cookie, SecureCookieConfig,
        OAUTH_STATE_COOKIE,
    },
    core::random_token,
    errors::AuthError,
    gate::Identity,
    types::*,
};

/// user注册处理器
pub async fn register(
    State(state): State<AuthState>,
    body: Option<Json<RegisterRequest>>,
) -> Result<Response, AuthError> {
    let grant = state.service.register(json_or_default(body)).await?;
    let cookies = set_cookies(&[session_cookie(state.service.config(), &grant.token)])?;

    Ok((StatusCode::CREATED, cookies, Json(UserResponse { user: (&grant.user).into() })).into_response())
}

/// user登录处理器
pub async fn login(
    State(state): State<AuthState>,
    body: Option<Json<LoginRequest>>,
) -> Result<Response, AuthError> {
    let grant = state.service.login(json_or_default(body)).await?;
    info!(user_id = %grant.user.id, "login succeeded");
    let cookies = set_cookies(&[session_cookie(state.service.config(), &grant.token)])?;

    Ok((cookies, Json(UserResponse { user: (&grant.user).into() })).into_response())
}

/// user登出处理器; succeeds with or without a session.
pub async fn logout(State(state): State<AuthState>, headers: HeaderMap) -> Result<Response, AuthError> {
    let token = state.gate.extract_token(&headers);
    state.service.logout(token.as_deref());

    let config = state.service.config();
    let cookies = set_cookies(&[clear_cookie(&config.cookie_name, config.secure_cookies)])?;
    Ok((cookies, Json(json!({ "ok": true }))).into_response())
}

/// fetch当前User information处理器
pub async fn me(
    State(state): State<AuthState>,
    identity: Identity,
) -> Result<Json<UserResponse>, AuthError> {
    let user = state.service.current_user(&identity).await?;
    Ok(Json(UserResponse { user: (&user).into() }))
}

/// Redirect to the provider's consent page with a fresh CSRF state.
pub async fn google_start(State(state): State<AuthState>) -> Result<Response, AuthError> {
    let csrf_state = random_token();
    let url = state.service.google_authorization_url(&csrf_state)?;

    let cookies = set_cookies(&[oauth_state_cookie(
        &csrf_state,
        state.service.config().secure_cookies,
    )])?;
    Ok((cookies, Redirect::to(&url)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// OAuth回调处理器; always answers with a redirect to the frontend.
pub async fn google_callback(
    State(state): State<AuthState>,
    Query(query): Query<OAuthCallbackQuery>,
    headers: HeaderMap,
) -> Response {
    let config = state.service.config();
    let frontend = config.frontend_url.trim_end_matches('/');
    let clear_state = clear_cookie(OAUTH_STATE_COOKIE, config.secure_cookies);

    let failure = |reason: &str| -> Response {
        let target = format!("{}/login?error={}", frontend, reason);
        let cookies = set_cookies(&[clear_state.clone()]).unwrap_or_default();
        (cookies, Redirect::to(&target)).into_response()
    };

    if let Some(error) = &query.error {
        warn!(error = %error, "provider returned an OAuth error");
        return failure("oauth_failed");
    }

    let expected = read_cookie(&headers, OAUTH_STATE_COOKIE);
    let state_matches = match (&query.state, &expected) {
        (Some(given), Some(expected)) => bool::from(given.as_bytes().ct_eq(expected.as_bytes())),
        _ => false,
    };
    if !state_matches {
        warn!("OAuth callback state mismatch");
        return failure("oauth_failed");
    }

    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        warn!("OAuth callback without code");
        return failure("oauth_failed");
    };

    match state.service.oauth_callback(code).await {
        Ok(grant) => {
            let cookies = set_cookies(&[clear_state.clone(), session_cookie(config, &grant.token)]);
            match cookies {
                Ok(cookies) => (cookies, Redirect::to(frontend)).into_response(),
                Err(e) => {
                    tracing::error!(error = %e, "failed to build session cookie");
                    failure("server_error")
                }
            }
        }
        Err(e @ (AuthError::OAuth(_) | AuthError::NotConfigured(_))) => {
            warn!(error = %e, "OAuth sign-in failed");
            failure("oauth_failed")
        }
        Err(e) => {
            tracing::error!(error = %e, "OAuth callback error");
            failure("server_error")
        }
    }
}

pub async fn forgot_password(
    State(state): State<AuthState>,
    body: Option<Json<ForgotPasswordRequest>>,
) -> Result<Json<ForgotPasswordResponse>, AuthError> {
    let response = state.service.forgot_password(json_or_default(body)).await?;
    Ok(Json(response))
}

pub async fn reset_password(
    State(state): State<AuthState>,
    body: Option<Json<ResetPasswordRequest>>,
) -> Result<Json<MessageResponse>, AuthError> {
    state.service.reset_password(json_or_default(body)).await?;
    Ok(Json(MessageResponse {
        message: "Password has been successfully reset. You can now log in with your new password."
            .to_string(),
    }))
}

pub async fn validate_reset_token(
    State(state): State<AuthState>,
    Path(token): Path<String>,
) -> (StatusCode, Json<ValidateResetTokenResponse>) {
    match state.service.validate_reset_token(&token) {
        Ok(email) => (
            StatusCode::OK,
            Json(ValidateResetTokenResponse {
                valid: true,
                email: Some(email),
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ValidateResetTokenResponse {
                valid: false,
                email: None,
                error: Some(e.to_string()),
            }),
        ),
    }
}

/// 修改Password处理器
pub async fn change_password(
    State(state): State<AuthState>,
    identity: Identity,
    body: Option<Json<ChangePasswordRequest>>,
) -> Result<Json<MessageResponse>, AuthError> {
    state
        .service
        .change_password(&identity, json_or_default(body))
        .await?;
    Ok(Json(MessageResponse {
        message: "Password has been successfully changed.".to_string(),
    }))
}

// ========== 辅助函数 ==========

/// A missing or unparsable body is treated like an empty one, so field checks answer it.
fn json_or_default<T: Default>(body: Option<Json<T>>) -> T {
    body.map(|Json(inner)| inner).unwrap_or_default()
}

fn set_cookies(cookies: &[SecureCookieConfig]) -> Result<HeaderMap, AuthError> {
    let mut headers = HeaderMap::new();
    for cookie in cookies {
        cookie
            .append_to_headers(&mut headers)
            .map_err(AuthError::Internal)?;
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::SET_COOKIE;

    #[test]
    fn test_set_cookies_keeps_every_cookie() {
        let headers = set_cookies(&[
            clear_cookie(OAUTH_STATE_COOKIE, false),
            clear_cookie("auth_token", false),
        ])
        .unwrap();
        assert_eq!(headers.get_all(SET_COOKIE).iter().count(), 2);
    }

    #[test]
    fn test_json_or_default() {
        let req: LoginRequest = json_or_default(None);
        assert!(req.email.is_none());

        let req = json_or_default(Some(Json(ForgotPasswordRequest {
            email: Some("a@x.com".to_string()),
        })));
        assert_eq!(req.email.as_deref(), Some("a@x.com"));
    }
}
