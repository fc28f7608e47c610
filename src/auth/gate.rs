//! 认证中间件
//!
//! Resolves the session token on an inbound request to an authenticated identity.
//! Every failure (no token, unknown token, expired token) is the same 401.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{cookie::read_cookie, core::SessionTokenStore, errors::AuthError};

/// The authenticated caller, attached to the request for downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub token: String,
}

pub struct AuthorizationGate {
    sessions: Arc<SessionTokenStore>,
    cookie_name: String,
}

impl AuthorizationGate {
    pub fn new(sessions: Arc<SessionTokenStore>, cookie_name: impl Into<String>) -> Self {
        Self {
            sessions,
            cookie_name: cookie_name.into(),
        }
    }

    /// Bearer token from `Authorization`, else the session cookie.
    pub fn extract_token(&self, headers: &HeaderMap) -> Option<String> {
        bearer_token(headers).or_else(|| read_cookie(headers, &self.cookie_name))
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token = self.extract_token(headers).ok_or(AuthError::Unauthorized)?;

        match self.sessions.resolve(&token) {
            Some(user_id) => Ok(Identity { user_id, token }),
            None => {
                tracing::debug!("session token rejected");
                Err(AuthError::Unauthorized)
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    Arc<AuthorizationGate>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(identity.clone());
        }
        let gate = Arc::<AuthorizationGate>::from_ref(state);
        gate.authenticate(&parts.headers)
    }
}

/// Middleware for protected routers: rejects with 401 or inserts the [`Identity`].
pub async fn require_auth(
    State(gate): State<Arc<AuthorizationGate>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = gate.authenticate(request.headers())?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
