//! API路由定义

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use crate::auth::{
    gate::{require_auth, AuthorizationGate},
    AuthService,
};

/// Shared state of the auth routes
#[derive(Clone)]
pub struct AuthState {
    pub service: Arc<AuthService>,
    pub gate: Arc<AuthorizationGate>,
}

impl AuthState {
    pub fn new(service: Arc<AuthService>) -> Self {
        let gate = Arc::new(service.gate());
        Self { service, gate }
    }
}

impl FromRef<AuthState> for Arc<AuthorizationGate> {
    fn from_ref(state: &AuthState) -> Self {
        state.gate.clone()
    }
}

impl FromRef<AuthState> for Arc<AuthService> {
    fn from_ref(state: &AuthState) -> Self {
        state.service.clone()
    }
}

/// 创建认证路由, relative to the `/api/auth` mount point
pub fn create_auth_routes(state: AuthState) -> Router {
    // 需要会话的路由
    let protected = Router::new()
        .route("/me", get(handlers::me))
        .route("/change-password", post(handlers::change_password))
        .route_layer(middleware::from_fn_with_state(state.gate.clone(), require_auth));

    Router::new()
        // 注册和登录
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        // OAuth
        .route("/google", get(handlers::google_start))
        .route("/google/callback", get(handlers::google_callback))
        // Password恢复
        .route("/forgot-password", post(handlers::forgot_password))
        .route("/reset-password", post(handlers::reset_password))
        .route("/validate-reset-token/:token", get(handlers::validate_reset_token))
        .merge(protected)
        .with_state(state)
}
