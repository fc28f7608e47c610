use crate::api::handlers;
use crate::api::server_config::*;
use axum::{
    error_handling::HandleErrorLayer,
    http::{header, HeaderValue, Method, StatusCode},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::{limit::ConcurrencyLimitLayer, timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::auth::{create_auth_routes, AuthService, AuthState, MemoryStorage};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppServer {
    pub auth: Arc<AuthService>,
    pub config: AppConfig,
}

impl AppServer {
    /// Server backed by the in-memory credential store and the Google provider.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let auth = AuthService::new(Arc::new(MemoryStorage::new()), config.auth.clone())?;
        Ok(Self::with_service(Arc::new(auth), config))
    }

    pub fn with_service(auth: Arc<AuthService>, config: AppConfig) -> Self {
        Self { auth, config }
    }

    pub fn create_router(&self) -> Router {
        let auth_router = create_auth_routes(AuthState::new(self.auth.clone()));

        Router::new()
            .route("/api/health", get(handlers::health_check))
            .nest("/api/auth", auth_router)
            .layer(
                ServiceBuilder::new()
                    // Convert middleware errors (timeout/overload) into HTTP responses
                    .layer(HandleErrorLayer::new(|err: BoxError| async move {
                        if err.is::<tower::timeout::error::Elapsed>() {
                            (StatusCode::REQUEST_TIMEOUT, "request timed out")
                        } else {
                            (StatusCode::SERVICE_UNAVAILABLE, "service overloaded")
                        }
                    }))
                    .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENCY))
                    .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
                    .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                    // Structured HTTP tracing without leaking sensitive data
                    .layer(TraceLayer::new_for_http()),
            )
            .layer(self.cors_layer())
    }

    fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .config
            .server
            .cors_allow_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        tracing::info!("CORS configured to allow origins: {:?}", origins);

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::ORIGIN,
            ])
            .allow_credentials(true)
            .max_age(CORS_MAX_AGE)
    }

    pub async fn start(self) -> Result<(), anyhow::Error> {
        let sweepers = self.auth.spawn_sweepers();
        let app = self.create_router();

        let addr = self.config.server.bind_addr();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        for sweeper in sweepers {
            sweeper.abort();
        }
        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
