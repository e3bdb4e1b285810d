//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every control-plane route
//! - Compose access control and rate limiting per route group
//! - Wire up cross-cutting layers (tracing, request id, timeout, headers)
//! - Serve until the shutdown signal fires

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{RateLimitConfig, ServerConfig};
use crate::health::AlertStateMachine;
use crate::http::handlers;
use crate::http::request::{request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::security::access_control::{
    redirect_if_authenticated, require_api_session, require_page_session, require_reset_token,
};
use crate::security::rate_limit::rate_limit_middleware;
use crate::security::{headers, AccessControl, DenyPolicy, RateLimiter};
use crate::store::HistoryStore;

/// Static dashboard login.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    username: String,
    password: String,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn matches(&self, username: &str, password: &str) -> bool {
        !self.username.is_empty() && self.username == username && self.password == password
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub machine: Arc<AlertStateMachine>,
    pub store: Arc<dyn HistoryStore>,
    pub access: AccessControl,
    pub credentials: Arc<LoginCredentials>,
    pub static_dir: Arc<PathBuf>,
}

/// Requests running longer than `limit` are answered with `408`.
fn request_timeout(limit: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, limit)
}

/// HTTP server for the control plane.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given state and configuration.
    pub fn new(state: AppState, server: &ServerConfig, limits: &RateLimitConfig) -> Self {
        let api_limiter = Arc::new(RateLimiter::per_second(
            "api",
            limits.api_per_second,
            limits.api_burst,
            DenyPolicy::Reject,
        ));
        let reset_limiter = Arc::new(RateLimiter::per_minute(
            "reset",
            limits.reset_per_minute,
            limits.reset_burst,
            DenyPolicy::Drop,
        ));

        let router = Self::build_router(state, server, api_limiter, reset_limiter);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// `route_layer` calls run bottom-up: the last one added sees the
    /// request first.
    fn build_router(
        state: AppState,
        server: &ServerConfig,
        api_limiter: Arc<RateLimiter>,
        reset_limiter: Arc<RateLimiter>,
    ) -> Router {
        let access = state.access.clone();

        // session → rate limit → handler
        let api = Router::new()
            .route("/status", get(handlers::get_status))
            .route("/logs", get(handlers::get_logs))
            .route_layer(middleware::from_fn_with_state(api_limiter, rate_limit_middleware))
            .route_layer(middleware::from_fn_with_state(access.clone(), require_api_session));

        // rate limit → static token → handler
        let reset = Router::new()
            .route("/reset-alert", post(handlers::reset_alert))
            .route_layer(middleware::from_fn_with_state(access.clone(), require_reset_token))
            .route_layer(middleware::from_fn_with_state(reset_limiter, rate_limit_middleware));

        let pages = Router::new()
            .route("/", get(handlers::dashboard))
            .route_layer(middleware::from_fn_with_state(access.clone(), require_page_session));

        let login = Router::new()
            .route("/login", get(handlers::login_page).post(handlers::login))
            .route_layer(middleware::from_fn_with_state(access, redirect_if_authenticated));

        Router::new()
            .merge(api)
            .merge(reset)
            .merge(pages)
            .merge(login)
            .route("/logout", post(handlers::logout))
            .nest_service("/static", ServeDir::new(state.static_dir.as_path()))
            .with_state(state)
            .layer(request_timeout(Duration::from_secs(server.request_timeout_secs)))
            .layer(headers::nosniff())
            .layer(headers::deny_framing())
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id(request),
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The composed router, for in-process use.
    pub fn into_router(self) -> Router {
        self.router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use tower::ServiceExt;

    #[test]
    fn credentials_must_match_exactly() {
        let creds = LoginCredentials::new("admin", "pw");
        assert!(creds.matches("admin", "pw"));
        assert!(!creds.matches("admin", "PW"));
        assert!(!creds.matches("Admin", "pw"));
    }

    #[test]
    fn empty_configured_login_never_matches() {
        assert!(!LoginCredentials::new("", "").matches("", ""));
    }

    #[tokio::test]
    async fn slow_requests_time_out_with_408() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .route("/fast", get(|| async { "done" }))
            .layer(request_timeout(Duration::from_millis(50)));

        let slow = app
            .clone()
            .oneshot(axum::http::Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(slow.status(), StatusCode::REQUEST_TIMEOUT);

        let fast = app
            .oneshot(axum::http::Request::builder().uri("/fast").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(fast.status(), StatusCode::OK);
    }
}
