//! Access control middleware.
//!
//! - Browser routes: session cookie, redirect to `/login` when absent
//! - API routes: session cookie, `401` when absent
//! - Login page: inverted, redirect to `/` when already logged in
//! - Reset route: static shared token in `Authorization`

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use crate::observability::metrics;
use crate::security::session::{AuthError, SessionClaim, SessionCodec, SESSION_COOKIE};

/// State required for access control.
#[derive(Clone)]
pub struct AccessControl {
    pub sessions: Arc<dyn SessionCodec>,
    pub reset_token: Arc<str>,
}

impl AccessControl {
    pub fn new(sessions: Arc<dyn SessionCodec>, reset_token: impl Into<Arc<str>>) -> Self {
        Self {
            sessions,
            reset_token: reset_token.into(),
        }
    }

    /// Verify the session cookie carried by a request.
    pub fn session(&self, headers: &HeaderMap) -> Result<SessionClaim, AuthError> {
        let jar = CookieJar::from_headers(headers);
        let cookie = jar.get(SESSION_COOKIE).ok_or(AuthError::Missing)?;
        self.sessions.verify(cookie.value())
    }

    /// Whether an `Authorization` value carries the reset token, raw or as
    /// a bearer credential.
    pub fn is_reset_token(&self, value: &str) -> bool {
        let token = value.strip_prefix("Bearer ").unwrap_or(value);
        !token.is_empty() && token == &*self.reset_token
    }
}

fn reject(err: &AuthError, path: &str) {
    tracing::warn!(path = %path, reason = err.reason(), "Session validation failed");
    metrics::record_auth_failure(err.reason());
}

/// Browser routes: unauthenticated visitors go to the login form.
pub async fn require_page_session(
    State(access): State<AccessControl>,
    mut request: Request,
    next: Next,
) -> Response {
    match access.session(request.headers()) {
        Ok(claim) => {
            request.extensions_mut().insert(claim);
            next.run(request).await
        }
        Err(e) => {
            reject(&e, request.uri().path());
            Redirect::to("/login").into_response()
        }
    }
}

/// API routes: unauthenticated callers get `401`.
pub async fn require_api_session(
    State(access): State<AccessControl>,
    mut request: Request,
    next: Next,
) -> Response {
    match access.session(request.headers()) {
        Ok(claim) => {
            request.extensions_mut().insert(claim);
            next.run(request).await
        }
        Err(e) => {
            reject(&e, request.uri().path());
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Unauthorized" })),
            )
                .into_response()
        }
    }
}

/// Login page: visitors with a valid session are sent to the dashboard.
pub async fn redirect_if_authenticated(
    State(access): State<AccessControl>,
    request: Request,
    next: Next,
) -> Response {
    if let Ok(claim) = access.session(request.headers()) {
        tracing::info!(user = %claim.sub, "User is already authenticated");
        return Redirect::to("/").into_response();
    }
    next.run(request).await
}

/// Reset route: the `Authorization` header must carry the shared token.
pub async fn require_reset_token(
    State(access): State<AccessControl>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| access.is_reset_token(value));

    if authorized {
        return next.run(request).await;
    }

    tracing::warn!("Unauthorized attempt to reset alert status");
    metrics::record_auth_failure("reset_token");
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Unauthorized" })),
    )
        .into_response()
}
