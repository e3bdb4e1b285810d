//! Control-plane handlers.

use axum::{
    extract::{rejection::FormRejection, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::http::server::AppState;
use crate::store::{format_timestamp, Page, ProbeRecord, DEFAULT_PER_PAGE};
use crate::security::SESSION_COOKIE;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub connection_status: String,
    pub last_email_sent: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    page: Option<String>,
    per_page: Option<String>,
}

/// Missing fields read as empty, which never matches a login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Lenient integer parse: anything that is not a non-negative integer is `0`.
pub fn parse_or_zero(value: &str) -> u32 {
    value.trim().parse().unwrap_or(0)
}

impl LogsQuery {
    /// Absent parameters take the defaults; malformed ones parse as `0`,
    /// which `Page` clamps to page 1 / the default size.
    pub fn page(&self) -> Page {
        let number = self.page.as_deref().map_or(1, parse_or_zero);
        let size = self.per_page.as_deref().map_or(DEFAULT_PER_PAGE, parse_or_zero);
        Page::new(number, size)
    }
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.machine.snapshot().await;
    Json(StatusResponse {
        connection_status: snapshot.state.to_string(),
        last_email_sent: snapshot
            .last_notified_at
            .map(format_timestamp)
            .unwrap_or_default(),
    })
}

pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<ProbeRecord>>, (StatusCode, &'static str)> {
    const FAILED: (StatusCode, &str) = (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch logs");

    let store = state.store.clone();
    let page = query.page();
    let read = tokio::task::spawn_blocking(move || store.read_records(page))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Log read task failed");
            FAILED
        })?;

    read.map(Json).map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch logs");
        FAILED
    })
}

pub async fn reset_alert(State(state): State<AppState>) -> Json<MessageResponse> {
    let was_sent = state.machine.reset_alert().await;
    tracing::info!(was_sent, "Alert status reset via HTTP endpoint");
    Json(MessageResponse {
        message: "Alert status reset successfully".to_string(),
    })
}

pub async fn dashboard(State(state): State<AppState>, request: Request) -> Response {
    serve_asset(&state, "index.html", request).await
}

pub async fn login_page(State(state): State<AppState>, request: Request) -> Response {
    serve_asset(&state, "login.html", request).await
}

async fn serve_asset(state: &AppState, name: &str, request: Request) -> Response {
    match ServeFile::new(state.static_dir.join(name)).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    // An unreadable body is a failed login, not a client error.
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable login form");
            LoginForm::default()
        }
    };
    tracing::info!(username = %form.username, "Login attempt");

    if !state.credentials.matches(&form.username, &form.password) {
        tracing::warn!(username = %form.username, "Invalid login credentials");
        return (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response();
    }

    let token = match state.access.sessions.issue(&form.username) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "Could not generate session token");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Could not generate token").into_response();
        }
    };

    let max_age = i64::try_from(state.access.sessions.ttl().as_secs()).unwrap_or(i64::MAX);
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age));

    (jar.add(cookie), Redirect::to("/")).into_response()
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), Redirect::to("/login"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use crate::health::{AlertStateMachine, ProbeOutcome};
    use crate::http::LoginCredentials;
    use crate::notify::{Notice, Notifier, NotifyError};
    use crate::security::{AccessControl, JwtSessions};
    use crate::store::{HistoryStore, StatusRecord, StoreError};

    /// Store whose history reads hold the calling thread.
    struct SlowStore;

    impl HistoryStore for SlowStore {
        fn read_status(&self) -> Result<Option<StatusRecord>, StoreError> {
            Ok(None)
        }

        fn write_status(&self, _: &StatusRecord) -> Result<(), StoreError> {
            Ok(())
        }

        fn append_record(&self, _: ProbeOutcome, _: DateTime<Utc>) -> Result<i64, StoreError> {
            Ok(1)
        }

        fn read_records(&self, _: Page) -> Result<Vec<ProbeRecord>, StoreError> {
            std::thread::sleep(Duration::from_millis(200));
            Ok(Vec::new())
        }
    }

    struct SilentNotifier;

    #[async_trait]
    impl Notifier for SilentNotifier {
        async fn notify(&self, _: &Notice) -> Result<(), NotifyError> {
            Ok(())
        }
    }

    fn state_over(store: Arc<dyn HistoryStore>) -> AppState {
        AppState {
            machine: Arc::new(AlertStateMachine::new(
                "10.0.0.1:22",
                Arc::new(SilentNotifier),
                store.clone(),
                None,
            )),
            store,
            access: AccessControl::new(
                Arc::new(JwtSessions::new(b"secret", Duration::from_secs(60))),
                "reset",
            ),
            credentials: Arc::new(LoginCredentials::new("admin", "pw")),
            static_dir: Arc::new(PathBuf::from("static")),
        }
    }

    fn query(page: Option<&str>, per_page: Option<&str>) -> LogsQuery {
        LogsQuery {
            page: page.map(str::to_string),
            per_page: per_page.map(str::to_string),
        }
    }

    #[test]
    fn missing_params_use_defaults() {
        assert_eq!(query(None, None).page(), Page::new(1, 25));
    }

    #[test]
    fn explicit_params_are_honoured() {
        let page = query(Some("2"), Some("10")).page();
        assert_eq!((page.number(), page.size()), (2, 10));
    }

    #[test]
    fn malformed_params_fall_back_through_zero() {
        assert_eq!(parse_or_zero("abc"), 0);
        assert_eq!(parse_or_zero("-3"), 0);
        assert_eq!(query(Some("abc"), Some("")).page(), Page::new(1, 25));
        assert_eq!(query(Some("0"), Some("x")).page().number(), 1);
    }

    #[tokio::test]
    async fn slow_log_reads_leave_the_runtime_free() {
        let state = state_over(Arc::new(SlowStore));

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let Json(records) = get_logs(State(state), Query(query(None, None))).await.unwrap();
        ticker.abort();

        assert!(records.is_empty());
        let ticks = ticks.load(Ordering::SeqCst);
        assert!(ticks >= 5, "runtime stalled during the read: {ticks} ticks");
    }
}
