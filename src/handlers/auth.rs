use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;

use crate::errors::{AppError, LOGIN_PATH};
use crate::services::auth;
use crate::state::AppState;

static LOGIN_HTML: &str = include_str!("../web/login.html");

pub const DASHBOARD_PATH: &str = "/admin";

/// Admin gate shared by every operator route. Runs before any lookup so an
/// unauthenticated caller learns nothing about the target record.
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    match auth::session_cookie(headers) {
        Some(cookie) if state.sessions.is_authenticated(cookie) => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}

fn start_session(state: &AppState) -> Result<Response, AppError> {
    let cookie = state.sessions.create()?;
    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, DASHBOARD_PATH.to_string()),
            (
                header::SET_COOKIE,
                auth::set_cookie_header(&cookie, state.sessions.ttl()),
            ),
        ],
    )
        .into_response())
}

pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_HTML)
}

// POST /admin/login
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let ok = auth::check_credentials(
        form.username.trim(),
        &form.password,
        &state.config.admin_user,
        &state.config.admin_pass,
    );

    if !ok {
        tracing::warn!(username = %form.username, "admin login failed");
        return Err(AppError::InvalidCredentials);
    }

    tracing::info!("admin logged in");
    start_session(&state)
}

fn otp_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

// POST /admin/otp
pub async fn request_otp(State(state): State<Arc<AppState>>) -> Response {
    let admin_phone = state.config.admin_whatsapp.as_deref();

    // No code is issued unless someone can receive it.
    if !state.notifier.can_alert_admin(admin_phone) {
        return otp_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "no channel configured to deliver login codes",
        );
    }

    let code = match state.otp.issue() {
        Ok(code) => code,
        Err(auth::OtpError::Internal(e)) => {
            tracing::error!(error = %e, "failed to generate login code");
            return otp_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to generate login code");
        }
        Err(e) => {
            tracing::warn!(error = %e, "login code request refused");
            return otp_error(StatusCode::TOO_MANY_REQUESTS, &e.to_string());
        }
    };

    let text = format!(
        "{}: your admin login code is {code}. It expires in 5 minutes.",
        state.config.business_name
    );

    match state.notifier.alert_admin(admin_phone, "Admin login code", &text).await {
        Ok(true) => (StatusCode::ACCEPTED, Json(serde_json::json!({"ok": true}))).into_response(),
        Ok(false) => {
            state.otp.revoke();
            otp_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "no channel configured to deliver login codes",
            )
        }
        Err(e) => {
            state.otp.revoke();
            tracing::error!(error = %e, "failed to deliver login code");
            otp_error(StatusCode::BAD_GATEWAY, "failed to deliver login code")
        }
    }
}

// POST /admin/otp/verify
#[derive(Deserialize)]
pub struct OtpForm {
    pub code: String,
}

pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Form(form): Form<OtpForm>,
) -> Result<Response, AppError> {
    if !state.otp.verify(&form.code) {
        tracing::warn!("admin login code rejected");
        return Err(AppError::InvalidCredentials);
    }

    tracing::info!("admin logged in with one-time code");
    start_session(&state)
}

// POST /admin/logout
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(cookie) = auth::session_cookie(&headers) {
        state.sessions.remove(cookie);
    }

    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, LOGIN_PATH.to_string()),
            (header::SET_COOKIE, auth::clear_cookie_header()),
        ],
    )
        .into_response()
}
