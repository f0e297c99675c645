pub mod admin;
pub mod auth;
pub mod bookings;

use std::sync::Arc;

use axum::response::Redirect;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(|| async { Redirect::to("/book") }))
        .route("/book", get(bookings::book_page))
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings/:id", get(bookings::get_booking))
        .route("/admin/login", get(auth::login_page).post(auth::login))
        .route("/admin/otp", post(auth::request_otp))
        .route("/admin/otp/verify", post(auth::verify_otp))
        .route("/admin/logout", post(auth::logout))
        .route("/admin", get(admin::dashboard))
        .route("/api/admin/bookings", get(admin::list_bookings))
        .route(
            "/api/admin/bookings/:id/confirm",
            post(admin::confirm_booking),
        )
        .route(
            "/api/admin/bookings/:id/reject",
            post(admin::reject_booking),
        )
        .route(
            "/api/admin/bookings/:id/resend",
            post(admin::resend_notifications),
        )
        .route("/api/admin/bookings/:id", delete(admin::delete_booking))
        .route(
            "/api/admin/bookings/:id/receipt",
            get(admin::download_receipt),
        )
        .route("/api/admin/export.csv", get(admin::export_csv))
        .route("/api/admin/reminders/run", post(admin::run_reminders))
        .route("/api/admin/events", get(admin::events_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
