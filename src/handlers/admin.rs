use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::Local;
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use super::auth::require_admin;
use crate::db::queries::{self, Transition};
use crate::db;
use crate::errors::AppError;
use crate::models::{Booking, BookingEvent, BookingStatus, ValidationError};
use crate::services::{export, receipt, reminder};
use crate::state::AppState;

static ADMIN_HTML: &str = include_str!("../web/admin.html");

// GET /admin
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Html<&'static str>, AppError> {
    require_admin(&state, &headers)?;
    Ok(Html(ADMIN_HTML))
}

fn load_booking(state: &AppState, id: i64) -> Result<Booking, AppError> {
    let conn = db::lock(&state.db)?;
    queries::get_booking_by_id(&conn, id)?.ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    require_admin(&state, &headers)?;

    let status_filter = match query.status.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => Some(
            BookingStatus::from_label(s)
                .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))?,
        ),
        None => None,
    };

    let conn = db::lock(&state.db)?;
    Ok(Json(queries::list_bookings(&conn, status_filter)?))
}

fn transition(state: &AppState, id: i64, next: BookingStatus) -> Result<Json<Booking>, AppError> {
    let outcome = {
        let conn = db::lock(&state.db)?;
        queries::transition_status(&conn, id, next)?
    };

    match outcome {
        Transition::Applied(booking) => {
            tracing::info!(booking_id = id, status = next.as_str(), "booking status changed");
            let _ = state.notifier.dispatch(&booking, BookingEvent::for_status(next));
            Ok(Json(booking))
        }
        Transition::Unchanged(booking) => Ok(Json(booking)),
        Transition::Conflict(booking) => Err(AppError::Conflict(format!(
            "booking {id} is already {}",
            booking.status.as_str()
        ))),
        Transition::NotFound => Err(AppError::NotFound(format!("booking {id}"))),
    }
}

// POST /api/admin/bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    require_admin(&state, &headers)?;
    transition(&state, id, BookingStatus::Confirmed)
}

// POST /api/admin/bookings/:id/reject
pub async fn reject_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    require_admin(&state, &headers)?;
    transition(&state, id, BookingStatus::Rejected)
}

// POST /api/admin/bookings/:id/resend
pub async fn resend_notifications(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    require_admin(&state, &headers)?;

    let booking = load_booking(&state, id)?;
    let event = BookingEvent::for_status(booking.status);
    let _ = state.notifier.dispatch(&booking, event);

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({"ok": true, "event": event})),
    ))
}

// DELETE /api/admin/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_admin(&state, &headers)?;

    let deleted = {
        let conn = db::lock(&state.db)?;
        queries::delete_booking(&conn, id)?
    };

    if deleted {
        tracing::info!(booking_id = id, "booking deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("booking {id}")))
    }
}

// GET /api/admin/bookings/:id/receipt
pub async fn download_receipt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    require_admin(&state, &headers)?;

    let booking = load_booking(&state, id)?;
    let pdf = receipt::generate_pdf(&booking, &state.config.business_name);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"Booking_{id}.pdf\""),
            ),
        ],
        pdf,
    )
        .into_response())
}

// GET /api/admin/export.csv
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_admin(&state, &headers)?;

    let bookings = {
        let conn = db::lock(&state.db)?;
        queries::list_bookings(&conn, None)?
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"bookings.csv\""),
        ],
        export::bookings_csv(&bookings),
    )
        .into_response())
}

// POST /api/admin/reminders/run
pub async fn run_reminders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;

    let processed =
        reminder::run_reminders(&state.db, &state.notifier, Local::now().date_naive()).await?;
    Ok(Json(serde_json::json!({"processed": processed})))
}

// GET /api/admin/events (SSE stream of delivery reports)
pub async fn events_stream(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    require_admin(&state, &headers)?;

    let rx = state.notifier.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(report) => {
            let data = serde_json::to_string(&report).unwrap_or_default();
            Some(Ok(Event::default().data(data).event("delivery")))
        }
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(_)) => None,
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
