use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use serde::Serialize;

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::{BookingEvent, BookingForm};
use crate::services::qr;
use crate::state::AppState;

static BOOK_HTML: &str = include_str!("../web/book.html");

pub async fn book_page() -> Html<&'static str> {
    Html(BOOK_HTML)
}

// POST /api/bookings
#[derive(Serialize)]
pub struct CreatedResponse {
    id: i64,
    status: String,
    whatsapp_link: String,
    whatsapp_qr: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(form): Json<BookingForm>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let new_booking = form.validate()?;

    let booking = {
        let conn = db::lock(&state.db)?;
        queries::insert_booking(&conn, &new_booking)?
    };
    tracing::info!(booking_id = booking.id, service = %booking.service, "booking created");

    // Delivery continues in the background after the response is sent.
    let _ = state.notifier.dispatch(&booking, BookingEvent::Created);

    let whatsapp_link = state.notifier.whatsapp().link_for(&booking, BookingEvent::Created);
    let whatsapp_qr = match qr::svg_code(&whatsapp_link) {
        Ok(svg) => Some(svg),
        Err(e) => {
            tracing::warn!(booking_id = booking.id, error = %e, "could not render whatsapp QR code");
            None
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: booking.id,
            status: booking.status.as_str().to_string(),
            whatsapp_link,
            whatsapp_qr,
        }),
    ))
}

// GET /api/bookings/:id
#[derive(Serialize)]
pub struct BookingSummary {
    id: i64,
    name: String,
    event_date: String,
    service: String,
    location: String,
    status: String,
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<BookingSummary>, AppError> {
    let booking = {
        let conn = db::lock(&state.db)?;
        queries::get_booking_by_id(&conn, id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    Ok(Json(BookingSummary {
        id: booking.id,
        name: booking.name,
        event_date: booking.event_date.format("%Y-%m-%d").to_string(),
        service: booking.service,
        location: booking.location,
        status: booking.status.as_str().to_string(),
    }))
}
