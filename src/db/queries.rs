use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Booking, BookingStatus, DeliveryFlag, NewBooking};

const BOOKING_COLUMNS: &str = "id, name, location, phone, customer_email, event_date, service, extras, notes, \
     status, whatsapp_sent, email_sent, reminder_sent, created_at";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Result of asking the store to move a booking to a new status.
#[derive(Debug)]
pub enum Transition {
    /// The booking was Pending and now holds the requested status.
    Applied(Booking),
    /// The booking already held the requested status; nothing was written.
    Unchanged(Booking),
    /// The booking sits in the other terminal status; nothing was written.
    Conflict(Booking),
    NotFound,
}

// ── Bookings ──

pub fn insert_booking(conn: &Connection, booking: &NewBooking) -> anyhow::Result<Booking> {
    let created_at = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();
    let event_date = booking.event_date.format(DATE_FORMAT).to_string();

    conn.execute(
        "INSERT INTO bookings (name, location, phone, customer_email, event_date, service, extras, notes, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.name,
            booking.location,
            booking.phone,
            booking.customer_email,
            event_date,
            booking.service,
            booking.extras_joined(),
            booking.notes,
            BookingStatus::Pending.as_str(),
            created_at,
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_booking_by_id(conn, id)?
        .ok_or_else(|| anyhow::anyhow!("booking {id} missing right after insert"))
}

pub fn get_booking_by_id(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All bookings, newest first.
pub fn list_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY created_at DESC, id DESC"
    ))?;

    let rows = stmt.query_map(params![status_filter.map(|s| s.as_str())], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn transition_status(
    conn: &Connection,
    id: i64,
    next: BookingStatus,
) -> anyhow::Result<Transition> {
    anyhow::ensure!(
        BookingStatus::Pending.can_transition_to(next),
        "{} is not a reachable status",
        next.as_str()
    );

    let updated = conn.execute(
        "UPDATE bookings SET status = ?1 WHERE id = ?2 AND status = ?3",
        params![next.as_str(), id, BookingStatus::Pending.as_str()],
    )?;

    let Some(booking) = get_booking_by_id(conn, id)? else {
        return Ok(Transition::NotFound);
    };

    Ok(if updated > 0 {
        Transition::Applied(booking)
    } else if booking.status == next {
        Transition::Unchanged(booking)
    } else {
        Transition::Conflict(booking)
    })
}

pub fn delete_booking(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

/// Sets a delivery flag. Flags are never cleared.
pub fn mark_delivered(conn: &Connection, id: i64, flag: DeliveryFlag) -> anyhow::Result<bool> {
    let count = conn.execute(
        &format!("UPDATE bookings SET {} = 1 WHERE id = ?1", flag.column()),
        params![id],
    )?;
    Ok(count > 0)
}

/// Confirmed bookings on `event_date` that have not had a reminder yet.
pub fn due_reminders(conn: &Connection, event_date: NaiveDate) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE event_date = ?1 AND status = ?2 AND reminder_sent = 0
         ORDER BY id ASC"
    ))?;

    let date = event_date.format(DATE_FORMAT).to_string();
    let rows = stmt.query_map(params![date, BookingStatus::Confirmed.as_str()], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let event_date_str: String = row.get(5)?;
    let status_str: String = row.get(9)?;
    let created_at_str: String = row.get(13)?;

    let event_date = NaiveDate::parse_from_str(&event_date_str, DATE_FORMAT)
        .map_err(|e| anyhow::anyhow!("bad event_date {event_date_str:?}: {e}"))?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, TIMESTAMP_FORMAT)
        .map_err(|e| anyhow::anyhow!("bad created_at {created_at_str:?}: {e}"))?;

    Ok(Booking {
        id: row.get(0)?,
        name: row.get(1)?,
        location: row.get(2)?,
        phone: row.get(3)?,
        customer_email: row.get(4)?,
        event_date,
        service: row.get(6)?,
        extras: row.get(7)?,
        notes: row.get(8)?,
        status: BookingStatus::parse(&status_str),
        whatsapp_sent: row.get::<_, i32>(10)? != 0,
        email_sent: row.get::<_, i32>(11)? != 0,
        reminder_sent: row.get::<_, i32>(12)? != 0,
        created_at,
    })
}
