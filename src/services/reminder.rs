use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use tokio::task::JoinHandle;

use crate::db::{self, queries, Db};
use crate::models::DeliveryFlag;
use crate::services::notify::Notifier;

/// Sends a WhatsApp reminder for every confirmed booking happening the day
/// after `today` that has not been reminded yet. The flag is set whether or
/// not the send went through. Returns the number of bookings processed.
pub async fn run_reminders(db: &Db, notifier: &Notifier, today: NaiveDate) -> anyhow::Result<usize> {
    let tomorrow = today.succ_opt().context("date out of range")?;

    let due = {
        let conn = db::lock(db)?;
        queries::due_reminders(&conn, tomorrow)?
    };

    for booking in &due {
        if let Err(e) = notifier.whatsapp().remind(booking).await {
            tracing::error!(booking_id = booking.id, error = %e, "reminder send failed");
        }

        let marked =
            db::lock(db).and_then(|conn| queries::mark_delivered(&conn, booking.id, DeliveryFlag::Reminder));
        if let Err(e) = marked {
            tracing::error!(booking_id = booking.id, error = %e, "failed to persist reminder flag");
        }
    }

    Ok(due.len())
}

/// Next wall-clock occurrence of `at` strictly after `now`.
pub fn next_run(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Runs [`run_reminders`] once a day at `at`, local time.
pub fn spawn_daily(db: Db, notifier: Arc<Notifier>, at: NaiveTime) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Local::now().naive_local();
            let next = next_run(now, at);
            tracing::info!(next_run = %next, "reminder job scheduled");

            tokio::time::sleep((next - now).to_std().unwrap_or_default()).await;

            match run_reminders(&db, &notifier, Local::now().date_naive()).await {
                Ok(count) => tracing::info!(count, "reminder job finished"),
                Err(e) => tracing::error!(error = %e, "reminder job failed"),
            }
        }
    })
}
