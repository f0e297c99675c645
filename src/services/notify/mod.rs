//! Notification fan-out.
//!
//! Each lifecycle event of a booking is delivered through every configured
//! channel in its own task. Channel failures are logged and reported, never
//! returned to the caller, and a channel without configuration is skipped.

pub mod channels;
pub mod compose;
pub mod phone;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::db::{self, queries, Db};
use crate::models::{Booking, BookingEvent, DeliveryFlag};

pub use channels::{EmailChannel, SmsChannel, WhatsAppChannel};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    WhatsApp,
    Sms,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Email => "email",
            ChannelKind::WhatsApp => "whatsapp",
            ChannelKind::Sms => "sms",
        }
    }

    /// Flag persisted after a successful send, if the channel has one.
    pub fn flag(&self) -> Option<DeliveryFlag> {
        match self {
            ChannelKind::Email => Some(DeliveryFlag::Email),
            ChannelKind::WhatsApp => Some(DeliveryFlag::WhatsApp),
            ChannelKind::Sms => None,
        }
    }
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;
    async fn deliver(&self, booking: &Booking, event: BookingEvent) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    pub booking_id: i64,
    pub event: BookingEvent,
    pub channel: ChannelKind,
    pub outcome: DeliveryOutcome,
}

/// Tasks spawned by one [`Notifier::dispatch`]. Dropping the handle leaves
/// the tasks running.
pub struct DispatchHandle {
    skipped: Vec<DeliveryReport>,
    tasks: Vec<JoinHandle<DeliveryReport>>,
}

impl DispatchHandle {
    /// Waits for every channel task and returns one report per channel.
    pub async fn wait(self) -> Vec<DeliveryReport> {
        let mut reports = self.skipped;
        for task in self.tasks {
            match task.await {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!(error = %e, "notification task panicked"),
            }
        }
        reports
    }
}

pub struct Notifier {
    db: Db,
    email: Option<Arc<EmailChannel>>,
    whatsapp: Arc<WhatsAppChannel>,
    sms: Option<Arc<SmsChannel>>,
    reports_tx: broadcast::Sender<DeliveryReport>,
}

impl Notifier {
    pub fn new(
        db: Db,
        email: Option<EmailChannel>,
        whatsapp: WhatsAppChannel,
        sms: Option<SmsChannel>,
    ) -> Self {
        let (reports_tx, _) = broadcast::channel(256);
        Self {
            db,
            email: email.map(Arc::new),
            whatsapp: Arc::new(whatsapp),
            sms: sms.map(Arc::new),
            reports_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeliveryReport> {
        self.reports_tx.subscribe()
    }

    pub fn whatsapp(&self) -> &WhatsAppChannel {
        &self.whatsapp
    }

    fn channels(&self) -> [(ChannelKind, Option<Arc<dyn NotificationChannel>>); 3] {
        [
            (
                ChannelKind::Email,
                self.email.clone().map(|c| c as Arc<dyn NotificationChannel>),
            ),
            (
                ChannelKind::WhatsApp,
                Some(self.whatsapp.clone() as Arc<dyn NotificationChannel>),
            ),
            (
                ChannelKind::Sms,
                self.sms.clone().map(|c| c as Arc<dyn NotificationChannel>),
            ),
        ]
    }

    /// Starts delivery of `event` on every channel. Returns immediately;
    /// the caller may wait on the handle or drop it.
    pub fn dispatch(&self, booking: &Booking, event: BookingEvent) -> DispatchHandle {
        let booking = Arc::new(booking.clone());
        let mut skipped = vec![];
        let mut tasks = vec![];

        for (kind, channel) in self.channels() {
            let Some(channel) = channel else {
                tracing::debug!(booking_id = booking.id, channel = kind.as_str(), "channel not configured, skipping");
                let report = DeliveryReport {
                    booking_id: booking.id,
                    event,
                    channel: kind,
                    outcome: DeliveryOutcome::Skipped,
                };
                let _ = self.reports_tx.send(report.clone());
                skipped.push(report);
                continue;
            };

            let booking = Arc::clone(&booking);
            let db = Arc::clone(&self.db);
            let tx = self.reports_tx.clone();
            tasks.push(tokio::spawn(async move {
                let report = deliver_one(channel.as_ref(), &db, &booking, event).await;
                // No subscribers is fine.
                let _ = tx.send(report.clone());
                report
            }));
        }

        DispatchHandle { skipped, tasks }
    }

    /// Whether [`Notifier::alert_admin`] has any channel to send through.
    pub fn can_alert_admin(&self, admin_phone: Option<&str>) -> bool {
        (self.sms.is_some() && admin_phone.is_some())
            || self.whatsapp.can_message_admin()
            || self.email.is_some()
    }

    /// Best-effort message to the operator through the first channel that
    /// can reach them: SMS, then WhatsApp API, then email. `Ok(false)` when
    /// no channel is able to.
    pub async fn alert_admin(
        &self,
        admin_phone: Option<&str>,
        subject: &str,
        text: &str,
    ) -> anyhow::Result<bool> {
        if let (Some(sms), Some(phone)) = (&self.sms, admin_phone) {
            sms.send_to(phone, text).await?;
            return Ok(true);
        }
        if self.whatsapp.send_to_admin(text).await? {
            return Ok(true);
        }
        if let Some(email) = &self.email {
            email.send_to_admin(subject, &format!("<p>{text}</p>")).await?;
            return Ok(true);
        }
        Ok(false)
    }
}

async fn deliver_one(
    channel: &dyn NotificationChannel,
    db: &Db,
    booking: &Booking,
    event: BookingEvent,
) -> DeliveryReport {
    let kind = channel.kind();
    let outcome = match channel.deliver(booking, event).await {
        Ok(()) => {
            tracing::info!(booking_id = booking.id, channel = kind.as_str(), ?event, "notification sent");
            if let Some(flag) = kind.flag() {
                let marked = db::lock(db).and_then(|conn| queries::mark_delivered(&conn, booking.id, flag));
                if let Err(e) = marked {
                    tracing::error!(booking_id = booking.id, error = %e, "failed to persist delivery flag");
                }
            }
            DeliveryOutcome::Delivered
        }
        Err(e) => {
            let error = format!("{e:#}");
            tracing::error!(booking_id = booking.id, channel = kind.as_str(), error = %error, "notification failed");
            DeliveryOutcome::Failed(error)
        }
    };

    DeliveryReport {
        booking_id: booking.id,
        event,
        channel: kind,
        outcome,
    }
}
