use async_trait::async_trait;

use super::{compose, phone, ChannelKind, NotificationChannel};
use crate::models::{Booking, BookingEvent};
use crate::services::messaging::whatsapp::deep_link;
use crate::services::messaging::{Attachment, EmailProvider, MessagingProvider, OutgoingEmail};
use crate::services::receipt;

// ── Email ──

pub struct EmailChannel {
    provider: Box<dyn EmailProvider>,
    admin_email: String,
    business_name: String,
}

impl EmailChannel {
    pub fn new(provider: Box<dyn EmailProvider>, admin_email: String, business_name: String) -> Self {
        Self {
            provider,
            admin_email,
            business_name,
        }
    }

    pub async fn send_to_admin(&self, subject: &str, html: &str) -> anyhow::Result<()> {
        self.provider
            .send_email(&OutgoingEmail {
                to: vec![self.admin_email.clone()],
                bcc: vec![],
                subject: subject.to_string(),
                html: html.to_string(),
                attachment: None,
            })
            .await
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn deliver(&self, booking: &Booking, event: BookingEvent) -> anyhow::Result<()> {
        // Customer gets the mail with the admin in BCC; without a customer
        // address the admin is the only recipient.
        let (to, bcc) = match &booking.customer_email {
            Some(addr) => (vec![addr.clone()], vec![self.admin_email.clone()]),
            None => (vec![self.admin_email.clone()], vec![]),
        };

        let email = OutgoingEmail {
            to,
            bcc,
            subject: compose::email_subject(booking, event),
            html: compose::email_html(booking, event, &self.business_name),
            attachment: Some(Attachment {
                name: format!("Booking_{}.pdf", booking.id),
                content: receipt::generate_pdf(booking, &self.business_name),
            }),
        };

        self.provider.send_email(&email).await
    }
}

// ── WhatsApp ──

/// WhatsApp through the business API when one is configured, otherwise a
/// `wa.me` deep link that is logged and handed back to the submitter.
pub struct WhatsAppChannel {
    api: Option<Box<dyn MessagingProvider>>,
    admin_phone: Option<String>,
    country_code: String,
    business_name: String,
}

impl WhatsAppChannel {
    pub fn new(
        api: Option<Box<dyn MessagingProvider>>,
        admin_phone: Option<String>,
        country_code: String,
        business_name: String,
    ) -> Self {
        Self {
            api,
            admin_phone,
            country_code,
            business_name,
        }
    }

    pub fn has_api(&self) -> bool {
        self.api.is_some()
    }

    pub fn link_for(&self, booking: &Booking, event: BookingEvent) -> String {
        let text = compose::whatsapp_text(booking, event, &self.business_name);
        deep_link(&phone::international(&booking.phone, &self.country_code), &text)
    }

    /// Sends `text` to the customer, copying the admin when configured.
    async fn send(&self, booking: &Booking, text: &str) -> anyhow::Result<()> {
        let customer = phone::international(&booking.phone, &self.country_code);

        let Some(api) = &self.api else {
            let link = deep_link(&customer, text);
            tracing::info!(booking_id = booking.id, link = %link, "whatsapp link generated");
            return Ok(());
        };

        api.send_message(&customer, text).await?;

        if let Some(admin) = &self.admin_phone {
            let admin = phone::international(admin, &self.country_code);
            if let Err(e) = api.send_message(&admin, text).await {
                tracing::warn!(booking_id = booking.id, error = %e, "whatsapp admin copy failed");
            }
        }
        Ok(())
    }

    pub async fn remind(&self, booking: &Booking) -> anyhow::Result<()> {
        let text = compose::reminder_text(booking, &self.business_name);
        self.send(booking, &text).await
    }

    pub fn can_message_admin(&self) -> bool {
        self.api.is_some() && self.admin_phone.is_some()
    }

    /// Direct message to the admin number; `Ok(false)` when there is no
    /// API or no admin number to send through.
    pub async fn send_to_admin(&self, text: &str) -> anyhow::Result<bool> {
        match (&self.api, &self.admin_phone) {
            (Some(api), Some(admin)) => {
                api.send_message(&phone::international(admin, &self.country_code), text)
                    .await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::WhatsApp
    }

    async fn deliver(&self, booking: &Booking, event: BookingEvent) -> anyhow::Result<()> {
        let text = compose::whatsapp_text(booking, event, &self.business_name);
        self.send(booking, &text).await
    }
}

// ── SMS ──

pub struct SmsChannel {
    provider: Box<dyn MessagingProvider>,
    country_code: String,
    business_name: String,
}

impl SmsChannel {
    pub fn new(provider: Box<dyn MessagingProvider>, country_code: String, business_name: String) -> Self {
        Self {
            provider,
            country_code,
            business_name,
        }
    }

    pub async fn send_to(&self, to: &str, text: &str) -> anyhow::Result<()> {
        self.provider
            .send_message(&phone::national(to, &self.country_code), text)
            .await
    }
}

#[async_trait]
impl NotificationChannel for SmsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn deliver(&self, booking: &Booking, event: BookingEvent) -> anyhow::Result<()> {
        let text = compose::sms_text(booking, event, &self.business_name);
        self.send_to(&booking.phone, &text).await
    }
}
