pub mod brevo;
pub mod fast2sms;
pub mod whatsapp;

use async_trait::async_trait;

/// Sends a plain text message to a phone number (SMS or WhatsApp).
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub name: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub html: String,
    pub attachment: Option<Attachment>,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_email(&self, email: &OutgoingEmail) -> anyhow::Result<()>;
}
