use anyhow::Context;
use async_trait::async_trait;

use super::MessagingProvider;

const WHATSAPP_API_URL: &str = "https://api.ultramsg.com";

/// WhatsApp business messages through an instance-based gateway.
pub struct WhatsAppApiProvider {
    instance_id: String,
    token: String,
    base_url: String,
    client: reqwest::Client,
}

impl WhatsAppApiProvider {
    pub fn new(client: reqwest::Client, instance_id: String, token: String) -> Self {
        Self {
            instance_id,
            token,
            base_url: WHATSAPP_API_URL.to_string(),
            client,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl MessagingProvider for WhatsAppApiProvider {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        let url = format!("{}/{}/messages/chat", self.base_url, self.instance_id);
        let to = format!("+{}", to.trim_start_matches('+'));

        self.client
            .post(&url)
            .form(&[("token", self.token.as_str()), ("to", to.as_str()), ("body", body)])
            .send()
            .await
            .context("failed to send WhatsApp message")?
            .error_for_status()
            .context("WhatsApp API returned error")?;

        Ok(())
    }
}

/// `https://wa.me/` deep link prefilled with `text`. Used when no
/// WhatsApp API is configured.
pub fn deep_link(phone: &str, text: &str) -> String {
    format!(
        "https://wa.me/{}?text={}",
        phone.trim_start_matches('+'),
        urlencoding::encode(text)
    )
}
