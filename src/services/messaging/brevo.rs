use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use serde_json::json;

use super::{EmailProvider, OutgoingEmail};

const BREVO_API_URL: &str = "https://api.brevo.com";

/// Transactional email through the Brevo v3 API.
pub struct BrevoEmailProvider {
    api_key: String,
    sender_name: String,
    sender_email: String,
    base_url: String,
    client: reqwest::Client,
}

impl BrevoEmailProvider {
    pub fn new(
        client: reqwest::Client,
        api_key: String,
        sender_name: String,
        sender_email: String,
    ) -> Self {
        Self {
            api_key,
            sender_name,
            sender_email,
            base_url: BREVO_API_URL.to_string(),
            client,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn payload(&self, email: &OutgoingEmail) -> serde_json::Value {
        let recipients = |list: &[String]| -> Vec<serde_json::Value> {
            list.iter().map(|addr| json!({ "email": addr })).collect()
        };

        let mut body = json!({
            "sender": { "name": self.sender_name, "email": self.sender_email },
            "to": recipients(&email.to),
            "subject": email.subject,
            "htmlContent": email.html,
        });

        if !email.bcc.is_empty() {
            body["bcc"] = json!(recipients(&email.bcc));
        }
        if let Some(attachment) = &email.attachment {
            body["attachment"] = json!([{
                "name": attachment.name,
                "content": base64::engine::general_purpose::STANDARD.encode(&attachment.content),
            }]);
        }
        body
    }
}

#[async_trait]
impl EmailProvider for BrevoEmailProvider {
    async fn send_email(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
        anyhow::ensure!(!email.to.is_empty(), "email has no recipients");

        let url = format!("{}/v3/smtp/email", self.base_url);
        self.client
            .post(&url)
            .header("api-key", &self.api_key)
            .header("accept", "application/json")
            .json(&self.payload(email))
            .send()
            .await
            .context("failed to call Brevo API")?
            .error_for_status()
            .context("Brevo API returned error")?;

        Ok(())
    }
}
