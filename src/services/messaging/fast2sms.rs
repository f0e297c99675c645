use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::MessagingProvider;

const FAST2SMS_API_URL: &str = "https://www.fast2sms.com";

/// Bulk SMS through the Fast2SMS quick route.
pub struct Fast2SmsProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl Fast2SmsProvider {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            api_key,
            base_url: FAST2SMS_API_URL.to_string(),
            client,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl MessagingProvider for Fast2SmsProvider {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        let url = format!("{}/dev/bulkV2", self.base_url);

        let resp = self
            .client
            .post(&url)
            .header("authorization", &self.api_key)
            .json(&json!({
                "route": "q",
                "message": body,
                "numbers": to,
                "flash": "0",
            }))
            .send()
            .await
            .context("failed to call Fast2SMS API")?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse Fast2SMS response")?;

        if !status.is_success() || data["return"] == json!(false) {
            anyhow::bail!("Fast2SMS API error ({}): {}", status, data);
        }

        Ok(())
    }
}
