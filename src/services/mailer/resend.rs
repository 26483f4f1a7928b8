use anyhow::Context;
use async_trait::async_trait;

use super::{Mailer, OutboundEmail};

pub struct ResendMailer {
    api_key: String,
    from: String,
    client: reqwest::Client,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            api_key,
            from,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutboundEmail) -> anyhow::Result<()> {
        let mut body = serde_json::json!({
            "from": self.from,
            "to": [email.to],
            "subject": email.subject,
            "text": email.text,
        });
        if let Some(html) = &email.html {
            body["html"] = serde_json::json!(html);
        }
        if let Some(reply_to) = &email.reply_to {
            body["reply_to"] = serde_json::json!(reply_to);
        }

        self.client
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to send email via Resend")?
            .error_for_status()
            .context("Resend API returned error")?;

        Ok(())
    }
}
