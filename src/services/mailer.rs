use serde::Serialize;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// External delivery collaborator. Like generation, failures are
/// opaque; the worker resolves any error to `FAILED`.
#[async_trait::async_trait]
pub trait DeliveryService: Send + Sync {
    async fn deliver(&self, email: &OutboundEmail) -> anyhow::Result<()>;
}

/// Sends mail through a JSON mail API (Resend-style endpoint).
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(endpoint: String, api_key: String, from: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            endpoint,
            api_key,
            from,
        }
    }
}

#[async_trait::async_trait]
impl DeliveryService for HttpMailer {
    async fn deliver(&self, email: &OutboundEmail) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "from": self.from,
            "to": [email.to],
            "subject": email.subject,
            "text": email.body,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("mail API returned {status}: {body}");
        }

        Ok(())
    }
}
