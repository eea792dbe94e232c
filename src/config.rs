use crate::worker::{DEFAULT_BATCH_SIZE, DEFAULT_INTERVAL};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub mailer_url: String,
    pub mailer_api_key: String,
    pub mailer_from: String,
    pub worker_interval: Duration,
    pub worker_batch_size: i64,
}

fn required(key: &str) -> anyhow::Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("{key} not set"))
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port: u16 = parsed_or("PORT", 3000);
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            listen_addr: format!("0.0.0.0:{port}"),
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            mailer_url: required("MAILER_URL")?,
            mailer_api_key: required("MAILER_API_KEY")?,
            mailer_from: required("MAILER_FROM")?,
            worker_interval: Duration::from_secs(parsed_or(
                "WORKER_INTERVAL_SECS",
                DEFAULT_INTERVAL.as_secs(),
            )),
            worker_batch_size: parsed_or("WORKER_BATCH_SIZE", DEFAULT_BATCH_SIZE),
        })
    }
}
