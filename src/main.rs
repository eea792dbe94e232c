use std::sync::Arc;

mod config;
mod error;
mod http;
mod ingest;
mod schema;
mod services;
mod store;
mod worker;

use config::Config;
use services::{ContentGenerator, DeliveryService, HttpMailer, OpenAiGenerator};
use store::{LeadStore, PgLeadStore};
use worker::LifecycleWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let store = PgLeadStore::connect(&config.database_url).await?;
    store.bootstrap().await?;
    let store: Arc<dyn LeadStore> = Arc::new(store);
    tracing::info!("database initialized");

    let generator: Arc<dyn ContentGenerator> = Arc::new(OpenAiGenerator::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    ));
    let delivery: Arc<dyn DeliveryService> = Arc::new(HttpMailer::new(
        config.mailer_url.clone(),
        config.mailer_api_key.clone(),
        config.mailer_from.clone(),
    ));

    let lifecycle = Arc::new(LifecycleWorker::new(
        store.clone(),
        generator,
        delivery,
        config.worker_batch_size,
    ));
    let worker_handle = lifecycle.start(config.worker_interval);
    tracing::info!(
        interval_secs = config.worker_interval.as_secs(),
        batch_size = config.worker_batch_size,
        "lifecycle worker started"
    );

    let app = http::router(http::AppState { store });
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    worker_handle.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
