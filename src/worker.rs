use crate::error::StoreError;
use crate::schema::Lead;
use crate::services::{ContentGenerator, DeliveryService, GenerationRequest, OutboundEmail};
use crate::store::LeadStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_BATCH_SIZE: i64 = 5;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Advances awaiting leads through generation and delivery, one bounded
/// batch per tick. Failures are isolated per lead: a bad lead becomes
/// `FAILED` and its siblings still get processed.
pub struct LifecycleWorker {
    store: Arc<dyn LeadStore>,
    generator: Arc<dyn ContentGenerator>,
    delivery: Arc<dyn DeliveryService>,
    batch_size: i64,
    // Re-entrancy guard: a tick that outlives the interval must not
    // overlap the next one.
    in_flight: tokio::sync::Mutex<()>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub sent: u32,
    pub failed: u32,
}

impl TickSummary {
    pub fn processed(&self) -> u32 {
        self.sent + self.failed
    }
}

pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl LifecycleWorker {
    pub fn new(
        store: Arc<dyn LeadStore>,
        generator: Arc<dyn ContentGenerator>,
        delivery: Arc<dyn DeliveryService>,
        batch_size: i64,
    ) -> Self {
        Self {
            store,
            generator,
            delivery,
            batch_size,
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Runs one scheduling tick. A store read failure is returned to
    /// the caller (the schedule logs it and tries again next interval);
    /// everything below that is absorbed per lead.
    pub async fn tick(&self) -> Result<TickSummary, StoreError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!("previous lifecycle tick still running, skipping this one");
            return Ok(TickSummary::default());
        };

        let leads = self.store.select_awaiting(self.batch_size).await?;
        if leads.is_empty() {
            tracing::debug!("no awaiting leads");
            return Ok(TickSummary::default());
        }

        tracing::info!(count = leads.len(), "processing awaiting leads");

        let mut summary = TickSummary::default();
        for lead in &leads {
            self.process_lead(lead, &mut summary).await;
        }
        Ok(summary)
    }

    async fn process_lead(&self, lead: &Lead, summary: &mut TickSummary) {
        let outcome = self.generate_and_deliver(lead).await;

        match outcome {
            Ok(content) => {
                if let Err(err) = self.store.mark_sent(lead.id, &content).await {
                    // Known gap: the mail went out but the lead stays
                    // AWAITING, so a later tick may send it again.
                    tracing::error!(
                        lead_id = %lead.id,
                        email = %lead.email,
                        error = %err,
                        "failed to record sent lead; message was already delivered"
                    );
                } else {
                    tracing::info!(lead_id = %lead.id, email = %lead.email, "email sent");
                    summary.sent += 1;
                }
            }
            Err(err) => {
                tracing::warn!(
                    lead_id = %lead.id,
                    email = %lead.email,
                    error = %err,
                    "lead processing failed"
                );
                if let Err(err) = self.store.mark_failed(lead.id).await {
                    tracing::error!(lead_id = %lead.id, error = %err, "failed to record failure");
                }
                summary.failed += 1;
            }
        }
    }

    async fn generate_and_deliver(&self, lead: &Lead) -> anyhow::Result<String> {
        let request = GenerationRequest::from_lead(lead);
        let content = self.generator.generate(&request).await?;

        let email = OutboundEmail {
            to: lead.email.clone(),
            subject: format!("Regarding {}", lead.topic),
            body: content.clone(),
        };
        self.delivery.deliver(&email).await?;

        Ok(content)
    }

    /// Spawns the recurring schedule. Tick errors are logged and the
    /// schedule keeps running; `WorkerHandle::stop` shuts it down.
    pub fn start(self: Arc<Self>, interval: Duration) -> WorkerHandle {
        let (shutdown, mut rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick fires immediately; consume it so
            // the worker waits one full interval before its first run.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = rx.changed() => break,
                    _ = ticker.tick() => {
                        match self.tick().await {
                            Ok(summary) if summary.processed() > 0 => {
                                tracing::info!(
                                    sent = summary.sent,
                                    failed = summary.failed,
                                    "lifecycle tick"
                                );
                            }
                            Err(err) => tracing::error!(error = %err, "lifecycle tick failed"),
                            _ => {}
                        }
                    }
                }
            }
        });
        WorkerHandle { shutdown, task }
    }
}
