use crate::error::StoreError;
use crate::schema::{Lead, NewLead, StatusCounts};
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgLeadStore;

/// Outcome of a batch upsert. `accepted + skipped` always equals the
/// number of rows handed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertReport {
    pub accepted: usize,
    pub skipped: usize,
}

/// Durable, email-keyed storage of leads. Injected into the worker and
/// the HTTP surface as `Arc<dyn LeadStore>` so tests can swap in a fake.
#[async_trait::async_trait]
pub trait LeadStore: Send + Sync {
    /// Writes a batch atomically. Rows with a non-empty name and email
    /// are inserted as `AWAITING`; on an email conflict only the status
    /// is reset to `AWAITING` (re-uploading re-arms a lead without
    /// clobbering its other fields). Rows missing name or email are
    /// counted as skipped, never an error.
    async fn upsert_batch(&self, rows: &[NewLead]) -> Result<UpsertReport, StoreError>;

    /// Up to `limit` `AWAITING` leads, oldest first.
    async fn select_awaiting(&self, limit: i64) -> Result<Vec<Lead>, StoreError>;

    /// Marks a lead `SENT` and stores the delivered content.
    async fn mark_sent(&self, id: Uuid, content: &str) -> Result<(), StoreError>;

    /// Marks a lead `FAILED`, leaving `generated_content` untouched.
    async fn mark_failed(&self, id: Uuid) -> Result<(), StoreError>;

    /// Counts per status, zero-filled for statuses with no leads.
    async fn count_by_status(&self) -> Result<StatusCounts, StoreError>;
}
