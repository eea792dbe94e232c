//! In-process `LeadStore` with the same observable semantics as the
//! Postgres implementation, used by worker and ingestion tests.

use crate::error::StoreError;
use crate::schema::{Lead, LeadStatus, NewLead, StatusCounts};
use crate::store::{LeadStore, UpsertReport};
use chrono::{Duration, TimeZone, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryLeadStore {
    leads: Mutex<Vec<Lead>>,
    seq: AtomicI64,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `select_awaiting` and `count_by_status` fail until reset.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes `mark_sent` and `mark_failed` fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, email: &str) -> Option<Lead> {
        self.leads
            .lock()
            .unwrap()
            .iter()
            .find(|lead| lead.email == email)
            .cloned()
    }

    fn next_created_at(&self) -> chrono::DateTime<Utc> {
        // Distinct, strictly increasing timestamps so ordering tests
        // are deterministic.
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(seq)
    }
}

#[async_trait::async_trait]
impl LeadStore for MemoryLeadStore {
    async fn upsert_batch(&self, rows: &[NewLead]) -> Result<UpsertReport, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated write failure".into()));
        }

        let mut leads = self.leads.lock().unwrap();
        let mut report = UpsertReport::default();
        for row in rows {
            if !row.is_valid() {
                report.skipped += 1;
                continue;
            }
            report.accepted += 1;

            if let Some(existing) = leads.iter_mut().find(|lead| lead.email == row.email) {
                // Conflict path touches only the status.
                existing.status = LeadStatus::Awaiting;
                continue;
            }
            leads.push(Lead {
                id: Uuid::new_v4(),
                name: row.name.clone(),
                email: row.email.clone(),
                company: row.company.clone(),
                role: row.role.clone(),
                topic: row.topic.clone(),
                status: LeadStatus::Awaiting,
                generated_content: None,
                created_at: self.next_created_at(),
            });
        }
        Ok(report)
    }

    async fn select_awaiting(&self, limit: i64) -> Result<Vec<Lead>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated read failure".into()));
        }

        let mut awaiting: Vec<Lead> = self
            .leads
            .lock()
            .unwrap()
            .iter()
            .filter(|lead| lead.status == LeadStatus::Awaiting)
            .cloned()
            .collect();
        awaiting.sort_by_key(|lead| lead.created_at);
        awaiting.truncate(limit.max(0) as usize);
        Ok(awaiting)
    }

    async fn mark_sent(&self, id: Uuid, content: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated write failure".into()));
        }

        let mut leads = self.leads.lock().unwrap();
        if let Some(lead) = leads.iter_mut().find(|lead| lead.id == id) {
            lead.status = LeadStatus::Sent;
            lead.generated_content = Some(content.to_string());
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated write failure".into()));
        }

        let mut leads = self.leads.lock().unwrap();
        if let Some(lead) = leads.iter_mut().find(|lead| lead.id == id) {
            lead.status = LeadStatus::Failed;
        }
        Ok(())
    }

    async fn count_by_status(&self) -> Result<StatusCounts, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated read failure".into()));
        }

        let mut counts = StatusCounts::default();
        for lead in self.leads.lock().unwrap().iter() {
            counts.record(lead.status, 1);
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, email: &str) -> NewLead {
        NewLead {
            name: name.to_string(),
            email: email.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn accepted_plus_skipped_covers_whole_batch() {
        let store = MemoryLeadStore::new();
        let batch = vec![
            row("A", "a@x.com"),
            row("", "b@x.com"),
            NewLead {
                name: "C".into(),
                email: "c@x.com".into(),
                company: "Acme".into(),
                topic: "pricing".into(),
                ..Default::default()
            },
        ];

        let report = store.upsert_batch(&batch).await.unwrap();
        assert_eq!(report.accepted, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.accepted + report.skipped, batch.len());

        let awaiting = store.select_awaiting(10).await.unwrap();
        let emails: Vec<&str> = awaiting.iter().map(|l| l.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", "c@x.com"]);
    }

    #[tokio::test]
    async fn reupload_resets_status_without_clobbering_fields() {
        let store = MemoryLeadStore::new();
        store
            .upsert_batch(&[NewLead {
                name: "Ada".into(),
                email: "ada@x.com".into(),
                company: "Acme".into(),
                role: "CTO".into(),
                topic: "pricing".into(),
            }])
            .await
            .unwrap();

        let lead = store.get("ada@x.com").unwrap();
        store.mark_failed(lead.id).await.unwrap();

        // Re-upload with different attribute values.
        store
            .upsert_batch(&[NewLead {
                name: "Different".into(),
                email: "ada@x.com".into(),
                company: "Other".into(),
                ..Default::default()
            }])
            .await
            .unwrap();

        let lead = store.get("ada@x.com").unwrap();
        assert_eq!(lead.status, LeadStatus::Awaiting);
        assert_eq!(lead.name, "Ada");
        assert_eq!(lead.company, "Acme");
        assert_eq!(lead.role, "CTO");
        assert_eq!(lead.topic, "pricing");
    }

    #[tokio::test]
    async fn select_awaiting_is_bounded_oldest_first_and_status_filtered() {
        let store = MemoryLeadStore::new();
        let batch: Vec<NewLead> = (0..7).map(|i| row("L", &format!("l{i}@x.com"))).collect();
        store.upsert_batch(&batch).await.unwrap();

        let first = store.get("l0@x.com").unwrap();
        store.mark_sent(first.id, "hello").await.unwrap();

        let awaiting = store.select_awaiting(3).await.unwrap();
        assert_eq!(awaiting.len(), 3);
        let emails: Vec<&str> = awaiting.iter().map(|l| l.email.as_str()).collect();
        assert_eq!(emails, vec!["l1@x.com", "l2@x.com", "l3@x.com"]);
        assert!(awaiting.iter().all(|l| l.status == LeadStatus::Awaiting));
        assert!(
            awaiting
                .windows(2)
                .all(|pair| pair[0].created_at <= pair[1].created_at)
        );
    }

    #[tokio::test]
    async fn mark_sent_is_idempotent_and_mark_failed_keeps_content() {
        let store = MemoryLeadStore::new();
        store.upsert_batch(&[row("A", "a@x.com")]).await.unwrap();
        let lead = store.get("a@x.com").unwrap();

        store.mark_sent(lead.id, "body").await.unwrap();
        store.mark_sent(lead.id, "body").await.unwrap();
        let lead = store.get("a@x.com").unwrap();
        assert_eq!(lead.status, LeadStatus::Sent);
        assert_eq!(lead.generated_content.as_deref(), Some("body"));

        store.mark_failed(lead.id).await.unwrap();
        let lead = store.get("a@x.com").unwrap();
        assert_eq!(lead.status, LeadStatus::Failed);
        assert_eq!(lead.generated_content.as_deref(), Some("body"));
    }

    #[tokio::test]
    async fn counts_include_zero_statuses_and_sum_to_total() {
        let store = MemoryLeadStore::new();
        store
            .upsert_batch(&[row("A", "a@x.com"), row("B", "b@x.com")])
            .await
            .unwrap();
        let lead = store.get("a@x.com").unwrap();
        store.mark_failed(lead.id).await.unwrap();

        let counts = store.count_by_status().await.unwrap();
        assert_eq!(counts.awaiting, 1);
        assert_eq!(counts.generated, 0);
        assert_eq!(counts.sent, 0);
        assert_eq!(counts.failed, 1);
        assert_eq!(
            counts.total,
            counts.awaiting + counts.generated + counts.sent + counts.failed
        );
    }
}
