use crate::error::StoreError;
use crate::schema::{Lead, LeadStatus, NewLead, StatusCounts};
use crate::store::{LeadStore, UpsertReport};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

pub struct PgLeadStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct LeadRow {
    id: Uuid,
    name: String,
    email: String,
    company: String,
    role: String,
    topic: String,
    status: String,
    generated_content: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeadRow> for Lead {
    type Error = StoreError;

    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        let status: LeadStatus = row.status.parse()?;
        Ok(Lead {
            id: row.id,
            name: row.name,
            email: row.email,
            company: row.company,
            role: row.role,
            topic: row.topic,
            status,
            generated_content: row.generated_content,
            created_at: row.created_at,
        })
    }
}

impl PgLeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Creates the leads table if it does not exist yet.
    pub async fn bootstrap(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS leads (
                id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                name text NOT NULL,
                email text NOT NULL UNIQUE,
                company text NOT NULL DEFAULT '',
                role text NOT NULL DEFAULT '',
                topic text NOT NULL DEFAULT '',
                status text NOT NULL DEFAULT 'AWAITING',
                generated_content text,
                created_at timestamptz NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl LeadStore for PgLeadStore {
    async fn upsert_batch(&self, rows: &[NewLead]) -> Result<UpsertReport, StoreError> {
        let mut report = UpsertReport::default();

        // One transaction over the whole batch, row-by-row statements
        // inside it: a single multi-row INSERT .. ON CONFLICT would be
        // rejected by Postgres if the same email appeared twice in one
        // batch.
        let mut tx = self.pool.begin().await?;
        for row in rows {
            if !row.is_valid() {
                tracing::warn!(
                    name = %row.name,
                    email = %row.email,
                    "skipping row (missing name or email)"
                );
                report.skipped += 1;
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO leads (name, email, company, role, topic, status)
                VALUES ($1, $2, $3, $4, $5, 'AWAITING')
                ON CONFLICT (email) DO UPDATE SET status = 'AWAITING'
                "#,
            )
            .bind(&row.name)
            .bind(&row.email)
            .bind(&row.company)
            .bind(&row.role)
            .bind(&row.topic)
            .execute(&mut *tx)
            .await?;
            report.accepted += 1;
        }
        tx.commit().await?;

        Ok(report)
    }

    async fn select_awaiting(&self, limit: i64) -> Result<Vec<Lead>, StoreError> {
        let rows: Vec<LeadRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, company, role, topic, status, generated_content, created_at
            FROM leads
            WHERE status = 'AWAITING'
            ORDER BY created_at, id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Lead::try_from).collect()
    }

    async fn mark_sent(&self, id: Uuid, content: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE leads SET status = 'SENT', generated_content = $2 WHERE id = $1")
            .bind(id)
            .bind(content)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE leads SET status = 'FAILED' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_by_status(&self) -> Result<StatusCounts, StoreError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM leads GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            let status: LeadStatus = status.parse()?;
            counts.record(status, count);
        }
        Ok(counts)
    }
}
