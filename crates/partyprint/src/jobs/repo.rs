// crates/partyprint/src/jobs/repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{QueueError, QueueResult};
use crate::jobs::model::{Job, JobId, JobStatus, SortOrder, StatusCounts};
use crate::jobs::store::JobStore;

const JOB_COLUMNS: &str = "id, filename, owner, url, status, created_at, updated_at";

/// Raw row as stored. `status` is free text in the table, so it is checked
/// on the way out instead of trusted.
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    filename: String,
    owner: String,
    url: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = QueueError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Job {
            id: row.id,
            filename: row.filename,
            owner: row.owner,
            url: row.url,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn insert(&self, job: &Job) -> QueueResult<()> {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, filename, owner, url, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(job.id)
        .bind(&job.filename)
        .bind(&job.owner)
        .bind(&job.url)
        .bind(job.status.as_str())
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: JobId) -> QueueResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Job::try_from).transpose()
    }

    // Single conditional UPDATE: under READ COMMITTED a concurrent writer on the
    // same row blocks, then re-checks the status guard against the committed value,
    // so two callers can never both see `queued` and both win.
    async fn transition(
        &self,
        id: JobId,
        from: &[JobStatus],
        to: JobStatus,
    ) -> QueueResult<Option<Job>> {
        let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();

        let row = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            UPDATE jobs
            SET status = $2,
                updated_at = now()
            WHERE id = $1
              AND status = ANY($3)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(to.as_str())
        .bind(from)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Job::try_from).transpose()
    }

    async fn list(
        &self,
        status: Option<JobStatus>,
        order: SortOrder,
        limit: i64,
    ) -> QueueResult<Vec<Job>> {
        let order_by = match order {
            SortOrder::Oldest => "created_at ASC, seq ASC",
            SortOrder::Newest => "created_at DESC, seq DESC",
        };

        let rows = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY {order_by}
            LIMIT $2
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Job::try_from).collect()
    }

    async fn delete(&self, id: JobId) -> QueueResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "DELETE FROM jobs WHERE id = $1 RETURNING {JOB_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Job::try_from).transpose()
    }

    async fn count_by_status(&self) -> QueueResult<StatusCounts> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM jobs GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = StatusCounts::default();
        for (status, n) in rows {
            counts.add(status.parse()?, n);
        }
        Ok(counts)
    }
}
