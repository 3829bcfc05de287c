use std::sync::Arc;

use crate::error::{QueueError, QueueResult};
use crate::jobs::model::{Job, JobId, JobStatus, NewJob, SortOrder, StatusCounts};
use crate::jobs::store::JobStore;

pub const DEFAULT_LIST_LIMIT: i64 = 100;
pub const MAX_LIST_LIMIT: i64 = 500;

/// States `enqueue` may move to `queued`. `printing` is here so an admin can
/// push a job back after an agent died mid-print.
const ENQUEUE_FROM: [JobStatus; 3] = [JobStatus::Uploaded, JobStatus::Queued, JobStatus::Printing];

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How many queued candidates one dispatch round looks at.
    pub dispatch_scan_batch: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dispatch_scan_batch: 16,
        }
    }
}

/// Owns the job lifecycle:
///
/// ```text
/// uploaded --enqueue--> queued --dispatch_next--> printing --complete_print--> printed
/// ```
///
/// `complete_print` is accepted from any state. A job left in `printing` by a
/// crashed agent stays there until someone calls `enqueue` on it.
#[derive(Clone)]
pub struct QueueEngine {
    store: Arc<dyn JobStore>,
    cfg: EngineConfig,
}

impl QueueEngine {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<dyn JobStore>, cfg: EngineConfig) -> Self {
        Self { store, cfg }
    }

    pub async fn create_job(&self, new_job: NewJob) -> QueueResult<Job> {
        let job = Job::new(new_job);
        self.store.insert(&job).await?;
        tracing::info!(job_id = %job.id, filename = %job.filename, owner = %job.owner, "job created");
        Ok(job)
    }

    pub async fn get_job(&self, id: JobId) -> QueueResult<Job> {
        self.store.get(id).await?.ok_or(QueueError::NotFound(id))
    }

    /// Move a job to `queued`. Already-queued jobs are left alone, and a printed
    /// job is returned unchanged since it never goes back into the queue.
    pub async fn enqueue(&self, id: JobId) -> QueueResult<Job> {
        if let Some(job) = self
            .store
            .transition(id, &ENQUEUE_FROM, JobStatus::Queued)
            .await?
        {
            tracing::info!(job_id = %id, "[PRINT] job queued for printing");
            return Ok(job);
        }

        let job = self.get_job(id).await?;
        tracing::warn!(job_id = %id, status = %job.status, "[PRINT] enqueue ignored");
        Ok(job)
    }

    /// Hand the oldest queued job to the caller and mark it `printing`.
    ///
    /// Candidates are read oldest first and each is claimed with a
    /// `queued -> printing` compare-and-set. A failed claim means another poller
    /// took that job out of `queued`, so rescanning always makes progress and
    /// `None` is only returned once a scan finds nothing queued.
    pub async fn dispatch_next(&self) -> QueueResult<Option<Job>> {
        let batch = self.cfg.dispatch_scan_batch.clamp(1, 256);

        let mut round: u64 = 0;
        loop {
            let candidates = self
                .store
                .list(Some(JobStatus::Queued), SortOrder::Oldest, batch)
                .await?;

            if candidates.is_empty() {
                return Ok(None);
            }

            for candidate in candidates {
                match self
                    .store
                    .transition(candidate.id, &[JobStatus::Queued], JobStatus::Printing)
                    .await?
                {
                    Some(job) => {
                        tracing::info!(job_id = %job.id, owner = %job.owner, "[DISPATCH] job sent to printer");
                        return Ok(Some(job));
                    }
                    None => {
                        tracing::debug!(job_id = %candidate.id, round, "dispatch race lost, trying next candidate");
                    }
                }
            }
            round += 1;
        }
    }

    /// Mark a job printed. Safe to repeat: a second report on a printed job succeeds.
    pub async fn complete_print(&self, id: JobId) -> QueueResult<Job> {
        let job = self
            .store
            .transition(id, &JobStatus::ALL, JobStatus::Printed)
            .await?
            .ok_or(QueueError::NotFound(id))?;

        tracing::info!(job_id = %id, "[PRINTED] job marked complete");
        Ok(job)
    }

    /// Newest first, optionally filtered. `limit` is clamped to [1, 500].
    pub async fn list_jobs(
        &self,
        status: Option<JobStatus>,
        limit: Option<i64>,
    ) -> QueueResult<Vec<Job>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        self.store.list(status, SortOrder::Newest, limit).await
    }

    /// Queued jobs in the order dispatch will hand them out.
    pub async fn dispatch_order(&self, limit: Option<i64>) -> QueueResult<Vec<Job>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        self.store
            .list(Some(JobStatus::Queued), SortOrder::Oldest, limit)
            .await
    }

    /// Remove the job row and return it. The backing blob is the caller's concern.
    pub async fn delete_job(&self, id: JobId) -> QueueResult<Job> {
        let job = self
            .store
            .delete(id)
            .await?
            .ok_or(QueueError::NotFound(id))?;

        tracing::info!(job_id = %id, "job deleted");
        Ok(job)
    }

    pub async fn status_counts(&self) -> QueueResult<StatusCounts> {
        self.store.count_by_status().await
    }
}
