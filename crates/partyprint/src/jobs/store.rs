use async_trait::async_trait;

use crate::error::QueueResult;
use crate::jobs::model::{Job, JobId, JobStatus, SortOrder, StatusCounts};

/// Persistence seam for jobs.
///
/// `transition` is the only mutation that needs to be atomic: it must check the
/// current status and write the new one as a single step (a conditional update in
/// SQL, a write lock in memory). Dispatch relies on it to hand each job to exactly
/// one caller.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new row. Fails if the id already exists.
    async fn insert(&self, job: &Job) -> QueueResult<()>;

    async fn get(&self, id: JobId) -> QueueResult<Option<Job>>;

    /// Set `status = to` only if the current status is one of `from`.
    /// Returns the updated job, or `None` if the row is missing or the guard did not match.
    async fn transition(
        &self,
        id: JobId,
        from: &[JobStatus],
        to: JobStatus,
    ) -> QueueResult<Option<Job>>;

    /// Jobs ordered by `created_at` then insertion order, optionally filtered by status.
    async fn list(
        &self,
        status: Option<JobStatus>,
        order: SortOrder,
        limit: i64,
    ) -> QueueResult<Vec<Job>>;

    /// Remove the row and return what was removed.
    async fn delete(&self, id: JobId) -> QueueResult<Option<Job>>;

    async fn count_by_status(&self) -> QueueResult<StatusCounts>;
}
