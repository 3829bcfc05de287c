//! Manual overrides used by operators, over HTTP and from `ppctl`.

use std::sync::Arc;

use crate::blob::BlobStore;
use crate::error::QueueResult;
use crate::jobs::{Job, JobId, QueueEngine};

#[derive(Clone)]
pub struct AdminActions {
    engine: QueueEngine,
    blobs: Arc<dyn BlobStore>,
}

impl AdminActions {
    pub fn new(engine: QueueEngine, blobs: Arc<dyn BlobStore>) -> Self {
        Self { engine, blobs }
    }

    /// Queue a job. Also the way to rescue a job stuck in `printing`.
    pub async fn queue(&self, id: JobId) -> QueueResult<Job> {
        let job = self.engine.enqueue(id).await?;
        tracing::info!(job_id = %id, status = %job.status, "[ADMIN] queued job for print");
        Ok(job)
    }

    pub async fn mark_printed(&self, id: JobId) -> QueueResult<Job> {
        let job = self.engine.complete_print(id).await?;
        tracing::info!(job_id = %id, "[ADMIN] marked job as printed");
        Ok(job)
    }

    /// Delete the row, then try to delete the blob. A blob failure is logged and
    /// does not undo or fail the row removal.
    pub async fn delete(&self, id: JobId) -> QueueResult<Job> {
        let job = self.engine.delete_job(id).await?;

        match self.blobs.delete(&job.filename).await {
            Ok(()) => tracing::info!(filename = %job.filename, "[ADMIN] deleted blob"),
            Err(e) => {
                tracing::warn!(filename = %job.filename, error = %e, "[ADMIN] failed to delete blob")
            }
        }

        tracing::info!(job_id = %id, "[ADMIN] deleted job");
        Ok(job)
    }
}
