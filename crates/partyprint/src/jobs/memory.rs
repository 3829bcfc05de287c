use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{QueueError, QueueResult};
use crate::jobs::model::{Job, JobId, JobStatus, SortOrder, StatusCounts};
use crate::jobs::store::JobStore;

struct Row {
    seq: u64,
    job: Job,
}

#[derive(Default)]
struct Inner {
    rows: HashMap<JobId, Row>,
    next_seq: u64,
}

/// In-process job store for tests and single-node runs without a database.
///
/// Reads share the lock; only writes (including the status CAS) take it exclusively.
#[derive(Default)]
pub struct MemoryJobStore {
    inner: RwLock<Inner>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: &Job) -> QueueResult<()> {
        let mut inner = self.inner.write();
        if inner.rows.contains_key(&job.id) {
            return Err(QueueError::storage(format!("duplicate job id {}", job.id)));
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.rows.insert(
            job.id,
            Row {
                seq,
                job: job.clone(),
            },
        );
        Ok(())
    }

    async fn get(&self, id: JobId) -> QueueResult<Option<Job>> {
        Ok(self.inner.read().rows.get(&id).map(|r| r.job.clone()))
    }

    async fn transition(
        &self,
        id: JobId,
        from: &[JobStatus],
        to: JobStatus,
    ) -> QueueResult<Option<Job>> {
        let mut inner = self.inner.write();
        let Some(row) = inner.rows.get_mut(&id) else {
            return Ok(None);
        };
        if !from.contains(&row.job.status) {
            return Ok(None);
        }
        row.job.status = to;
        row.job.updated_at = Utc::now();
        Ok(Some(row.job.clone()))
    }

    async fn list(
        &self,
        status: Option<JobStatus>,
        order: SortOrder,
        limit: i64,
    ) -> QueueResult<Vec<Job>> {
        let inner = self.inner.read();
        let mut rows: Vec<&Row> = inner
            .rows
            .values()
            .filter(|r| status.map_or(true, |s| r.job.status == s))
            .collect();

        rows.sort_by(|a, b| {
            a.job
                .created_at
                .cmp(&b.job.created_at)
                .then(a.seq.cmp(&b.seq))
        });
        if order == SortOrder::Newest {
            rows.reverse();
        }

        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(rows.into_iter().take(limit).map(|r| r.job.clone()).collect())
    }

    async fn delete(&self, id: JobId) -> QueueResult<Option<Job>> {
        Ok(self.inner.write().rows.remove(&id).map(|r| r.job))
    }

    async fn count_by_status(&self) -> QueueResult<StatusCounts> {
        let mut counts = StatusCounts::default();
        for row in self.inner.read().rows.values() {
            counts.add(row.job.status, 1);
        }
        Ok(counts)
    }
}
