// crates/partyprint/src/api/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::jobs::{Job, JobStatus};

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub filename: String,
    pub owner: Option<String>,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub job_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub id: Uuid,
    pub path: String,
    pub user: String,
    /// `uploaded`, or `queued` when auto-queue ran.
    pub status: JobStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobActionResponse {
    pub ok: bool,
    pub job: Job,
    /// Set when the request was accepted but left the job as it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl JobActionResponse {
    pub fn new(job: Job) -> Self {
        Self {
            ok: true,
            job,
            note: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListJobsResponse {
    pub items: Vec<Job>,
}

/// Body of `GET /next-job`. Every field is `null` when nothing is queued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextJobResponse {
    pub id: Option<Uuid>,
    pub filename: Option<String>,
    pub owner: Option<String>,
    pub url: Option<String>,
}

/// A job as the printer agent sees it after a successful poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedJob {
    pub id: Uuid,
    pub filename: String,
    pub owner: String,
    pub url: String,
}

impl From<Option<Job>> for NextJobResponse {
    fn from(job: Option<Job>) -> Self {
        match job {
            Some(job) => Self {
                id: Some(job.id),
                filename: Some(job.filename),
                owner: Some(job.owner),
                url: Some(job.url),
            },
            None => Self::default(),
        }
    }
}

impl NextJobResponse {
    /// `None` for an empty poll. A response with an id but no url is treated as empty too.
    pub fn dispatched(self) -> Option<DispatchedJob> {
        let id = self.id?;
        let url = self.url?;
        Some(DispatchedJob {
            id,
            filename: self.filename.unwrap_or_default(),
            owner: self.owner.unwrap_or_else(|| "Anonymous".to_string()),
            url,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GalleryImage {
    pub path: String,
    pub user: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GalleryResponse {
    pub images: Vec<GalleryImage>,
}
