use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QueueError;

pub type JobId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub filename: String,
    pub owner: String,
    pub url: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// A freshly uploaded job with a new random id.
    pub fn new(job: NewJob) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            filename: job.filename,
            owner: job.owner,
            url: job.url,
            status: JobStatus::Uploaded,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub filename: String,
    pub owner: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Uploaded,
    Queued,
    Printing,
    Printed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Uploaded,
        JobStatus::Queued,
        JobStatus::Printing,
        JobStatus::Printed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Uploaded => "uploaded",
            JobStatus::Queued => "queued",
            JobStatus::Printing => "printing",
            JobStatus::Printed => "printed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "uploaded" => Ok(JobStatus::Uploaded),
            "queued" => Ok(JobStatus::Queued),
            "printing" => Ok(JobStatus::Printing),
            "printed" => Ok(JobStatus::Printed),
            other => Err(QueueError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first, the dispatch order.
    Oldest,
    /// Newest first, for listings.
    Newest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub uploaded: i64,
    pub queued: i64,
    pub printing: i64,
    pub printed: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: JobStatus, n: i64) {
        match status {
            JobStatus::Uploaded => self.uploaded += n,
            JobStatus::Queued => self.queued += n,
            JobStatus::Printing => self.printing += n,
            JobStatus::Printed => self.printed += n,
        }
    }

    pub fn total(&self) -> i64 {
        self.uploaded + self.queued + self.printing + self.printed
    }
}
