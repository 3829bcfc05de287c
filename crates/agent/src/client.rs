use std::time::Duration;

use async_trait::async_trait;
use partyprint::api::models::{DispatchedJob, NextJobResponse};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Network, DNS, timeout or body decoding failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned HTTP {0}")]
    HttpStatus(u16),
}

/// The three calls an agent makes against the queue server.
#[async_trait]
pub trait PrintServer: Send + Sync {
    async fn next_job(&self) -> Result<Option<DispatchedJob>, ClientError>;

    async fn download(&self, url: &str) -> Result<Vec<u8>, ClientError>;

    async fn mark_printed(&self, job_id: Uuid) -> Result<(), ClientError>;
}

pub struct HttpPrintServer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPrintServer {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

fn check_status(res: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    if res.status().is_success() {
        Ok(res)
    } else {
        Err(ClientError::HttpStatus(res.status().as_u16()))
    }
}

#[async_trait]
impl PrintServer for HttpPrintServer {
    async fn next_job(&self) -> Result<Option<DispatchedJob>, ClientError> {
        let res = self
            .client
            .get(format!("{}/next-job", self.base_url))
            .send()
            .await?;
        let body: NextJobResponse = check_status(res)?.json().await?;
        Ok(body.dispatched())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let res = self.client.get(url).send().await?;
        let bytes = check_status(res)?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn mark_printed(&self, job_id: Uuid) -> Result<(), ClientError> {
        let res = self
            .client
            .post(format!("{}/mark-printed/{job_id}", self.base_url))
            .send()
            .await?;
        check_status(res)?;
        Ok(())
    }
}
